use std::path::PathBuf;

use didl_parser::{parse, resolve};

use crate::cli::ColorChoice;
use crate::util::load_source;

pub struct CheckArgs {
    pub path: PathBuf,
    pub color: ColorChoice,
}

pub fn run(args: CheckArgs) {
    let source = load_source(&args.path);
    let path = args.path.display().to_string();

    let parsed = parse(&source);
    let resolved = resolve(&parsed.program);
    let mut diagnostics = parsed.diagnostics;
    diagnostics.extend(resolved.diagnostics);

    if !diagnostics.is_empty() {
        let rendered = diagnostics
            .printer()
            .source(&source)
            .path(&path)
            .colored(args.color.should_colorize())
            .render();
        eprintln!("{rendered}");
    }
    if diagnostics.has_errors() {
        eprintln!("error: {} error(s) in {path}", diagnostics.error_count());
        std::process::exit(1);
    }

    let graph = resolved.graph;
    let methods = graph.service().map_or(0, |s| s.methods.len());
    println!("{path}: {} type(s), {} method(s)", graph.defs().count(), methods);
}
