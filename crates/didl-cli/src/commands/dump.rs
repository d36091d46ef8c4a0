use std::path::PathBuf;

use didl_core::render_graph;

use crate::util::load_interface;

pub struct DumpArgs {
    pub path: PathBuf,
}

pub fn run(args: DumpArgs) {
    let graph = load_interface(&args.path);
    print!("{}", render_graph(&graph));
}
