use std::path::PathBuf;

use didl_codec::{decode_args, decode_args_with_types, render_args};
use didl_core::Value;

use crate::util::{load_interface, parse_hex};

pub struct DecodeArgs {
    pub hex: String,
    pub did: Option<PathBuf>,
    pub method: Option<String>,
    pub reply: bool,
}

pub fn run(args: DecodeArgs) {
    let bytes = match parse_hex(&args.hex) {
        Ok(bytes) => bytes,
        Err(msg) => {
            eprintln!("error: {msg}");
            std::process::exit(1);
        }
    };

    let values = match (&args.did, &args.method) {
        (Some(did), Some(method)) => {
            let graph = load_interface(did);
            let Some(sig) = graph.method(method) else {
                eprintln!("error: service has no method `{method}`");
                std::process::exit(1);
            };
            let types = if args.reply { &sig.rets } else { &sig.args };
            decode_with(|| decode_args_with_types(&graph, types, &bytes))
        }
        _ => decode_with(|| decode_args(&bytes)),
    };

    println!("{}", render_args(&values));
}

fn decode_with(decode: impl FnOnce() -> Result<Vec<Value>, didl_codec::CodecError>) -> Vec<Value> {
    match decode() {
        Ok(values) => values,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
