use std::path::PathBuf;

use didl_codec::encode_args;
use serde_json::Value as Json;

use crate::json::value_from_json;
use crate::util::{load_interface, to_hex};

pub struct EncodeArgs {
    pub path: PathBuf,
    pub method: String,
    pub args: String,
}

pub fn run(args: EncodeArgs) {
    let graph = load_interface(&args.path);
    let Some(sig) = graph.method(&args.method) else {
        eprintln!("error: service has no method `{}`", args.method);
        std::process::exit(1);
    };

    let json: Json = match serde_json::from_str(&args.args) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("error: invalid JSON arguments: {e}");
            std::process::exit(1);
        }
    };
    let Json::Array(items) = json else {
        eprintln!("error: arguments must be a JSON array, one element per parameter");
        std::process::exit(1);
    };
    if items.len() != sig.args.len() {
        eprintln!(
            "error: method `{}` takes {} argument(s), got {}",
            args.method,
            sig.args.len(),
            items.len()
        );
        std::process::exit(1);
    }

    let mut values = Vec::with_capacity(items.len());
    for (ty, item) in sig.args.iter().zip(&items) {
        match value_from_json(&graph, *ty, item) {
            Ok(value) => values.push(value),
            Err(msg) => {
                eprintln!("error: {msg}");
                std::process::exit(1);
            }
        }
    }

    match encode_args(&graph, &sig.args, &values) {
        Ok(bytes) => println!("{}", to_hex(&bytes)),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
