mod cli;
mod commands;
mod json;
mod util;

use clap::Parser;

use cli::{Cli, Command};
use commands::{check, decode, dump, encode};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Check { path, color } => check::run(check::CheckArgs { path, color }),
        Command::Dump { path } => dump::run(dump::DumpArgs { path }),
        Command::Encode { path, method, args } => {
            encode::run(encode::EncodeArgs { path, method, args })
        }
        Command::Decode {
            hex,
            did,
            method,
            reply,
        } => decode::run(decode::DecodeArgs {
            hex,
            did,
            method,
            reply,
        }),
    }
}
