use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn should_colorize(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

#[derive(Parser)]
#[command(name = "didl", bin_name = "didl")]
#[command(about = "Candid interface parser and wire codec")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse an interface and report diagnostics
    #[command(after_help = r#"EXAMPLES:
  didl check wallet.did
  didl check - < wallet.did"#)]
    Check {
        /// Interface file, or `-` for stdin
        path: PathBuf,

        /// When to color diagnostics
        #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
        color: ColorChoice,
    },

    /// Print the resolved types and service of an interface
    Dump {
        /// Interface file, or `-` for stdin
        path: PathBuf,
    },

    /// Encode JSON arguments for a method call
    #[command(after_help = r#"EXAMPLES:
  didl encode wallet.did greet '["alice"]'
  didl encode wallet.did transfer '[{"to": "aaaaa-aa", "amount": 5}]'"#)]
    Encode {
        /// Interface file, or `-` for stdin
        path: PathBuf,

        /// Method name
        method: String,

        /// Arguments as a JSON array
        args: String,
    },

    /// Decode a wire message to textual syntax
    #[command(after_help = r#"EXAMPLES:
  didl decode 4449444c00017105616c696365
  didl decode --did wallet.did --method greet --reply 4449444c0001710568656c6c6f"#)]
    Decode {
        /// Message bytes in hex
        hex: String,

        /// Interface file; with --method, restores field and variant names
        #[arg(long)]
        did: Option<PathBuf>,

        /// Method whose declared types guide decoding
        #[arg(long, requires = "did")]
        method: Option<String>,

        /// Decode as the method's reply instead of its arguments
        #[arg(long, requires = "method")]
        reply: bool,
    },
}
