use std::fs;
use std::io::{self, Read};
use std::path::Path;

use didl_core::TypeGraph;
use didl_parser::parse_interface;

pub fn load_source(path: &Path) -> String {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            eprintln!("error: failed to read stdin: {e}");
            std::process::exit(1);
        }
        return buf;
    }
    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: failed to read {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

/// Parse and resolve, printing diagnostics and exiting on failure.
pub fn load_interface(path: &Path) -> TypeGraph {
    let source = load_source(path);
    match parse_interface(&source) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("{}", e.render(&source));
            std::process::exit(1);
        }
    }
}

pub fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() % 2 != 0 {
        return Err("odd number of hex digits".to_owned());
    }
    let digits = compact.as_bytes();
    let mut out = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks_exact(2) {
        let hi = hex_digit(pair[0])?;
        let lo = hex_digit(pair[1])?;
        out.push(hi << 4 | lo);
    }
    Ok(out)
}

fn hex_digit(byte: u8) -> Result<u8, String> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        other => Err(format!("invalid hex digit {:?}", other as char)),
    }
}

pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips() {
        let bytes = parse_hex("4449444c00").unwrap();
        assert_eq!(bytes, [0x44, 0x49, 0x44, 0x4c, 0x00]);
        assert_eq!(to_hex(&bytes), "4449444c00");
    }

    #[test]
    fn hex_tolerates_whitespace_and_case() {
        assert_eq!(parse_hex("DE ad\nBE ef").unwrap(), [0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn bad_hex_is_reported() {
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }
}
