//! Principal identifiers.
//!
//! A principal is an opaque blob of at most 29 bytes. The textual form is
//! `base32(crc32_be(blob) ++ blob)` in lowercase, grouped in fives with
//! dashes, e.g. `w7x7r-cok77-xa`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_LEN: usize = 29;
const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PrincipalError {
    #[error("principal blob exceeds {MAX_LEN} bytes: {0}")]
    TooLong(usize),
    #[error("invalid character {0:?} in principal text")]
    InvalidCharacter(char),
    #[error("principal text too short")]
    TooShort,
    #[error("principal checksum mismatch")]
    ChecksumMismatch,
}

/// An opaque principal id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    blob: Vec<u8>,
}

impl Principal {
    pub fn from_blob(blob: impl Into<Vec<u8>>) -> Result<Self, PrincipalError> {
        let blob = blob.into();
        if blob.len() > MAX_LEN {
            return Err(PrincipalError::TooLong(blob.len()));
        }
        Ok(Self { blob })
    }

    /// The anonymous principal, a single `0x04` byte.
    pub fn anonymous() -> Self {
        Self { blob: vec![0x04] }
    }

    /// The management canister, the empty blob (renders as `aaaaa-aa`).
    pub fn management() -> Self {
        Self { blob: Vec::new() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.blob
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let checksum = crc32fast::hash(&self.blob);
        let mut data = checksum.to_be_bytes().to_vec();
        data.extend_from_slice(&self.blob);

        let encoded = base32_encode(&data);
        for (i, c) in encoded.iter().enumerate() {
            if i > 0 && i % 5 == 0 {
                write!(f, "-")?;
            }
            write!(f, "{}", *c as char)?;
        }
        Ok(())
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(text: &str) -> Result<Self, PrincipalError> {
        let mut compact = Vec::with_capacity(text.len());
        for c in text.chars() {
            if c == '-' {
                continue;
            }
            compact.push(c);
        }
        let data = base32_decode(&compact)?;
        if data.len() < 4 {
            return Err(PrincipalError::TooShort);
        }
        let (checksum, blob) = data.split_at(4);
        if checksum != crc32fast::hash(blob).to_be_bytes() {
            return Err(PrincipalError::ChecksumMismatch);
        }
        Self::from_blob(blob.to_vec())
    }
}

fn base32_encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len().div_ceil(5) * 8);
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    for &byte in data {
        acc = (acc << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((acc >> bits) & 0x1f) as usize]);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((acc << (5 - bits)) & 0x1f) as usize]);
    }
    out
}

fn base32_decode(chars: &[char]) -> Result<Vec<u8>, PrincipalError> {
    let mut out = Vec::with_capacity(chars.len() * 5 / 8);
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    for &c in chars {
        let value = match c.to_ascii_lowercase() {
            c @ 'a'..='z' => c as u32 - 'a' as u32,
            c @ '2'..='7' => c as u32 - '2' as u32 + 26,
            other => return Err(PrincipalError::InvalidCharacter(other)),
        };
        acc = (acc << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn management_canister_text() {
        assert_eq!(Principal::management().to_string(), "aaaaa-aa");
    }

    #[test]
    fn anonymous_round_trips() {
        let p = Principal::anonymous();
        let text = p.to_string();
        assert_eq!(text.parse::<Principal>().unwrap(), p);
    }

    #[test]
    fn arbitrary_blob_round_trips() {
        let p = Principal::from_blob(vec![0xab, 0xcd, 0x01]).unwrap();
        let parsed: Principal = p.to_string().parse().unwrap();
        assert_eq!(parsed, p);
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let text = Principal::anonymous().to_string();
        // Flip the first character (part of the checksum prefix).
        let mut chars: Vec<char> = text.chars().collect();
        chars[0] = if chars[0] == 'a' { 'b' } else { 'a' };
        let corrupted: String = chars.into_iter().collect();
        assert!(matches!(
            corrupted.parse::<Principal>(),
            Err(PrincipalError::ChecksumMismatch)
        ));
    }

    #[test]
    fn oversized_blob_rejected() {
        assert!(matches!(
            Principal::from_blob(vec![0u8; 30]),
            Err(PrincipalError::TooLong(30))
        ));
    }
}
