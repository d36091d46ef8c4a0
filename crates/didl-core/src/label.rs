//! Record and variant field labels.
//!
//! On the wire a field is identified only by a 32-bit id. Named labels hash to
//! their id; numeric labels are the id directly. Canonical field order is
//! ascending id, independent of declaration order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A record/variant field label: declared name or bare numeric id.
///
/// Two labels with the same id compare equal on the wire even if one is named
/// and the other numeric, so `Ord`/`Eq` go through [`Label::id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Label {
    Named(String),
    Id(u32),
}

impl Label {
    /// The wire id of this label.
    ///
    /// Named labels use the Candid field hash: the degree-223 polynomial
    /// `h(s) = sum(s[i] * 223^(n-1-i)) mod 2^32`. This must match the
    /// authoritative Candid specification exactly or interop silently breaks.
    pub fn id(&self) -> u32 {
        match self {
            Label::Named(name) => field_hash(name),
            Label::Id(id) => *id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Label::Named(name) => Some(name),
            Label::Id(_) => None,
        }
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Label {}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id().cmp(&other.id())
    }
}

impl std::hash::Hash for Label {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Named(name) => {
                if is_plain_identifier(name) {
                    write!(f, "{name}")
                } else {
                    write!(f, "{name:?}")
                }
            }
            Label::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Candid field-id hash of a name.
pub fn field_hash(name: &str) -> u32 {
    name.bytes()
        .fold(0u32, |h, b| h.wrapping_mul(223).wrapping_add(b as u32))
}

/// Whether a name can appear unquoted in Candid text.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_reference_vectors() {
        // Reference values from the Candid specification's examples.
        assert_eq!(field_hash(""), 0);
        assert_eq!(field_hash("a"), 97);
        assert_eq!(field_hash("b"), 98);
        assert_eq!(field_hash("ok"), 24860);
        assert_eq!(field_hash("head"), 1_158_359_328);
        assert_eq!(field_hash("tail"), 1_291_237_008);
    }

    #[test]
    fn named_and_numeric_labels_compare_by_id() {
        assert_eq!(Label::Named("a".into()), Label::Id(97));
        assert!(Label::Named("a".into()) < Label::Named("b".into()));
    }

    #[test]
    fn display_quotes_non_identifiers() {
        assert_eq!(Label::Named("head".into()).to_string(), "head");
        assert_eq!(Label::Named("two words".into()).to_string(), "\"two words\"");
        assert_eq!(Label::Id(7).to_string(), "7");
    }
}
