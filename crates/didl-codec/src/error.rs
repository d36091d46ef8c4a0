use didl_core::Label;

/// Failures while encoding or decoding wire messages.
///
/// Every variant names what was being processed; decode failures in
/// particular must point at the offending structure, since the caller only
/// has an opaque byte buffer to look at.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("value does not match expected type: expected {expected}, got {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("missing required field `{0}`")]
    MissingField(Label),

    #[error("variant tag `{0}` is not a member of the expected variant")]
    UnknownVariantTag(Label),

    #[error("type `{0}` cannot be sent on the wire")]
    UnsupportedType(String),

    #[error("buffer too short while reading {context} at offset {offset}")]
    TruncatedBuffer { context: &'static str, offset: usize },

    #[error("leading bytes are not the DIDL magic")]
    BadMagic,

    #[error("invalid {context} tag {tag} at offset {offset}")]
    InvalidTag {
        context: &'static str,
        tag: i64,
        offset: usize,
    },

    #[error("type table index {index} out of range ({len} entries)")]
    TypeIndexOutOfRange { index: u64, len: usize },

    #[error("message declares {declared} argument(s) but {expected} were requested")]
    ArityMismatch { declared: usize, expected: usize },

    #[error("service has no method `{0}`")]
    UnknownMethod(String),

    #[error("integer does not fit in {0}")]
    IntOutOfRange(&'static str),

    #[error("nesting exceeds {limit} levels")]
    NestingTooDeep { limit: u32 },

    #[error("trailing bytes after last argument")]
    TrailingBytes,

    #[error("text value is not valid UTF-8")]
    InvalidUtf8,
}
