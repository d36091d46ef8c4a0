//! Lexer for Candid interface-description text.
//!
//! Produces span-based tokens without storing text - text is sliced from
//! source only when needed.
//!
//! ## Error handling
//!
//! Consecutive unrecognized characters coalesce into single `Garbage` tokens
//! rather than one error per character, keeping the stream manageable for
//! malformed input. The parser reports each `Garbage` token once and keeps
//! going, so one pass surfaces every independent lexical problem.

use logos::Logos;
use rowan::TextRange;
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    #[token("{")]
    BraceOpen,

    #[token("}")]
    BraceClose,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token("=")]
    Equals,

    #[token("->")]
    Arrow,

    #[token("type")]
    TypeKw,

    #[token("import")]
    ImportKw,

    #[token("service")]
    ServiceKw,

    #[token("opt")]
    OptKw,

    #[token("vec")]
    VecKw,

    #[token("record")]
    RecordKw,

    #[token("variant")]
    VariantKw,

    #[token("func")]
    FuncKw,

    #[token("blob")]
    BlobKw,

    #[token("principal")]
    PrincipalKw,

    #[token("query")]
    QueryKw,

    #[token("oneway")]
    OnewayKw,

    /// Identifier; primitive type names (`nat`, `text`, ...) lex as plain
    /// identifiers and are classified by the parser.
    #[regex("[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// Natural number literal, decimal or hex, `_` separators allowed.
    #[regex("[0-9][0-9_]*")]
    #[regex("0x[0-9a-fA-F][0-9a-fA-F_]*")]
    Number,

    /// Float literal. Recognized so the lexer never stalls on one; the
    /// grammar has no position that accepts it, so the parser reports it.
    #[regex(r"[0-9][0-9_]*\.[0-9_]*(?:[eE][+-]?[0-9_]+)?")]
    FloatNumber,

    /// String literal with escapes; used for quoted field names and import
    /// paths.
    #[regex(r#""(?:[^"\\]|\\.)*""#)]
    Text,

    /// Synthesized for spans of unrecognized characters. The comment rules
    /// hang off this variant; the skip callback drops them before they
    /// surface, so the lexer itself never yields `Garbage`.
    #[regex(r"//[^\n]*", logos::skip, allow_greedy = true)]
    #[regex(r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/", logos::skip, allow_greedy = true)]
    Garbage,
}

/// Zero-copy token: kind + span, text retrieved via [`token_text`] when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: TextRange,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: TextRange) -> Self {
        Self { kind, span }
    }
}

fn range_to_text_range(range: Range<usize>) -> TextRange {
    TextRange::new((range.start as u32).into(), (range.end as u32).into())
}

/// Tokenizes source into a vector of span-based tokens.
///
/// Post-processes the Logos output to coalesce consecutive lexer errors into
/// single `Garbage` tokens.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut error_span: Option<Range<usize>> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                // Flush accumulated error span before emitting valid token
                if let Some(span) = error_span.take() {
                    tokens.push(Token::new(TokenKind::Garbage, range_to_text_range(span)));
                }

                let span = lexer.span();
                tokens.push(Token::new(kind, range_to_text_range(span)));
            }
            Some(Err(())) => {
                // Grow the span to the error's own end, not the next valid
                // token's start, so skipped trivia after the bad characters
                // stays out of the garbage token.
                let span = lexer.span();
                match &mut error_span {
                    Some(acc) => acc.end = span.end,
                    None => error_span = Some(span),
                }
            }
            None => {
                if let Some(span) = error_span.take() {
                    tokens.push(Token::new(TokenKind::Garbage, range_to_text_range(span)));
                }
                break;
            }
        }
    }

    tokens
}

/// Retrieves the text slice for a token. O(1) slice into source.
#[inline]
pub fn token_text<'src>(source: &'src str, token: &Token) -> &'src str {
    &source[std::ops::Range::<usize>::from(token.span)]
}

/// Decodes the escapes of a string literal token (quotes included).
///
/// Supported escapes: `\n`, `\r`, `\t`, `\\`, `\"`, `\'`, `\u{…}`, and
/// two-digit hex `\xx`. Returns `Err` with a description on malformed input.
pub fn unescape_text(literal: &str) -> Result<String, String> {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| "string literal missing quotes".to_owned())?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('u') => {
                if chars.next() != Some('{') {
                    return Err("expected `{` after `\\u`".to_owned());
                }
                let mut hex = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(h) if h.is_ascii_hexdigit() => hex.push(h),
                        _ => return Err("unterminated `\\u{...}` escape".to_owned()),
                    }
                }
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| format!("invalid unicode escape `\\u{{{hex}}}`"))?;
                out.push(
                    char::from_u32(code)
                        .ok_or_else(|| format!("invalid unicode scalar U+{code:X}"))?,
                );
            }
            Some(h1) if h1.is_ascii_hexdigit() => {
                let h2 = chars
                    .next()
                    .filter(|c| c.is_ascii_hexdigit())
                    .ok_or_else(|| "truncated hex escape".to_owned())?;
                let byte = u8::from_str_radix(&format!("{h1}{h2}"), 16)
                    .expect("two hex digits always parse");
                out.push(byte as char);
            }
            other => return Err(format!("unknown escape `\\{}`", other.unwrap_or(' '))),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_a_type_definition() {
        assert_eq!(
            kinds("type List = opt record { head : nat; tail : List };"),
            vec![
                TokenKind::TypeKw,
                TokenKind::Ident,
                TokenKind::Equals,
                TokenKind::OptKw,
                TokenKind::RecordKw,
                TokenKind::BraceOpen,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::BraceClose,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("// line\ntype /* block ** with stars */ T = nat;"),
            vec![
                TokenKind::TypeKw,
                TokenKind::Ident,
                TokenKind::Equals,
                TokenKind::Ident,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn garbage_coalesces() {
        let tokens = lex("type @@@ T");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::TypeKw, TokenKind::Garbage, TokenKind::Ident]
        );
        let garbage = tokens[1];
        assert_eq!(u32::from(garbage.span.start()), 5);
        assert_eq!(u32::from(garbage.span.end()), 8);
    }

    #[test]
    fn garbage_span_excludes_trailing_trivia() {
        let tokens = lex("type @@ // note\nT");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::TypeKw, TokenKind::Garbage, TokenKind::Ident]
        );
        let garbage = tokens[1];
        assert_eq!(u32::from(garbage.span.start()), 5);
        assert_eq!(u32::from(garbage.span.end()), 7);
    }

    #[test]
    fn arrow_and_punctuation() {
        assert_eq!(
            kinds("(text) -> (text) query"),
            vec![
                TokenKind::ParenOpen,
                TokenKind::Ident,
                TokenKind::ParenClose,
                TokenKind::Arrow,
                TokenKind::ParenOpen,
                TokenKind::Ident,
                TokenKind::ParenClose,
                TokenKind::QueryKw,
            ]
        );
    }

    #[test]
    fn number_forms() {
        assert_eq!(
            kinds("5 1_000 0xff 1.5"),
            vec![
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::FloatNumber,
            ]
        );
    }

    #[test]
    fn unescape_handles_common_escapes() {
        assert_eq!(unescape_text(r#""a\nb""#).unwrap(), "a\nb");
        assert_eq!(unescape_text(r#""\u{1F4A9}""#).unwrap(), "\u{1F4A9}");
        assert_eq!(unescape_text(r#""\41""#).unwrap(), "A");
        assert!(unescape_text(r#""\q""#).is_err());
    }
}
