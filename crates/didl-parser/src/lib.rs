//! Parser for Candid interface descriptions.
//!
//! Turns `.did` source into a [`didl_core::TypeGraph`]: lexing and parsing
//! build a concrete syntax tree, resolution ties named references to arena
//! slots and normalizes the service declaration into method signatures.
//!
//! ```
//! let graph = didl_parser::parse_interface(r#"
//!     type Name = text;
//!     service : { greet : (Name) -> (text) query; }
//! "#).unwrap();
//! assert!(graph.method("greet").unwrap().is_query);
//! ```

pub mod cst;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod resolver;

use didl_core::TypeGraph;

pub use diagnostics::{DiagnosticKind, DiagnosticMessage, Diagnostics, Severity};
pub use parser::{parse, ParseResult};
pub use resolver::{resolve, ResolveResult};

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("interface has syntax errors ({} error(s))", .0.error_count())]
    Parse(Diagnostics),
    #[error("interface has resolution errors ({} error(s))", .0.error_count())]
    Resolve(Diagnostics),
}

impl Error {
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            Error::Parse(diags) | Error::Resolve(diags) => diags,
        }
    }

    /// Render the diagnostics against the source they were produced from.
    pub fn render(&self, source: &str) -> String {
        self.diagnostics().render(source)
    }
}

/// Parse and resolve an interface description in one call.
///
/// Warnings are tolerated; any error-severity diagnostic fails the whole
/// source, with parse errors taking precedence over resolution errors.
pub fn parse_interface(source: &str) -> Result<TypeGraph, Error> {
    let parsed = parse(source);
    if parsed.diagnostics.has_errors() {
        return Err(Error::Parse(parsed.diagnostics));
    }
    let resolved = resolve(&parsed.program);
    if resolved.diagnostics.has_errors() {
        return Err(Error::Resolve(resolved.diagnostics));
    }
    Ok(resolved.graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn parse_interface_end_to_end() {
        let graph = parse_interface(indoc! {"
            type Profile = record { name : text; age : nat8 };
            service : {
              get_profile : (principal) -> (opt Profile) query;
            }
        "})
        .unwrap();
        assert!(graph.def("Profile").is_some());
        assert!(graph.method("get_profile").unwrap().is_query);
    }

    #[test]
    fn syntax_errors_take_precedence() {
        let err = parse_interface("type = Unknown;").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.diagnostics().has_errors());
    }

    #[test]
    fn resolution_errors_surface_with_name() {
        let err = parse_interface("type A = vec Missing;").unwrap_err();
        let Error::Resolve(diags) = err else {
            panic!("expected resolve error");
        };
        assert!(diags.messages()[0].message().contains("`Missing`"));
    }

    #[test]
    fn error_renders_against_source() {
        let source = "type A = vec Missing;";
        let err = parse_interface(source).unwrap_err();
        let rendered = err.render(source);
        assert!(rendered.contains("Missing"));
    }
}
