//! xbrl-roundtrip - XBRL namespace canonicalization and lossless parse/build
//!
//! Licensed under AGPL-3.0

pub mod builder;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fixup;
pub mod model;
pub mod namespace;
pub mod parser;
pub mod source;
pub mod verifier;
pub mod xml;

// Re-export main types
pub use builder::Builder;
pub use config::{Config, Prefixes};
pub use error::{ElementError, Severity};
pub use fixup::fixup;
pub use model::{Context, Fact, Identifier, LabelLink, Period, Record, SchemaRef, Unit};
pub use parser::{ParsedDocument, Parser};
pub use source::{Documents, Loaded};
pub use verifier::{Diagnostic, Report, Summary, Verifier};
pub use xml::Element;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error(transparent)]
    Element(#[from] ElementError),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// True when the error signals an engine defect rather than bad input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Element(e) if e.is_fatal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_engine_defects_are_fatal() {
        let err: Error =
            ElementError::Implementation("context handler returned a unit record".into()).into();
        assert!(err.is_fatal());

        let err: Error = ElementError::MalformedPeriod(3).into();
        assert!(!err.is_fatal());
        assert!(!Error::Xml("unclosed element <a>".into()).is_fatal());
    }
}
