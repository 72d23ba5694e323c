//! Tag dispatch: resolved tag -> handler kind.

use crate::error::ElementError;
use crate::namespace::QName;

/// Element types with a handler. `General` is the fallback for leaf facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Context,
    Unit,
    SchemaRef,
    LabelLink,
    General,
}

impl ElementKind {
    /// Structural handler registered for a local name.
    pub fn from_local(local: &str) -> Option<Self> {
        match local {
            "context" => Some(ElementKind::Context),
            "unit" => Some(ElementKind::Unit),
            "schemaRef" => Some(ElementKind::SchemaRef),
            "labelLink" => Some(ElementKind::LabelLink),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Context => "context",
            ElementKind::Unit => "unit",
            ElementKind::SchemaRef => "schemaRef",
            ElementKind::LabelLink => "labelLink",
            ElementKind::General => "general",
        }
    }
}

/// `(prefix, local)` of a resolved tag; unprefixed tags get `""`.
#[inline]
pub fn split(tag: &str) -> (&str, &str) {
    let qname = QName::from_prefixed(tag);
    (qname.namespace, qname.local)
}

/// Like [`split`], for call sites that need a namespace prefix.
pub fn split_prefixed(tag: &str) -> Result<(&str, &str), ElementError> {
    match split(tag) {
        ("", _) => Err(ElementError::MalformedTag(tag.to_string())),
        parts => Ok(parts),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route<'a> {
    pub kind: ElementKind,
    pub prefix: &'a str,
    pub local: &'a str,
}

/// Pick the handler for a resolved tag.
///
/// Unknown local types fall through to [`ElementKind::General`], which needs
/// a namespace prefix; an unknown unprefixed tag has no handler at all.
pub fn route(tag: &str) -> Result<Route<'_>, ElementError> {
    let (prefix, local) = split(tag);
    if let Some(kind) = ElementKind::from_local(local) {
        return Ok(Route {
            kind,
            prefix,
            local,
        });
    }

    match split_prefixed(tag) {
        Ok((prefix, local)) => Ok(Route {
            kind: ElementKind::General,
            prefix,
            local,
        }),
        Err(_) => Err(ElementError::NoHandler(local.to_string())),
    }
}
