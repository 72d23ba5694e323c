// Per-element outcomes of fixup, dispatch, parsing and building
use thiserror::Error;

/// How a caller must react to an [`ElementError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The element is outside the handled set; move on silently.
    Skip,
    /// The input is malformed; surface it and continue with the next element.
    Report,
    /// The engine broke its own contract; abort the run.
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    #[error("no handler for element type '{0}'")]
    NoHandler(String),

    #[error("namespace '{0}' is not an understood fact namespace")]
    DisallowedNamespace(String),

    #[error("tag '{0}' has no namespace prefix")]
    MalformedTag(String),

    #[error("namespace '{0}' is not bound in the active scope")]
    UnboundNamespace(String),

    #[error("period must have one or two children, found {0}")]
    MalformedPeriod(usize),

    #[error("unknown labelLink child '{0}'")]
    UnknownLinkChild(String),

    #[error("attribute '{0}' collides with a reserved record field")]
    AttributeCollision(String),

    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    #[error("<{element}> is missing child <{child}>")]
    MissingChild { element: String, child: String },

    #[error("<{element}> must have exactly {expected} child element(s), found {found}")]
    ChildCount {
        element: String,
        expected: usize,
        found: usize,
    },

    #[error("implementation error: {0}")]
    Implementation(String),
}

impl ElementError {
    pub fn severity(&self) -> Severity {
        match self {
            ElementError::NoHandler(_) | ElementError::DisallowedNamespace(_) => Severity::Skip,
            ElementError::Implementation(_) => Severity::Fatal,
            ElementError::MalformedTag(_)
            | ElementError::UnboundNamespace(_)
            | ElementError::MalformedPeriod(_)
            | ElementError::UnknownLinkChild(_)
            | ElementError::AttributeCollision(_)
            | ElementError::MissingAttribute { .. }
            | ElementError::MissingChild { .. }
            | ElementError::ChildCount { .. } => Severity::Report,
        }
    }

    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    pub(crate) fn missing_attribute(element: &str, attribute: &str) -> Self {
        ElementError::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub(crate) fn missing_child(element: &str, child: &str) -> Self {
        ElementError::MissingChild {
            element: element.to_string(),
            child: child.to_string(),
        }
    }
}
