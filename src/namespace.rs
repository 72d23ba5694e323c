//! Namespace binding scopes.
//!
//! A [`Scope`] holds the URI <-> prefix bindings visible at one element. The
//! reader uses the prefix -> URI direction to expand raw names into
//! `{uri}local`; the fixup pass uses the URI -> prefix direction to turn them
//! back into stable `prefix:local` names.

use crate::error::ElementError;
use ahash::AHashMap;
use compact_str::CompactString;
use std::rc::Rc;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
pub const XML_PREFIX: &str = "xml";

/// A name split into namespace (URI or prefix) and local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub namespace: &'a str,
    pub local: &'a str,
}

impl<'a> QName<'a> {
    /// Split an expanded `{uri}local` name. `None` when the name carries no
    /// `{...}` part.
    pub fn from_expanded(name: &'a str) -> Option<Result<Self, ElementError>> {
        let rest = name.strip_prefix('{')?;
        Some(match rest.split_once('}') {
            Some((namespace, local)) => Ok(QName { namespace, local }),
            None => Err(ElementError::MalformedTag(name.to_string())),
        })
    }

    /// Split a raw or resolved `prefix:local` name; unprefixed names get an
    /// empty prefix.
    pub fn from_prefixed(name: &'a str) -> Self {
        match name.split_once(':') {
            Some((namespace, local)) => QName { namespace, local },
            None => QName {
                namespace: "",
                local: name,
            },
        }
    }
}

/// Prefix declared by a namespace declaration attribute (`xmlns` -> `""`,
/// `xmlns:p` -> `p`), or `None` for ordinary attributes.
pub fn declared_prefix(attribute: &str) -> Option<&str> {
    if attribute == "xmlns" {
        Some("")
    } else {
        attribute.strip_prefix("xmlns:")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    by_uri: AHashMap<CompactString, CompactString>,
    by_prefix: AHashMap<CompactString, CompactString>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::root()
    }
}

impl Scope {
    /// The document-level scope: only the implicit `xml` binding.
    pub fn root() -> Self {
        let mut scope = Scope {
            by_uri: AHashMap::new(),
            by_prefix: AHashMap::new(),
        };
        scope.bind(XML_PREFIX, XML_NAMESPACE);
        scope
    }

    /// Parent scope overlaid with an element's own declarations, given as
    /// `(prefix, uri)` pairs in attribute order. Later declarations win.
    pub fn with_declarations<'d, I>(&self, declarations: I) -> Scope
    where
        I: IntoIterator<Item = (&'d str, &'d str)>,
    {
        let mut scope = self.clone();
        for (prefix, uri) in declarations {
            scope.bind(prefix, uri);
        }
        scope
    }

    fn bind(&mut self, prefix: &str, uri: &str) {
        let previous = if uri.is_empty() {
            // xmlns="" undeclares the default namespace
            self.by_prefix.remove(prefix)
        } else {
            self.by_prefix
                .insert(CompactString::from(prefix), CompactString::from(uri))
        };

        if let Some(old_uri) = previous {
            if old_uri != uri && self.by_uri.get(&old_uri).map(|p| p.as_str()) == Some(prefix) {
                self.by_uri.remove(&old_uri);
                let fallback = self
                    .by_prefix
                    .iter()
                    .filter(|(_, u)| **u == old_uri)
                    .map(|(p, _)| p)
                    .min()
                    .cloned();
                if let Some(fallback) = fallback {
                    self.by_uri.insert(old_uri, fallback);
                }
            }
        }

        if !uri.is_empty() {
            self.by_uri
                .insert(CompactString::from(uri), CompactString::from(prefix));
        }
    }

    #[inline]
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.by_uri.get(uri).map(|p| p.as_str())
    }

    #[inline]
    pub fn uri_for(&self, prefix: &str) -> Option<&str> {
        self.by_prefix.get(prefix).map(|u| u.as_str())
    }

    /// Resolve an expanded `{uri}local` name to `prefix:local`. Names without
    /// a `{uri}` part (and `{}local`) come back as the bare local name.
    pub fn resolve(&self, name: &str) -> Result<String, ElementError> {
        let qname = match QName::from_expanded(name) {
            Some(qname) => qname?,
            None => return Ok(name.to_string()),
        };
        if qname.namespace.is_empty() {
            return Ok(qname.local.to_string());
        }
        match self.prefix_for(qname.namespace) {
            Some("") => Ok(qname.local.to_string()),
            Some(prefix) => Ok(format!("{}:{}", prefix, qname.local)),
            None => Err(ElementError::UnboundNamespace(qname.namespace.to_string())),
        }
    }

    /// Expand a raw element name. Unprefixed element names take the default
    /// namespace. `None` when the prefix is not declared.
    pub fn expand_element(&self, raw: &str) -> Option<String> {
        let qname = QName::from_prefixed(raw);
        self.expand(qname, true)
    }

    /// Expand a raw attribute name. Unprefixed attributes have no namespace.
    pub fn expand_attribute(&self, raw: &str) -> Option<String> {
        let qname = QName::from_prefixed(raw);
        self.expand(qname, false)
    }

    fn expand(&self, qname: QName<'_>, use_default: bool) -> Option<String> {
        if qname.namespace.is_empty() && !use_default {
            return Some(qname.local.to_string());
        }
        match self.uri_for(qname.namespace) {
            Some(uri) => Some(format!("{{{}}}{}", uri, qname.local)),
            None if qname.namespace.is_empty() => Some(qname.local.to_string()),
            None => None,
        }
    }

    /// Sorted binding content, used to identify equal scopes.
    fn fingerprint(&self) -> ScopeKey {
        let mut by_uri: Vec<_> = self
            .by_uri
            .iter()
            .map(|(u, p)| (u.clone(), p.clone()))
            .collect();
        let mut by_prefix: Vec<_> = self
            .by_prefix
            .iter()
            .map(|(p, u)| (p.clone(), u.clone()))
            .collect();
        by_uri.sort_unstable();
        by_prefix.sort_unstable();
        (by_uri, by_prefix)
    }
}

type ScopeKey = (
    Vec<(CompactString, CompactString)>,
    Vec<(CompactString, CompactString)>,
);

/// Identifier shared by every frame whose scope has identical bindings.
pub type ScopeId = u32;

struct Frame {
    scope: Rc<Scope>,
    id: ScopeId,
}

/// Scope stack for one depth-first traversal. Not shared across traversals
/// or threads.
pub struct ScopeStack {
    frames: Vec<Frame>,
    interned: AHashMap<ScopeKey, ScopeId>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        let root = Scope::root();
        let mut interned = AHashMap::new();
        interned.insert(root.fingerprint(), 0);
        Self {
            frames: vec![Frame {
                scope: Rc::new(root),
                id: 0,
            }],
            interned,
        }
    }

    #[inline]
    pub fn current(&self) -> &Scope {
        // The root frame is never popped
        &self.frames[self.frames.len() - 1].scope
    }

    #[inline]
    pub fn current_id(&self) -> ScopeId {
        self.frames[self.frames.len() - 1].id
    }

    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Enter an element with the given `(prefix, uri)` declarations.
    pub fn push<'d, I>(&mut self, declarations: I)
    where
        I: IntoIterator<Item = (&'d str, &'d str)>,
    {
        let mut declarations = declarations.into_iter().peekable();
        let top = &self.frames[self.frames.len() - 1];
        if declarations.peek().is_none() {
            let frame = Frame {
                scope: Rc::clone(&top.scope),
                id: top.id,
            };
            self.frames.push(frame);
            return;
        }

        let scope = top.scope.with_declarations(declarations);
        let next_id = self.interned.len() as ScopeId;
        let id = *self.interned.entry(scope.fingerprint()).or_insert(next_id);
        self.frames.push(Frame {
            scope: Rc::new(scope),
            id,
        });
    }

    /// Leave the current element. The document-level frame stays.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTANCE: &str = "http://www.xbrl.org/2003/instance";
    const GAAP: &str = "http://xbrl.us/us-gaap/2009-01-31";

    #[test]
    fn test_resolve_bound_and_unbound() {
        let scope = Scope::root().with_declarations([("xbrli", INSTANCE), ("us-gaap", GAAP)]);
        assert_eq!(
            scope.resolve(&format!("{{{}}}context", INSTANCE)).unwrap(),
            "xbrli:context"
        );
        assert_eq!(scope.resolve("contextRef").unwrap(), "contextRef");
        assert_eq!(scope.resolve("{}plain").unwrap(), "plain");
        assert_eq!(
            scope.resolve(&format!("{{{}}}lang", XML_NAMESPACE)).unwrap(),
            "xml:lang"
        );
        assert_eq!(
            scope.resolve("{urn:nowhere}x"),
            Err(ElementError::UnboundNamespace("urn:nowhere".into()))
        );
        assert!(matches!(
            scope.resolve("{broken"),
            Err(ElementError::MalformedTag(_))
        ));
    }

    #[test]
    fn test_default_namespace_resolves_to_local_name() {
        let scope = Scope::root().with_declarations([("", INSTANCE)]);
        assert_eq!(scope.resolve(&format!("{{{}}}unit", INSTANCE)).unwrap(), "unit");
        assert_eq!(
            scope.expand_element("unit").unwrap(),
            format!("{{{}}}unit", INSTANCE)
        );
        assert_eq!(scope.expand_attribute("id").unwrap(), "id");
    }

    #[test]
    fn test_local_declaration_overrides_parent() {
        let parent = Scope::root().with_declarations([("a", "urn:one")]);
        let child = parent.with_declarations([("b", "urn:one")]);
        assert_eq!(child.resolve("{urn:one}x").unwrap(), "b:x");
        assert_eq!(parent.resolve("{urn:one}x").unwrap(), "a:x");

        // rebinding a prefix drops the stale URI -> prefix entry
        let rebound = parent.with_declarations([("a", "urn:two")]);
        assert_eq!(rebound.resolve("{urn:two}x").unwrap(), "a:x");
        assert!(rebound.resolve("{urn:one}x").is_err());
    }

    #[test]
    fn test_undeclared_prefix_does_not_expand() {
        let scope = Scope::root();
        assert_eq!(scope.expand_element("foo:bar"), None);
        assert_eq!(
            scope.expand_attribute("xml:lang").unwrap(),
            format!("{{{}}}lang", XML_NAMESPACE)
        );
    }

    #[test]
    fn test_stack_restores_parent_scope() {
        let mut stack = ScopeStack::new();
        stack.push([("x", "urn:one")]);
        let before = stack.current().clone();
        let before_id = stack.current_id();

        stack.push([("x", "urn:two")]);
        assert_eq!(stack.current().uri_for("x"), Some("urn:two"));
        stack.pop();

        assert_eq!(stack.current(), &before);
        assert_eq!(stack.current_id(), before_id);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_equal_scopes_share_an_id() {
        let mut stack = ScopeStack::new();
        stack.push([("x", "urn:one")]);
        let first = stack.current_id();
        stack.pop();
        stack.push([("y", "urn:two")]);
        let second = stack.current_id();
        stack.pop();
        stack.push([("x", "urn:one")]);
        assert_eq!(stack.current_id(), first);
        assert_ne!(first, second);

        stack.pop();
        stack.pop();
        assert_eq!(stack.depth(), 0);
    }
}
