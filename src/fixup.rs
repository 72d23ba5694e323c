//! Namespace fixup pass.
//!
//! Rewrites a reader tree from expanded `{uri}local` names to `prefix:local`
//! names. The pass takes the tree by value and owns it exclusively for the
//! whole walk. Namespace declaration attributes are carried over untouched.

use crate::error::ElementError;
use crate::namespace::{declared_prefix, ScopeId, ScopeStack};
use crate::xml::Element;
use ahash::AHashMap;

/// Resolve every tag and attribute name in `root`.
///
/// Fails with [`ElementError::UnboundNamespace`] when a name refers to a URI
/// that no enclosing element declares.
pub fn fixup(root: Element) -> Result<Element, ElementError> {
    Fixup::new().element(root)
}

struct Fixup {
    scopes: ScopeStack,
    // Keyed by scope identity so overridden bindings never share entries
    memo: AHashMap<ScopeId, AHashMap<String, String>>,
}

impl Fixup {
    fn new() -> Self {
        Self {
            scopes: ScopeStack::new(),
            memo: AHashMap::new(),
        }
    }

    fn element(&mut self, element: Element) -> Result<Element, ElementError> {
        self.scopes.push(element.declarations());
        let result = self.rewrite(element);
        self.scopes.pop();
        result
    }

    fn rewrite(&mut self, element: Element) -> Result<Element, ElementError> {
        let Element {
            tag,
            attributes,
            text,
            children,
        } = element;

        let tag = self.resolve(&tag)?;

        let mut resolved = Vec::with_capacity(attributes.len());
        for (name, value) in attributes {
            let name = if declared_prefix(&name).is_some() {
                name
            } else {
                self.resolve(&name)?
            };
            resolved.push((name, value));
        }

        let children = children
            .into_iter()
            .map(|child| self.element(child))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Element {
            tag,
            attributes: resolved,
            text,
            children,
        })
    }

    fn resolve(&mut self, name: &str) -> Result<String, ElementError> {
        if !name.starts_with('{') {
            return Ok(name.to_string());
        }

        let id = self.scopes.current_id();
        if let Some(hit) = self.memo.get(&id).and_then(|names| names.get(name)) {
            return Ok(hit.clone());
        }

        let resolved = self.scopes.current().resolve(name)?;
        self.memo
            .entry(id)
            .or_default()
            .insert(name.to_string(), resolved.clone());
        Ok(resolved)
    }
}
