//! Element tree, streaming reader and serializer built on quick-xml.
//!
//! The reader produces trees with expanded `{uri}local` element and attribute
//! names. Namespace declarations stay on their element as raw `xmlns` /
//! `xmlns:p` attributes so later passes can see local overrides.

use crate::namespace::{declared_prefix, ScopeStack};
use crate::{Error, Result};
use ahash::AHashMap;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fmt::Write as _;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    /// Attribute name/value pairs in document order; names are unique.
    pub attributes: Vec<(String, String)>,
    /// Character data before the first child element.
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text = if text.is_empty() { None } else { Some(text) };
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Set an attribute, replacing an existing value of the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text content, empty when absent.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// `(prefix, uri)` pairs of the namespace declarations on this element.
    pub fn declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .filter_map(|(n, v)| declared_prefix(n).map(|p| (p, v.as_str())))
    }

    /// This element and all its descendants in pre-order, each with a locator
    /// path such as `/xbrli:xbrl/xbrli:context[2]` (1-based among siblings
    /// sharing the tag).
    pub fn locate(&self) -> Vec<(String, &Element)> {
        let mut out = Vec::new();
        locate_into(self, format!("/{}", self.tag), &mut out);
        out
    }
}

fn locate_into<'e>(element: &'e Element, path: String, out: &mut Vec<(String, &'e Element)>) {
    let mut seen: AHashMap<&str, usize> = AHashMap::new();
    out.push((path.clone(), element));
    for child in &element.children {
        let n = seen.entry(child.tag.as_str()).or_insert(0);
        *n += 1;
        locate_into(child, format!("{}/{}[{}]", path, child.tag, n), out);
    }
}

/// Parse a document into an expanded-name tree.
pub fn parse_bytes(data: &[u8]) -> Result<Element> {
    // Skip BOM if present
    let data = if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    };
    TreeReader::new(data).read()
}

struct TreeReader<'a> {
    reader: Reader<&'a [u8]>,
    scopes: ScopeStack,
    stack: Vec<Element>,
    root: Option<Element>,
}

impl<'a> TreeReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            reader: Reader::from_reader(data),
            scopes: ScopeStack::new(),
            stack: Vec::new(),
            root: None,
        }
    }

    fn read(mut self) -> Result<Element> {
        loop {
            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    let element = self.open(&e)?;
                    self.stack.push(element);
                }
                Ok(Event::Empty(e)) => {
                    let element = self.open(&e)?;
                    self.scopes.pop();
                    self.attach(element)?;
                }
                Ok(Event::End(_)) => {
                    let mut element = self
                        .stack
                        .pop()
                        .ok_or_else(|| Error::Xml("unexpected closing tag".to_string()))?;
                    self.scopes.pop();
                    if !element.children.is_empty()
                        && element.text.as_deref().is_some_and(|t| t.trim().is_empty())
                    {
                        element.text = None;
                    }
                    self.attach(element)?;
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|err| {
                        Error::Xml(format!("invalid text content: {}", err))
                    })?;
                    self.push_text(&text);
                }
                Ok(Event::CData(e)) => {
                    let raw = e.into_inner();
                    let text = decode(&raw)?;
                    self.push_text(&text);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {
                    // Declarations, comments, processing instructions, DOCTYPE
                }
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "{} at byte {}",
                        e,
                        self.reader.buffer_position()
                    )));
                }
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(Error::Xml(format!("unclosed element <{}>", open.tag)));
        }
        self.root
            .ok_or_else(|| Error::Xml("document has no root element".to_string()))
    }

    /// Build the element for a start tag and enter its namespace scope.
    fn open(&mut self, start: &BytesStart<'_>) -> Result<Element> {
        let raw_tag = decode(start.name().as_ref())?;

        let mut raw_attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::Xml(format!("in <{}>: {}", raw_tag, e)))?;
            let name = decode(attr.key.as_ref())?;
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("in <{}>: {}", raw_tag, e)))?
                .into_owned();
            raw_attributes.push((name, value));
        }

        self.scopes.push(
            raw_attributes
                .iter()
                .filter_map(|(n, v)| declared_prefix(n).map(|p| (p, v.as_str()))),
        );
        let scope = self.scopes.current();

        let tag = scope
            .expand_element(&raw_tag)
            .ok_or_else(|| Error::Xml(format!("unbound prefix in element <{}>", raw_tag)))?;

        let mut attributes = Vec::with_capacity(raw_attributes.len());
        for (name, value) in raw_attributes {
            let name = if declared_prefix(&name).is_some() {
                name
            } else {
                scope.expand_attribute(&name).ok_or_else(|| {
                    Error::Xml(format!("unbound prefix in attribute {} of <{}>", name, raw_tag))
                })?
            };
            attributes.push((name, value));
        }

        Ok(Element {
            tag,
            attributes,
            text: None,
            children: Vec::new(),
        })
    }

    fn push_text(&mut self, text: &str) {
        if let Some(node) = self.stack.last_mut() {
            // Tail text after a child is not modelled
            if node.children.is_empty() {
                node.text.get_or_insert_with(String::new).push_str(text);
            }
        }
    }

    fn attach(&mut self, element: Element) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None if self.root.is_some() => {
                return Err(Error::Xml(format!(
                    "multiple root elements (second is <{}>)",
                    element.tag
                )));
            }
            None => self.root = Some(element),
        }
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| Error::Xml("invalid UTF-8 in document".to_string()))
}

/// Serialize a tree as indented XML. Attributes are written in name order.
pub fn to_string(element: &Element) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_element(&mut writer, element)?;
    String::from_utf8(writer.into_inner())
        .map_err(|_| Error::Xml("serializer produced invalid UTF-8".to_string()))
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.tag.as_str());
    let mut attributes: Vec<_> = element.attributes.iter().collect();
    attributes.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, value) in attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    // Whitespace-only text is formatting, never content
    let text = element.text.as_deref().filter(|t| !t.trim().is_empty());
    if text.is_none() && element.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    if let Some(text) = text {
        emit(writer, Event::Text(BytesText::new(text)))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    emit(writer, Event::End(BytesEnd::new(element.tag.as_str())))
}

fn emit<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Xml(format!("serialization failed: {}", e)))
}

/// Whitespace-insensitive serialization: every line stripped, then joined.
pub fn canonical(element: &Element) -> Result<String> {
    Ok(to_string(element)?.lines().map(str::trim).collect())
}

/// Indented outline of the tag hierarchy.
pub fn render_tree(element: &Element) -> String {
    let mut out = String::new();
    out.push_str(&element.tag);
    out.push('\n');
    render_children(element, 0, &mut out);
    out
}

fn render_children(element: &Element, indent: usize, out: &mut String) {
    for child in &element.children {
        let _ = writeln!(out, " {}|-{}", "|  ".repeat(indent), child.tag);
        if !child.children.is_empty() {
            render_children(child, indent + 1, out);
        }
    }
}
