use crate::dispatch::ElementKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Typed records, one variant per handled XML shape
// ============================================================================

/// Record keys of a [`Fact`] that element attributes may not use.
pub const RESERVED_FACT_KEYS: &[&str] = &["type", "element_type", "namespace", "text"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Record {
    #[serde(rename = "context")]
    Context(Context),
    #[serde(rename = "unit")]
    Unit(Unit),
    #[serde(rename = "schemaRef")]
    SchemaRef(SchemaRef),
    #[serde(rename = "labelLink")]
    LabelLink(LabelLink),
    #[serde(rename = "general")]
    General(Fact),
}

impl Record {
    pub fn kind(&self) -> ElementKind {
        match self {
            Record::Context(_) => ElementKind::Context,
            Record::Unit(_) => ElementKind::Unit,
            Record::SchemaRef(_) => ElementKind::SchemaRef,
            Record::LabelLink(_) => ElementKind::LabelLink,
            Record::General(_) => ElementKind::General,
        }
    }

    pub fn as_context(&self) -> Option<&Context> {
        match self {
            Record::Context(context) => Some(context),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    pub identifier: Identifier,
    pub period: Period,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub scheme: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Period {
    Instant(String),
    /// Start date, end date.
    Duration(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub measure: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRef {
    pub link_type: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelLink {
    pub role: String,
    #[serde(rename = "labelLink_type")]
    pub link_type: String,
    pub locs: Vec<Loc>,
    pub labels: Vec<Label>,
    #[serde(rename = "labelArcs")]
    pub label_arcs: Vec<LabelArc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loc {
    pub href: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelArc {
    pub arcrole: String,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Leaf fact element, e.g. `us-gaap:Cash`. Every element attribute is kept
/// under its resolved name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub element_type: String,
    pub namespace: String,
    pub text: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}
