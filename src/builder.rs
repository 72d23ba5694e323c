//! Element builder: typed record -> namespace-resolved XML element.
//!
//! Each record is rebuilt in the field order the parser reads it, so that
//! `canonical(build(parse(e))) == canonical(e)` for every handled element.

use crate::config::{qualify, Config};
use crate::error::ElementError;
use crate::model::*;
use crate::xml::Element;

const LOCATOR: &str = "locator";
const RESOURCE: &str = "resource";
const ARC: &str = "arc";

pub struct Builder {
    config: Config,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn build(&self, record: &Record) -> Result<Element, ElementError> {
        match record {
            Record::Context(context) => Ok(self.build_context(context)),
            Record::Unit(unit) => Ok(self.build_unit(unit)),
            Record::SchemaRef(schema_ref) => Ok(self.build_schema_ref(schema_ref)),
            Record::LabelLink(link) => Ok(self.build_label_link(link)),
            Record::General(fact) => self.build_general(fact),
        }
    }

    fn build_context(&self, context: &Context) -> Element {
        let p = &self.config.prefixes;

        let identifier = Element::new(p.instance("identifier"))
            .with_attribute("scheme", context.identifier.scheme.as_str())
            .with_text(context.identifier.value.as_str());

        let mut period = Element::new(p.instance("period"));
        match &context.period {
            Period::Instant(date) => {
                period = period.with_child(Element::new(p.instance("instant")).with_text(date.as_str()));
            }
            Period::Duration(start, end) => {
                period = period
                    .with_child(Element::new(p.instance("startDate")).with_text(start.as_str()))
                    .with_child(Element::new(p.instance("endDate")).with_text(end.as_str()));
            }
        }

        Element::new(p.instance("context"))
            .with_attribute("id", context.id.as_str())
            .with_child(Element::new(p.instance("entity")).with_child(identifier))
            .with_child(period)
    }

    fn build_unit(&self, unit: &Unit) -> Element {
        let p = &self.config.prefixes;
        Element::new(p.instance("unit"))
            .with_attribute("id", unit.id.as_str())
            .with_child(Element::new(p.instance("measure")).with_text(unit.measure.as_str()))
    }

    fn build_schema_ref(&self, schema_ref: &SchemaRef) -> Element {
        let p = &self.config.prefixes;
        Element::new(p.link("schemaRef"))
            .with_attribute(p.xlink("type"), schema_ref.link_type.as_str())
            .with_attribute(p.xlink("href"), schema_ref.href.as_str())
    }

    fn build_label_link(&self, link: &LabelLink) -> Element {
        let p = &self.config.prefixes;
        let mut element = Element::new(p.link("labelLink"))
            .with_attribute(p.xlink("type"), link.link_type.as_str())
            .with_attribute(p.xlink("role"), link.role.as_str());

        for loc in &link.locs {
            let mut child = Element::new(p.link("loc"))
                .with_attribute(p.xlink("type"), LOCATOR)
                .with_attribute(p.xlink("href"), loc.href.as_str())
                .with_attribute(p.xlink("label"), loc.label.as_str());
            set_optional(&mut child, p.xlink("title"), &loc.title);
            element.children.push(child);
        }

        for label in &link.labels {
            let mut child = Element::new(p.link("label"))
                .with_attribute(p.xlink("type"), RESOURCE)
                .with_attribute(p.xlink("label"), label.label.as_str());
            set_optional(&mut child, p.xlink("role"), &label.role);
            set_optional(&mut child, p.xlink("title"), &label.title);
            set_optional(&mut child, p.xml("lang"), &label.language);
            set_optional(&mut child, "id".to_string(), &label.id);
            element.children.push(child.with_text(label.text.as_str()));
        }

        for arc in &link.label_arcs {
            let mut child = Element::new(p.link("labelArc"))
                .with_attribute(p.xlink("type"), ARC)
                .with_attribute(p.xlink("arcrole"), arc.arcrole.as_str())
                .with_attribute(p.xlink("from"), arc.from.as_str())
                .with_attribute(p.xlink("to"), arc.to.as_str());
            set_optional(&mut child, p.xlink("title"), &arc.title);
            element.children.push(child);
        }

        element
    }

    fn build_general(&self, fact: &Fact) -> Result<Element, ElementError> {
        if fact.namespace.is_empty() {
            return Err(ElementError::MalformedTag(fact.element_type.clone()));
        }

        let mut element = Element::new(qualify(&fact.namespace, &fact.element_type));
        for (name, value) in &fact.attributes {
            if RESERVED_FACT_KEYS.contains(&name.as_str()) {
                return Err(ElementError::AttributeCollision(name.clone()));
            }
            element.set_attribute(name.as_str(), value.as_str());
        }
        Ok(element.with_text(fact.text.as_str()))
    }
}

fn set_optional(element: &mut Element, name: String, value: &Option<String>) {
    if let Some(value) = value {
        element.set_attribute(name, value.as_str());
    }
}
