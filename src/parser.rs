//! Element parser: namespace-resolved XML element -> typed record.

use crate::config::Config;
use crate::dispatch::{self, ElementKind};
use crate::error::{ElementError, Severity};
use crate::model::*;
use crate::xml::Element;
use std::collections::BTreeMap;

pub struct Parser {
    config: Config,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything parsed out of one document.
#[derive(Debug, Default)]
pub struct ParsedDocument {
    pub records: Vec<Record>,
    /// Skipped elements, by locator path.
    pub skipped: Vec<(String, ElementError)>,
    /// Malformed elements, by locator path.
    pub failures: Vec<(String, ElementError)>,
}

impl ParsedDocument {
    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.records.iter().filter_map(Record::as_context)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkChild {
    Loc,
    Label,
    LabelArc,
}

impl LinkChild {
    fn from_local(local: &str) -> Option<Self> {
        match local {
            "loc" => Some(LinkChild::Loc),
            "label" => Some(LinkChild::Label),
            "labelArc" => Some(LinkChild::LabelArc),
            _ => None,
        }
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse one element.
    pub fn parse(&self, element: &Element) -> Result<Record, ElementError> {
        let route = dispatch::route(&element.tag)?;
        let record = match route.kind {
            ElementKind::Context => self.parse_context(element)?,
            ElementKind::Unit => self.parse_unit(element)?,
            ElementKind::SchemaRef => self.parse_schema_ref(element)?,
            ElementKind::LabelLink => self.parse_label_link(element)?,
            ElementKind::General => self.parse_general(element, route.prefix, route.local)?,
        };

        if record.kind() != route.kind {
            return Err(ElementError::Implementation(format!(
                "{} handler returned a {} record",
                route.kind.as_str(),
                record.kind().as_str()
            )));
        }
        Ok(record)
    }

    /// Parse every element of a document tree in document order.
    ///
    /// Skip and report outcomes are collected; only a fatal error aborts.
    pub fn parse_document(&self, root: &Element) -> Result<ParsedDocument, ElementError> {
        let mut parsed = ParsedDocument::default();
        for (path, element) in root.locate() {
            match self.parse(element) {
                Ok(record) => parsed.records.push(record),
                Err(err) => match err.severity() {
                    Severity::Skip => parsed.skipped.push((path, err)),
                    Severity::Report => parsed.failures.push((path, err)),
                    Severity::Fatal => return Err(err),
                },
            }
        }
        Ok(parsed)
    }

    fn parse_context(&self, element: &Element) -> Result<Record, ElementError> {
        let id = required_attribute(element, "id")?;

        let entity = child(element, "entity")?;
        let identifier = sole_child(entity)?;
        let scheme = required_attribute(identifier, "scheme")?;

        let period = child(element, "period")?;
        let period = match period.children.as_slice() {
            [instant] => Period::Instant(instant.text().to_string()),
            [start, end] => Period::Duration(start.text().to_string(), end.text().to_string()),
            other => return Err(ElementError::MalformedPeriod(other.len())),
        };

        Ok(Record::Context(Context {
            id: id.to_string(),
            identifier: Identifier {
                scheme: scheme.to_string(),
                value: identifier.text().to_string(),
            },
            period,
        }))
    }

    fn parse_unit(&self, element: &Element) -> Result<Record, ElementError> {
        let id = required_attribute(element, "id")?;
        let measure = sole_child(element)?;
        if dispatch::split(&measure.tag).1 != "measure" {
            return Err(ElementError::missing_child(&element.tag, "measure"));
        }

        Ok(Record::Unit(Unit {
            id: id.to_string(),
            measure: measure.text().to_string(),
        }))
    }

    fn parse_schema_ref(&self, element: &Element) -> Result<Record, ElementError> {
        let p = &self.config.prefixes;
        Ok(Record::SchemaRef(SchemaRef {
            link_type: required_attribute(element, &p.xlink("type"))?.to_string(),
            href: required_attribute(element, &p.xlink("href"))?.to_string(),
        }))
    }

    fn parse_label_link(&self, element: &Element) -> Result<Record, ElementError> {
        let prefixes = &self.config.prefixes;
        let mut link = LabelLink {
            role: required_attribute(element, &prefixes.xlink("role"))?.to_string(),
            link_type: required_attribute(element, &prefixes.xlink("type"))?.to_string(),
            locs: Vec::new(),
            labels: Vec::new(),
            label_arcs: Vec::new(),
        };

        for child in &element.children {
            let (_, local) = dispatch::split(&child.tag);
            match LinkChild::from_local(local) {
                Some(LinkChild::Loc) => link.locs.push(self.parse_loc(child)?),
                Some(LinkChild::Label) => link.labels.push(self.parse_label(child)?),
                Some(LinkChild::LabelArc) => link.label_arcs.push(self.parse_label_arc(child)?),
                None => return Err(ElementError::UnknownLinkChild(child.tag.clone())),
            }
        }

        Ok(Record::LabelLink(link))
    }

    fn parse_loc(&self, element: &Element) -> Result<Loc, ElementError> {
        let p = &self.config.prefixes;
        Ok(Loc {
            href: required_attribute(element, &p.xlink("href"))?.to_string(),
            label: required_attribute(element, &p.xlink("label"))?.to_string(),
            title: optional_attribute(element, &p.xlink("title")),
        })
    }

    fn parse_label(&self, element: &Element) -> Result<Label, ElementError> {
        let p = &self.config.prefixes;
        Ok(Label {
            label: required_attribute(element, &p.xlink("label"))?.to_string(),
            role: optional_attribute(element, &p.xlink("role")),
            title: optional_attribute(element, &p.xlink("title")),
            language: optional_attribute(element, &p.xml("lang")),
            id: optional_attribute(element, "id"),
            text: element.text().to_string(),
        })
    }

    fn parse_label_arc(&self, element: &Element) -> Result<LabelArc, ElementError> {
        let p = &self.config.prefixes;
        Ok(LabelArc {
            arcrole: required_attribute(element, &p.xlink("arcrole"))?.to_string(),
            from: required_attribute(element, &p.xlink("from"))?.to_string(),
            to: required_attribute(element, &p.xlink("to"))?.to_string(),
            title: optional_attribute(element, &p.xlink("title")),
        })
    }

    fn parse_general(
        &self,
        element: &Element,
        prefix: &str,
        local: &str,
    ) -> Result<Record, ElementError> {
        if !self.config.is_fact_namespace(prefix) {
            return Err(ElementError::DisallowedNamespace(prefix.to_string()));
        }
        if !element.children.is_empty() {
            return Err(ElementError::ChildCount {
                element: element.tag.clone(),
                expected: 0,
                found: element.children.len(),
            });
        }

        let mut attributes = BTreeMap::new();
        for (name, value) in &element.attributes {
            if RESERVED_FACT_KEYS.contains(&name.as_str()) {
                return Err(ElementError::AttributeCollision(name.clone()));
            }
            attributes.insert(name.clone(), value.clone());
        }

        Ok(Record::General(Fact {
            element_type: local.to_string(),
            namespace: prefix.to_string(),
            text: element.text().to_string(),
            attributes,
        }))
    }
}

fn required_attribute<'e>(element: &'e Element, name: &str) -> Result<&'e str, ElementError> {
    element
        .attribute(name)
        .ok_or_else(|| ElementError::missing_attribute(&element.tag, name))
}

#[inline]
fn optional_attribute(element: &Element, name: &str) -> Option<String> {
    element.attribute(name).map(str::to_string)
}

/// First child with the given local name.
fn child<'e>(element: &'e Element, local: &str) -> Result<&'e Element, ElementError> {
    element
        .children
        .iter()
        .find(|c| dispatch::split(&c.tag).1 == local)
        .ok_or_else(|| ElementError::missing_child(&element.tag, local))
}

fn sole_child(element: &Element) -> Result<&Element, ElementError> {
    match element.children.as_slice() {
        [only] => Ok(only),
        children => Err(ElementError::ChildCount {
            element: element.tag.clone(),
            expected: 1,
            found: children.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixup::fixup;
    use crate::xml::parse_bytes;
    use pretty_assertions::assert_eq;

    const NAMESPACES: &str = r#"xmlns:xbrli="http://www.xbrl.org/2003/instance"
        xmlns:link="http://www.xbrl.org/2003/linkbase"
        xmlns:xlink="http://www.w3.org/1999/xlink"
        xmlns:us-gaap="http://xbrl.us/us-gaap/2009-01-31"
        xmlns:dei="http://xbrl.us/dei/2009-01-31"
        xmlns:foo="http://example.com/foo""#;

    /// Parse a fragment wrapped in a root that declares the usual prefixes and
    /// return the resolved first child.
    fn fragment(body: &str) -> Element {
        let doc = format!("<xbrli:xbrl {}>{}</xbrli:xbrl>", NAMESPACES, body);
        let root = fixup(parse_bytes(doc.as_bytes()).unwrap()).unwrap();
        root.children.into_iter().next().unwrap()
    }

    fn context_with_period(period: &str) -> Element {
        fragment(&format!(
            r#"<xbrli:context id="c">
                <xbrli:entity>
                    <xbrli:identifier scheme="http://www.sec.gov/CIK">0000843006</xbrli:identifier>
                </xbrli:entity>
                <xbrli:period>{}</xbrli:period>
            </xbrli:context>"#,
            period
        ))
    }

    #[test]
    fn test_parse_instant_context() {
        let element = fragment(
            r#"<xbrli:context id="i_2010-06-30">
                <xbrli:entity>
                    <xbrli:identifier scheme="http://www.sec.gov/CIK">0000843006</xbrli:identifier>
                </xbrli:entity>
                <xbrli:period>
                    <xbrli:instant>2010-06-30</xbrli:instant>
                </xbrli:period>
            </xbrli:context>"#,
        );
        let record = Parser::new().parse(&element).unwrap();
        assert_eq!(
            record,
            Record::Context(Context {
                id: "i_2010-06-30".into(),
                identifier: Identifier {
                    scheme: "http://www.sec.gov/CIK".into(),
                    value: "0000843006".into(),
                },
                period: Period::Instant("2010-06-30".into()),
            })
        );
    }

    #[test]
    fn test_parse_duration_context() {
        let element = context_with_period(
            "<xbrli:startDate>2010-04-01</xbrli:startDate><xbrli:endDate>2010-06-30</xbrli:endDate>",
        );
        let record = Parser::new().parse(&element).unwrap();
        assert_eq!(
            record.as_context().unwrap().period,
            Period::Duration("2010-04-01".into(), "2010-06-30".into())
        );
    }

    #[test]
    fn test_malformed_period_is_reported() {
        let three = context_with_period(
            "<xbrli:startDate>a</xbrli:startDate><xbrli:endDate>b</xbrli:endDate><xbrli:instant>c</xbrli:instant>",
        );
        let err = Parser::new().parse(&three).unwrap_err();
        assert_eq!(err, ElementError::MalformedPeriod(3));
        assert_eq!(err.severity(), Severity::Report);

        let empty = context_with_period("");
        assert_eq!(
            Parser::new().parse(&empty),
            Err(ElementError::MalformedPeriod(0))
        );
    }

    #[test]
    fn test_context_requires_id_and_single_identifier() {
        let element = fragment(
            r#"<xbrli:context><xbrli:entity/><xbrli:period/></xbrli:context>"#,
        );
        assert!(matches!(
            Parser::new().parse(&element),
            Err(ElementError::MissingAttribute { .. })
        ));

        let element = fragment(
            r#"<xbrli:context id="c"><xbrli:entity/><xbrli:period/></xbrli:context>"#,
        );
        assert!(matches!(
            Parser::new().parse(&element),
            Err(ElementError::ChildCount { expected: 1, found: 0, .. })
        ));
    }

    #[test]
    fn test_parse_unit() {
        let element = fragment(
            r#"<xbrli:unit id="USD"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>"#,
        );
        assert_eq!(
            Parser::new().parse(&element).unwrap(),
            Record::Unit(Unit {
                id: "USD".into(),
                measure: "iso4217:USD".into(),
            })
        );
    }

    #[test]
    fn test_parse_schema_ref() {
        let element = fragment(
            r#"<link:schemaRef xlink:type="simple" xlink:href="isdr-20100630.xsd"/>"#,
        );
        assert_eq!(
            Parser::new().parse(&element).unwrap(),
            Record::SchemaRef(SchemaRef {
                link_type: "simple".into(),
                href: "isdr-20100630.xsd".into(),
            })
        );
    }

    #[test]
    fn test_parse_label_link() {
        let element = fragment(
            r#"<link:labelLink xlink:type="extended" xlink:role="http://www.xbrl.org/2003/role/link">
                <link:loc xlink:type="locator" xlink:href="isdr-20100630.xsd#isdr_Cash" xlink:label="isdr_Cash"/>
                <link:label xlink:type="resource" xlink:label="isdr_Cash_lbl" xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US" id="lbl_1">Cash</link:label>
                <link:labelArc xlink:type="arc" xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label" xlink:from="isdr_Cash" xlink:to="isdr_Cash_lbl" xlink:title="label: isdr_Cash to isdr_Cash_lbl"/>
            </link:labelLink>"#,
        );
        let record = Parser::new().parse(&element).unwrap();
        let Record::LabelLink(link) = record else {
            panic!("expected a labelLink record");
        };
        assert_eq!(link.link_type, "extended");
        assert_eq!(link.locs[0].title, None);
        assert_eq!(link.labels[0].language.as_deref(), Some("en-US"));
        assert_eq!(link.labels[0].id.as_deref(), Some("lbl_1"));
        assert_eq!(link.labels[0].text, "Cash");
        assert_eq!(link.label_arcs[0].from, "isdr_Cash");
    }

    #[test]
    fn test_unknown_link_child_fails_the_link() {
        let element = fragment(
            r#"<link:labelLink xlink:type="extended" xlink:role="r">
                <link:footnote>x</link:footnote>
            </link:labelLink>"#,
        );
        assert_eq!(
            Parser::new().parse(&element),
            Err(ElementError::UnknownLinkChild("link:footnote".into()))
        );
    }

    #[test]
    fn test_parse_general_fact() {
        let element = fragment(
            r#"<us-gaap:Cash contextRef="i_2010-06-30" unitRef="USD" decimals="-3">1000</us-gaap:Cash>"#,
        );
        let Record::General(fact) = Parser::new().parse(&element).unwrap() else {
            panic!("expected a general record");
        };
        assert_eq!(fact.element_type, "Cash");
        assert_eq!(fact.namespace, "us-gaap");
        assert_eq!(fact.text, "1000");
        assert_eq!(fact.attributes.len(), 3);
        assert_eq!(fact.attributes["decimals"], "-3");
    }

    #[test]
    fn test_disallowed_namespace_is_a_skip() {
        let element = fragment(r#"<foo:Bar contextRef="c">1</foo:Bar>"#);
        let err = Parser::new().parse(&element).unwrap_err();
        assert_eq!(err, ElementError::DisallowedNamespace("foo".into()));
        assert_eq!(err.severity(), Severity::Skip);

        let parser = Parser::with_config(Config::default().with_fact_namespace("foo"));
        assert!(parser.parse(&element).is_ok());
    }

    #[test]
    fn test_reserved_attribute_collides() {
        let element = fragment(r#"<dei:DocumentType text="x">10-Q</dei:DocumentType>"#);
        assert_eq!(
            Parser::new().parse(&element),
            Err(ElementError::AttributeCollision("text".into()))
        );
    }

    #[test]
    fn test_parse_document_collects_outcomes() {
        let doc = format!(
            r#"<xbrli:xbrl {}>
                <link:schemaRef xlink:type="simple" xlink:href="a.xsd"/>
                <xbrli:unit id="USD"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
                <xbrli:unit id="broken"/>
            </xbrli:xbrl>"#,
            NAMESPACES
        );
        let root = fixup(parse_bytes(doc.as_bytes()).unwrap()).unwrap();
        let parsed = Parser::new().parse_document(&root).unwrap();

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.failures.len(), 1);
        assert_eq!(parsed.failures[0].0, "/xbrli:xbrl/xbrli:unit[2]");
        // root and the measure element are out of scope
        assert_eq!(parsed.skipped.len(), 2);
        assert_eq!(parsed.contexts().count(), 0);
    }
}
