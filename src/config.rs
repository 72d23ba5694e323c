// Engine configuration: fact allow-list and structural prefixes

/// Namespace prefixes whose leaf elements the `general` fallback understands.
pub const DEFAULT_FACT_NAMESPACES: &[&str] = &["us-gaap", "dei"];

/// Prefixes the parser reads and the builder writes for structural elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefixes {
    pub instance: String,
    pub link: String,
    pub xlink: String,
    pub xml: String,
}

impl Default for Prefixes {
    fn default() -> Self {
        Self {
            instance: "xbrli".to_string(),
            link: "link".to_string(),
            xlink: "xlink".to_string(),
            xml: "xml".to_string(),
        }
    }
}

impl Prefixes {
    #[inline]
    pub fn instance(&self, local: &str) -> String {
        qualify(&self.instance, local)
    }

    #[inline]
    pub fn link(&self, local: &str) -> String {
        qualify(&self.link, local)
    }

    #[inline]
    pub fn xlink(&self, local: &str) -> String {
        qualify(&self.xlink, local)
    }

    #[inline]
    pub fn xml(&self, local: &str) -> String {
        qualify(&self.xml, local)
    }
}

/// `prefix:local`, or the bare local name for the empty prefix.
pub fn qualify(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub fact_namespaces: Vec<String>,
    pub prefixes: Prefixes,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fact_namespaces: DEFAULT_FACT_NAMESPACES
                .iter()
                .map(|ns| ns.to_string())
                .collect(),
            prefixes: Prefixes::default(),
        }
    }
}

impl Config {
    pub fn is_fact_namespace(&self, prefix: &str) -> bool {
        self.fact_namespaces.iter().any(|ns| ns == prefix)
    }

    pub fn with_fact_namespace(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !self.is_fact_namespace(&prefix) {
            self.fact_namespaces.push(prefix);
        }
        self
    }

    /// Replace the allow-list.
    pub fn with_fact_namespaces<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fact_namespaces = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prefixes(mut self, prefixes: Prefixes) -> Self {
        self.prefixes = prefixes;
        self
    }
}
