//! Round-trip verification.
//!
//! Every element of a document is parsed and rebuilt; the canonical forms of
//! the original and rebuilt element must be equal.

use crate::builder::Builder;
use crate::config::Config;
use crate::error::Severity;
use crate::parser::Parser;
use crate::source::{Documents, Loaded};
use crate::xml::{canonical, Element};
use crate::Result;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The document could not be read, parsed as XML, or namespace-resolved.
    LoadFailure { file: String, reason: String },
    ParseFailure {
        file: String,
        element: String,
        reason: String,
    },
    Mismatch {
        file: String,
        element: String,
        original: String,
        rebuilt: String,
    },
}

impl Diagnostic {
    pub fn file(&self) -> &str {
        match self {
            Diagnostic::LoadFailure { file, .. }
            | Diagnostic::ParseFailure { file, .. }
            | Diagnostic::Mismatch { file, .. } => file,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub documents: usize,
    /// Elements parsed, rebuilt and compared.
    pub checked: usize,
    pub skipped: usize,
    pub failures: usize,
    pub mismatches: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
    pub summary: Summary,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn merge(&mut self, other: Report) {
        self.diagnostics.extend(other.diagnostics);
        self.summary.documents += other.summary.documents;
        self.summary.checked += other.summary.checked;
        self.summary.skipped += other.summary.skipped;
        self.summary.failures += other.summary.failures;
        self.summary.mismatches += other.summary.mismatches;
    }
}

pub struct Verifier {
    parser: Parser,
    builder: Builder,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            parser: Parser::with_config(config.clone()),
            builder: Builder::with_config(config),
        }
    }

    /// Verify one namespace-resolved document.
    ///
    /// Returns `Err` only for fatal conditions; malformed elements and
    /// mismatches are collected in the report.
    pub fn verify_document(&self, file: &str, root: &Element) -> Result<Report> {
        let mut report = Report::default();
        report.summary.documents = 1;

        for (path, element) in root.locate() {
            let outcome = self
                .parser
                .parse(element)
                .and_then(|record| self.builder.build(&record));

            match outcome {
                Ok(rebuilt) => {
                    report.summary.checked += 1;
                    let original = canonical(element)?;
                    let rebuilt = canonical(&rebuilt)?;
                    if original != rebuilt {
                        tracing::warn!(file, element = %path, "round-trip mismatch");
                        report.summary.mismatches += 1;
                        report.diagnostics.push(Diagnostic::Mismatch {
                            file: file.to_string(),
                            element: path,
                            original,
                            rebuilt,
                        });
                    }
                }
                Err(err) => match err.severity() {
                    Severity::Skip => {
                        tracing::debug!(file, element = %path, reason = %err, "skipped");
                        report.summary.skipped += 1;
                    }
                    Severity::Report => {
                        tracing::warn!(file, element = %path, reason = %err, "parse failure");
                        report.summary.failures += 1;
                        report.diagnostics.push(Diagnostic::ParseFailure {
                            file: file.to_string(),
                            element: path,
                            reason: err.to_string(),
                        });
                    }
                    Severity::Fatal => {
                        tracing::error!(file, element = %path, reason = %err, "aborting");
                        return Err(err.into());
                    }
                },
            }
        }

        tracing::info!(
            file,
            checked = report.summary.checked,
            skipped = report.summary.skipped,
            failures = report.summary.failures,
            mismatches = report.summary.mismatches,
            "document verified"
        );
        Ok(report)
    }

    /// Verify independent documents, in parallel with the `parallel` feature.
    /// Diagnostics come back ordered by file.
    pub fn verify_documents(&self, documents: &Documents) -> Result<Report> {
        #[cfg(feature = "parallel")]
        let reports: Vec<Result<Report>> = documents
            .par_iter()
            .map(|(file, root)| self.verify_document(file, root))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let reports: Vec<Result<Report>> = documents
            .iter()
            .map(|(file, root)| self.verify_document(file, root))
            .collect();

        let mut total = Report::default();
        for report in reports {
            total.merge(report?);
        }
        total.diagnostics.sort_by(|a, b| a.file().cmp(b.file()));
        Ok(total)
    }

    /// Verify a loaded directory, including its load failures.
    pub fn verify_loaded(&self, loaded: &Loaded) -> Result<Report> {
        let mut report = self.verify_documents(&loaded.documents)?;
        report.summary.documents += loaded.failures.len();
        report.diagnostics.extend(loaded.failures.iter().cloned());
        report.diagnostics.sort_by(|a, b| a.file().cmp(b.file()));
        Ok(report)
    }
}
