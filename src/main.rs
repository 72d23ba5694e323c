//! xbrl-roundtrip CLI - namespace canonicalization and round-trip checks

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use xbrl_roundtrip::source::{self, load_directory};
use xbrl_roundtrip::{xml, Config, Diagnostic, Parser, Verifier};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// XBRL namespace canonicalization and parse/build round-trip checks
#[derive(ClapParser)]
#[command(name = "xbrl-roundtrip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Selection {
    /// Directory of XBRL documents
    dir: PathBuf,

    /// Only load files with this extension (repeatable)
    #[arg(short, long = "extension")]
    extensions: Vec<String>,

    /// Fact namespace prefix understood by the generic parser (repeatable,
    /// replaces the default us-gaap and dei)
    #[arg(short, long = "fact-namespace")]
    fact_namespaces: Vec<String>,
}

impl Selection {
    fn config(&self) -> Config {
        if self.fact_namespaces.is_empty() {
            Config::default()
        } else {
            Config::default().with_fact_namespaces(self.fact_namespaces.iter().cloned())
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and rebuild every element, reporting failures and mismatches
    ///
    /// Contexts, units and links are rebuilt with the `xbrli`, `link` and
    /// `xlink` prefixes. Filings that bind these vocabularies to other
    /// prefixes, or to the default namespace, report every such element as
    /// a mismatch.
    Verify {
        #[command(flatten)]
        selection: Selection,

        /// Exit with status 1 when any diagnostic is produced
        #[arg(long)]
        strict: bool,

        /// Output the report as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Parse every document and print the typed records
    Parse {
        #[command(flatten)]
        selection: Selection,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the element outline of one document
    Tree {
        /// Input file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Verify {
            selection,
            strict,
            json,
        } => {
            let start = Instant::now();
            let loaded = load_directory(&selection.dir, &selection.extensions)
                .with_context(|| format!("Failed to load {}", selection.dir.display()))?;
            let verifier = Verifier::with_config(selection.config());
            let report = match verifier.verify_loaded(&loaded) {
                Ok(report) => report,
                Err(err) if err.is_fatal() => {
                    eprintln!("{} {}", "FATAL:".red().bold(), err);
                    std::process::exit(2);
                }
                Err(err) => return Err(err).context("Round-trip verification aborted"),
            };
            let elapsed = start.elapsed();

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for diagnostic in &report.diagnostics {
                    print_diagnostic(diagnostic);
                }

                let summary = &report.summary;
                let mark = if report.is_clean() {
                    "✓".green().bold()
                } else {
                    "✗".red().bold()
                };
                println!("{} {}", mark, selection.dir.display());
                println!("  Documents:  {}", summary.documents);
                println!("  Checked:    {}", summary.checked);
                println!("  Skipped:    {}", summary.skipped);
                println!("  Failures:   {}", summary.failures);
                println!("  Mismatches: {}", summary.mismatches);
                println!("  Time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
            }

            if strict && !report.is_clean() {
                std::process::exit(1);
            }
        }

        Commands::Parse { selection, json } => {
            let loaded = load_directory(&selection.dir, &selection.extensions)
                .with_context(|| format!("Failed to load {}", selection.dir.display()))?;
            let parser = Parser::with_config(selection.config());

            for failure in &loaded.failures {
                print_diagnostic(failure);
            }

            for (file, root) in &loaded.documents {
                let parsed = parser
                    .parse_document(root)
                    .with_context(|| format!("Parsing {} aborted", file))?;

                if json {
                    let value = serde_json::json!({ "file": file, "records": parsed.records });
                    println!("{}", serde_json::to_string_pretty(&value)?);
                } else {
                    println!("{} {}", "✓".green().bold(), file);
                    println!("  Records: {}", parsed.records.len());
                    println!("  Contexts: {}", parsed.contexts().count());
                    println!("  Skipped: {}", parsed.skipped.len());
                    for (path, err) in &parsed.failures {
                        println!("  {} {}: {}", "ERROR:".red(), path, err);
                    }
                }
            }
        }

        Commands::Tree { input } => {
            let root = source::with_contents(&input, source::load_document)
                .and_then(|doc| doc)
                .with_context(|| format!("Failed to load {}", input.display()))?;
            print!("{}", xml::render_tree(&root));
        }
    }

    Ok(())
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    match diagnostic {
        Diagnostic::LoadFailure { file, reason } => {
            println!("{} {}: {}", "LOAD:".red().bold(), file, reason);
        }
        Diagnostic::ParseFailure {
            file,
            element,
            reason,
        } => {
            println!("{} {} {}: {}", "ERROR:".red(), file, element, reason);
        }
        Diagnostic::Mismatch {
            file,
            element,
            original,
            rebuilt,
        } => {
            println!("{} {} {}", "MISMATCH:".yellow(), file, element);
            println!("  original: {}", original);
            println!("  rebuilt:  {}", rebuilt);
        }
    }
}
