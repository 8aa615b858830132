//! Outcome Reporting
//!
//! Presentation-only sinks for per-file results. Nothing here feeds back
//! into the driver's control flow.

use crate::codegen::Artifact;
use crate::error::UnresolvedSchemas;
use crate::source::SchemaFile;

/// Receives per-file outcomes of a run
pub trait Reporter {
    /// A schema file compiled and its artifacts were written
    fn compiled(&self, file: &SchemaFile, artifacts: &[Artifact]);

    /// The run stopped with files still pending
    fn unresolved(&self, unresolved: &UnresolvedSchemas);
}

/// Prints outcomes to the console
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn compiled(&self, file: &SchemaFile, artifacts: &[Artifact]) {
        println!("✅ Avro schema compiled: {} ({} file(s))", file.name(), artifacts.len());
    }

    fn unresolved(&self, unresolved: &UnresolvedSchemas) {
        if unresolved.is_empty() {
            return;
        }
        eprintln!(
            "⚠️  Unable to resolve dependencies for: [{}]",
            unresolved.file_names().join(", ")
        );
        for entry in unresolved.entries() {
            eprintln!("   └─ {}: {}", entry.file.name(), entry.error);
        }
    }
}

/// Discards all outcomes
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn compiled(&self, _file: &SchemaFile, _artifacts: &[Artifact]) {}

    fn unresolved(&self, _unresolved: &UnresolvedSchemas) {}
}
