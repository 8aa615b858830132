//! Compilation Driver
//!
//! Compiles an unordered set of interdependent schema files without being
//! told an order. Every pass attempts all pending files; types from files
//! that compile are merged into the registry and become context for the
//! next attempt. The run succeeds when nothing is pending and fails when a
//! whole pass compiles nothing.
//!
//! Within a pass files are attempted in the order given. With
//! `RegistryView::Snapshot` that order does not change the number of
//! passes; with `RegistryView::Incremental` a favorable order can need
//! fewer. Either way an acyclic input needs at most one pass per file.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::codegen::{Artifact, CodeEmitter};
use crate::config::RegistryView;
use crate::error::{Result, SchemaError, UnresolvedSchema, UnresolvedSchemas};
use crate::parser::SchemaParser;
use crate::registry::TypeRegistry;
use crate::report::Reporter;
use crate::source::{discover, SchemaFile, SourceOptions};

/// Name of the checksum manifest written next to the artifacts
pub const CHECKSUMS_FILE: &str = "checksums.sha256";

/// Settings for one driver
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Cleared and recreated at the start of every run
    pub output_dir: PathBuf,
    pub registry_view: RegistryView,
    pub write_checksums: bool,
}

impl DriverOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            registry_view: RegistryView::default(),
            write_checksums: true,
        }
    }

    pub fn with_registry_view(mut self, view: RegistryView) -> Self {
        self.registry_view = view;
        self
    }

    pub fn with_checksums(mut self, write: bool) -> Self {
        self.write_checksums = write;
        self
    }
}

/// What happened in one pass
#[derive(Debug, Clone, Serialize)]
pub struct PassStats {
    /// 1-based pass number
    pub pass: usize,
    /// Files attempted in this pass
    pub attempted: usize,
    /// Files that compiled in this pass, in attempt order
    pub resolved: Vec<SchemaFile>,
    /// Registry size once the pass finished
    pub registry_size: usize,
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub passes: Vec<PassStats>,
    /// Files in the order they compiled
    pub compiled: Vec<SchemaFile>,
    pub artifacts: Vec<Artifact>,
    /// Every type resolved during the run
    pub registry: TypeRegistry,
}

impl RunSummary {
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }
}

/// Dependency-resolving compiler driver
pub struct Driver<P, E, R> {
    parser: P,
    emitter: E,
    reporter: R,
    options: DriverOptions,
}

impl<P, E, R> Driver<P, E, R>
where
    P: SchemaParser,
    E: CodeEmitter,
    R: Reporter,
{
    pub fn new(parser: P, emitter: E, reporter: R, options: DriverOptions) -> Self {
        Self {
            parser,
            emitter,
            reporter,
            options,
        }
    }

    /// Discover schema files in `dir` and compile them
    pub fn run_dir(&self, dir: &Path, source: &SourceOptions) -> Result<RunSummary> {
        let files = discover(dir, source)?;
        self.run(files)
    }

    /// Compile `files`, resolving cross-file references.
    ///
    /// Returns `SchemaError::Unresolved` naming every file left pending, with
    /// its last error, when a pass makes no progress.
    pub fn run(&self, files: Vec<SchemaFile>) -> Result<RunSummary> {
        if self.emitter.writes_output() {
            prepare_output_dir(&self.options.output_dir)?;
        }

        let mut seen = HashSet::new();
        let mut pending: Vec<SchemaFile> = files.into_iter().filter(|f| seen.insert(f.clone())).collect();
        let mut registry = TypeRegistry::new();
        let mut failures: HashMap<SchemaFile, SchemaError> = HashMap::new();

        let mut passes = Vec::new();
        let mut compiled = Vec::with_capacity(pending.len());
        let mut artifacts = Vec::new();

        while !pending.is_empty() {
            let pass = passes.len() + 1;
            tracing::debug!(pass, pending = pending.len(), known_types = registry.len(), "starting pass");

            let snapshot = match self.options.registry_view {
                RegistryView::Snapshot => Some(registry.clone()),
                RegistryView::Incremental => None,
            };

            let mut resolved = Vec::new();
            for file in &pending {
                let known = snapshot.as_ref().unwrap_or(&registry);
                let parsed = self.parser.parse(file, known);
                let parsed = parsed.and_then(|parsed| {
                    registry.merge(parsed.types.clone())?;
                    Ok(parsed)
                });

                match parsed {
                    Ok(parsed) => {
                        let emitted = self.emitter.emit(&parsed, &self.options.output_dir)?;
                        tracing::info!(
                            file = %file.name(),
                            types = parsed.types.len(),
                            artifacts = emitted.len(),
                            pass,
                            "compiled schema"
                        );
                        self.reporter.compiled(file, &emitted);
                        failures.remove(file);
                        resolved.push(file.clone());
                        artifacts.extend(emitted);
                    }
                    Err(e) => {
                        tracing::debug!(file = %file.name(), pass, error = %e, "schema not resolved yet");
                        failures.insert(file.clone(), e);
                    }
                }
            }

            let resolved_set: HashSet<&SchemaFile> = resolved.iter().collect();
            pending.retain(|f| !resolved_set.contains(f));

            passes.push(PassStats {
                pass,
                attempted: pending.len() + resolved.len(),
                resolved: resolved.clone(),
                registry_size: registry.len(),
            });

            if resolved.is_empty() {
                let entries = pending
                    .into_iter()
                    .map(|file| {
                        let error = failures.remove(&file).unwrap_or_else(|| {
                            SchemaError::InvalidFormat("no diagnostic recorded".to_string())
                        });
                        UnresolvedSchema { file, error }
                    })
                    .collect();
                let unresolved = UnresolvedSchemas::new(entries);

                tracing::error!(
                    pass,
                    unresolved = unresolved.len(),
                    "no progress: circular dependencies or missing types"
                );
                self.reporter.unresolved(&unresolved);
                return Err(SchemaError::Unresolved(unresolved));
            }

            compiled.extend(resolved);
        }

        if self.options.write_checksums && self.emitter.writes_output() {
            write_checksums(&self.options.output_dir, &artifacts)?;
        }

        tracing::info!(
            files = compiled.len(),
            artifacts = artifacts.len(),
            passes = passes.len(),
            types = registry.len(),
            "compilation finished"
        );

        Ok(RunSummary {
            passes,
            compiled,
            artifacts,
            registry,
        })
    }
}

/// Remove any previous output and recreate the directory empty.
///
/// Refuses the filesystem root, paths made only of `.` and `..`, and any
/// existing directory that contains the working directory.
fn prepare_output_dir(dir: &Path) -> Result<()> {
    let only_dots = dir
        .components()
        .all(|c| matches!(c, Component::CurDir | Component::ParentDir));
    if only_dots || dir.parent().is_none() || contains_working_dir(dir)? {
        return Err(SchemaError::InvalidFormat(format!(
            "refusing to clear output directory {:?}",
            dir
        )));
    }
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

fn contains_working_dir(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    let dir = dir.canonicalize()?;
    Ok(std::env::current_dir()?.canonicalize()?.starts_with(dir))
}

fn write_checksums(dir: &Path, artifacts: &[Artifact]) -> Result<()> {
    let mut lines: Vec<String> = artifacts
        .iter()
        .map(|a| format!("{}  {}", a.checksum, a.file_name()))
        .collect();
    lines.sort();

    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(dir.join(CHECKSUMS_FILE), content)?;
    Ok(())
}
