//! Code Generation
//!
//! Turns a parsed schema into source artifacts in the output directory.
//!
//! Architecture:
//! - CodeEmitter: the seam the driver calls once per compiled schema file
//! - RustCodeEmitter: one Rust module per named type the file defines
//! - NullEmitter: resolves nothing to disk (dry runs)
//!
//! An emitter only sees one schema at a time and must not assume anything
//! about which other schemas have been emitted. The output directory is
//! expected to start empty; an artifact never replaces an existing file.

pub mod names;
pub mod rust;

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use apache_avro::Schema;
use serde::Serialize;

use crate::checksum::Checksum;
use crate::config::CodegenConfig;
use crate::error::{Result, SchemaError};
use crate::parser::{fullname, ParsedSchema};

pub use names::Namer;

// =============================================================================
// Artifacts
// =============================================================================

/// One generated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Avro type the file was generated for
    pub type_name: String,
    /// Location of the written file
    pub path: PathBuf,
    /// SHA256 of the file content
    pub checksum: Checksum,
}

impl Artifact {
    /// File name relative to the output directory
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

// =============================================================================
// Emitter seam
// =============================================================================

/// Writes generated artifacts for one parsed schema
pub trait CodeEmitter {
    fn emit(&self, parsed: &ParsedSchema, out_dir: &Path) -> Result<Vec<Artifact>>;

    /// Whether this emitter writes to the output directory at all
    fn writes_output(&self) -> bool {
        true
    }
}

/// Emitter for dry runs
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEmitter;

impl CodeEmitter for NullEmitter {
    fn emit(&self, _parsed: &ParsedSchema, _out_dir: &Path) -> Result<Vec<Artifact>> {
        Ok(Vec::new())
    }

    fn writes_output(&self) -> bool {
        false
    }
}

/// Generates one Rust module per named Avro type
#[derive(Debug, Clone, Default)]
pub struct RustCodeEmitter {
    config: CodegenConfig,
    namer: Namer,
}

impl RustCodeEmitter {
    pub fn new(config: CodegenConfig) -> Self {
        let namer = Namer::new(config.naming.clone());
        Self { config, namer }
    }
}

impl CodeEmitter for RustCodeEmitter {
    fn emit(&self, parsed: &ParsedSchema, out_dir: &Path) -> Result<Vec<Artifact>> {
        let mut definitions = BTreeMap::new();
        collect_named(&parsed.schema, &mut definitions);

        let mut artifacts = Vec::with_capacity(parsed.types.len());
        for def in &parsed.types {
            let schema = definitions.get(def.fullname.as_str()).ok_or_else(|| {
                SchemaError::InvalidFormat(format!(
                    "{}: type {} missing from parsed schema",
                    parsed.file.name(),
                    def.fullname
                ))
            })?;

            let Some(code) = rust::render(schema, &parsed.file, &self.namer, &self.config) else {
                continue;
            };

            let module = format!("{}.rs", self.namer.module_name(&def.fullname));
            let path = out_dir.join(&module);
            write_new(&path, &code).map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => SchemaError::ModuleCollision {
                    module,
                    type_name: def.fullname.clone(),
                },
                _ => SchemaError::Io(e),
            })?;
            tracing::debug!(type_name = %def.fullname, path = %path.display(), "wrote artifact");

            artifacts.push(Artifact {
                type_name: def.fullname.clone(),
                path,
                checksum: Checksum::of(&code),
            });
        }

        Ok(artifacts)
    }
}

fn write_new(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(content.as_bytes())
}

/// Index every named definition in a schema tree by full name
pub fn collect_named<'s>(schema: &'s Schema, out: &mut BTreeMap<String, &'s Schema>) {
    match schema {
        Schema::Record(record) => {
            out.entry(fullname(&record.name)).or_insert(schema);
            for field in &record.fields {
                collect_named(&field.schema, out);
            }
        }
        Schema::Enum(e) => {
            out.entry(fullname(&e.name)).or_insert(schema);
        }
        Schema::Fixed(fixed) => {
            out.entry(fullname(&fixed.name)).or_insert(schema);
        }
        Schema::Array(inner) | Schema::Map(inner) => collect_named(inner, out),
        Schema::Union(union) => {
            for variant in union.variants() {
                collect_named(variant, out);
            }
        }
        _ => {}
    }
}
