//! Avro Schema Compiler
//!
//! Compiles a directory of interdependent Avro schema files (`.avsc`) into
//! Rust source, resolving cross-file type references without being told a
//! compilation order.
//!
//! ## Pipeline
//!
//! ```text
//! input dir ──discover──▶ pending files
//!                              │
//!                 ┌────────────┴────────────┐
//!                 │   pass (repeat)          │
//!                 │   parse(file, registry)  │──▶ failure ledger
//!                 │   registry ∪= new types  │
//!                 │   emit(schema, out dir)  │──▶ *.rs, checksums.sha256
//!                 └────────────┬────────────┘
//!                              │
//!          nothing pending ──▶ RunSummary
//!          no progress     ──▶ SchemaError::Unresolved
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use avrogen::{AvroParser, ConsoleReporter, Driver, DriverOptions, RustCodeEmitter};
//!
//! let driver = Driver::new(
//!     AvroParser::new(),
//!     RustCodeEmitter::default(),
//!     ConsoleReporter,
//!     DriverOptions::new("build/generated-avro"),
//! );
//! let summary = driver.run_dir("src/main/avro".as_ref(), &Default::default())?;
//! ```

pub mod checksum;
pub mod codegen;
pub mod config;
pub mod driver;
pub mod error;
pub mod parser;
pub mod registry;
pub mod report;
pub mod source;

pub use checksum::Checksum;
pub use codegen::{Artifact, CodeEmitter, NullEmitter, RustCodeEmitter};
pub use config::{CodegenConfig, CompilerConfig, DriverConfig, NamingConfig, RegistryView};
pub use driver::{Driver, DriverOptions, PassStats, RunSummary};
pub use error::{Result, SchemaError, UnresolvedSchema, UnresolvedSchemas};
pub use parser::{AvroParser, ParsedSchema, SchemaParser};
pub use registry::{TypeDefinition, TypeRegistry};
pub use report::{ConsoleReporter, Reporter, SilentReporter};
pub use source::{discover, SchemaFile, SourceOptions};
