//! Avro Schema Compiler CLI
//!
//! Compiles a directory of `.avsc` files into Rust modules.

use std::path::{Path, PathBuf};

use anyhow::Context;
use avrogen::{
    AvroParser, CompilerConfig, ConsoleReporter, Driver, DriverOptions, NullEmitter,
    RegistryView, RunSummary, RustCodeEmitter,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "avrogen")]
#[command(about = "Compile interdependent Avro schemas into Rust code")]
#[command(version)]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every schema and write generated code
    Compile {
        /// Directory holding the schema files
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output directory (cleared before compiling)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Let later files in a pass see types resolved earlier in it
        #[arg(long)]
        incremental: bool,
        /// Write a JSON run summary to this file
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Resolve every schema without writing any output
    Check {
        /// Directory holding the schema files
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Let later files in a pass see types resolved earlier in it
        #[arg(long)]
        incremental: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut cfg = CompilerConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Compile { input, output, incremental, summary } => {
            if let Some(input) = input {
                cfg.compiler.input_dir = input;
            }
            if let Some(output) = output {
                cfg.compiler.output_dir = output;
            }
            if incremental {
                cfg.compiler.registry_view = RegistryView::Incremental;
            }

            println!(
                "🔍 Compiling Avro schemas: {} -> {}",
                cfg.compiler.input_dir.display(),
                cfg.compiler.output_dir.display()
            );

            let options = DriverOptions::new(cfg.compiler.output_dir.clone())
                .with_registry_view(cfg.compiler.registry_view)
                .with_checksums(cfg.codegen.write_checksums);
            let driver = Driver::new(
                AvroParser::new(),
                RustCodeEmitter::new(cfg.codegen.clone()),
                ConsoleReporter,
                options,
            );

            let result = driver.run_dir(&cfg.compiler.input_dir, &cfg.compiler.source_options())?;

            println!(
                "✅ {} schema(s) compiled into {} file(s) in {} pass(es)",
                result.compiled.len(),
                result.artifact_count(),
                result.pass_count()
            );

            if let Some(path) = summary {
                write_summary(&path, &cfg, &result)?;
                println!("✅ Summary written to {:?}", path);
            }
            Ok(())
        }

        Commands::Check { input, incremental } => {
            if let Some(input) = input {
                cfg.compiler.input_dir = input;
            }
            if incremental {
                cfg.compiler.registry_view = RegistryView::Incremental;
            }

            println!("🔍 Checking Avro schemas in {}", cfg.compiler.input_dir.display());

            let options = DriverOptions::new(cfg.compiler.output_dir.clone())
                .with_registry_view(cfg.compiler.registry_view);
            let driver = Driver::new(AvroParser::new(), NullEmitter, ConsoleReporter, options);

            let result = driver.run_dir(&cfg.compiler.input_dir, &cfg.compiler.source_options())?;

            println!(
                "✅ All {} schema(s) resolve ({} type(s), {} pass(es))",
                result.compiled.len(),
                result.registry.len(),
                result.pass_count()
            );
            Ok(())
        }
    }
}

fn write_summary(path: &Path, cfg: &CompilerConfig, result: &RunSummary) -> anyhow::Result<()> {
    let report = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "input_dir": cfg.compiler.input_dir,
        "output_dir": cfg.compiler.output_dir,
        "registry_view": cfg.compiler.registry_view,
        "passes": result.passes,
        "files": result.compiled,
        "artifacts": result.artifacts,
        "types": result.registry.names().collect::<Vec<_>>(),
    });

    std::fs::write(path, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("failed to write summary {:?}", path))?;
    Ok(())
}
