//! Compiler Config CLI
//!
//! View and manage avrogen configuration.

use avrogen::CompilerConfig;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "avrogen-config")]
#[command(about = "View and manage avrogen configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path (default: avrogen.toml)
        #[arg(short, long, default_value = "avrogen.toml")]
        output: String,
    },

    /// Validate configuration
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let cfg = CompilerConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("📋 avrogen Configuration\n");
                println!("Compiler:");
                println!("  Input: {:?}", cfg.compiler.input_dir);
                println!("  Output: {:?}", cfg.compiler.output_dir);
                println!("  Extension: .{}", cfg.compiler.extension);
                println!("  Recursive: {}", cfg.compiler.recursive);
                println!("  Registry view: {:?}", cfg.compiler.registry_view);

                println!("\nCodegen:");
                println!("  Derives: {}", cfg.codegen.derives.join(", "));
                println!("  Header: {}", cfg.codegen.header);
                println!("  Checksums: {}", cfg.codegen.write_checksums);

                let mut acronyms: Vec<_> = cfg.codegen.naming.acronyms.iter().collect();
                acronyms.sort();
                println!("\nNaming:");
                println!("  Acronyms: {}", acronyms.into_iter().cloned().collect::<Vec<_>>().join(", "));
                println!("  Preserve SCREAMING case: {}", cfg.codegen.naming.preserve_screaming_case);
            }
        }

        Commands::Init { output } => {
            let cfg = CompilerConfig::default();
            cfg.save(&output)?;
            println!("✅ Created config file: {}", output);
        }

        Commands::Validate { config } => match CompilerConfig::load_from(config.as_deref()) {
            Ok(cfg) => {
                println!("✅ Configuration is valid");
                println!("   Input: {:?}", cfg.compiler.input_dir);
                println!("   Output: {:?}", cfg.compiler.output_dir);
                println!("   Registry view: {:?}", cfg.compiler.registry_view);
            }
            Err(e) => {
                eprintln!("❌ Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
