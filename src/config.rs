//! Configuration management for the schema compiler
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (avrogen.toml)
//! - Environment variables (AVROGEN__*)
//!
//! ## Example config file (avrogen.toml):
//! ```toml
//! [compiler]
//! input_dir = "src/main/avro"
//! output_dir = "build/generated-avro"
//! extension = "avsc"
//! recursive = false
//! registry_view = "snapshot"
//!
//! [codegen]
//! derives = ["Debug", "Clone", "PartialEq", "Serialize", "Deserialize"]
//! header = true
//! write_checksums = true
//!
//! [codegen.naming]
//! acronyms = ["ID", "URL", "UUID"]
//! preserve_screaming_case = false
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::source::SourceOptions;

/// Main configuration for the schema compiler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Input/output and driver settings
    #[serde(default)]
    pub compiler: DriverConfig,

    /// Code generation settings
    #[serde(default)]
    pub codegen: CodegenConfig,
}

/// Driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Directory holding the schema files
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory that receives generated code (cleared on every run)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Schema file extension, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Descend into subdirectories of the input directory
    #[serde(default)]
    pub recursive: bool,

    /// Which registry state a pass parses against
    #[serde(default)]
    pub registry_view: RegistryView,
}

/// Registry visibility within a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegistryView {
    /// Every file in a pass sees the registry as it was when the pass began
    #[default]
    Snapshot,
    /// Later files in a pass also see types merged earlier in that pass
    Incremental,
}

/// Code generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Derives placed on every generated type
    #[serde(default = "default_derives")]
    pub derives: Vec<String>,

    /// Emit the DO-NOT-EDIT module header
    #[serde(default = "default_true")]
    pub header: bool,

    /// Write checksums.sha256 next to the generated files
    #[serde(default = "default_true")]
    pub write_checksums: bool,

    /// Naming conventions
    #[serde(default)]
    pub naming: NamingConfig,
}

/// Naming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Acronyms to preserve (e.g., ID, URL, UUID, API)
    #[serde(default = "default_acronyms")]
    pub acronyms: HashSet<String>,

    /// Whether to preserve all-caps words in type and variant names
    #[serde(default)]
    pub preserve_screaming_case: bool,
}

// Default value functions
fn default_input_dir() -> PathBuf {
    PathBuf::from("src/main/avro")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build/generated-avro")
}

fn default_extension() -> String {
    "avsc".to_string()
}

fn default_true() -> bool {
    true
}

fn default_derives() -> Vec<String> {
    ["Debug", "Clone", "PartialEq", "Serialize", "Deserialize"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_acronyms() -> HashSet<String> {
    ["ID", "URL", "UUID", "API", "HTTP", "JSON", "XML", "SQL", "URI", "UI", "IO"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            extension: default_extension(),
            recursive: false,
            registry_view: RegistryView::default(),
        }
    }
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            derives: default_derives(),
            header: true,
            write_checksums: true,
            naming: NamingConfig::default(),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            acronyms: default_acronyms(),
            preserve_screaming_case: false,
        }
    }
}

impl DriverConfig {
    /// Discovery options for the input directory
    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            extension: self.extension.clone(),
            recursive: self.recursive,
        }
    }
}

impl CompilerConfig {
    /// Load configuration from the default locations, layering an explicit
    /// file over them when given
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["avrogen.toml", ".avrogen.toml", "config/avrogen.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "avrogen", "avrogen") {
            let xdg_config = config_dir.config_dir().join("avrogen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (AVROGEN__COMPILER__OUTPUT_DIR, ...)
        builder = builder.add_source(
            Environment::with_prefix("AVROGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert_eq!(config.compiler.extension, "avsc");
        assert_eq!(config.compiler.registry_view, RegistryView::Snapshot);
        assert!(config.codegen.header);
        assert!(config.codegen.derives.contains(&"Serialize".to_string()));
    }

    #[test]
    fn test_serialize_config() {
        let config = CompilerConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[compiler]"));
        assert!(toml_str.contains("[codegen]"));
        assert!(toml_str.contains("registry_view = \"snapshot\""));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: CompilerConfig = toml::from_str(
            r#"
            [compiler]
            output_dir = "out"
            registry_view = "incremental"
            "#,
        )
        .unwrap();
        assert_eq!(config.compiler.output_dir, PathBuf::from("out"));
        assert_eq!(config.compiler.input_dir, PathBuf::from("src/main/avro"));
        assert_eq!(config.compiler.registry_view, RegistryView::Incremental);
        assert!(config.codegen.write_checksums);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avrogen.toml");
        let path = path.to_str().unwrap();

        let mut config = CompilerConfig::default();
        config.compiler.recursive = true;
        config.save(path).unwrap();

        let loaded = CompilerConfig::load_from(Some(path)).unwrap();
        assert!(loaded.compiler.recursive);
    }
}
