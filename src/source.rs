//! Schema Source
//!
//! Enumerates candidate schema files from an input directory.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::Result;

/// One schema source unit, identified by its path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaFile(PathBuf);

impl SchemaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File name used in diagnostics
    pub fn name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl fmt::Display for SchemaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<PathBuf> for SchemaFile {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

/// Options for schema discovery
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// File extension to select, without the leading dot
    pub extension: String,
    /// Descend into subdirectories
    pub recursive: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            extension: "avsc".to_string(),
            recursive: false,
        }
    }
}

/// List schema files under `dir`, sorted by path.
///
/// Filesystem enumeration order is unspecified, so the result is sorted to
/// give every run the same attempt order.
pub fn discover(dir: &Path, options: &SourceOptions) -> Result<Vec<SchemaFile>> {
    // Surface a missing directory instead of compiling nothing
    std::fs::metadata(dir)?;

    let max_depth = if options.recursive { usize::MAX } else { 1 };

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(max_depth) {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if path.extension().map(|e| e == options.extension.as_str()).unwrap_or(false) {
            files.push(SchemaFile::new(path));
        }
    }

    files.sort();
    tracing::debug!(count = files.len(), dir = %dir.display(), "discovered schema files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.avsc"), "{}").unwrap();
        fs::write(dir.path().join("a.avsc"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.avsc"), "{}").unwrap();

        let files = discover(dir.path(), &SourceOptions::default()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a.avsc", "b.avsc"]);
    }

    #[test]
    fn test_discover_recursive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.avsc"), "{}").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.avsc"), "{}").unwrap();

        let options = SourceOptions { recursive: true, ..Default::default() };
        let files = discover(dir.path(), &options).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_discover_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(discover(&missing, &SourceOptions::default()).is_err());
    }

    #[test]
    fn test_schema_file_name() {
        let file = SchemaFile::new("/tmp/schemas/User.avsc");
        assert_eq!(file.name(), "User.avsc");
        assert_eq!(file.to_string(), "User.avsc");
    }
}
