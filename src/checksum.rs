//! Checksum utilities for generated artifacts

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA256 checksum of generated content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from a string
    pub fn of(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify that content matches this checksum
    pub fn verify(&self, content: &str) -> bool {
        Self::of(content) == *self
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let content = "pub struct User {}";
        assert_eq!(Checksum::of(content), Checksum::of(content));
        assert_eq!(Checksum::of(content).as_str().len(), 64);
    }

    #[test]
    fn test_checksum_different_content() {
        assert_ne!(Checksum::of("pub struct A;"), Checksum::of("pub struct B;"));
    }

    #[test]
    fn test_checksum_verification() {
        let content = "pub enum Color { Red }";
        let checksum = Checksum::of(content);
        assert!(checksum.verify(content));
        assert!(!checksum.verify("different content"));
    }
}
