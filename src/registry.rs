//! Type Registry
//!
//! Append-only mapping from fully-qualified Avro type names to the
//! definitions that later schema files may reference.

use std::collections::BTreeMap;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::error::{Result, SchemaError};
use crate::source::SchemaFile;

/// A resolved named type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    /// Fully-qualified name (e.g., "com.acme.User")
    pub fullname: String,
    /// Standalone definition: every name qualified, nested named types
    /// replaced by references, so it can be inlined anywhere
    pub definition: serde_json::Value,
    /// File that defined this type
    pub source: SchemaFile,
}

impl TypeDefinition {
    /// Simple name without namespace
    pub fn name(&self) -> &str {
        self.fullname.rsplit('.').next().unwrap_or(&self.fullname)
    }
}

/// Known named types, keyed by full name
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDefinition>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn contains(&self, fullname: &str) -> bool {
        self.types.contains_key(fullname)
    }

    pub fn get(&self, fullname: &str) -> Option<&TypeDefinition> {
        self.types.get(fullname)
    }

    /// All known names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Merge newly resolved types.
    ///
    /// Existing entries are never replaced. If any incoming name is already
    /// known, nothing is inserted and the first definer is reported.
    pub fn merge(&mut self, incoming: Vec<TypeDefinition>) -> Result<usize> {
        let mut seen = std::collections::HashSet::new();
        for def in &incoming {
            if let Some(existing) = self.types.get(&def.fullname) {
                return Err(SchemaError::DuplicateType {
                    name: def.fullname.clone(),
                    defined_in: existing.source.name(),
                });
            }
            if !seen.insert(def.fullname.as_str()) {
                return Err(SchemaError::DuplicateType {
                    name: def.fullname.clone(),
                    defined_in: def.source.name(),
                });
            }
        }

        let added = incoming.len();
        for def in incoming {
            self.types.insert(def.fullname.clone(), def);
        }
        Ok(added)
    }

    /// Closest known name to `name`, for diagnostics
    pub fn suggest(&self, name: &str) -> Option<String> {
        let matcher = SkimMatcherV2::default();
        let simple = name.rsplit('.').next().unwrap_or(name);

        self.types
            .values()
            .filter_map(|def| {
                let score = matcher
                    .fuzzy_match(&def.fullname, name)
                    .or_else(|| matcher.fuzzy_match(def.name(), simple))?;
                Some((score, &def.fullname))
            })
            .max_by_key(|(score, _)| *score)
            .map(|(_, fullname)| fullname.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn def(fullname: &str, file: &str) -> TypeDefinition {
        TypeDefinition {
            fullname: fullname.to_string(),
            definition: json!({"type": "fixed", "name": fullname, "size": 4}),
            source: SchemaFile::new(file),
        }
    }

    #[test]
    fn test_merge_appends() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.merge(vec![def("a.X", "x.avsc")]).unwrap(), 1);
        assert_eq!(registry.merge(vec![def("a.Y", "y.avsc"), def("a.Z", "y.avsc")]).unwrap(), 2);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a.X", "a.Y", "a.Z"]);
    }

    #[test]
    fn test_merge_first_wins() {
        let mut registry = TypeRegistry::new();
        registry.merge(vec![def("a.X", "first.avsc")]).unwrap();

        let err = registry
            .merge(vec![def("a.W", "second.avsc"), def("a.X", "second.avsc")])
            .unwrap_err();
        match err {
            SchemaError::DuplicateType { name, defined_in } => {
                assert_eq!(name, "a.X");
                assert_eq!(defined_in, "first.avsc");
            }
            other => panic!("Expected DuplicateType, got {:?}", other),
        }

        // Rejected merge is all-or-nothing
        assert!(!registry.contains("a.W"));
        assert_eq!(registry.get("a.X").unwrap().source.name(), "first.avsc");
    }

    #[test]
    fn test_name_parts() {
        let d = def("com.acme.User", "u.avsc");
        assert_eq!(d.name(), "User");

        let bare = def("User", "u.avsc");
        assert_eq!(bare.name(), "User");
    }

    #[test]
    fn test_suggest() {
        let mut registry = TypeRegistry::new();
        registry
            .merge(vec![def("com.acme.Address", "a.avsc"), def("com.acme.Order", "o.avsc")])
            .unwrap();

        assert_eq!(registry.suggest("com.acme.Adress").as_deref(), Some("com.acme.Address"));
        assert_eq!(TypeRegistry::new().suggest("Anything"), None);
    }
}
