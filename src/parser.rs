//! Avro Schema Parsing
//!
//! Parses one `.avsc` file against the types already in the registry.
//!
//! Avro's grammar is handled by `apache-avro`. This module only supplies
//! context: every name in the file is qualified with its namespace, and each
//! reference to a registry type is replaced by that type's definition at its
//! first use. The result is a self-contained schema that `Schema::parse`
//! accepts on its own, so no parser state is carried between files.

use std::collections::HashSet;
use std::fs;

use apache_avro::schema::{Name, Schema};
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};
use crate::registry::{TypeDefinition, TypeRegistry};
use crate::source::SchemaFile;

const PRIMITIVES: &[&str] = &[
    "null", "boolean", "int", "long", "float", "double", "bytes", "string",
];

const NAMED_KINDS: &[&str] = &["record", "enum", "fixed"];

/// Stand-in for the null namespace in names handed to apache-avro
const NULL_NAMESPACE: &str = "__avrogen_null";

/// Result of parsing one schema file
#[derive(Debug, Clone)]
pub struct ParsedSchema {
    /// File the schema came from
    pub file: SchemaFile,
    /// Self-contained Avro schema (registry types inlined). Names in the
    /// null namespace carry a reserved namespace here; read them with
    /// [`fullname`].
    pub schema: Schema,
    /// Named types defined by this file, nested ones included
    pub types: Vec<TypeDefinition>,
}

impl ParsedSchema {
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.fullname.as_str())
    }

    pub fn defines(&self, fullname: &str) -> bool {
        self.types.iter().any(|t| t.fullname == fullname)
    }
}

/// Parses one schema file given the types already known.
///
/// Implementations must be pure in (file content, registry): a file that
/// parsed once keeps parsing when the registry grows.
pub trait SchemaParser {
    fn parse(&self, file: &SchemaFile, known: &TypeRegistry) -> Result<ParsedSchema>;
}

/// Parser for Avro JSON schema files
#[derive(Debug, Clone, Copy, Default)]
pub struct AvroParser;

impl AvroParser {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaParser for AvroParser {
    fn parse(&self, file: &SchemaFile, known: &TypeRegistry) -> Result<ParsedSchema> {
        let content = fs::read_to_string(file.path())?;
        parse_str(file, &content, known)
    }
}

/// Full name of a type in a parsed schema, null namespace restored
pub fn fullname(name: &Name) -> String {
    real_name(&name.fullname(None)).to_string()
}

/// Parse schema text as if it were the content of `file`
pub fn parse_str(file: &SchemaFile, content: &str, known: &TypeRegistry) -> Result<ParsedSchema> {
    let json: Value = serde_json::from_str(content)
        .map_err(|e| SchemaError::InvalidFormat(format!("{}: {}", file.name(), e)))?;

    let mut resolver = Resolver::new(file, known);
    let expanded = resolver.expand(&json, None)?;
    let schema = Schema::parse(&expanded)?;

    let types = resolver
        .defined
        .into_iter()
        .map(|(fullname, definition)| TypeDefinition {
            fullname,
            definition: standalone(&definition, true),
            source: file.clone(),
        })
        .collect();

    Ok(ParsedSchema {
        file: file.clone(),
        schema,
        types,
    })
}

// =============================================================================
// Name resolution
// =============================================================================

struct Resolver<'a> {
    file: &'a SchemaFile,
    known: &'a TypeRegistry,
    /// Definitions owned by this file, in completion order
    defined: Vec<(String, Value)>,
    defined_names: HashSet<String>,
    /// Registry types already inlined; later uses stay references
    inlined: HashSet<String>,
    /// Depth of registry inlining in progress
    inlining: usize,
}

impl<'a> Resolver<'a> {
    fn new(file: &'a SchemaFile, known: &'a TypeRegistry) -> Self {
        Self {
            file,
            known,
            defined: Vec::new(),
            defined_names: HashSet::new(),
            inlined: HashSet::new(),
            inlining: 0,
        }
    }

    fn expand(&mut self, value: &Value, namespace: Option<&str>) -> Result<Value> {
        match value {
            Value::String(name) => self.reference(name, namespace),
            Value::Array(branches) => {
                let branches = branches
                    .iter()
                    .map(|b| self.expand(b, namespace))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Array(branches))
            }
            Value::Object(obj) => self.expand_object(obj, namespace),
            other => Ok(other.clone()),
        }
    }

    fn reference(&mut self, name: &str, namespace: Option<&str>) -> Result<Value> {
        if PRIMITIVES.contains(&name) {
            return Ok(Value::String(name.to_string()));
        }

        // Registry definitions hold exact full names only
        let mut candidates = if self.inlining > 0 {
            vec![name.to_string()]
        } else {
            let mut candidates = vec![qualify(name, namespace)];
            if !name.contains('.') && namespace.is_some() {
                candidates.push(name.to_string());
            }
            candidates
        };

        for candidate in &candidates {
            if self.defined_names.contains(candidate) || self.inlined.contains(candidate) {
                return Ok(Value::String(avro_name(candidate)));
            }
        }

        let known = self.known;
        for candidate in &candidates {
            if let Some(def) = known.get(candidate) {
                self.inlined.insert(candidate.clone());
                self.inlining += 1;
                let expanded = self.expand(&def.definition, None);
                self.inlining -= 1;
                return expanded;
            }
        }

        let name = candidates.swap_remove(0);
        let suggestion = known.suggest(&name);
        Err(SchemaError::UnknownType { name, suggestion })
    }

    fn expand_object(&mut self, obj: &Map<String, Value>, namespace: Option<&str>) -> Result<Value> {
        let mut out = obj.clone();
        match obj.get("type") {
            Some(Value::String(kind)) if NAMED_KINDS.contains(&kind.as_str()) => {
                return self.expand_named(obj, kind, namespace);
            }
            Some(Value::String(kind)) if kind == "array" => {
                if let Some(items) = obj.get("items") {
                    out.insert("items".to_string(), self.expand(items, namespace)?);
                }
            }
            Some(Value::String(kind)) if kind == "map" => {
                if let Some(values) = obj.get("values") {
                    out.insert("values".to_string(), self.expand(values, namespace)?);
                }
            }
            Some(inner) => {
                out.insert("type".to_string(), self.expand(inner, namespace)?);
            }
            None => {
                return Err(SchemaError::InvalidFormat(format!(
                    "{}: schema object without a \"type\"",
                    self.file.name()
                )));
            }
        }
        Ok(Value::Object(out))
    }

    fn expand_named(
        &mut self,
        obj: &Map<String, Value>,
        kind: &str,
        enclosing: Option<&str>,
    ) -> Result<Value> {
        let name = obj.get("name").and_then(Value::as_str).ok_or_else(|| {
            SchemaError::InvalidFormat(format!("{}: {} without a name", self.file.name(), kind))
        })?;

        let namespace = match name.rsplit_once('.') {
            Some((ns, _)) => Some(ns.to_string()),
            // Registry definitions carry full names already
            None if self.inlining > 0 => None,
            None => match obj.get("namespace").and_then(Value::as_str) {
                Some("") => None,
                Some(ns) => Some(ns.to_string()),
                None => enclosing.map(str::to_string),
            },
        };
        if namespace.as_deref() == Some(NULL_NAMESPACE) {
            return Err(SchemaError::InvalidFormat(format!(
                "{}: namespace {} is reserved",
                self.file.name(),
                NULL_NAMESPACE
            )));
        }
        let fullname = qualify(name, namespace.as_deref());

        if self.inlining == 0 {
            if let Some(existing) = self.known.get(&fullname) {
                return Err(SchemaError::DuplicateType {
                    name: fullname,
                    defined_in: existing.source.name(),
                });
            }
            if self.defined_names.contains(&fullname) || self.inlined.contains(&fullname) {
                return Err(SchemaError::DuplicateType {
                    name: fullname,
                    defined_in: self.file.name(),
                });
            }
            // Registered before the fields so a record may refer to itself
            self.defined_names.insert(fullname.clone());
        }

        let mut out = obj.clone();
        out.insert("name".to_string(), Value::String(avro_name(&fullname)));
        out.remove("namespace");

        if kind == "record" {
            let fields = obj.get("fields").and_then(Value::as_array).ok_or_else(|| {
                SchemaError::InvalidFormat(format!(
                    "{}: record {} has no \"fields\" array",
                    self.file.name(),
                    fullname
                ))
            })?;

            let mut expanded = Vec::with_capacity(fields.len());
            for field in fields {
                let mut field_obj = field.as_object().cloned().ok_or_else(|| {
                    SchemaError::InvalidFormat(format!(
                        "{}: record {} has a field that is not an object",
                        self.file.name(),
                        fullname
                    ))
                })?;
                if let Some(ty) = field.get("type") {
                    field_obj.insert("type".to_string(), self.expand(ty, namespace.as_deref())?);
                }
                expanded.push(Value::Object(field_obj));
            }
            out.insert("fields".to_string(), Value::Array(expanded));
        }

        let out = Value::Object(out);
        if self.inlining == 0 {
            self.defined.push((fullname, out.clone()));
        }
        Ok(out)
    }
}

fn qualify(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) if !name.contains('.') && !ns.is_empty() => format!("{}.{}", ns, name),
        _ => name.to_string(),
    }
}

/// Name as written into the schema handed to apache-avro. Every such name
/// contains a dot, so apache-avro never applies an enclosing namespace.
fn avro_name(fullname: &str) -> String {
    if fullname.contains('.') {
        fullname.to_string()
    } else {
        format!("{}.{}", NULL_NAMESPACE, fullname)
    }
}

fn real_name(name: &str) -> &str {
    name.strip_prefix(NULL_NAMESPACE)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(name)
}

fn is_named(obj: &Map<String, Value>) -> bool {
    matches!(obj.get("type"), Some(Value::String(kind)) if NAMED_KINDS.contains(&kind.as_str()))
        && obj.get("name").map(Value::is_string).unwrap_or(false)
}

/// Reduce a qualified definition to itself alone: nested named types
/// become references by exact full name.
fn standalone(value: &Value, top: bool) -> Value {
    match value {
        Value::String(name) => Value::String(real_name(name).to_string()),
        Value::Object(obj) => {
            if !top && is_named(obj) {
                return obj.get("name").map(|n| standalone(n, false)).unwrap_or(Value::Null);
            }
            let mut out = Map::with_capacity(obj.len());
            for (key, v) in obj {
                let v = match key.as_str() {
                    "name" | "type" | "items" | "values" => standalone(v, false),
                    "fields" => match v {
                        Value::Array(fields) => Value::Array(
                            fields
                                .iter()
                                .map(|field| match field {
                                    Value::Object(f) => {
                                        let mut f = f.clone();
                                        if let Some(ty) = f.get("type").map(|t| standalone(t, false)) {
                                            f.insert("type".to_string(), ty);
                                        }
                                        Value::Object(f)
                                    }
                                    other => other.clone(),
                                })
                                .collect(),
                        ),
                        other => other.clone(),
                    },
                    _ => v.clone(),
                };
                out.insert(key.clone(), v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(|i| standalone(i, false)).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file(name: &str) -> SchemaFile {
        SchemaFile::new(name)
    }

    fn parse(name: &str, content: &str, known: &TypeRegistry) -> Result<ParsedSchema> {
        parse_str(&file(name), content, known)
    }

    const ADDRESS: &str = r#"{
        "type": "record", "name": "Address", "namespace": "com.acme",
        "fields": [
            {"name": "street", "type": "string"},
            {"name": "zip", "type": {"type": "fixed", "name": "Zip", "size": 5}}
        ]
    }"#;

    const USER: &str = r#"{
        "type": "record", "name": "User", "namespace": "com.acme",
        "fields": [
            {"name": "id", "type": "string"},
            {"name": "home", "type": "Address"},
            {"name": "work", "type": ["null", "com.acme.Address"], "default": null}
        ]
    }"#;

    #[test]
    fn test_primitive_schema_defines_nothing() {
        let parsed = parse("p.avsc", r#""string""#, &TypeRegistry::new()).unwrap();
        assert!(parsed.types.is_empty());
        assert_eq!(parsed.schema, Schema::String);
    }

    #[test]
    fn test_nested_types_are_defined_and_split() {
        let parsed = parse("address.avsc", ADDRESS, &TypeRegistry::new()).unwrap();
        let mut names: Vec<_> = parsed.type_names().collect();
        names.sort();
        assert_eq!(names, vec!["com.acme.Address", "com.acme.Zip"]);

        // The record's registry definition refers to Zip by name
        let address = parsed.types.iter().find(|t| t.fullname == "com.acme.Address").unwrap();
        assert_eq!(address.definition["fields"][1]["type"], json!("com.acme.Zip"));
        assert_eq!(address.source.name(), "address.avsc");
    }

    #[test]
    fn test_registry_types_are_inlined_not_defined() {
        let mut registry = TypeRegistry::new();
        let address = parse("address.avsc", ADDRESS, &registry).unwrap();
        registry.merge(address.types).unwrap();

        let user = parse("user.avsc", USER, &registry).unwrap();
        assert_eq!(user.type_names().collect::<Vec<_>>(), vec!["com.acme.User"]);
        assert!(!user.defines("com.acme.Address"));

        match &user.schema {
            Schema::Record(record) => assert_eq!(record.fields.len(), 3),
            other => panic!("Expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_reference() {
        let err = parse("user.avsc", USER, &TypeRegistry::new()).unwrap_err();
        match err {
            SchemaError::UnknownType { name, .. } => assert_eq!(name, "com.acme.Address"),
            other => panic!("Expected UnknownType, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_reference_without_namespace() {
        let schema = r#"{"type": "record", "name": "R", "fields": [{"name": "z", "type": "Z"}]}"#;
        let err = parse("r.avsc", schema, &TypeRegistry::new()).unwrap_err();
        assert_eq!(err.to_string(), "Unknown type: Z");
    }

    #[test]
    fn test_redefinition_of_registry_type() {
        let mut registry = TypeRegistry::new();
        registry.merge(parse("address.avsc", ADDRESS, &registry).unwrap().types).unwrap();

        let err = parse("copy.avsc", ADDRESS, &registry).unwrap_err();
        match err {
            SchemaError::DuplicateType { name, defined_in } => {
                assert_eq!(name, "com.acme.Address");
                assert_eq!(defined_in, "address.avsc");
            }
            other => panic!("Expected DuplicateType, got {:?}", other),
        }
    }

    fn field_schema<'s>(schema: &'s Schema, index: usize) -> &'s Schema {
        match schema {
            Schema::Record(record) => &record.fields[index].schema,
            other => panic!("Expected record, got {:?}", other),
        }
    }

    const PLAIN: &str = r#"{"type": "enum", "name": "Plain", "symbols": ["A"]}"#;

    #[test]
    fn test_null_namespace_registry_type_used_twice() {
        let mut registry = TypeRegistry::new();
        registry.merge(parse("plain.avsc", PLAIN, &registry).unwrap().types).unwrap();

        let holder = r#"{
            "type": "record", "name": "Holder", "namespace": "com.acme",
            "fields": [
                {"name": "a", "type": "Plain"},
                {"name": "b", "type": ["null", "Plain"], "default": null}
            ]
        }"#;
        let parsed = parse("holder.avsc", holder, &registry).unwrap();
        assert_eq!(parsed.type_names().collect::<Vec<_>>(), vec!["com.acme.Holder"]);

        match field_schema(&parsed.schema, 0) {
            Schema::Enum(e) => assert_eq!(fullname(&e.name), "Plain"),
            other => panic!("Expected enum, got {:?}", other),
        }
        match field_schema(&parsed.schema, 1) {
            Schema::Union(union) => match &union.variants()[1] {
                Schema::Ref { name } => assert_eq!(fullname(name), "Plain"),
                other => panic!("Expected reference, got {:?}", other),
            },
            other => panic!("Expected union, got {:?}", other),
        }

        // Stored definitions use real full names
        let def = &parsed.types[0].definition;
        assert_eq!(def["name"], json!("com.acme.Holder"));
        assert_eq!(def["fields"][0]["type"], json!("Plain"));
    }

    #[test]
    fn test_null_namespace_nested_type_used_twice() {
        let schema = r#"{
            "type": "record", "name": "Holder", "namespace": "com.acme",
            "fields": [
                {"name": "a", "type": {"type": "enum", "name": "Plain", "namespace": "", "symbols": ["A"]}},
                {"name": "b", "type": "Plain"}
            ]
        }"#;
        let parsed = parse("holder.avsc", schema, &TypeRegistry::new()).unwrap();
        let mut names: Vec<_> = parsed.type_names().collect();
        names.sort();
        assert_eq!(names, vec!["Plain", "com.acme.Holder"]);

        let plain = parsed.types.iter().find(|t| t.fullname == "Plain").unwrap();
        assert_eq!(plain.definition["name"], json!("Plain"));
    }

    #[test]
    fn test_inlined_definition_keeps_its_references() {
        let mut registry = TypeRegistry::new();
        registry.merge(parse("plain.avsc", PLAIN, &registry).unwrap().types).unwrap();

        let outer = r#"{
            "type": "record", "name": "Outer", "namespace": "com.x",
            "fields": [{"name": "p", "type": "Plain"}]
        }"#;
        registry.merge(parse("outer.avsc", outer, &registry).unwrap().types).unwrap();

        // A same-named type in Outer's namespace arrives later
        let shadow = r#"{"type": "enum", "name": "Plain", "namespace": "com.x", "symbols": ["B"]}"#;
        registry.merge(parse("shadow.avsc", shadow, &registry).unwrap().types).unwrap();

        let user = r#"{
            "type": "record", "name": "User", "namespace": "com.y",
            "fields": [{"name": "o", "type": "com.x.Outer"}]
        }"#;
        let parsed = parse("user.avsc", user, &registry).unwrap();

        match field_schema(field_schema(&parsed.schema, 0), 0) {
            Schema::Enum(e) => {
                assert_eq!(fullname(&e.name), "Plain");
                assert_eq!(e.symbols, vec!["A"]);
            }
            other => panic!("Expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_reserved_namespace_rejected() {
        let schema = r#"{"type": "enum", "name": "E", "namespace": "__avrogen_null", "symbols": ["A"]}"#;
        let err = parse("e.avsc", schema, &TypeRegistry::new()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFormat(_)));
    }

    #[test]
    fn test_self_reference() {
        let schema = r#"{
            "type": "record", "name": "Node", "namespace": "tree",
            "fields": [
                {"name": "value", "type": "long"},
                {"name": "children", "type": {"type": "array", "items": "Node"}}
            ]
        }"#;
        let parsed = parse("node.avsc", schema, &TypeRegistry::new()).unwrap();
        assert_eq!(parsed.type_names().collect::<Vec<_>>(), vec!["tree.Node"]);
    }

    #[test]
    fn test_invalid_json() {
        let err = parse("broken.avsc", "{ not json", &TypeRegistry::new()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFormat(_)));
    }

    #[test]
    fn test_grammar_error_is_reported() {
        let schema = r#"{"type": "enum", "name": "Color", "symbols": "RED"}"#;
        assert!(parse("color.avsc", schema, &TypeRegistry::new()).is_err());
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("User", Some("com.acme")), "com.acme.User");
        assert_eq!(qualify("other.User", Some("com.acme")), "other.User");
        assert_eq!(qualify("User", None), "User");
    }
}
