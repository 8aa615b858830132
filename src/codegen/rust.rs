//! Rust Code Emitter
//!
//! Renders one Avro named type as a standalone Rust module.
//!
//! Key constraints:
//! - A module never assumes another module has been generated yet
//! - References to other named types go through `super::<module>`
//! - Only the type itself (plus companion union enums) is rendered

use apache_avro::schema::{EnumSchema, FixedSchema, Name, RecordSchema, Schema};

use super::names::{to_snake_case, Namer};
use crate::config::CodegenConfig;
use crate::parser::fullname;
use crate::source::SchemaFile;

/// Largest fixed size that still maps to a serde-derivable array
const MAX_ARRAY_FIXED: usize = 32;

/// Render a named schema as Rust source
pub fn render(
    schema: &Schema,
    source: &SchemaFile,
    namer: &Namer,
    config: &CodegenConfig,
) -> Option<String> {
    let mut emitter = Renderer {
        namer,
        config,
        uses_map: false,
        companions: Vec::new(),
    };

    let (name, body) = match schema {
        Schema::Record(record) => (fullname(&record.name), emitter.emit_record(record)),
        Schema::Enum(e) => (fullname(&e.name), emitter.emit_enum(e)),
        Schema::Fixed(fixed) => (fullname(&fixed.name), emitter.emit_fixed(fixed)),
        _ => return None,
    };

    let mut output = String::new();
    if config.header {
        output.push_str(&format!("//! Generated from `{}` - DO NOT EDIT\n", source.name()));
        output.push_str("//!\n");
        output.push_str(&format!("//! Avro type `{}`.\n\n", name));
    }

    output.push_str("#[allow(unused_imports)]\n");
    output.push_str("use serde::{Deserialize, Serialize};\n");
    if emitter.uses_map {
        output.push_str("use std::collections::HashMap;\n");
    }
    output.push('\n');

    output.push_str(&body);
    for companion in &emitter.companions {
        output.push('\n');
        output.push_str(companion);
    }

    Some(output)
}

struct Renderer<'a> {
    namer: &'a Namer,
    config: &'a CodegenConfig,
    uses_map: bool,
    /// Enums generated for non-optional unions
    companions: Vec<String>,
}

impl Renderer<'_> {
    fn derive_line(&self) -> String {
        format!("#[derive({})]\n", self.config.derives.join(", "))
    }

    fn emit_doc(output: &mut String, doc: Option<&str>, indent: &str) {
        if let Some(doc) = doc {
            for line in doc.lines() {
                output.push_str(&format!("{}/// {}\n", indent, line.trim()));
            }
        }
    }

    // =========================================================================
    // Records
    // =========================================================================

    fn emit_record(&mut self, record: &RecordSchema) -> String {
        let mut output = String::new();
        let owner = fullname(&record.name);
        let type_name = self.namer.type_name(&owner);

        Self::emit_doc(&mut output, record.doc.as_deref(), "");
        output.push_str(&self.derive_line());
        output.push_str(&format!("pub struct {} {{\n", type_name));

        for field in &record.fields {
            let ident = self.namer.field_name(&field.name);
            let ty = self.rust_type(&field.schema, &owner, &field.name, false);

            Self::emit_doc(&mut output, field.doc.as_deref(), "    ");
            if ident.trim_start_matches("r#") != field.name {
                output.push_str(&format!("    #[serde(rename = \"{}\")]\n", field.name));
            }
            output.push_str(&format!("    pub {}: {},\n", ident, ty));
        }

        output.push_str("}\n");
        output
    }

    // =========================================================================
    // Enums
    // =========================================================================

    fn emit_enum(&mut self, e: &EnumSchema) -> String {
        let mut output = String::new();
        let type_name = self.namer.type_name(&fullname(&e.name));

        Self::emit_doc(&mut output, e.doc.as_deref(), "");
        output.push_str(&self.derive_line());
        output.push_str(&format!("pub enum {} {{\n", type_name));

        for symbol in &e.symbols {
            let variant = self.namer.variant_name(symbol);
            if &variant != symbol {
                output.push_str(&format!("    #[serde(rename = \"{}\")]\n", symbol));
            }
            output.push_str(&format!("    {},\n", variant));
        }

        output.push_str("}\n");
        output
    }

    // =========================================================================
    // Fixed
    // =========================================================================

    fn emit_fixed(&mut self, fixed: &FixedSchema) -> String {
        let mut output = String::new();
        let type_name = self.namer.type_name(&fullname(&fixed.name));

        Self::emit_doc(&mut output, fixed.doc.as_deref(), "");
        output.push_str(&self.derive_line());
        if fixed.size <= MAX_ARRAY_FIXED {
            output.push_str(&format!("pub struct {}(pub [u8; {}]);\n", type_name, fixed.size));
        } else {
            output.push_str(&format!("pub struct {}(pub Vec<u8>);\n", type_name));
        }
        output
    }

    // =========================================================================
    // Type references
    // =========================================================================

    /// Path to another named type, or the bare name for the type itself
    fn named_path(&self, name: &Name, owner: &str) -> String {
        let full = fullname(name);
        let type_name = self.namer.type_name(&full);
        if full == owner {
            type_name
        } else {
            format!("super::{}::{}", self.namer.module_name(&full), type_name)
        }
    }

    fn named_ref(&self, name: &Name, owner: &str, in_container: bool) -> String {
        let path = self.named_path(name, owner);
        // A record holding itself needs indirection unless a container provides it
        if fullname(name) == owner && !in_container {
            format!("Box<{}>", path)
        } else {
            path
        }
    }

    fn rust_type(&mut self, schema: &Schema, owner: &str, field: &str, in_container: bool) -> String {
        match schema {
            Schema::Null => "()".to_string(),
            Schema::Boolean => "bool".to_string(),
            Schema::Int | Schema::Date | Schema::TimeMillis => "i32".to_string(),
            Schema::Long
            | Schema::TimeMicros
            | Schema::TimestampMillis
            | Schema::TimestampMicros
            | Schema::LocalTimestampMillis
            | Schema::LocalTimestampMicros => "i64".to_string(),
            Schema::Float => "f32".to_string(),
            Schema::Double => "f64".to_string(),
            Schema::Bytes | Schema::Decimal(_) => "Vec<u8>".to_string(),
            Schema::String | Schema::Uuid => "String".to_string(),
            Schema::Duration => "[u8; 12]".to_string(),
            Schema::Array(items) => format!("Vec<{}>", self.rust_type(items, owner, field, true)),
            Schema::Map(values) => {
                self.uses_map = true;
                format!("HashMap<String, {}>", self.rust_type(values, owner, field, true))
            }
            Schema::Union(union) => self.union_type(union.variants(), owner, field, in_container),
            Schema::Record(record) => self.named_ref(&record.name, owner, in_container),
            Schema::Enum(e) => self.named_ref(&e.name, owner, in_container),
            Schema::Fixed(fixed) => self.named_ref(&fixed.name, owner, in_container),
            Schema::Ref { name } => self.named_ref(name, owner, in_container),
        }
    }

    fn union_type(&mut self, variants: &[Schema], owner: &str, field: &str, in_container: bool) -> String {
        let non_null: Vec<&Schema> = variants.iter().filter(|v| !matches!(v, Schema::Null)).collect();
        let nullable = non_null.len() < variants.len();

        let inner = match non_null.as_slice() {
            [] => return "()".to_string(),
            [single] => self.rust_type(single, owner, field, in_container),
            many => self.companion_enum(many, owner, field),
        };

        if nullable {
            // Option does not box, so a self reference keeps its Box
            format!("Option<{}>", inner)
        } else {
            inner
        }
    }

    /// Generate an untagged enum for a union with several non-null branches
    fn companion_enum(&mut self, branches: &[&Schema], owner: &str, field: &str) -> String {
        let enum_name = format!(
            "{}{}",
            self.namer.type_name(owner),
            self.namer.type_name(&to_snake_case(field))
        );

        let mut output = String::new();
        output.push_str(&format!("/// Union type of `{}.{}`\n", self.namer.type_name(owner), field));
        output.push_str(&self.derive_line());
        output.push_str("#[serde(untagged)]\n");
        output.push_str(&format!("pub enum {} {{\n", enum_name));

        for branch in branches {
            let variant = self.branch_variant(branch);
            let ty = self.rust_type(branch, owner, field, true);
            output.push_str(&format!("    {}({}),\n", variant, ty));
        }
        output.push_str("}\n");

        self.companions.push(output);
        enum_name
    }

    fn branch_variant(&self, schema: &Schema) -> String {
        let label = match schema {
            Schema::Record(record) => fullname(&record.name),
            Schema::Enum(e) => fullname(&e.name),
            Schema::Fixed(fixed) => fullname(&fixed.name),
            Schema::Ref { name } => fullname(name),
            Schema::Boolean => "boolean".to_string(),
            Schema::Int => "int".to_string(),
            Schema::Long => "long".to_string(),
            Schema::Float => "float".to_string(),
            Schema::Double => "double".to_string(),
            Schema::Bytes => "bytes".to_string(),
            Schema::String => "string".to_string(),
            Schema::Array(_) => "array".to_string(),
            Schema::Map(_) => "map".to_string(),
            _ => "value".to_string(),
        };
        self.namer.type_name(&label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingConfig;

    fn render_str(json: &str) -> String {
        let schema = Schema::parse_str(json).unwrap();
        render(
            &schema,
            &SchemaFile::new("test.avsc"),
            &Namer::new(NamingConfig::default()),
            &CodegenConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_record_fields() {
        let code = render_str(
            r#"{
                "type": "record", "name": "User", "namespace": "com.acme",
                "doc": "A registered user",
                "fields": [
                    {"name": "id", "type": "string"},
                    {"name": "firstName", "type": "string"},
                    {"name": "age", "type": ["null", "int"], "default": null},
                    {"name": "tags", "type": {"type": "array", "items": "string"}},
                    {"name": "attrs", "type": {"type": "map", "values": "long"}},
                    {"name": "type", "type": "boolean"}
                ]
            }"#,
        );

        assert!(code.contains("//! Generated from `test.avsc` - DO NOT EDIT"));
        assert!(code.contains("/// A registered user\n"));
        assert!(code.contains("pub struct User {"));
        assert!(code.contains("    pub id: String,"));
        assert!(code.contains("    #[serde(rename = \"firstName\")]\n    pub first_name: String,"));
        assert!(code.contains("    pub age: Option<i32>,"));
        assert!(code.contains("    pub tags: Vec<String>,"));
        assert!(code.contains("    pub attrs: HashMap<String, i64>,"));
        assert!(code.contains("use std::collections::HashMap;"));
        assert!(code.contains("    pub r#type: bool,"));
        assert!(!code.contains("rename = \"type\""));
    }

    #[test]
    fn test_logical_types_follow_their_encoding() {
        let code = render_str(
            r#"{
                "type": "record", "name": "Reading",
                "fields": [
                    {"name": "at", "type": {"type": "long", "logicalType": "local-timestamp-millis"}},
                    {"name": "day", "type": {"type": "int", "logicalType": "date"}},
                    {"name": "amount", "type": {"type": "bytes", "logicalType": "big-decimal"}},
                    {"name": "price", "type": {"type": "bytes", "logicalType": "decimal", "precision": 9, "scale": 2}},
                    {"name": "id", "type": {"type": "string", "logicalType": "uuid"}}
                ]
            }"#,
        );
        assert!(code.contains("    pub at: i64,"));
        assert!(code.contains("    pub day: i32,"));
        assert!(code.contains("    pub amount: Vec<u8>,"));
        assert!(code.contains("    pub price: Vec<u8>,"));
        assert!(code.contains("    pub id: String,"));
    }

    #[test]
    fn test_null_namespace_reference_path() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record", "name": "com.acme.Holder",
                "fields": [{"name": "p", "type": {"type": "enum", "name": "__avrogen_null.Plain", "symbols": ["A"]}}]
            }"#,
        )
        .unwrap();
        let code = render(
            &schema,
            &SchemaFile::new("holder.avsc"),
            &Namer::new(NamingConfig::default()),
            &CodegenConfig::default(),
        )
        .unwrap();
        assert!(code.contains("    pub p: super::plain::Plain,"));
    }

    #[test]
    fn test_enum_symbols() {
        let code = render_str(r#"{"type": "enum", "name": "Color", "symbols": ["RED", "Green"]}"#);
        assert!(code.contains("pub enum Color {"));
        assert!(code.contains("    #[serde(rename = \"RED\")]\n    Red,"));
        assert!(code.contains("    Green,"));
    }

    #[test]
    fn test_fixed() {
        let small = render_str(r#"{"type": "fixed", "name": "Md5", "size": 16}"#);
        assert!(small.contains("pub struct Md5(pub [u8; 16]);"));

        let large = render_str(r#"{"type": "fixed", "name": "Blob", "size": 64}"#);
        assert!(large.contains("pub struct Blob(pub Vec<u8>);"));
    }

    #[test]
    fn test_references_and_recursion() {
        let code = render_str(
            r#"{
                "type": "record", "name": "Node", "namespace": "tree",
                "fields": [
                    {"name": "label", "type": {"type": "enum", "name": "Label", "symbols": ["A"]}},
                    {"name": "next", "type": ["null", "Node"], "default": null},
                    {"name": "children", "type": {"type": "array", "items": "Node"}}
                ]
            }"#,
        );
        assert!(code.contains("    pub label: super::tree_label::Label,"));
        assert!(code.contains("    pub next: Option<Box<Node>>,"));
        assert!(code.contains("    pub children: Vec<Node>,"));
        // Nested named types get their own module
        assert!(!code.contains("pub enum Label"));
    }

    #[test]
    fn test_union_companion_enum() {
        let code = render_str(
            r#"{
                "type": "record", "name": "Event",
                "fields": [
                    {"name": "payload", "type": ["null", "string", "long"], "default": null}
                ]
            }"#,
        );
        assert!(code.contains("    pub payload: Option<EventPayload>,"));
        assert!(code.contains("#[serde(untagged)]\npub enum EventPayload {"));
        assert!(code.contains("    String(String),"));
        assert!(code.contains("    Long(i64),"));
    }
}
