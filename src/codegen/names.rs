//! Name Conversion
//!
//! Maps Avro names onto Rust identifiers:
//! - Type names and enum symbols to PascalCase, respecting acronyms
//! - Field names to snake_case
//! - Full names to module names
//! - Rust keywords to raw identifiers

use crate::config::NamingConfig;

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be raw identifiers
const RESERVED: &[&str] = &["self", "Self", "super", "crate"];

/// Converts Avro names to Rust identifiers
#[derive(Debug, Clone, Default)]
pub struct Namer {
    config: NamingConfig,
}

impl Namer {
    pub fn new(config: NamingConfig) -> Self {
        Self { config }
    }

    /// Rust type name for an Avro name (namespace dropped)
    pub fn type_name(&self, fullname: &str) -> String {
        let simple = fullname.rsplit('.').next().unwrap_or(fullname);
        let name = if has_separators(simple) {
            self.to_pascal_case(simple)
        } else {
            // Already PascalCase - preserve it, only fix the first letter
            capitalize(simple)
        };
        escape(&name)
    }

    /// Enum variant for an Avro enum symbol or union branch
    pub fn variant_name(&self, symbol: &str) -> String {
        if !has_separators(symbol) && !is_screaming(symbol) {
            return escape(&capitalize(symbol));
        }
        escape(&self.to_pascal_case(symbol))
    }

    /// Struct field for an Avro field name
    pub fn field_name(&self, name: &str) -> String {
        escape(&to_snake_case(name))
    }

    /// Module (file stem) for a full name: "com.acme.UserId" -> "com_acme_user_id"
    pub fn module_name(&self, fullname: &str) -> String {
        fullname
            .split('.')
            .filter(|s| !s.is_empty())
            .map(to_snake_case)
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Convert string to PascalCase, respecting acronyms
    fn to_pascal_case(&self, s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        let mut current_word = String::new();

        for c in s.chars() {
            if c == '_' || c == '-' || c == ' ' {
                if !current_word.is_empty() {
                    result.push_str(&self.case_word(&current_word));
                    current_word.clear();
                }
            } else {
                current_word.push(c);
            }
        }

        if !current_word.is_empty() {
            result.push_str(&self.case_word(&current_word));
        }

        result
    }

    /// Apply casing to a word, preserving acronyms
    fn case_word(&self, word: &str) -> String {
        let upper = word.to_uppercase();

        if self.config.acronyms.contains(&upper) {
            return upper;
        }

        if self.config.preserve_screaming_case && is_screaming(word) {
            return word.to_string();
        }

        let mut chars = word.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => {
                let mut result = first.to_uppercase().to_string();
                for c in chars {
                    result.push(c.to_ascii_lowercase());
                }
                result
            }
        }
    }
}

fn has_separators(s: &str) -> bool {
    s.contains('_') || s.contains('-') || s.contains(' ')
}

fn is_screaming(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_alphabetic())
        && s.chars().all(|c| !c.is_ascii_lowercase())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// "firstName" -> "first_name", "HTTPStatus" -> "http_status"
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' || c == '_' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map(|n| n.is_ascii_lowercase()).unwrap_or(false);
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if boundary && !result.ends_with('_') && !result.is_empty() {
                result.push('_');
            }
        }
        result.push(c.to_ascii_lowercase());
    }

    result
}

/// Make an identifier safe to use in generated code
pub fn escape(ident: &str) -> String {
    if RESERVED.contains(&ident) {
        return format!("{}_", ident);
    }
    if KEYWORDS.contains(&ident) {
        return format!("r#{}", ident);
    }
    if ident.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true) {
        return format!("_{}", ident);
    }
    ident.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namer() -> Namer {
        Namer::new(NamingConfig::default())
    }

    #[test]
    fn test_type_name() {
        let namer = namer();
        assert_eq!(namer.type_name("com.acme.User"), "User");
        assert_eq!(namer.type_name("com.acme.userProfile"), "UserProfile");
        assert_eq!(namer.type_name("order_line"), "OrderLine");
        assert_eq!(namer.type_name("api_key"), "APIKey");
    }

    #[test]
    fn test_variant_name() {
        let namer = namer();
        assert_eq!(namer.variant_name("RED"), "Red");
        assert_eq!(namer.variant_name("DARK_BLUE"), "DarkBlue");
        assert_eq!(namer.variant_name("pending"), "Pending");
        assert_eq!(namer.variant_name("Self"), "Self_");
    }

    #[test]
    fn test_field_name() {
        let namer = namer();
        assert_eq!(namer.field_name("firstName"), "first_name");
        assert_eq!(namer.field_name("HTTPStatus"), "http_status");
        assert_eq!(namer.field_name("id"), "id");
        assert_eq!(namer.field_name("type"), "r#type");
        assert_eq!(namer.field_name("self"), "self_");
        assert_eq!(namer.field_name("2fa"), "_2fa");
    }

    #[test]
    fn test_module_name() {
        let namer = namer();
        assert_eq!(namer.module_name("com.acme.UserId"), "com_acme_user_id");
        assert_eq!(namer.module_name("Standalone"), "standalone");
    }

    #[test]
    fn test_screaming_preserved_when_configured() {
        let namer = Namer::new(NamingConfig {
            preserve_screaming_case: true,
            ..NamingConfig::default()
        });
        assert_eq!(namer.variant_name("DARK_BLUE"), "DARKBLUE");
    }
}
