//! Keyed message templates.
//!
//! Validation code refers to messages by a dotted key (`vm.box_missing`) and a
//! list of named parameters. The catalog owns the English text and renders it
//! with `%{param}` interpolation. A TOML locale file can replace any subset of
//! the built-in templates.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

mod builtin;

pub use builtin::BUILTIN_MESSAGES;

/// Error types for loading message templates
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Failed to read locale file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Template '{0}' must be a string")]
    InvalidTemplate(String),
}

/// Message catalog keyed by dotted message key.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    templates: HashMap<String, String>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MessageCatalog {
    /// Catalog holding only the built-in English templates.
    pub fn builtin() -> Self {
        let templates = BUILTIN_MESSAGES
            .iter()
            .map(|(key, text)| (key.to_string(), text.to_string()))
            .collect();
        Self { templates }
    }

    /// Catalog with no templates at all. Every lookup renders as missing.
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Built-in templates overlaid with the entries of a locale file.
    pub fn with_locale_file(path: &Path) -> Result<Self, MessageError> {
        let contents = fs::read_to_string(path)?;
        let mut catalog = Self::builtin();
        catalog.extend_from_toml(&contents)?;
        Ok(catalog)
    }

    /// Overlay templates from a TOML document.
    ///
    /// Nested tables are flattened into dotted keys, so `[vm] box_missing = ".."`
    /// replaces `vm.box_missing`.
    pub fn extend_from_toml(&mut self, contents: &str) -> Result<(), MessageError> {
        let table: toml::Table = toml::from_str(contents)?;
        let mut flat = Vec::new();
        flatten("", table, &mut flat)?;
        self.templates.extend(flat);
        Ok(())
    }

    /// Add or replace one template.
    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(key.into(), template.into());
    }

    /// Whether a template exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    /// Render `key` with named parameters.
    ///
    /// Placeholders without a matching parameter are left untouched.
    pub fn render(&self, key: &str, params: &[(&str, &str)]) -> String {
        match self.templates.get(key) {
            Some(template) => interpolate(template, params),
            None => format!("translation missing: {}", key),
        }
    }
}

fn flatten(
    prefix: &str,
    table: toml::Table,
    out: &mut Vec<(String, String)>,
) -> Result<(), MessageError> {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            toml::Value::String(s) => out.push((full_key, s)),
            toml::Value::Table(nested) => flatten(&full_key, nested, out)?,
            _ => return Err(MessageError::InvalidTemplate(full_key)),
        }
    }
    Ok(())
}

fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match params.iter().find(|(k, _)| *k == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("%{");
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                // Unterminated placeholder, copy verbatim
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}
