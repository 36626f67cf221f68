//! Network declarations
//!
//! Declarations are stored verbatim; nothing is checked until validation.

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Kind of network attached to the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkType {
    HostOnly,
    Bridged,
    /// Unrecognized type, kept so validation can report it
    Other(String),
}

impl NetworkType {
    /// Parse a type name. A leading `:` is accepted and ignored.
    pub fn parse(s: &str) -> Self {
        match s.trim_start_matches(':') {
            "hostonly" => NetworkType::HostOnly,
            "bridged" => NetworkType::Bridged,
            other => NetworkType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NetworkType::HostOnly => "hostonly",
            NetworkType::Bridged => "bridged",
            NetworkType::Other(s) => s,
        }
    }
}

impl From<&str> for NetworkType {
    fn from(s: &str) -> Self {
        NetworkType::parse(s)
    }
}

impl Serialize for NetworkType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One positional network argument
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkArg {
    /// A symbolic flag such as `:dhcp`
    Symbol(String),
    Value(Value),
}

impl NetworkArg {
    pub fn symbol(name: &str) -> Self {
        NetworkArg::Symbol(name.trim_start_matches(':').to_string())
    }

    pub fn string(s: impl Into<String>) -> Self {
        NetworkArg::Value(Value::String(s.into()))
    }

    /// Strings written as `:name` become symbols, everything else is kept as is.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) if s.starts_with(':') && s.len() > 1 => NetworkArg::symbol(&s),
            other => NetworkArg::Value(other),
        }
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(self, NetworkArg::Symbol(s) if s == name)
    }

    /// String payload, if this is a plain string argument
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NetworkArg::Value(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            NetworkArg::Symbol(s) => Value::String(format!(":{}", s)),
            NetworkArg::Value(v) => v.clone(),
        }
    }
}

impl Serialize for NetworkArg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// A `(type, args)` pair in declaration order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkDeclaration {
    #[serde(rename = "type")]
    pub kind: NetworkType,
    pub args: Vec<NetworkArg>,
}

impl NetworkDeclaration {
    pub fn new(kind: impl Into<NetworkType>, args: Vec<NetworkArg>) -> Self {
        Self {
            kind: kind.into(),
            args,
        }
    }
}
