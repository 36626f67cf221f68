//! Effective configuration with provenance
//!
//! Loads the configuration layers, merges and finalizes them into one root
//! aggregate, and derives the per-machine aggregates from it. Every loaded
//! file is recorded with its SHA-256 digest.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::defaults::BuiltinDefaults;
use super::document::MachineFile;
use super::merge::merge_layers;
use crate::environment::Environment;
use crate::vm::{normalize_machine_name, ValidationReport, VmConfig};

/// Schema version for the JSON rendering
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "vmcfg/effective_config@1";

/// Provider whose overrides apply when none is chosen
pub const DEFAULT_PROVIDER: &str = "virtualbox";

/// File name looked up in the project directory
pub const MACHINE_FILE_NAME: &str = "Machinefile.toml";

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Host,
    Project,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    /// Origin of this source
    pub origin: ConfigOrigin,

    /// File path (None for builtin)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Merged and finalized configuration for a project
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,

    root: VmConfig,
}

impl EffectiveConfig {
    /// Build effective config from the built-in defaults and the optional
    /// host and project machine files. Missing files are skipped.
    pub fn build(
        host_config_path: Option<&Path>,
        project_config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: Built-in defaults
        layers.push(BuiltinDefaults::default().to_vm_config());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        });

        // Layer 2: Host config
        if let Some(path) = host_config_path {
            if path.exists() {
                let (layer, digest) = Self::load_machine_file(path)?;
                layers.push(layer);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Host,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            }
        }

        // Layer 3: Project config
        if let Some(path) = project_config_path {
            if path.exists() {
                let (layer, digest) = Self::load_machine_file(path)?;
                layers.push(layer);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Project,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            }
        }

        debug!(layers = layers.len(), "building effective configuration");
        Ok(Self::from_layers(layers, sources))
    }

    /// Merge already-built layers and finalize the result
    pub fn from_layers(layers: Vec<VmConfig>, sources: Vec<ConfigSource>) -> Self {
        let mut root = merge_layers(layers);
        root.finalize();

        Self {
            created_at: Utc::now(),
            sources,
            root,
        }
    }

    /// Default host machine file (~/.config/vmcfg/Machinefile.toml)
    pub fn default_host_path() -> Option<PathBuf> {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".config/vmcfg").join(MACHINE_FILE_NAME))
    }

    /// Load and interpret a machine file, returning the layer and digest
    fn load_machine_file(path: &Path) -> Result<(VmConfig, String), ConfigError> {
        let bytes = fs::read(path)?;

        // Compute digest
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes).map_err(|e| {
            ConfigError::InvalidDocument(format!("{}: invalid UTF-8: {}", path.display(), e))
        })?;

        let layer = MachineFile::parse(&contents)?.to_vm_config();
        debug!(path = %path.display(), %digest, "loaded machine file");
        Ok((layer, digest))
    }

    /// The merged root aggregate
    pub fn root(&self) -> &VmConfig {
        &self.root
    }

    /// Machines in definition order
    pub fn machine_names(&self) -> Vec<&str> {
        self.root.machine_names()
    }

    /// Defined machine name matching `requested` (`:web` finds `web`)
    pub fn resolve_machine(&self, requested: &str) -> Option<String> {
        let name = normalize_machine_name(requested);
        self.root.machines().contains(&name).then_some(name)
    }

    /// Effective aggregate for one machine under `provider`.
    ///
    /// Layers, in order: the root, the root's override for `provider`, the
    /// machine's own blocks, the machine's override for `provider`.
    pub fn machine(&self, name: &str, provider: &str) -> Option<VmConfig> {
        let definition = self.root.machines().get(name)?;
        let machine_layer = definition.materialize();

        let mut layers = vec![self.root.clone()];
        if let Some(over) = self.root.providers().get(provider) {
            layers.push(over.materialize().vm);
        }
        let machine_override = machine_layer
            .providers()
            .get(provider)
            .map(|over| over.materialize().vm);
        layers.push(machine_layer);
        if let Some(over) = machine_override {
            layers.push(over);
        }

        debug!(machine = name, provider, layers = layers.len(), "materializing machine");
        let mut merged = merge_layers(layers);
        merged.finalize();
        Some(merged)
    }

    /// Validate one machine; `None` if it is not defined
    pub fn validate_machine(
        &self,
        name: &str,
        provider: &str,
        env: &Environment,
    ) -> Option<ValidationReport> {
        self.machine(name, provider).map(|config| config.validate(env))
    }

    /// Validate every machine in definition order
    pub fn validate_all(&self, env: &Environment, provider: &str) -> Vec<(String, ValidationReport)> {
        self.machine_names()
            .into_iter()
            .filter_map(|name| {
                self.validate_machine(name, provider, env)
                    .map(|report| (name.to_string(), report))
            })
            .collect()
    }

    /// JSON rendering of `config` (the root when None) with provenance
    pub fn to_value(&self, machine: Option<(&str, &VmConfig)>) -> Value {
        let (name, config) = match machine {
            Some((name, config)) => (Some(name), config),
            None => (None, &self.root),
        };

        json!({
            "schema_version": SCHEMA_VERSION,
            "schema_id": SCHEMA_ID,
            "created_at": self.created_at,
            "machine": name,
            "sources": self.sources,
            "config": config.to_value(),
        })
    }

    /// Serialize to JSON
    pub fn to_json(&self, machine: Option<(&str, &VmConfig)>) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_value(machine))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read machine file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid machine file: {0}")]
    InvalidDocument(String),
}
