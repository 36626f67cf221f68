//! Provider overrides

use std::fmt;

use serde_json::Value;

use super::keyed::Keyed;
use super::{Block, Settings, VmConfig};
use crate::config::merge_settings;

/// What a provider block configures
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// Free-form provider settings (memory, cpus, gui, ...)
    pub settings: Settings,
    /// Machine overrides applied only when this provider is selected
    pub vm: VmConfig,
}

impl ProviderConfig {
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.settings.insert(key.into(), value);
    }

    /// Deep-merge `overlay` into the current settings
    pub fn merge_settings(&mut self, overlay: Settings) {
        merge_settings(&mut self.settings, overlay);
    }
}

/// A named provider with its deferred configuration block
#[derive(Clone)]
pub struct ProviderOverride {
    name: String,
    block: Option<Block<ProviderConfig>>,
}

impl fmt::Debug for ProviderOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderOverride")
            .field("name", &self.name)
            .field("block", &self.block.is_some())
            .finish()
    }
}

impl ProviderOverride {
    pub fn new(name: impl Into<String>, block: Option<Block<ProviderConfig>>) -> Self {
        Self {
            name: name.into(),
            block,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_block(&self) -> bool {
        self.block.is_some()
    }

    /// Replace the block
    pub fn set_block(&mut self, block: Option<Block<ProviderConfig>>) {
        self.block = block;
    }

    /// Run the block against a fresh [`ProviderConfig`]
    pub fn materialize(&self) -> ProviderConfig {
        let mut config = ProviderConfig::default();
        if let Some(ref block) = self.block {
            block(&mut config);
        }
        config
    }
}

/// Provider name -> override, in first-declaration order
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    entries: Keyed<ProviderOverride>,
}

impl ProviderRegistry {
    /// Store `(name, block)`, replacing any earlier declaration
    pub fn set(&mut self, name: &str, block: Option<Block<ProviderConfig>>) {
        self.get_or_create(name).set_block(block);
    }

    /// Read-only lookup; never creates an entry
    pub fn get(&self, name: &str) -> Option<&ProviderOverride> {
        self.entries.get(name)
    }

    /// Lookup that creates an empty override on first reference
    pub fn get_or_create(&mut self, name: &str) -> &mut ProviderOverride {
        self.entries
            .get_or_insert_with(name, || ProviderOverride::new(name, None))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderOverride> {
        self.entries.iter().map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key-wise merge, `other` replacing whole overrides on collision
    pub fn merged(&self, other: &ProviderRegistry) -> ProviderRegistry {
        ProviderRegistry {
            entries: self.entries.merged(&other.entries),
        }
    }
}
