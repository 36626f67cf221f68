//! Sub-machine registry
//!
//! Multi-machine setups define each machine by name. Definitions accumulate:
//! repeated `define` calls for one name merge options and append blocks, and
//! the blocks are replayed in order when the machine is materialized.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use super::{Block, Settings, VmConfig};

/// Name given to the implicit machine when none is defined
pub const DEFAULT_VM_NAME: &str = "default";

/// Options and blocks accumulated for one machine name
#[derive(Clone, Default)]
pub struct SubMachineDefinition {
    options: Settings,
    blocks: Vec<Block<VmConfig>>,
}

impl fmt::Debug for SubMachineDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubMachineDefinition")
            .field("options", &self.options)
            .field("blocks", &self.blocks.len())
            .finish()
    }
}

impl SubMachineDefinition {
    pub fn options(&self) -> &Settings {
        &self.options
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Replay every block, in order, against a fresh aggregate
    pub fn materialize(&self) -> VmConfig {
        let mut config = VmConfig::new();
        for block in &self.blocks {
            block(&mut config);
        }
        config
    }

    fn absorb(&mut self, options: Settings, block: Option<Block<VmConfig>>) {
        // Shallow: later keys replace earlier ones wholesale
        self.options.extend(options);
        if let Some(block) = block {
            self.blocks.push(block);
        }
    }
}

/// Ordered machine names plus their definitions
#[derive(Debug, Clone, Default)]
pub struct SubMachineRegistry {
    keys: Vec<String>,
    definitions: BTreeMap<String, SubMachineDefinition>,
}

impl SubMachineRegistry {
    pub fn define(&mut self, name: &str, options: Option<Settings>, block: Option<Block<VmConfig>>) {
        let name = normalize_machine_name(name);
        debug!(machine = %name, has_block = block.is_some(), "define");

        self.keys.push(name.clone());
        self.definitions
            .entry(name)
            .or_default()
            .absorb(options.unwrap_or_default(), block);
    }

    /// Every `define` call's name, duplicates included
    pub fn defined_vm_keys(&self) -> &[String] {
        &self.keys
    }

    /// Names deduplicated by first occurrence
    pub fn machine_names(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for key in &self.keys {
            if !seen.contains(&key.as_str()) {
                seen.push(key.as_str());
            }
        }
        seen
    }

    pub fn get(&self, name: &str) -> Option<&SubMachineDefinition> {
        self.definitions.get(normalize_machine_name(name).as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(normalize_machine_name(name).as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Inject the implicit default machine when nothing was defined
    pub fn finalize(&mut self) {
        if self.machine_names().is_empty() {
            debug!("no machines defined, adding '{}'", DEFAULT_VM_NAME);
            self.define(DEFAULT_VM_NAME, None, None);
        }
    }

    /// Names concatenate; same-name definitions merge options and blocks
    pub fn merged(&self, other: &SubMachineRegistry) -> SubMachineRegistry {
        let mut result = self.clone();
        result.keys.extend(other.keys.iter().cloned());
        for (name, def) in &other.definitions {
            let target = result.definitions.entry(name.clone()).or_default();
            target.options.extend(def.options.clone());
            target.blocks.extend(def.blocks.iter().cloned());
        }
        result
    }
}

/// Machine names ignore surrounding whitespace and a leading `:`
pub fn normalize_machine_name(name: &str) -> String {
    name.trim().trim_start_matches(':').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::block;
    use serde_json::json;

    fn opts(value: serde_json::Value) -> Option<Settings> {
        value.as_object().cloned()
    }

    #[test]
    fn test_define_accumulates() {
        let mut registry = SubMachineRegistry::default();
        registry.define(
            "web",
            opts(json!({"opt": 1})),
            Some(block(|c: &mut VmConfig| c.box_name = Some("one".to_string()))),
        );
        registry.define(
            "web",
            opts(json!({"opt2": 2})),
            Some(block(|c: &mut VmConfig| c.host_name = Some("web".to_string()))),
        );

        let def = registry.get("web").unwrap();
        assert_eq!(def.options()["opt"], 1);
        assert_eq!(def.options()["opt2"], 2);
        assert_eq!(def.block_count(), 2);

        let config = def.materialize();
        assert_eq!(config.box_name.as_deref(), Some("one"));
        assert_eq!(config.host_name.as_deref(), Some("web"));
    }

    #[test]
    fn test_options_shallow_overwrite() {
        let mut registry = SubMachineRegistry::default();
        registry.define("db", opts(json!({"nested": {"a": 1}})), None);
        registry.define("db", opts(json!({"nested": {"b": 2}})), None);

        let def = registry.get("db").unwrap();
        assert_eq!(def.options()["nested"], json!({"b": 2}));
    }

    #[test]
    fn test_keys_keep_duplicates_names_dedup() {
        let mut registry = SubMachineRegistry::default();
        registry.define("web", None, None);
        registry.define("db", None, None);
        registry.define("web", None, None);

        assert_eq!(registry.defined_vm_keys(), &["web", "db", "web"]);
        assert_eq!(registry.machine_names(), vec!["web", "db"]);
    }

    #[test]
    fn test_name_normalized() {
        let mut registry = SubMachineRegistry::default();
        registry.define(":web ", None, None);
        assert_eq!(registry.machine_names(), vec!["web"]);
        assert!(registry.get("web").is_some());
        assert!(registry.get(":web").is_some());
    }

    #[test]
    fn test_contains_normalizes_lookup() {
        let mut registry = SubMachineRegistry::default();
        registry.define("web", None, None);

        assert!(registry.contains("web"));
        assert!(registry.contains(":web"));
        assert!(registry.contains(" web "));
        assert!(!registry.contains("db"));
        assert_eq!(normalize_machine_name(" :web"), "web");
    }

    #[test]
    fn test_finalize_adds_default_once() {
        let mut registry = SubMachineRegistry::default();
        registry.finalize();
        registry.finalize();

        assert_eq!(registry.defined_vm_keys(), &[DEFAULT_VM_NAME]);
        assert_eq!(registry.get(DEFAULT_VM_NAME).unwrap().block_count(), 0);
    }

    #[test]
    fn test_finalize_keeps_explicit_machines() {
        let mut registry = SubMachineRegistry::default();
        registry.define("web", None, None);
        registry.finalize();
        assert_eq!(registry.machine_names(), vec!["web"]);
    }

    #[test]
    fn test_merged() {
        let mut parent = SubMachineRegistry::default();
        parent.define("web", opts(json!({"primary": true})), Some(block(|c: &mut VmConfig| {
            c.box_name = Some("parent".to_string());
        })));

        let mut child = SubMachineRegistry::default();
        child.define("db", None, None);
        child.define("web", opts(json!({"primary": false})), Some(block(|c: &mut VmConfig| {
            c.guest = Some("freebsd".to_string());
        })));

        let merged = parent.merged(&child);
        assert_eq!(merged.machine_names(), vec!["web", "db"]);

        let web = merged.get("web").unwrap();
        assert_eq!(web.options()["primary"], false);
        assert_eq!(web.block_count(), 2);

        let config = web.materialize();
        assert_eq!(config.box_name.as_deref(), Some("parent"));
        assert_eq!(config.guest.as_deref(), Some("freebsd"));

        assert_eq!(parent.get("web").unwrap().block_count(), 1);
    }
}
