//! Provisioner plugins
//!
//! A plugin owns the validation rules for one provisioner name. Declarations
//! look their plugin up here and hand it their materialized settings.

mod file;
mod shell;

pub use file::FileProvisioner;
pub use shell::ShellProvisioner;

use crate::environment::Environment;
use crate::vm::{Settings, ValidationReport};

/// Validation hook for one provisioner type
pub trait ProvisionerPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Append any problems with `settings` to `report`
    fn validate(&self, settings: &Settings, env: &Environment, report: &mut ValidationReport);
}

/// Registered plugins by name
#[derive(Default)]
pub struct ProvisionerRegistry {
    plugins: Vec<Box<dyn ProvisionerPlugin>>,
}

impl ProvisionerRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `shell` and `file`
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(ShellProvisioner);
        registry.register(FileProvisioner);
        registry
    }

    /// Add a plugin, replacing any plugin already registered under its name
    pub fn register(&mut self, plugin: impl ProvisionerPlugin + 'static) {
        self.plugins.retain(|p| p.name() != plugin.name());
        self.plugins.push(Box::new(plugin));
    }

    pub fn get(&self, name: &str) -> Option<&dyn ProvisionerPlugin> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }
}

/// String setting, treating JSON null as absent
pub(crate) fn setting_str<'a>(settings: &'a Settings, key: &str) -> Option<&'a str> {
    settings.get(key).and_then(|v| v.as_str())
}

/// Whether a key is set to anything other than null
pub(crate) fn setting_present(settings: &Settings, key: &str) -> bool {
    settings.get(key).map_or(false, |v| !v.is_null())
}
