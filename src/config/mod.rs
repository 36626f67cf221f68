//! Configuration layering
//!
//! Builds the effective configuration from, in order of precedence:
//! 1. Built-in defaults
//! 2. Host machine file (~/.config/vmcfg/Machinefile.toml)
//! 3. Project machine file (./Machinefile.toml)
//!
//! and then, per machine, the provider and sub-machine layers on top.

mod defaults;
mod document;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use document::{
    DefineEntry, FolderEntry, MachineFile, NetworkEntry, PortEntry, ProviderEntry,
    ProvisionEntry, VmSection,
};
pub use effective::{
    ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, DEFAULT_PROVIDER,
    MACHINE_FILE_NAME, SCHEMA_ID, SCHEMA_VERSION,
};
pub use merge::{deep_merge, merge_layers, merge_settings};
