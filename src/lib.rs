//! vm-config - layered virtual machine configuration
//!
//! Machine definitions (box, forwarded ports, shared folders, networks,
//! providers, provisioners, sub-machines) are declared in layers, merged in
//! order, finalized and validated before any machine action runs.

pub mod config;
pub mod environment;
pub mod provisioners;
pub mod vm;

pub use config::{ConfigError, EffectiveConfig, MachineFile};
pub use environment::Environment;
pub use provisioners::{ProvisionerPlugin, ProvisionerRegistry};
pub use vm::{IssueCode, ValidationReport, VmConfig};
