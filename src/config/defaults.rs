//! Built-in machine defaults (layer 1)
//!
//! Hardcoded defaults every machine starts from.

use serde::{Deserialize, Serialize};

use crate::vm::{ForwardPortOptions, PortRange, ShareFolderOptions, VmConfig};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Host ports available for automatic collision fixes (default: 2200..=2250)
    pub auto_port_range: (u16, u16),

    /// Guest OS family (default: "linux")
    pub guest: String,

    /// Guest SSH port (default: 22)
    pub ssh_guest_port: u16,

    /// Host port forwarded to guest SSH (default: 2222)
    pub ssh_host_port: u16,

    /// Name of the project root shared folder (default: "v-root")
    pub root_share_name: String,

    /// Where the project root is mounted in the guest (default: "/vagrant")
    pub root_share_guest_path: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            auto_port_range: (2200, 2250),
            guest: "linux".to_string(),
            ssh_guest_port: 22,
            ssh_host_port: 2222,
            root_share_name: "v-root".to_string(),
            root_share_guest_path: "/vagrant".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to an aggregate layer for merging
    pub fn to_vm_config(&self) -> VmConfig {
        let mut config = VmConfig::new();
        config.auto_port_range = Some(PortRange {
            start: self.auto_port_range.0,
            end: self.auto_port_range.1,
        });
        config.guest = Some(self.guest.clone());
        config.forward_port(
            self.ssh_guest_port,
            self.ssh_host_port,
            ForwardPortOptions::default().name("ssh").auto(true),
        );
        config.share_folder(
            &self.root_share_name,
            self.root_share_guest_path.clone(),
            ".",
            ShareFolderOptions::default(),
        );
        config
    }
}
