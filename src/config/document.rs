//! Machine file documents
//!
//! A `Machinefile.toml` describes one configuration layer. Every repeated
//! section is an array of tables so declaration order survives parsing.
//! Nested `config`, `override` and `settings` tables are not applied
//! immediately: they become deferred blocks that replay the table against
//! their target when it is materialized.

use serde::Deserialize;
use serde_json::Value;

use super::effective::ConfigError;
use crate::vm::{
    block, ForwardPortOptions, NetworkArg, PortRange, Protocol, ProviderConfig, Settings,
    ShareFolderOptions, VmConfig,
};

/// Top-level document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineFile {
    #[serde(default)]
    pub vm: VmSection,
}

/// A `[vm]`-shaped table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VmSection {
    #[serde(rename = "box")]
    pub box_name: Option<String>,
    pub box_url: Option<String>,
    pub base_mac: Option<String>,
    pub guest: Option<String>,
    pub host_name: Option<String>,
    pub auto_port_range: Option<(u16, u16)>,

    #[serde(default)]
    pub forwarded_port: Vec<PortEntry>,
    #[serde(default)]
    pub shared_folder: Vec<FolderEntry>,
    #[serde(default)]
    pub network: Vec<NetworkEntry>,
    #[serde(default)]
    pub provider: Vec<ProviderEntry>,
    #[serde(default)]
    pub provision: Vec<ProvisionEntry>,
    #[serde(default)]
    pub define: Vec<DefineEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortEntry {
    pub guest: u16,
    pub host: u16,
    pub name: Option<String>,
    pub protocol: Option<Protocol>,
    pub adapter: Option<u32>,
    pub auto: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolderEntry {
    pub name: String,
    pub guest_path: String,
    pub host_path: String,
    pub create: Option<bool>,
    pub owner: Option<String>,
    pub group: Option<String>,
    pub nfs: Option<bool>,
    pub transient: Option<bool>,
    pub extra: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderEntry {
    pub name: String,
    pub settings: Option<Settings>,
    #[serde(rename = "override")]
    pub vm_override: Option<Box<VmSection>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionEntry {
    pub name: String,
    pub options: Option<Settings>,
    pub settings: Option<Settings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefineEntry {
    pub name: String,
    pub options: Option<Settings>,
    pub config: Option<Box<VmSection>>,
}

impl MachineFile {
    /// Parse a machine file from a TOML string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let file: MachineFile = toml::from_str(s)?;
        file.vm.check()?;
        Ok(file)
    }

    /// Interpret the document into a fresh aggregate layer
    pub fn to_vm_config(&self) -> VmConfig {
        let mut config = VmConfig::new();
        self.vm.apply(&mut config);
        config
    }
}

impl VmSection {
    /// Structural checks serde cannot express
    fn check(&self) -> Result<(), ConfigError> {
        if let Some((start, end)) = self.auto_port_range {
            if start > end {
                return Err(ConfigError::InvalidDocument(format!(
                    "auto_port_range start {} is greater than end {}",
                    start, end
                )));
            }
        }

        for folder in &self.shared_folder {
            require_name("shared_folder", &folder.name)?;
        }
        for provider in &self.provider {
            require_name("provider", &provider.name)?;
            if let Some(ref section) = provider.vm_override {
                section.check()?;
            }
        }
        for provision in &self.provision {
            require_name("provision", &provision.name)?;
        }
        for define in &self.define {
            require_name("define", &define.name)?;
            if let Some(ref section) = define.config {
                section.check()?;
            }
        }

        Ok(())
    }

    /// Replay this table against `config`. Unset scalars leave `config` alone.
    pub fn apply(&self, config: &mut VmConfig) {
        if let Some(ref v) = self.box_name {
            config.box_name = Some(v.clone());
        }
        if let Some(ref v) = self.box_url {
            config.box_url = Some(v.clone());
        }
        if let Some(ref v) = self.base_mac {
            config.base_mac = Some(v.clone());
        }
        if let Some(ref v) = self.guest {
            config.guest = Some(v.clone());
        }
        if let Some(ref v) = self.host_name {
            config.host_name = Some(v.clone());
        }
        if let Some((start, end)) = self.auto_port_range {
            config.auto_port_range = Some(PortRange { start, end });
        }

        for port in &self.forwarded_port {
            let options = ForwardPortOptions {
                name: port.name.clone(),
                protocol: port.protocol,
                adapter: port.adapter,
                auto: port.auto,
            };
            config.forward_port(port.guest, port.host, options);
        }

        for folder in &self.shared_folder {
            let options = ShareFolderOptions {
                create: folder.create,
                owner: folder.owner.clone(),
                group: folder.group.clone(),
                nfs: folder.nfs,
                transient: folder.transient,
                extra: folder.extra.clone(),
            };
            config.share_folder(
                &folder.name,
                folder.guest_path.clone(),
                folder.host_path.clone(),
                options,
            );
        }

        for network in &self.network {
            let args = network.args.iter().cloned().map(NetworkArg::from_value).collect();
            config.network(network.kind.as_str(), args);
        }

        for provider in &self.provider {
            config.provider(&provider.name, provider_block(provider));
        }

        for provision in &self.provision {
            let settings_block = provision.settings.clone().map(|settings| {
                block(move |target: &mut Settings| {
                    target.extend(settings.clone());
                })
            });
            config.provision(&provision.name, provision.options.clone(), settings_block);
        }

        for define in &self.define {
            let config_block = define.config.clone().map(|section| {
                block(move |target: &mut VmConfig| section.apply(target))
            });
            config.define(&define.name, define.options.clone(), config_block);
        }
    }
}

fn provider_block(entry: &ProviderEntry) -> Option<crate::vm::Block<ProviderConfig>> {
    if entry.settings.is_none() && entry.vm_override.is_none() {
        return None;
    }

    let settings = entry.settings.clone();
    let vm_override = entry.vm_override.clone();
    Some(block(move |target: &mut ProviderConfig| {
        if let Some(ref settings) = settings {
            target.merge_settings(settings.clone());
        }
        if let Some(ref section) = vm_override {
            section.apply(&mut target.vm);
        }
    }))
}

fn require_name(section: &str, name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidDocument(format!(
            "[[vm.{}]] entries need a non-empty name",
            section
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::{NetworkType, DEFAULT_VM_NAME};

    const FULL: &str = r#"
[vm]
box = "precise64"
box_url = "http://files.example.com/precise64.box"
base_mac = "080027A4B2C1"
host_name = "app.local"
auto_port_range = [3000, 3100]

[[vm.forwarded_port]]
guest = 80
host = 8080

[[vm.forwarded_port]]
guest = 53
host = 5353
protocol = "udp"
name = "dns"

[[vm.shared_folder]]
name = "v-data"
guest_path = "/data"
host_path = "data"
create = true
extra = { mount_options = ["dmode=775"] }

[[vm.network]]
type = "hostonly"
args = [":dhcp"]

[[vm.network]]
type = "bridged"

[[vm.provider]]
name = "virtualbox"
settings = { memory = 1024 }
override = { box = "precise64-vbox" }

[[vm.provision]]
name = "shell"
options = { inline = "echo one" }
settings = { args = "--quiet" }

[[vm.define]]
name = "web"
options = { primary = true }
config = { host_name = "web.local" }

[[vm.define]]
name = "db"
"#;

    #[test]
    fn test_parse_full_document() {
        let config = MachineFile::parse(FULL).unwrap().to_vm_config();

        assert_eq!(config.box_name.as_deref(), Some("precise64"));
        assert_eq!(config.base_mac.as_deref(), Some("080027A4B2C1"));
        assert_eq!(config.auto_port_range, Some(PortRange { start: 3000, end: 3100 }));

        let ports = config.forwarded_ports();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].name, "2g-7sg");
        assert_eq!(ports[1].name, "dns");
        assert_eq!(ports[1].protocol, Protocol::Udp);

        let folder = config.shared_folders().get("v-data").unwrap();
        assert!(folder.create);
        assert_eq!(folder.extra.as_ref().unwrap()["mount_options"][0], "dmode=775");

        assert_eq!(config.networks()[0].kind, NetworkType::HostOnly);
        assert!(config.networks()[0].args[0].is_symbol("dhcp"));
        assert_eq!(config.networks()[1].kind, NetworkType::Bridged);

        assert_eq!(config.machine_names(), vec!["web", "db"]);
    }

    #[test]
    fn test_provider_block_replays_table() {
        let config = MachineFile::parse(FULL).unwrap().to_vm_config();
        let provider = config.providers().get("virtualbox").unwrap().materialize();

        assert_eq!(provider.settings["memory"], 1024);
        assert_eq!(provider.vm.box_name.as_deref(), Some("precise64-vbox"));
    }

    #[test]
    fn test_provision_settings_block() {
        let config = MachineFile::parse(FULL).unwrap().to_vm_config();
        let shell = &config.provisioners()[0];

        assert_eq!(shell.name(), "shell");
        let settings = shell.settings();
        assert_eq!(settings["inline"], "echo one");
        assert_eq!(settings["args"], "--quiet");
    }

    #[test]
    fn test_define_block_replays_nested_section() {
        let config = MachineFile::parse(FULL).unwrap().to_vm_config();

        let web = config.machines().get("web").unwrap();
        assert_eq!(web.options()["primary"], true);
        assert_eq!(web.block_count(), 1);
        assert_eq!(web.materialize().host_name.as_deref(), Some("web.local"));

        let db = config.machines().get("db").unwrap();
        assert_eq!(db.block_count(), 0);
    }

    #[test]
    fn test_empty_document() {
        let mut config = MachineFile::parse("").unwrap().to_vm_config();
        assert!(config.box_name.is_none());
        config.finalize();
        assert_eq!(config.machine_names(), vec![DEFAULT_VM_NAME]);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = MachineFile::parse("[vm]\nbox = \"a\"\nmemory = 512\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_bad_port_range_rejected() {
        let err = MachineFile::parse("[vm]\nauto_port_range = [2250, 2200]\n").unwrap_err();
        assert!(err.to_string().contains("auto_port_range"));
    }

    #[test]
    fn test_nested_define_checked() {
        let doc = r#"
[[vm.define]]
name = "web"
config = { provision = [{ name = "" }] }
"#;
        let err = MachineFile::parse(doc).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDocument(_)));
    }

    #[test]
    fn test_invalid_protocol_rejected() {
        let doc = r#"
[[vm.forwarded_port]]
guest = 80
host = 8080
protocol = "sctp"
"#;
        assert!(MachineFile::parse(doc).is_err());
    }
}
