//! Machine configuration aggregate
//!
//! [`VmConfig`] is the root object for one configuration layer. Layers are
//! built independently, combined with [`VmConfig::merge`] (parent then child),
//! finalized once and then validated against an [`Environment`].
//!
//! [`Environment`]: crate::environment::Environment

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

mod forwarded_port;
mod keyed;
mod network;
mod provider;
mod provisioner;
mod report;
mod shared_folder;
mod subvm;
mod validate;

pub use forwarded_port::{to_base32, ForwardPortOptions, ForwardedPort, Protocol};
pub use keyed::Keyed;
pub use network::{NetworkArg, NetworkDeclaration, NetworkType};
pub use provider::{ProviderConfig, ProviderOverride, ProviderRegistry};
pub use provisioner::ProvisionerDeclaration;
pub use report::{IssueCode, ValidationIssue, ValidationReport};
pub use shared_folder::{ShareFolderOptions, SharedFolder};
pub use subvm::{normalize_machine_name, SubMachineDefinition, SubMachineRegistry, DEFAULT_VM_NAME};
pub use validate::BOX_LOOKUP_PROVIDER;

/// Deferred configuration block, replayed against a fresh target
pub type Block<T> = Arc<dyn Fn(&mut T) + Send + Sync>;

/// Free-form key/value settings
pub type Settings = serde_json::Map<String, Value>;

/// Wrap a closure as a [`Block`]
pub fn block<T, F>(f: F) -> Block<T>
where
    F: Fn(&mut T) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Inclusive host port range used for automatic port correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

/// One layer of machine configuration
#[derive(Debug, Clone, Default)]
pub struct VmConfig {
    pub auto_port_range: Option<PortRange>,
    pub base_mac: Option<String>,
    /// The `box` setting
    pub box_name: Option<String>,
    pub box_url: Option<String>,
    pub guest: Option<String>,
    pub host_name: Option<String>,

    forwarded_ports: Vec<ForwardedPort>,
    shared_folders: Keyed<SharedFolder>,
    networks: Vec<NetworkDeclaration>,
    providers: ProviderRegistry,
    provisioners: Vec<ProvisionerDeclaration>,
    machines: SubMachineRegistry,
}

impl VmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward_port(&mut self, guest_port: u16, host_port: u16, options: ForwardPortOptions) {
        self.forwarded_ports
            .push(ForwardedPort::new(guest_port, host_port, options));
    }

    pub fn share_folder(
        &mut self,
        name: &str,
        guest_path: impl Into<String>,
        host_path: impl Into<String>,
        options: ShareFolderOptions,
    ) {
        self.shared_folders
            .insert(name, SharedFolder::new(guest_path, host_path, options));
    }

    pub fn network(&mut self, kind: impl Into<NetworkType>, args: Vec<NetworkArg>) {
        self.networks.push(NetworkDeclaration::new(kind, args));
    }

    /// Declare a provider; an earlier declaration of the same name is replaced.
    pub fn provider(&mut self, name: &str, block: Option<Block<ProviderConfig>>) {
        self.providers.set(name, block);
    }

    pub fn provision(&mut self, name: &str, options: Option<Settings>, block: Option<Block<Settings>>) {
        self.provisioners
            .push(ProvisionerDeclaration::new(name, options, block));
    }

    pub fn define(&mut self, name: &str, options: Option<Settings>, block: Option<Block<VmConfig>>) {
        self.machines.define(name, options, block);
    }

    pub fn forwarded_ports(&self) -> &[ForwardedPort] {
        &self.forwarded_ports
    }

    pub fn shared_folders(&self) -> &Keyed<SharedFolder> {
        &self.shared_folders
    }

    pub fn networks(&self) -> &[NetworkDeclaration] {
        &self.networks
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Mutable access, needed for [`ProviderRegistry::get_or_create`]
    pub fn providers_mut(&mut self) -> &mut ProviderRegistry {
        &mut self.providers
    }

    pub fn provisioners(&self) -> &[ProvisionerDeclaration] {
        &self.provisioners
    }

    pub fn machines(&self) -> &SubMachineRegistry {
        &self.machines
    }

    pub fn defined_vm_keys(&self) -> &[String] {
        self.machines.defined_vm_keys()
    }

    pub fn machine_names(&self) -> Vec<&str> {
        self.machines.machine_names()
    }

    /// Combine with a child layer. Neither operand is modified.
    ///
    /// Scalars take the child's value when set. Ports, networks and
    /// provisioners concatenate child after parent. Shared folders and
    /// providers merge by name with the child winning.
    pub fn merge(&self, other: &VmConfig) -> VmConfig {
        debug!(
            parent_ports = self.forwarded_ports.len(),
            child_ports = other.forwarded_ports.len(),
            "merging configuration layers"
        );

        VmConfig {
            auto_port_range: other.auto_port_range.or(self.auto_port_range),
            base_mac: other.base_mac.clone().or_else(|| self.base_mac.clone()),
            box_name: other.box_name.clone().or_else(|| self.box_name.clone()),
            box_url: other.box_url.clone().or_else(|| self.box_url.clone()),
            guest: other.guest.clone().or_else(|| self.guest.clone()),
            host_name: other.host_name.clone().or_else(|| self.host_name.clone()),
            forwarded_ports: concat(&self.forwarded_ports, &other.forwarded_ports),
            shared_folders: self.shared_folders.merged(&other.shared_folders),
            networks: concat(&self.networks, &other.networks),
            providers: self.providers.merged(&other.providers),
            provisioners: concat(&self.provisioners, &other.provisioners),
            machines: self.machines.merged(&other.machines),
        }
    }

    /// Inject computed defaults. Safe to call more than once.
    pub fn finalize(&mut self) {
        self.machines.finalize();
    }

    /// JSON view for display; blocks are shown by count only
    pub fn to_value(&self) -> Value {
        let folders: serde_json::Map<String, Value> = self
            .shared_folders
            .iter()
            .map(|(name, folder)| (name.to_string(), json!(folder)))
            .collect();

        let providers: Vec<Value> = self
            .providers
            .iter()
            .map(|p| json!({"name": p.name(), "configured": p.has_block()}))
            .collect();

        let provisioners: Vec<Value> = self
            .provisioners
            .iter()
            .map(|p| json!({"name": p.name(), "options": p.options(), "configured": p.has_block()}))
            .collect();

        let machines: Vec<Value> = self
            .machines
            .machine_names()
            .into_iter()
            .map(|name| {
                let def = self.machines.get(name);
                json!({
                    "name": name,
                    "options": def.map(|d| d.options().clone()).unwrap_or_default(),
                    "blocks": def.map(|d| d.block_count()).unwrap_or(0),
                })
            })
            .collect();

        json!({
            "box": self.box_name,
            "box_url": self.box_url,
            "base_mac": self.base_mac,
            "guest": self.guest,
            "host_name": self.host_name,
            "auto_port_range": self.auto_port_range,
            "forwarded_ports": self.forwarded_ports,
            "shared_folders": folders,
            "networks": self.networks,
            "providers": providers,
            "provisioners": provisioners,
            "machines": machines,
        })
    }
}

fn concat<T: Clone>(parent: &[T], child: &[T]) -> Vec<T> {
    parent.iter().chain(child.iter()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_port_appends_with_default_names() {
        let mut config = VmConfig::new();
        config.forward_port(22, 2222, ForwardPortOptions::default());
        config.forward_port(22, 2222, ForwardPortOptions::default());
        config.forward_port(80, 8080, ForwardPortOptions::default().name("http"));

        let names: Vec<_> = config.forwarded_ports().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["m-25e", "m-25e", "http"]);
    }

    #[test]
    fn test_share_folder_overwrites_by_name() {
        let mut config = VmConfig::new();
        config.share_folder("v-root", "/vagrant", ".", ShareFolderOptions::default());
        config.share_folder("v-root", "/srv", "src", ShareFolderOptions::default().create(true));

        assert_eq!(config.shared_folders().len(), 1);
        let folder = config.shared_folders().get("v-root").unwrap();
        assert_eq!(folder.guest_path, "/srv");
        assert_eq!(folder.host_path, "src");
        assert!(folder.create);
    }

    #[test]
    fn test_network_stored_verbatim() {
        let mut config = VmConfig::new();
        config.network("wormhole", vec![NetworkArg::string("not an ip")]);

        let decl = &config.networks()[0];
        assert_eq!(decl.kind, NetworkType::Other("wormhole".to_string()));
        assert_eq!(decl.args[0].as_str(), Some("not an ip"));
    }

    #[test]
    fn test_finalize_default_machine() {
        let mut config = VmConfig::new();
        config.finalize();
        config.finalize();
        assert_eq!(config.defined_vm_keys(), &[DEFAULT_VM_NAME]);
    }

    #[test]
    fn test_merge_list_order() {
        let mut a = VmConfig::new();
        a.forward_port(80, 8080, ForwardPortOptions::default());
        let mut b = VmConfig::new();
        b.forward_port(443, 8443, ForwardPortOptions::default());

        let merged = a.merge(&b);
        let guests: Vec<_> = merged.forwarded_ports().iter().map(|p| p.guest_port).collect();
        assert_eq!(guests, vec![80, 443]);

        // Operands untouched
        assert_eq!(a.forwarded_ports().len(), 1);
        assert_eq!(b.forwarded_ports().len(), 1);
    }

    #[test]
    fn test_merge_scalars_child_wins_when_set() {
        let mut parent = VmConfig::new();
        parent.box_name = Some("base".to_string());
        parent.guest = Some("linux".to_string());

        let mut child = VmConfig::new();
        child.box_name = Some("web".to_string());

        let merged = parent.merge(&child);
        assert_eq!(merged.box_name.as_deref(), Some("web"));
        assert_eq!(merged.guest.as_deref(), Some("linux"));
    }

    #[test]
    fn test_merge_collections() {
        let mut parent = VmConfig::new();
        parent.share_folder("data", "/data", "data", ShareFolderOptions::default());
        parent.network("bridged", vec![]);
        parent.provision("shell", None, None);
        parent.provider("virtualbox", None);

        let mut child = VmConfig::new();
        child.share_folder("data", "/mnt/data", "data", ShareFolderOptions::default());
        child.share_folder("logs", "/logs", "logs", ShareFolderOptions::default());
        child.network("hostonly", vec![NetworkArg::symbol("dhcp")]);
        child.provision("file", None, None);
        child.provider(
            "virtualbox",
            Some(block(|c: &mut ProviderConfig| c.set("gui", serde_json::json!(true)))),
        );

        let merged = parent.merge(&child);

        let folders: Vec<_> = merged.shared_folders().keys().collect();
        assert_eq!(folders, vec!["data", "logs"]);
        assert_eq!(merged.shared_folders().get("data").unwrap().guest_path, "/mnt/data");

        let nets: Vec<_> = merged.networks().iter().map(|n| n.kind.as_str().to_string()).collect();
        assert_eq!(nets, vec!["bridged", "hostonly"]);

        let provs: Vec<_> = merged.provisioners().iter().map(|p| p.name()).collect();
        assert_eq!(provs, vec!["shell", "file"]);

        assert!(merged.providers().get("virtualbox").unwrap().has_block());
    }

    #[test]
    fn test_to_value() {
        let mut config = VmConfig::new();
        config.box_name = Some("precise64".to_string());
        config.forward_port(80, 8080, ForwardPortOptions::default());
        config.define("web", None, Some(block(|_: &mut VmConfig| {})));
        config.finalize();

        let value = config.to_value();
        assert_eq!(value["box"], "precise64");
        assert_eq!(value["forwarded_ports"][0]["name"], "2g-7sg");
        assert_eq!(value["machines"][0]["name"], "web");
        assert_eq!(value["machines"][0]["blocks"], 1);
        assert!(value["base_mac"].is_null());
    }
}
