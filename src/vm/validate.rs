//! Aggregate validation
//!
//! Checks run in a fixed order and all of them run: box, shared folders,
//! networks, then each provisioner. Findings go into one report.

use tracing::debug;

use super::network::{NetworkDeclaration, NetworkType};
use super::report::{IssueCode, ValidationReport};
use super::VmConfig;
use crate::environment::Environment;

/// Box lookups are always made against this provider
pub const BOX_LOOKUP_PROVIDER: &str = "virtualbox";

impl VmConfig {
    /// Validate into a fresh report
    pub fn validate(&self, env: &Environment) -> ValidationReport {
        let mut report = ValidationReport::new();
        self.validate_into(env, &mut report);
        report
    }

    /// Validate, appending to an existing report
    pub fn validate_into(&self, env: &Environment, report: &mut ValidationReport) {
        let before = report.len();

        self.validate_box(env, report);
        self.validate_shared_folders(env, report);
        for network in &self.networks {
            validate_network(network, env, report);
        }
        for provisioner in &self.provisioners {
            provisioner.validate(env, report);
        }

        debug!(issues = report.len() - before, "validation pass complete");
    }

    fn validate_box(&self, env: &Environment, report: &mut ValidationReport) {
        if self.box_name.is_none() {
            report.add(IssueCode::MissingBox, env.render("vm.box_missing", &[]));
        }

        // An unset box is a failed lookup, not a skipped one
        let found = self
            .box_name
            .as_deref()
            .and_then(|name| env.boxes().find(name, BOX_LOOKUP_PROVIDER))
            .is_some();

        if let Some(ref name) = self.box_name {
            if self.box_url.is_none() && !found {
                report.add(
                    IssueCode::BoxNotFound,
                    env.render("vm.box_not_found", &[("name", name.as_str())]),
                );
            }
        }

        if found && self.base_mac.is_none() {
            report.add(IssueCode::MissingBaseMac, env.render("vm.base_mac_invalid", &[]));
        }
    }

    fn validate_shared_folders(&self, env: &Environment, report: &mut ValidationReport) {
        for (name, folder) in self.shared_folders.iter() {
            let host_path = env.expand_path(&folder.host_path);

            if !host_path.is_dir() && !folder.create {
                report.add(
                    IssueCode::SharedFolderPathMissing,
                    env.render(
                        "vm.shared_folder_hostpath_missing",
                        &[("name", name), ("path", folder.host_path.as_str())],
                    ),
                );
            }

            if folder.nfs && (folder.owner.is_some() || folder.group.is_some()) {
                report.add(
                    IssueCode::SharedFolderNfsOwnerGroup,
                    env.render("vm.shared_folder_nfs_owner_group", &[("name", name)]),
                );
            }
        }
    }
}

fn validate_network(network: &NetworkDeclaration, env: &Environment, report: &mut ValidationReport) {
    match network.kind {
        NetworkType::HostOnly => {
            let first = network.args.first();
            if first.map_or(false, |arg| arg.is_symbol("dhcp")) {
                return;
            }

            let ip = match first {
                Some(arg) => arg,
                None => {
                    report.add(IssueCode::NetworkIpRequired, env.render("vm.network_ip_required", &[]));
                    return;
                }
            };

            // Non-string arguments cannot be dotted quads
            let shown = ip.to_value().to_string();
            let text = ip.as_str().unwrap_or(&shown);
            // Trailing empty segments do not count as octets
            let mut parts: Vec<&str> = text.split('.').collect();
            while parts.last() == Some(&"") {
                parts.pop();
            }

            if ip.as_str().is_none() || parts.len() != 4 {
                report.add(
                    IssueCode::NetworkIpMalformed,
                    env.render("vm.network_ip_invalid", &[("ip", text)]),
                );
            } else if parts[3] == "1" {
                report.add(
                    IssueCode::NetworkIpReservedGateway,
                    env.render("vm.network_ip_ends_one", &[("ip", text)]),
                );
            }
        }
        NetworkType::Bridged => {}
        NetworkType::Other(ref kind) => {
            report.add(
                IssueCode::NetworkTypeInvalid,
                env.render("vm.network_invalid", &[("type", kind.as_str())]),
            );
        }
    }
}
