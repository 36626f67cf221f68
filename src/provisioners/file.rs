//! File upload provisioner

use super::{setting_str, ProvisionerPlugin};
use crate::environment::Environment;
use crate::vm::{IssueCode, Settings, ValidationReport};

#[derive(Debug, Clone, Copy, Default)]
pub struct FileProvisioner;

impl ProvisionerPlugin for FileProvisioner {
    fn name(&self) -> &str {
        "file"
    }

    fn validate(&self, settings: &Settings, env: &Environment, report: &mut ValidationReport) {
        if setting_str(settings, "source").map_or(true, str::is_empty) {
            report.add(
                IssueCode::Provisioner("file_no_source"),
                env.render("provisioners.file.no_source", &[]),
            );
        }

        if setting_str(settings, "destination").map_or(true, str::is_empty) {
            report.add(
                IssueCode::Provisioner("file_no_destination"),
                env.render("provisioners.file.no_destination", &[]),
            );
        }
    }
}
