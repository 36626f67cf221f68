//! Shell script provisioner
//!
//! Runs either an inline script or a script file from the host. Exactly one of
//! `path` / `inline` must be given.

use super::{setting_present, setting_str, ProvisionerPlugin};
use crate::environment::Environment;
use crate::vm::{IssueCode, Settings, ValidationReport};

#[derive(Debug, Clone, Copy, Default)]
pub struct ShellProvisioner;

impl ProvisionerPlugin for ShellProvisioner {
    fn name(&self) -> &str {
        "shell"
    }

    fn validate(&self, settings: &Settings, env: &Environment, report: &mut ValidationReport) {
        let has_path = setting_present(settings, "path");
        let has_inline = setting_present(settings, "inline");

        if has_path && has_inline {
            report.add(
                IssueCode::Provisioner("shell_path_and_inline_set"),
                env.render("provisioners.shell.path_and_inline_set", &[]),
            );
        } else if !has_path && !has_inline {
            report.add(
                IssueCode::Provisioner("shell_no_path_or_inline"),
                env.render("provisioners.shell.no_path_or_inline", &[]),
            );
        }

        if has_path {
            // A non-string path can never name a file
            let path = setting_str(settings, "path").unwrap_or_default();
            if path.is_empty() || !env.expand_path(path).is_file() {
                report.add(
                    IssueCode::Provisioner("shell_path_invalid"),
                    env.render("provisioners.shell.path_invalid", &[("path", path)]),
                );
            }
        }

        if setting_present(settings, "args") && setting_str(settings, "args").is_none() {
            report.add(
                IssueCode::Provisioner("shell_args_not_string"),
                env.render("provisioners.shell.args_must_be_string", &[]),
            );
        }
    }
}
