//! Provisioner declarations

use std::fmt;

use tracing::debug;

use super::report::{IssueCode, ValidationReport};
use super::{Block, Settings};
use crate::config::merge_settings;
use crate::environment::Environment;

/// A provisioner in declaration order
#[derive(Clone)]
pub struct ProvisionerDeclaration {
    name: String,
    options: Settings,
    block: Option<Block<Settings>>,
}

impl fmt::Debug for ProvisionerDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionerDeclaration")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("block", &self.block.is_some())
            .finish()
    }
}

impl ProvisionerDeclaration {
    pub fn new(name: impl Into<String>, options: Option<Settings>, block: Option<Block<Settings>>) -> Self {
        Self {
            name: name.into(),
            options: options.unwrap_or_default(),
            block,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &Settings {
        &self.options
    }

    pub fn has_block(&self) -> bool {
        self.block.is_some()
    }

    /// Options with the block replayed on top
    pub fn settings(&self) -> Settings {
        let mut settings = self.options.clone();
        if let Some(ref block) = self.block {
            let mut configured = Settings::new();
            block(&mut configured);
            merge_settings(&mut settings, configured);
        }
        settings
    }

    /// Delegate to the registered plugin, appending its findings to `report`.
    pub fn validate(&self, env: &Environment, report: &mut ValidationReport) {
        match env.provisioners().get(&self.name) {
            Some(plugin) => {
                debug!(provisioner = %self.name, "delegating validation");
                plugin.validate(&self.settings(), env, report);
            }
            None => {
                report.add(
                    IssueCode::ProvisionerNotFound,
                    env.render("vm.provisioner_not_found", &[("name", self.name.as_str())]),
                );
            }
        }
    }
}
