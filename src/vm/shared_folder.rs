//! Shared folders

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A host directory exposed inside the guest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedFolder {
    pub guest_path: String,
    /// Resolved against the environment root when relative
    pub host_path: String,
    /// Create the host directory if it does not exist
    pub create: bool,
    pub owner: Option<String>,
    pub group: Option<String>,
    /// Mount over NFS instead of the provider's native mechanism
    pub nfs: bool,
    pub transient: bool,
    /// Opaque provider-specific data
    pub extra: Option<Value>,
}

/// Caller overrides for [`SharedFolder`] defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareFolderOptions {
    pub create: Option<bool>,
    pub owner: Option<String>,
    pub group: Option<String>,
    pub nfs: Option<bool>,
    pub transient: Option<bool>,
    pub extra: Option<Value>,
}

impl ShareFolderOptions {
    pub fn create(mut self, create: bool) -> Self {
        self.create = Some(create);
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn nfs(mut self, nfs: bool) -> Self {
        self.nfs = Some(nfs);
        self
    }

    pub fn transient(mut self, transient: bool) -> Self {
        self.transient = Some(transient);
        self
    }

    pub fn extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }
}

impl SharedFolder {
    pub fn new(guest_path: impl Into<String>, host_path: impl Into<String>, options: ShareFolderOptions) -> Self {
        Self {
            guest_path: guest_path.into(),
            host_path: host_path.into(),
            create: options.create.unwrap_or(false),
            owner: options.owner,
            group: options.group,
            nfs: options.nfs.unwrap_or(false),
            transient: options.transient.unwrap_or(false),
            extra: options.extra,
        }
    }
}
