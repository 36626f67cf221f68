//! Validation report
//!
//! Every check appends here; nothing short-circuits.

use serde::{Serialize, Serializer};

/// Machine-readable classification of a validation issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueCode {
    MissingBox,
    BoxNotFound,
    MissingBaseMac,
    SharedFolderPathMissing,
    SharedFolderNfsOwnerGroup,
    NetworkIpRequired,
    NetworkIpMalformed,
    NetworkIpReservedGateway,
    NetworkTypeInvalid,
    ProvisionerNotFound,
    /// Raised by a provisioner plugin; opaque to the aggregate
    Provisioner(&'static str),
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::MissingBox => "missing_box",
            IssueCode::BoxNotFound => "box_not_found",
            IssueCode::MissingBaseMac => "missing_base_mac",
            IssueCode::SharedFolderPathMissing => "shared_folder_path_missing",
            IssueCode::SharedFolderNfsOwnerGroup => "shared_folder_nfs_owner_group",
            IssueCode::NetworkIpRequired => "network_ip_required",
            IssueCode::NetworkIpMalformed => "network_ip_malformed",
            IssueCode::NetworkIpReservedGateway => "network_ip_reserved_gateway",
            IssueCode::NetworkTypeInvalid => "network_type_invalid",
            IssueCode::ProvisionerNotFound => "provisioner_not_found",
            IssueCode::Provisioner(code) => code,
        }
    }

    /// Whether this is one of the box-resolution codes
    pub fn is_box_issue(&self) -> bool {
        matches!(
            self,
            IssueCode::MissingBox | IssueCode::BoxNotFound | IssueCode::MissingBaseMac
        )
    }
}

impl Serialize for IssueCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One rendered issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub message: String,
}

/// Accumulated issues for one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, code: IssueCode, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            code,
            message: message.into(),
        });
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Rendered messages in the order they were added
    pub fn messages(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.message.as_str()).collect()
    }

    pub fn codes(&self) -> Vec<&IssueCode> {
        self.issues.iter().map(|i| &i.code).collect()
    }

    pub fn count(&self, code: &IssueCode) -> usize {
        self.issues.iter().filter(|i| &i.code == code).count()
    }

    pub fn contains(&self, code: &IssueCode) -> bool {
        self.count(code) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }
}
