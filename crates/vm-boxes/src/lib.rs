//! Box catalog
//!
//! A box is a base image for one provider. On disk a catalog is a directory
//! laid out as `<root>/<box name>/<provider>/metadata.json`; the same box name
//! may exist for several providers side by side.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Name of the metadata file inside a box directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Error types for box catalog operations
#[derive(Debug, thiserror::Error)]
pub enum BoxError {
    #[error("Failed to read box metadata: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse box metadata: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to walk box directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Box '{name}' declares provider '{declared}' but is stored under '{provider}'")]
    ProviderMismatch {
        name: String,
        provider: String,
        declared: String,
    },
}

/// Contents of `metadata.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxMetadata {
    /// Provider the box was built for
    #[serde(default)]
    pub provider: Option<String>,

    /// Remaining keys are provider specific
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A box found in a catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxEntry {
    pub name: String,
    pub provider: String,
    /// Directory holding the box files (None for in-memory catalogs)
    pub directory: Option<PathBuf>,
    pub metadata: BoxMetadata,
}

/// Lookup of installed boxes by name and provider.
pub trait BoxCatalog {
    /// Find a box, or `None` when it is not installed for `provider`.
    fn find(&self, name: &str, provider: &str) -> Option<BoxEntry>;
}

/// Directory-backed catalog
#[derive(Debug, Clone)]
pub struct BoxCollection {
    directory: PathBuf,
}

impl BoxCollection {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Default catalog location (`~/.vmcfg/boxes`)
    pub fn default_path() -> Option<PathBuf> {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".vmcfg/boxes"))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Load a single box, failing on unreadable or inconsistent metadata.
    pub fn load(&self, name: &str, provider: &str) -> Result<Option<BoxEntry>, BoxError> {
        let box_dir = self.directory.join(name).join(provider);
        if !box_dir.is_dir() {
            return Ok(None);
        }

        let metadata_path = box_dir.join(METADATA_FILE);
        let metadata = if metadata_path.exists() {
            let bytes = fs::read(&metadata_path)?;
            serde_json::from_slice::<BoxMetadata>(&bytes)?
        } else {
            BoxMetadata::default()
        };

        if let Some(ref declared) = metadata.provider {
            if declared != provider {
                return Err(BoxError::ProviderMismatch {
                    name: name.to_string(),
                    provider: provider.to_string(),
                    declared: declared.clone(),
                });
            }
        }

        Ok(Some(BoxEntry {
            name: name.to_string(),
            provider: provider.to_string(),
            directory: Some(box_dir),
            metadata,
        }))
    }

    /// Every installed box, sorted by name then provider.
    pub fn all(&self) -> Result<Vec<BoxEntry>, BoxError> {
        if !self.directory.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.directory)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let provider = entry.file_name().to_string_lossy().to_string();
            let name = match entry.path().parent().and_then(|p| p.file_name()) {
                Some(n) => n.to_string_lossy().to_string(),
                None => continue,
            };

            if let Some(found) = self.load(&name, &provider)? {
                entries.push(found);
            }
        }

        Ok(entries)
    }
}

impl BoxCatalog for BoxCollection {
    fn find(&self, name: &str, provider: &str) -> Option<BoxEntry> {
        match self.load(name, provider) {
            Ok(found) => {
                debug!(name, provider, found = found.is_some(), "box lookup");
                found
            }
            Err(e) => {
                warn!(name, provider, error = %e, "ignoring unusable box");
                None
            }
        }
    }
}

/// In-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    boxes: Vec<(String, String)>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_box(mut self, name: &str, provider: &str) -> Self {
        self.boxes.push((name.to_string(), provider.to_string()));
        self
    }
}

impl BoxCatalog for StaticCatalog {
    fn find(&self, name: &str, provider: &str) -> Option<BoxEntry> {
        self.boxes
            .iter()
            .find(|(n, p)| n == name && p == provider)
            .map(|(n, p)| BoxEntry {
                name: n.clone(),
                provider: p.clone(),
                directory: None,
                metadata: BoxMetadata {
                    provider: Some(p.clone()),
                    extra: serde_json::Map::new(),
                },
            })
    }
}
