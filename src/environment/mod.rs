//! Validation environment
//!
//! Everything validation consults outside the aggregate itself: the project
//! root, the installed boxes, the message catalog and the provisioner plugins.

use std::fmt;
use std::path::{Path, PathBuf};

use vm_boxes::{BoxCatalog, StaticCatalog};
use vm_messages::MessageCatalog;

use crate::provisioners::ProvisionerRegistry;

pub struct Environment {
    root_path: PathBuf,
    boxes: Box<dyn BoxCatalog + Send + Sync>,
    messages: MessageCatalog,
    provisioners: ProvisionerRegistry,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("root_path", &self.root_path)
            .field("provisioners", &self.provisioners.names())
            .finish_non_exhaustive()
    }
}

impl Environment {
    /// Environment rooted at `root_path` with no boxes installed, the
    /// built-in messages and the built-in provisioners.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            boxes: Box::new(StaticCatalog::new()),
            messages: MessageCatalog::builtin(),
            provisioners: ProvisionerRegistry::builtin(),
        }
    }

    pub fn with_boxes(mut self, boxes: impl BoxCatalog + Send + Sync + 'static) -> Self {
        self.boxes = Box::new(boxes);
        self
    }

    pub fn with_messages(mut self, messages: MessageCatalog) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_provisioners(mut self, provisioners: ProvisionerRegistry) -> Self {
        self.provisioners = provisioners;
        self
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn boxes(&self) -> &dyn BoxCatalog {
        self.boxes.as_ref()
    }

    pub fn provisioners(&self) -> &ProvisionerRegistry {
        &self.provisioners
    }

    pub fn render(&self, key: &str, params: &[(&str, &str)]) -> String {
        self.messages.render(key, params)
    }

    /// Resolve a host path: `~` and `~/` against `$HOME`, relative paths against the root.
    pub fn expand_path(&self, path: &str) -> PathBuf {
        let home_relative = match path.strip_prefix('~') {
            Some("") => Some(""),
            Some(rest) => rest.strip_prefix('/'),
            None => None,
        };
        if let Some(rest) = home_relative {
            if let Ok(home) = std::env::var("HOME") {
                let home = PathBuf::from(home);
                return if rest.is_empty() { home } else { home.join(rest) };
            }
        }

        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_path.join(path)
        }
    }
}
