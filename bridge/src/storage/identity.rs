//! Device identity management
//!
//! The gateway recognizes a client installation by an opaque identity
//! string sent with every signed request. The identity is created once,
//! persisted as plain text, and reused for the lifetime of the install.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::filesys::file::File;

/// A per-installation opaque identity string (32 hex chars, no dashes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    /// Load the identity from its file, or generate and persist a new one.
    ///
    /// Never fails: an unreadable or empty file yields a freshly generated
    /// identity, and a failed persist is logged while the in-memory
    /// identity is still returned for the current run.
    pub async fn load_or_create(file: &File) -> Self {
        match file.read_string().await {
            Ok(contents) => {
                let id = contents.trim();
                if !id.is_empty() {
                    debug!("Loaded existing device identity: {}...", &id[..id.len().min(8)]);
                    return Self(id.to_string());
                }
            }
            Err(e) => {
                if file.exists().await {
                    warn!("Failed to load device identity: {}", e);
                }
            }
        }

        let id = Self::generate();
        if let Err(e) = file.write_string(id.as_str()).await {
            warn!("Failed to persist device identity, using it in-memory only: {}", e);
        }
        info!("Generated new device identity: {}...", &id.as_str()[..8]);
        id
    }

    /// Generate a fresh identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
