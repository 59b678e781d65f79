//! Utility functions

use serde::{Deserialize, Serialize};

/// Version information for the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Mask an email address for logging (`jo***@example.com`)
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        None => {
            let prefix: String = email.chars().take(2).collect();
            format!("{}***", prefix)
        }
        Some((local, domain)) => {
            if local.chars().count() <= 2 {
                let prefix: String = email.chars().take(1).collect();
                format!("{}***@{}", prefix, domain)
            } else {
                let prefix: String = local.chars().take(2).collect();
                format!("{}***@{}", prefix, domain)
            }
        }
    }
}
