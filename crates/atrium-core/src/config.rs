//! Directory pagination configuration.

use serde::{Deserialize, Serialize};

fn default_limit() -> usize {
    50
}

fn default_max_limit() -> usize {
    500
}

/// Page-size limits applied by [`crate::MemberDirectory`].
///
/// Deserializes with defaults so an empty config section is valid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectoryLimits {
    /// Page size used when the caller does not supply a limit.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Hard cap on caller-supplied limits.
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for DirectoryLimits {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl DirectoryLimits {
    /// Resolve a caller-supplied limit against the defaults and cap.
    pub fn clamp(&self, limit: Option<usize>) -> usize {
        limit.unwrap_or(self.default_limit).min(self.max_limit)
    }
}
