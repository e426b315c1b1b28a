//! Plugin identity, the registry key derived from a module's file name.

use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Name of a plugin within one registry: the module's file name with the
/// text after its last `.` removed (`motion.so` → `motion`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginIdentity(String);

impl PluginIdentity {
    /// Creates an identity from an already-stripped name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Derives an identity from a file name.
    ///
    /// Returns `None` when the stem would be empty (`.so`, `""`).
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let stem = match file_name.rfind('.') {
            Some(idx) => &file_name[..idx],
            None => file_name,
        };
        if stem.is_empty() {
            None
        } else {
            Some(Self(stem.to_string()))
        }
    }

    /// Derives an identity from the final component of `path`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::from_file_name)
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PluginIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PluginIdentity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<PluginIdentity> for String {
    fn from(identity: PluginIdentity) -> Self {
        identity.0
    }
}
