//! Discovery scanner: lists plugin candidates in a directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::DiscoveryError;
use crate::identity::PluginIdentity;

/// A file that looks like a plugin module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Identity derived from the file name.
    pub identity: PluginIdentity,
    /// Full path to the module file.
    pub path: PathBuf,
    /// File name as found in the directory.
    pub file_name: String,
}

/// Scans `dir` (non-recursively) for entries whose name ends with
/// `extension`, returned in ascending file-name order.
///
/// Directories, names that are not valid UTF-8, and names whose identity
/// would be empty are skipped.
pub fn scan(dir: &Path, extension: &str) -> Result<Vec<Candidate>, DiscoveryError> {
    let entries = fs::read_dir(dir).map_err(|source| DiscoveryError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut candidates = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };

        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(
                dir = %dir.display(),
                name = ?entry.file_name(),
                "Skipping entry with non UTF-8 name"
            );
            continue;
        };

        if file_name == "." || file_name == ".." || !file_name.ends_with(extension) {
            continue;
        }

        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            debug!(name = %file_name, "Skipping directory with plugin extension");
            continue;
        }

        let Some(identity) = PluginIdentity::from_file_name(&file_name) else {
            debug!(name = %file_name, "Skipping entry with empty plugin name");
            continue;
        };

        candidates.push(Candidate {
            identity,
            path: dir.join(&file_name),
            file_name,
        });
    }

    candidates.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    debug!(
        dir = %dir.display(),
        extension = %extension,
        count = candidates.len(),
        "Plugin directory scanned"
    );

    Ok(candidates)
}
