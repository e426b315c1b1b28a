//! Plugin registry: one record per plugin identity, in discovery order.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::LoadFailure;
use crate::identity::PluginIdentity;
use crate::loader::PluginModule;

/// Lifecycle state of one plugin identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "cause")]
pub enum PluginState {
    /// Seen on disk; no load attempted yet.
    Discovered,
    /// Module resident and registration committed.
    Registered,
    /// Load or registration failed; never retried.
    Failed(LoadFailure),
}

impl PluginState {
    /// Whether a load has been attempted for this identity.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Discovered)
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovered => write!(f, "discovered"),
            Self::Registered => write!(f, "registered"),
            Self::Failed(cause) => write!(f, "failed ({cause})"),
        }
    }
}

struct PluginRecord {
    identity: PluginIdentity,
    path: PathBuf,
    state: PluginState,
    // Held for the registry's lifetime; dropping it never unloads code.
    module: Option<Box<dyn PluginModule>>,
}

/// Registry of every plugin identity seen by discovery.
#[derive(Default)]
pub struct PluginRegistry {
    records: Vec<PluginRecord>,
    index: HashMap<PluginIdentity, usize>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.records.iter().map(|r| (&r.identity, r.state)))
            .finish()
    }
}

impl PluginRegistry {
    /// Creates a new empty plugin registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a discovered identity. Returns `false` if it was already known.
    pub fn insert(&mut self, identity: PluginIdentity, path: &Path) -> bool {
        if self.index.contains_key(&identity) {
            debug!(plugin = %identity, path = %path.display(), "Identity already known");
            return false;
        }
        self.index.insert(identity.clone(), self.records.len());
        self.records.push(PluginRecord {
            identity,
            path: path.to_path_buf(),
            state: PluginState::Discovered,
            module: None,
        });
        true
    }

    /// Marks a discovered identity registered, taking ownership of its module.
    ///
    /// Returns `false` if the identity is unknown or a load was already
    /// attempted; `module` is then dropped, its library stays mapped.
    pub fn register(&mut self, identity: &str, module: Box<dyn PluginModule>) -> bool {
        let Some(record) = self.record_mut(identity) else {
            return false;
        };
        if record.state.is_terminal() {
            return false;
        }
        record.state = PluginState::Registered;
        record.module = Some(module);
        info!(plugin = %record.identity, path = %record.path.display(), "Plugin registered");
        true
    }

    /// Marks a discovered identity failed.
    pub fn mark_failed(&mut self, identity: &str, failure: LoadFailure) -> bool {
        let Some(record) = self.record_mut(identity) else {
            return false;
        };
        if record.state.is_terminal() {
            return false;
        }
        record.state = PluginState::Failed(failure);
        true
    }

    /// Current state of `identity`.
    pub fn state(&self, identity: &str) -> Option<PluginState> {
        self.index.get(identity).map(|&i| self.records[i].state)
    }

    /// Path the identity was first discovered at.
    pub fn path(&self, identity: &str) -> Option<&Path> {
        self.index
            .get(identity)
            .map(|&i| self.records[i].path.as_path())
    }

    /// Whether `identity` is registered.
    pub fn is_registered(&self, identity: &str) -> bool {
        self.state(identity) == Some(PluginState::Registered)
    }

    /// Whether the registry holds a loaded module for `identity`.
    pub fn has_module(&self, identity: &str) -> bool {
        self.index
            .get(identity)
            .is_some_and(|&i| self.records[i].module.is_some())
    }

    /// All `(identity, registered)` pairs in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&PluginIdentity, bool)> + '_ {
        self.records
            .iter()
            .map(|r| (&r.identity, r.state == PluginState::Registered))
    }

    /// All `(identity, state)` pairs in discovery order.
    pub fn states(&self) -> impl Iterator<Item = (&PluginIdentity, PluginState)> + '_ {
        self.records.iter().map(|r| (&r.identity, r.state))
    }

    /// Number of known identities.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no identity has been discovered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of registered identities.
    pub fn loaded_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.state == PluginState::Registered)
            .count()
    }

    fn record_mut(&mut self, identity: &str) -> Option<&mut PluginRecord> {
        let i = *self.index.get(identity)?;
        Some(&mut self.records[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistrationError;
    use crate::registrar::PluginRegistrar;

    fn module() -> Box<dyn PluginModule> {
        Box::new(|_: &mut PluginRegistrar| -> Result<(), RegistrationError> { Ok(()) })
    }

    #[test]
    fn test_insert_is_idempotent_per_identity() {
        let mut registry = PluginRegistry::new();
        assert!(registry.insert(PluginIdentity::new("a"), Path::new("/p/a.so")));
        assert!(!registry.insert(PluginIdentity::new("a"), Path::new("/q/a.so")));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.path("a"), Some(Path::new("/p/a.so")));
        assert_eq!(registry.state("a"), Some(PluginState::Discovered));
    }

    #[test]
    fn test_terminal_states_never_change() {
        let mut registry = PluginRegistry::new();
        registry.insert(PluginIdentity::new("ok"), Path::new("/p/ok.so"));
        registry.insert(PluginIdentity::new("bad"), Path::new("/p/bad.so"));

        assert!(registry.register("ok", module()));
        assert!(registry.mark_failed("bad", LoadFailure::MissingEntryPoint));

        assert!(!registry.register("ok", module()));
        assert!(!registry.mark_failed("ok", LoadFailure::Runtime));
        assert!(!registry.register("bad", module()));

        assert!(registry.is_registered("ok"));
        assert!(registry.has_module("ok"));
        assert_eq!(
            registry.state("bad"),
            Some(PluginState::Failed(LoadFailure::MissingEntryPoint))
        );
        assert!(!registry.has_module("bad"));
    }

    #[test]
    fn test_unknown_identity() {
        let mut registry = PluginRegistry::new();
        assert!(!registry.register("ghost", module()));
        assert!(!registry.is_registered("ghost"));
        assert_eq!(registry.state("ghost"), None);
    }

    #[test]
    fn test_iter_preserves_discovery_order() {
        let mut registry = PluginRegistry::new();
        for name in ["b", "a", "c"] {
            registry.insert(PluginIdentity::new(name), Path::new(name));
        }
        registry.register("a", module());

        let pairs: Vec<(String, bool)> = registry
            .iter()
            .map(|(id, reg)| (id.to_string(), reg))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("b".to_string(), false),
                ("a".to_string(), true),
                ("c".to_string(), false),
            ]
        );
        assert_eq!(registry.loaded_count(), 1);
    }

    #[test]
    fn test_state_serializes_with_cause() {
        let failed = serde_json::to_value(PluginState::Failed(LoadFailure::MissingEntryPoint)).unwrap();
        assert_eq!(
            failed,
            serde_json::json!({"state": "failed", "cause": "missing_entry_point"})
        );
        let registered = serde_json::to_value(PluginState::Registered).unwrap();
        assert_eq!(registered, serde_json::json!({"state": "registered"}));
    }
}
