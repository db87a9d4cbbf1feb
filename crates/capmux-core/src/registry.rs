//! Capture type registry.
//!
//! Maps a capture-type identifier to a constructor function. The
//! orchestrator resolves the requested type names against the registry once
//! at build time; there is no runtime discovery by name-scanning.

use capmux_proto::{CaptureContext, CaptureUnit, Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Constructor for a capture unit.
///
/// Invoked *inside* the worker after it starts, so the unit (and any
/// non-transferable resource it opens) never crosses the worker boundary;
/// only the plain-data [`CaptureContext`] does.
pub type CaptureFactory =
    Arc<dyn Fn(&CaptureContext) -> Result<Box<dyn CaptureUnit>> + Send + Sync>;

/// Registry of capture-type constructors.
#[derive(Default, Clone)]
pub struct CaptureRegistry {
    factories: HashMap<String, CaptureFactory>,
}

impl CaptureRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor under a type name, replacing any previous
    /// registration with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&CaptureContext) -> Result<Box<dyn CaptureUnit>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Gets a constructor by type name.
    pub fn get(&self, name: &str) -> Option<&CaptureFactory> {
        self.factories.get(name)
    }

    /// Returns all registered type names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Resolves a list of requested type names to their constructors.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownCaptureType`] for a name with no registration, and
    /// [`Error::InvalidConfiguration`] for a duplicate request (each result
    /// tag must be unique within a group).
    pub fn resolve(&self, names: &[&str]) -> Result<Vec<(String, CaptureFactory)>> {
        let mut resolved = Vec::with_capacity(names.len());
        for &name in names {
            if resolved.iter().any(|(n, _)| n == name) {
                return Err(Error::invalid_config(format!(
                    "capture type '{name}' requested more than once"
                )));
            }
            let factory = self
                .get(name)
                .ok_or_else(|| Error::UnknownCaptureType(name.to_string()))?;
            resolved.push((name.to_string(), Arc::clone(factory)));
        }
        Ok(resolved)
    }
}

impl std::fmt::Debug for CaptureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("CaptureRegistry")
            .field("types", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCapture;
    use serde_json::json;

    fn sample_registry() -> CaptureRegistry {
        let mut registry = CaptureRegistry::new();
        registry.register("disk-info", |_ctx| {
            Ok(Box::new(ScriptedCapture::new("disk-info", json!({"disks": ["sda"]}))))
        });
        registry.register("crypto-bench-info", |_ctx| {
            Ok(Box::new(ScriptedCapture::new("crypto-bench-info", json!({}))))
        });
        registry
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = sample_registry();
        assert_eq!(registry.len(), 2);

        let resolved = registry.resolve(&["disk-info", "crypto-bench-info"]).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].0, "disk-info");
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let registry = sample_registry();
        let err = registry.resolve(&["disk-info", "cpu-info"]).err().unwrap();
        assert!(matches!(err, Error::UnknownCaptureType(name) if name == "cpu-info"));
    }

    #[test]
    fn test_duplicate_request_is_an_error() {
        let registry = sample_registry();
        let err = registry.resolve(&["disk-info", "disk-info"]).err().unwrap();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut registry = sample_registry();
        registry.register("disk-info", |_ctx| {
            Ok(Box::new(ScriptedCapture::new("disk-info", json!({"disks": []}))))
        });
        assert_eq!(registry.len(), 2);
    }
}
