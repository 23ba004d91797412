//! In-memory name directory.

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Maps service names to the endpoints serving them.
///
/// Cloning is cheap and clones share the same bindings. Each name resolves to
/// whatever the most recent `bind` stored; a reader never observes a torn
/// entry.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    bindings: Arc<RwLock<HashMap<String, Endpoint>>>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `endpoint`, returning the endpoint it replaced.
    pub fn bind(&self, name: impl Into<String>, endpoint: Endpoint) -> Option<Endpoint> {
        let name = name.into();
        debug!("Binding {} to {}", name, endpoint);
        self.bindings.write().insert(name, endpoint)
    }

    /// Look up the endpoint bound to `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is bound to `name`.
    pub fn resolve(&self, name: &str) -> Result<Endpoint> {
        self.bindings
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Remove the binding for `name`, returning it if there was one.
    pub fn unbind(&self, name: &str) -> Option<Endpoint> {
        debug!("Unbinding {}", name);
        self.bindings.write().remove(name)
    }

    /// All bound names, sorted.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    /// Whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }
}
