//! Mapping from backend class names to local model types.
//!
//! A local type name need not match the remote collection name: a
//! [`ModelType`] may carry a remote-name override, and the backend
//! addresses its reserved user collection as `_User` while the local type
//! is simply `User`. Resolution prefers an override match, then the
//! literal (normalized) class name.

use std::collections::HashMap;

use crate::error::Error;
use crate::model::{ModelType, RESERVED_USER_CLASS, USER_CLASS};

/// Registered model types, keyed by local type name.
///
/// Owned by the [`Client`](crate::client::Client); there is no process-wide
/// registry state.
#[derive(Debug, Default)]
pub struct Registry {
    types: HashMap<&'static str, &'static ModelType>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, model: &'static ModelType) {
        self.types.insert(model.name, model);
    }

    /// Look up a model type by its local name.
    pub fn get(&self, name: &str) -> Option<&'static ModelType> {
        self.types.get(name).copied()
    }

    /// Resolve a backend class name to a local model type.
    ///
    /// The singular-collection alias `_User` normalizes to `User` first.
    /// A type registered with a matching remote-name override wins over a
    /// literal name match. Failure is hard: an unresolvable class name
    /// during relationship resolution must not silently null the field.
    pub fn resolve(&self, backend_class: &str) -> Result<&'static ModelType, Error> {
        let name = normalize_class(backend_class);

        let by_override = self
            .types
            .values()
            .find(|model| model.remote_name == Some(name))
            .copied();

        by_override
            .or_else(|| self.get(name))
            .ok_or_else(|| Error::UnknownClass(backend_class.to_string()))
    }
}

/// Normalize the backend's reserved user collection alias.
pub fn normalize_class(name: &str) -> &str {
    if name == RESERVED_USER_CLASS {
        USER_CLASS
    } else {
        name
    }
}
