//! Name → base-URL registry shared across the application.

use dashmap::DashMap;
use url::Url;

use crate::config::schema::ServiceEntry;

/// Concurrent registry of logical service names.
///
/// Registration replaces any previous entry for the same name, so a
/// restarted service can re-register its new address.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: DashMap<String, Url>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configured service entries.
    pub fn from_config(entries: &[ServiceEntry]) -> Result<Self, url::ParseError> {
        let registry = Self::new();
        for entry in entries {
            registry.register(&entry.name, entry.base_url.parse()?);
        }
        Ok(registry)
    }

    /// Register (or replace) a service's base URL.
    pub fn register(&self, name: &str, base_url: Url) {
        tracing::debug!(service = name, url = %base_url, "service registered");
        self.services.insert(name.to_string(), base_url);
    }

    /// Remove a service; returns true if it was present.
    pub fn deregister(&self, name: &str) -> bool {
        self.services.remove(name).is_some()
    }

    /// Base URL for `name`, if registered.
    pub fn resolve(&self, name: &str) -> Option<Url> {
        self.services.get(name).map(|entry| entry.value().clone())
    }

    /// Names currently registered, in no particular order.
    pub fn names(&self) -> Vec<String> {
        self.services.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
