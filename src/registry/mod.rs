//! Backend Registry module.
//!
//! Holds every backend registered at startup, each with its own rate limiter,
//! and answers the one question the router and recommendation cache both
//! ask: in what order should backends be tried by default?

mod backend;
mod error;

pub use backend::*;
pub use error::*;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The Backend Registry stores all known chat backends.
///
/// Default order is ascending priority with ties broken by registration
/// order. Backends are shared as `Arc<Backend>` so the router can hold one
/// across an await point without holding a map guard.
///
/// # Examples
///
/// ```
/// use chatroute::agent::factory::create_agent;
/// use chatroute::config::{BackendConfig, BackendType};
/// use chatroute::ratelimit::RateLimits;
/// use chatroute::registry::{Backend, Registry};
/// use std::sync::Arc;
///
/// let registry = Registry::new();
/// let client = Arc::new(reqwest::Client::new());
///
/// let config = BackendConfig::new("dialogpt", BackendType::HuggingFace);
/// let backend = Backend::new(create_agent(&config, client), 10, RateLimits::new(100, 1000));
///
/// registry.add_backend(backend).unwrap();
/// assert_eq!(registry.backend_count(), 1);
/// assert_eq!(registry.priority_order_names(), vec!["dialogpt"]);
/// ```
pub struct Registry {
    backends: DashMap<String, Arc<Backend>>,
    next_order: AtomicU64,
}

impl Registry {
    /// Create a new empty Registry.
    pub fn new() -> Self {
        Self {
            backends: DashMap::new(),
            next_order: AtomicU64::new(0),
        }
    }

    /// Add a new backend to the registry, assigning its registration order.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateBackend` if a backend with the same
    /// name already exists, `RegistryError::EmptyName` for a blank name.
    pub fn add_backend(&self, mut backend: Backend) -> Result<(), RegistryError> {
        if backend.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }

        match self.backends.entry(backend.name.clone()) {
            Entry::Occupied(entry) => Err(RegistryError::DuplicateBackend(entry.key().clone())),
            Entry::Vacant(entry) => {
                backend.registration_order = self.next_order.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(
                    backend = %backend.name,
                    priority = backend.priority,
                    order = backend.registration_order,
                    "registered backend"
                );
                entry.insert(Arc::new(backend));
                Ok(())
            }
        }
    }

    /// Get a backend by name.
    pub fn get_backend(&self, name: &str) -> Option<Arc<Backend>> {
        self.backends.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// All backends in default routing order.
    pub fn priority_order(&self) -> Vec<Arc<Backend>> {
        let mut backends: Vec<Arc<Backend>> = self
            .backends
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        backends.sort_by_key(|b| (b.priority, b.registration_order));
        backends
    }

    /// Backend names in default routing order.
    pub fn priority_order_names(&self) -> Vec<String> {
        self.priority_order()
            .into_iter()
            .map(|b| b.name.clone())
            .collect()
    }

    /// Serializable snapshot of all backends in default order.
    pub fn views(&self) -> Vec<BackendView> {
        self.priority_order()
            .iter()
            .map(|b| BackendView::from(b.as_ref()))
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
