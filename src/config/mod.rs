//! Per-execution configuration snapshot.
//!
//! A [`Configs`] value is a type-keyed heterogeneous map. Each setting is
//! identified by a zero-sized key type implementing [`ConfigKey`], which fixes
//! the stored value type. Lookups are type-checked: a stored value whose type
//! does not match the key's value type reads as absent and is never coerced.
//!
//! Every setting the crate uses is exposed through a dedicated accessor that
//! encapsulates its default (e.g. [`Configs::body_encoder`] falls back to JSON,
//! [`Configs::log_level`] to [`LevelFilter::OFF`]), so missing keys never raise.
//!
//! # Lifecycle
//!
//! 1. A fresh, empty snapshot is created when a terminal operation runs.
//! 2. The builder's configuration steps are replayed in order.
//! 3. The snapshot is handed read-only to every pipeline stage.
//!
//! # Examples
//!
//! ```
//! use netclient::config::{ConfigKey, Configs};
//!
//! struct Tenant;
//! impl ConfigKey for Tenant {
//!     type Value = String;
//! }
//!
//! let mut configs = Configs::new();
//! assert_eq!(configs.get::<Tenant>(), None);
//!
//! configs.set::<Tenant>("acme".to_string());
//! assert_eq!(configs.get::<Tenant>().as_deref(), Some("acme"));
//!
//! let overridden = configs.with::<Tenant>("globex".to_string());
//! assert_eq!(overridden.get::<Tenant>().as_deref(), Some("globex"));
//! assert_eq!(configs.get::<Tenant>().as_deref(), Some("acme"));
//! ```

mod logging;
mod transport;

pub use logging::{LogLevelKey, Logger};
pub use transport::{TransportConfig, WebSocketConfig};

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use tracing::level_filters::LevelFilter;

/// Identity of one setting in a [`Configs`] snapshot.
///
/// Implement it on a private unit struct to add a custom setting.
pub trait ConfigKey: 'static {
    /// Type of the stored value.
    type Value: Clone + Send + Sync + 'static;
}

/// Type-keyed configuration snapshot.
#[derive(Clone, Default)]
pub struct Configs {
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Configs {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a setting, or `None` if unset.
    pub fn get<K: ConfigKey>(&self) -> Option<K::Value> {
        self.values
            .get(&TypeId::of::<K>())
            .and_then(|value| value.downcast_ref::<K::Value>())
            .cloned()
    }

    /// Write a setting, replacing any earlier value.
    pub fn set<K: ConfigKey>(&mut self, value: K::Value) {
        self.values.insert(TypeId::of::<K>(), Arc::new(value));
    }

    /// Remove a setting so its accessor falls back to the default.
    pub fn remove<K: ConfigKey>(&mut self) {
        self.values.remove(&TypeId::of::<K>());
    }

    /// Copy of this snapshot with one setting overridden.
    #[must_use]
    pub fn with<K: ConfigKey>(&self, value: K::Value) -> Self {
        let mut result = self.clone();
        result.set::<K>(value);
        result
    }

    /// Whether a setting has been written.
    pub fn contains<K: ConfigKey>(&self) -> bool {
        self.get::<K>().is_some()
    }

    /// Number of settings written.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no setting has been written.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Configs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configs")
            .field("settings", &self.values.len())
            .finish()
    }
}
