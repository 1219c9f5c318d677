//! Configuration for the events cache
//!
//! # Example: Using defaults
//!
//! ```rust
//! use semiocache::{ClearScope, EventsCacheConfig};
//!
//! let config = EventsCacheConfig::default();
//! assert_eq!(config.namespace, "events-cache");
//! assert_eq!(config.clear_scope, ClearScope::Network);
//! ```
//!
//! # Example: Custom configuration
//!
//! ```rust
//! use semiocache::{ClearScope, EventsCacheConfigBuilder};
//!
//! let config = EventsCacheConfigBuilder::new()
//!     .namespace("my-tool")
//!     .clear_scope(ClearScope::All)
//!     .build();
//! ```

use serde::{Deserialize, Serialize};

pub mod constants;

use constants::DEFAULT_NAMESPACE;

/// What [`EventsCache::clear`](crate::EventsCache::clear) removes
///
/// Several caches for different networks may share one store. Both scopes only
/// ever touch keys under the cache's namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearScope {
    /// Only keys of the cache's own network
    #[default]
    Network,
    /// Keys of every network under the namespace
    All,
}

/// Configuration for [`EventsCache`](crate::EventsCache)
///
/// Use [`EventsCacheConfigBuilder`] for a fluent API to construct instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsCacheConfig {
    /// Prefix of every cache key, separating this cache's records from other
    /// data in the same store
    /// Default: "events-cache"
    pub namespace: String,

    /// Scope of `clear()`
    /// Default: [`ClearScope::Network`]
    pub clear_scope: ClearScope,
}

impl Default for EventsCacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            clear_scope: ClearScope::default(),
        }
    }
}

/// Builder for [`EventsCacheConfig`]
#[derive(Debug, Clone, Default)]
pub struct EventsCacheConfigBuilder {
    config: EventsCacheConfig,
}

impl EventsCacheConfigBuilder {
    /// Start from the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key namespace
    ///
    /// A trailing `:` is dropped, since the key format adds its own separator.
    /// Any other `:` is escaped in keys, so `tool` and `tool:1` never share
    /// records.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.config.namespace = namespace.trim_end_matches(':').to_string();
        self
    }

    /// Set what `clear()` removes
    pub fn clear_scope(mut self, scope: ClearScope) -> Self {
        self.config.clear_scope = scope;
        self
    }

    pub fn build(self) -> EventsCacheConfig {
        self.config
    }
}
