//! Declarative cache construction.
//!
//! A [`CacheConfig`] names a policy, a capacity and a default TTL, and builds
//! the matching cache behind `Box<dyn Cache>`. Configs can be written in JSON:
//!
//! ```json
//! { "policy": "lfu", "capacity": 1000, "default_ttl_ms": 60000 }
//! ```
//!
//! Missing fields default to an unbounded LRU cache without expiry.

use crate::cache::Cache;
use crate::core::CacheCore;
use crate::error::{Error, Result};
use crate::policy::{Fifo, Lfu, Lru};
use crate::timed::TimedCache;
use crate::weak::WeakCache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Eviction policy selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Fifo,
    #[default]
    Lru,
    Lfu,
    Timed,
    Unbounded,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Fifo => write!(f, "fifo"),
            PolicyKind::Lru => write!(f, "lru"),
            PolicyKind::Lfu => write!(f, "lfu"),
            PolicyKind::Timed => write!(f, "timed"),
            PolicyKind::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Settings for building a cache.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub policy: PolicyKind,

    /// Maximum number of entries, `0` for unbounded.
    pub capacity: usize,

    /// TTL applied by `put`, zero for no expiry.
    #[serde(rename = "default_ttl_ms", with = "millis")]
    pub default_ttl: Duration,
}

impl CacheConfig {
    /// Unbounded config for `policy` without expiry.
    pub fn new(policy: PolicyKind) -> Self {
        CacheConfig {
            policy,
            ..Default::default()
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// Returns `Err(Error::ConfigError)` for malformed JSON, unknown fields,
    /// or a config that fails [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CacheConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings are meaningful for the chosen policy.
    ///
    /// # Errors
    ///
    /// - `timed` or `unbounded` with a non-zero capacity
    /// - `unbounded` with a non-zero default TTL
    pub fn validate(&self) -> Result<()> {
        match self.policy {
            PolicyKind::Timed | PolicyKind::Unbounded if self.capacity != 0 => {
                Err(Error::ConfigError(format!(
                    "{} caches have no capacity (got {})",
                    self.policy, self.capacity
                )))
            }
            PolicyKind::Unbounded if !self.default_ttl.is_zero() => Err(Error::ConfigError(
                "unbounded caches do not expire entries".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Build the configured cache.
    ///
    /// # Errors
    ///
    /// Returns `Err(Error::ConfigError)` if the config is invalid or names the
    /// `unbounded` policy, which holds values weakly and needs
    /// [`build_shared`](Self::build_shared).
    pub fn build<K, V>(&self) -> Result<Box<dyn Cache<K, V>>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        self.validate()?;
        let cache: Box<dyn Cache<K, V>> = match self.policy {
            PolicyKind::Fifo => Box::new(CacheCore::with_policy(
                Fifo,
                self.capacity,
                self.default_ttl,
            )),
            PolicyKind::Lru => Box::new(CacheCore::with_policy(
                Lru,
                self.capacity,
                self.default_ttl,
            )),
            PolicyKind::Lfu => Box::new(CacheCore::with_policy(
                Lfu,
                self.capacity,
                self.default_ttl,
            )),
            PolicyKind::Timed => Box::new(TimedCache::new(self.default_ttl)),
            PolicyKind::Unbounded => {
                return Err(Error::ConfigError(
                    "unbounded caches hold shared values; use build_shared".to_string(),
                ))
            }
        };
        debug!(
            "Built {} cache (capacity {}, ttl {:?})",
            self.policy, self.capacity, self.default_ttl
        );
        Ok(cache)
    }

    /// Build the configured cache over shared values. Supports every policy.
    ///
    /// # Errors
    ///
    /// Returns `Err(Error::ConfigError)` if the config is invalid.
    pub fn build_shared<K, T>(&self) -> Result<Box<dyn Cache<K, Arc<T>>>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        if self.policy == PolicyKind::Unbounded {
            self.validate()?;
            debug!("Built unbounded weak cache");
            return Ok(Box::new(WeakCache::<K, T>::new()));
        }
        self.build()
    }
}

/// `Duration` as integer milliseconds.
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
