//! # hoard
//!
//! In-process, thread-safe key/value caches with pluggable eviction.
//!
//! ## Features
//!
//! - **Bounded policies:** FIFO, LRU and LFU caches with an entry capacity
//! - **Expiry:** a default TTL per cache, overridable per `put`
//! - **Time-only cache:** unbounded, TTL-driven, with optional background pruning
//! - **Weak cache:** holds values only while callers keep an `Arc` to them
//! - **Concurrent:** one reader/writer lock per cache, reads share it
//! - **Observable:** removal listeners and hit/miss statistics
//!
//! ## Quick Start
//!
//! ```
//! use hoard::{Cache, CacheConfig, LfuCache, PolicyKind};
//! use std::time::Duration;
//!
//! // Construct directly...
//! let cache = LfuCache::with_timeout(100, Duration::from_secs(60));
//! cache.put("user:1", "alice".to_string());
//! assert_eq!(cache.get(&"user:1").as_deref(), Some("alice"));
//!
//! // ...or from a config, behind the `Cache` trait.
//! let cache = CacheConfig::new(PolicyKind::Fifo)
//!     .with_capacity(2)
//!     .build::<u32, u32>()?;
//! cache.put(1, 10);
//! cache.put(2, 20);
//! cache.put(3, 30);
//! assert_eq!(cache.get(&1), None);
//! # Ok::<(), hoard::Error>(())
//! ```
//!
//! ## Variants
//!
//! | Type | Capacity | Expiry | `prune()` |
//! |------|----------|--------|-----------|
//! | [`FifoCache`] | yes | yes | expired, then oldest |
//! | [`LruCache`] | yes | yes | expired |
//! | [`LfuCache`] | yes | yes | expired, then least used |
//! | [`TimedCache`] | no | yes | expired |
//! | [`WeakCache`] | no | no | unsupported |

#[macro_use]
extern crate log;

pub mod cache;
pub mod config;
pub mod core;
pub mod entry;
pub mod error;
pub mod file;
pub mod observability;
pub mod policy;
pub mod scheduler;
pub mod store;
pub mod timed;
pub mod weak;

// Re-exports for convenience
pub use cache::Cache;
pub use config::{CacheConfig, PolicyKind};
pub use crate::core::CacheCore;
pub use entry::CacheEntry;
pub use error::{Error, Result};
pub use file::FileCache;
pub use observability::{CacheStats, RemovalCause, RemovalListener};
pub use policy::{EvictionPolicy, Fifo, FifoCache, Lfu, LfuCache, Lru, LruCache, Timed, Unbounded};
pub use scheduler::PruneSchedule;
pub use store::{Store, Weigher};
pub use timed::TimedCache;
pub use weak::WeakCache;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
