//! ttlcache - Concurrency-safe TTL cache items
//!
//! Provides cache items that track their own access statistics and expiry
//! callbacks, plus a table that looks them up and sweeps expired ones.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheItem, CacheTable};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweeper_task;
