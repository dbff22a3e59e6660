//! Cache Module
//!
//! Provides concurrency-safe cache items and the table that owns them.

mod item;
mod stats;
mod table;


// Re-export public types
pub use item::{CacheItem, ExpiryCallback};
pub use stats::CacheStats;
pub use table::{CacheTable, DataLoader, ExpirationReport, ItemCallback};
