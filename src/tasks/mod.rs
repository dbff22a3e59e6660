//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache table.
//!
//! # Tasks
//! - Expiration sweep: Removes items whose life span has elapsed

mod sweeper;

pub use sweeper::spawn_sweeper_task;
