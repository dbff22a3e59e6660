//! Expiration Sweeper Task
//!
//! Background task that periodically removes expired items from a table.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheTable;

/// Spawns a background task that runs expiration checks on `table`.
///
/// The task sleeps until the next item is due to expire, but never longer
/// than `sweep_interval_secs` (clamped to at least one second), then removes
/// expired items and fires their removal callbacks.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let table = Arc::new(CacheTable::<String, String>::new("sessions"));
/// let sweeper = spawn_sweeper_task(table.clone(), 1);
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_sweeper_task<K, V>(
    table: Arc<CacheTable<K, V>>,
    sweep_interval_secs: u64,
) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    let interval = Duration::from_secs(sweep_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiration sweeper for table {} with interval of {:?}",
            table.name(),
            interval
        );

        let mut wait = interval;
        loop {
            tokio::time::sleep(wait).await;

            let report = table.expiration_check();

            if report.removed > 0 {
                info!(
                    "Expiration sweep: removed {} items from table {}",
                    report.removed,
                    table.name()
                );
            } else {
                debug!("Expiration sweep: no expired items in table {}", table.name());
            }

            wait = report.next_due.map_or(interval, |due| due.min(interval));
        }
    })
}
