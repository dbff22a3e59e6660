//! ttlcache demo - runs a cache table with a background expiration sweeper
//!
//! Seeds a table with a few items, logs every expiry and prints the table
//! statistics on shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttlcache::{spawn_sweeper_task, CacheTable, Config};

/// Main entry point for the ttlcache demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache table and seed it
/// 4. Start the background expiration sweeper
/// 5. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttlcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ttlcache demo");

    let config = Config::from_env();
    info!(
        "Configuration loaded: table={}, default_life_span={}s, sweep_interval={}s",
        config.table_name, config.default_life_span, config.sweep_interval
    );

    let table: Arc<CacheTable<String, String>> = Arc::new(CacheTable::from_config(&config));
    table.set_about_to_delete_item_callback(|item| {
        info!(
            "Removing {:?} after {} accesses",
            item.key(),
            item.access_count()
        );
    });
    table.set_data_loader(|key: &String| {
        key.strip_prefix("computed:").map(|suffix| {
            ttlcache::CacheItem::new(key.clone(), Duration::from_secs(5), suffix.to_uppercase())
        })
    });

    seed(&table, &config)?;

    let sweeper = spawn_sweeper_task(table.clone(), config.sweep_interval);
    info!("Expiration sweeper started");

    shutdown_signal().await?;

    sweeper.abort();
    warn!("Expiration sweeper aborted");

    let stats = table.stats();
    info!(
        "Final stats: hits={}, misses={}, loads={}, expirations={}, entries={}, hit_rate={:.2}",
        stats.hits,
        stats.misses,
        stats.loads,
        stats.expirations,
        stats.total_entries,
        stats.hit_rate()
    );

    Ok(())
}

/// Inserts a few demo items and exercises the lookup paths once.
fn seed(table: &CacheTable<String, String>, config: &Config) -> Result<()> {
    let greeting = table.add(
        "greeting".to_string(),
        Duration::from_secs(2),
        "hello".to_string(),
    );
    greeting.add_about_to_expire_callback(|key: &String| info!("{} expired", key));

    table.add(
        "motd".to_string(),
        config.default_life_span(),
        "welcome".to_string(),
    );
    table.add("pinned".to_string(), Duration::ZERO, "forever".to_string());

    let hit = table.value(&"greeting".to_string())?;
    info!("greeting = {} (accessed {} times)", hit.data(), hit.access_count());

    let loaded = table.value(&"computed:demo".to_string())?;
    info!("computed:demo = {}", loaded.data());

    if let Err(err) = table.value(&"absent".to_string()) {
        info!("Lookup of absent key failed as expected: {}", err);
    }

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM, initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, initiating shutdown...");
    }

    Ok(())
}
