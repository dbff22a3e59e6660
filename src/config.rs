//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the cache table, used in log output
    pub table_name: String,
    /// Life span in seconds for items added without an explicit one
    pub default_life_span: u64,
    /// Upper bound in seconds between two expiration sweeps
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TABLE_NAME` - Table name (default: "default")
    /// - `DEFAULT_LIFE_SPAN` - Item life span in seconds, 0 = never expires (default: 300)
    /// - `SWEEP_INTERVAL` - Maximum seconds between sweeps (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            table_name: env::var("CACHE_TABLE_NAME").unwrap_or(defaults.table_name),
            default_life_span: parse_var("DEFAULT_LIFE_SPAN").unwrap_or(defaults.default_life_span),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
        }
    }

    pub fn default_life_span(&self) -> Duration {
        Duration::from_secs(self.default_life_span)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: "default".to_string(),
            default_life_span: 300,
            sweep_interval: 1,
        }
    }
}
