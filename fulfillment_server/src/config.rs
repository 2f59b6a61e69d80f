use std::env;

use fulfillment_engine::db_url;
use log::*;
use payos_tools::PayOsConfig;

const DEFAULT_OFS_HOST: &str = "127.0.0.1";
const DEFAULT_OFS_PORT: u16 = 8460;
/// How long a hosted-checkout payment stays claimable before the watchdog fails it.
const DEFAULT_PAYMENT_TTL_SECONDS: i64 = 900;
/// How often the watchdog sweeps for due expiry markers.
const DEFAULT_WATCHDOG_INTERVAL_SECONDS: u64 = 30;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Lifetime of a hosted-checkout payment link, in seconds. Once it lapses, the expiry
    /// watchdog fails the payment and the reserved stock is released.
    pub payment_ttl_seconds: i64,
    /// The sweep interval of the expiry watchdog, in seconds.
    pub watchdog_interval_seconds: u64,
    /// PayOS gateway credentials and endpoints.
    pub payos: PayOsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OFS_HOST.to_string(),
            port: DEFAULT_OFS_PORT,
            database_url: String::default(),
            payment_ttl_seconds: DEFAULT_PAYMENT_TTL_SECONDS,
            watchdog_interval_seconds: DEFAULT_WATCHDOG_INTERVAL_SECONDS,
            payos: PayOsConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OFS_HOST").ok().unwrap_or_else(|| DEFAULT_OFS_HOST.into());
        let port = env::var("OFS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for OFS_PORT. {e} Using the default, {DEFAULT_OFS_PORT}, instead."
                    );
                    DEFAULT_OFS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_OFS_PORT);
        let database_url = db_url();
        let payment_ttl_seconds = env::var("OFS_PAYMENT_TTL")
            .map_err(|_| {
                info!(
                    "🪛️ OFS_PAYMENT_TTL is not set. Using the default value of {DEFAULT_PAYMENT_TTL_SECONDS} seconds."
                )
            })
            .and_then(|s| {
                s.parse::<i64>().map_err(|e| warn!("🪛️ Invalid configuration value for OFS_PAYMENT_TTL. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_PAYMENT_TTL_SECONDS);
        let watchdog_interval_seconds = env::var("OFS_WATCHDOG_INTERVAL")
            .map_err(|_| {
                info!(
                    "🪛️ OFS_WATCHDOG_INTERVAL is not set. Using the default value of \
                     {DEFAULT_WATCHDOG_INTERVAL_SECONDS} seconds."
                )
            })
            .and_then(|s| {
                s.parse::<u64>().map_err(|e| warn!("🪛️ Invalid configuration value for OFS_WATCHDOG_INTERVAL. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_WATCHDOG_INTERVAL_SECONDS);
        let payos = PayOsConfig::new_from_env_or_default();
        Self { host, port, database_url, payment_ttl_seconds, watchdog_interval_seconds, payos }
    }
}
