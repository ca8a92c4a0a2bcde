//! Application configuration loaded from environment variables.

use std::time::Duration;

use bus::DEFAULT_EXCHANGE;
use finance::{DEFAULT_INVOICE_DURATION_SECS, MAX_INVOICE_DURATION_SECS};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address (default `0.0.0.0:3000`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `DATABASE_URL`: PostgreSQL; unset runs on in-memory stores
/// - `AMQP_URL`, `EVENT_EXCHANGE`: RabbitMQ; unset runs an in-process bus
/// - `INVOICE_API_KEY`, `INVOICE_BASE_URL`, `INVOICE_TIMEOUT_SECS`,
///   `INVOICE_CURRENCY`: Xendit; no key runs a local fake provider
/// - `DEFAULT_INVOICE_DURATION_SECS`: invoice lifetime (default one day)
/// - `SWEEP_INTERVAL_SECS`: expiry sweep period (default one day)
/// - `WEBHOOK_CALLBACK_TOKEN`: required `x-callback-token` on webhooks
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub amqp_url: Option<String>,
    pub event_exchange: String,
    pub invoice_api_key: Option<String>,
    pub invoice_base_url: String,
    pub invoice_timeout: Duration,
    pub invoice_currency: String,
    pub invoice_duration_secs: i64,
    pub sweep_interval: Duration,
    pub webhook_callback_token: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        // Blank values count as unset.
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        // Zero durations count as unset.
        let secs = |key: &str| {
            var(key)
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
        };

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: var("DATABASE_URL"),
            amqp_url: var("AMQP_URL"),
            event_exchange: var("EVENT_EXCHANGE").unwrap_or(defaults.event_exchange),
            invoice_api_key: var("INVOICE_API_KEY"),
            invoice_base_url: var("INVOICE_BASE_URL").unwrap_or(defaults.invoice_base_url),
            invoice_timeout: secs("INVOICE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.invoice_timeout),
            invoice_currency: var("INVOICE_CURRENCY").unwrap_or(defaults.invoice_currency),
            invoice_duration_secs: var("DEFAULT_INVOICE_DURATION_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs: &i64| (1..=MAX_INVOICE_DURATION_SECS).contains(secs))
                .unwrap_or(defaults.invoice_duration_secs),
            sweep_interval: secs("SWEEP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            webhook_callback_token: var("WEBHOOK_CALLBACK_TOKEN"),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            amqp_url: None,
            event_exchange: DEFAULT_EXCHANGE.to_string(),
            invoice_api_key: None,
            invoice_base_url: "https://api.xendit.co".to_string(),
            invoice_timeout: Duration::from_secs(10),
            invoice_currency: "IDR".to_string(),
            invoice_duration_secs: DEFAULT_INVOICE_DURATION_SECS,
            sweep_interval: Duration::from_secs(24 * 60 * 60),
            webhook_callback_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = from_pairs(&[]);
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.event_exchange, "forest_events");
        assert_eq!(config.invoice_base_url, "https://api.xendit.co");
        assert_eq!(config.invoice_timeout, Duration::from_secs(10));
        assert_eq!(config.invoice_duration_secs, 86_400);
        assert_eq!(config.sweep_interval, Duration::from_secs(86_400));
        assert!(config.database_url.is_none());
        assert!(config.invoice_api_key.is_none());
        assert!(config.webhook_callback_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/forest"),
            ("EVENT_EXCHANGE", "trees"),
            ("INVOICE_TIMEOUT_SECS", "3"),
            ("SWEEP_INTERVAL_SECS", "60"),
            ("WEBHOOK_CALLBACK_TOKEN", "s3cret"),
        ]);
        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/forest")
        );
        assert_eq!(config.event_exchange, "trees");
        assert_eq!(config.invoice_timeout, Duration::from_secs(3));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.webhook_callback_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_invalid_and_blank_values_fall_back() {
        let config = from_pairs(&[
            ("PORT", "not-a-port"),
            ("INVOICE_API_KEY", "  "),
            ("SWEEP_INTERVAL_SECS", "0"),
            ("INVOICE_TIMEOUT_SECS", "0"),
            ("DEFAULT_INVOICE_DURATION_SECS", "-5"),
        ]);
        assert_eq!(config.port, 3000);
        assert!(config.invoice_api_key.is_none());
        assert_eq!(config.sweep_interval, Duration::from_secs(86_400));
        assert_eq!(config.invoice_timeout, Duration::from_secs(10));
        assert_eq!(config.invoice_duration_secs, 86_400);

        let config = from_pairs(&[("DEFAULT_INVOICE_DURATION_SECS", "99999999999")]);
        assert_eq!(config.invoice_duration_secs, 86_400);
    }
}
