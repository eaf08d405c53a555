//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL URL; in-memory stores when unset
/// - `STOCK_SERVICE_URL` — remote stock ledger; in-process when unset
/// - `USER_SERVICE_URL` — remote user directory; permissive stub when unset
/// - `REMOTE_TIMEOUT_MS` — per-call timeout on remote calls (default: `2000`)
/// - `BREAKER_MAX_FAILURES` — consecutive faults before the circuit opens
///   (default: `5`)
/// - `BREAKER_COOLDOWN_SECS` — open-circuit cooldown (default: `30`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub stock_service_url: Option<String>,
    pub user_service_url: Option<String>,
    pub remote_timeout: Duration,
    pub breaker_max_failures: u32,
    pub breaker_cooldown: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            stock_service_url: std::env::var("STOCK_SERVICE_URL").ok(),
            user_service_url: std::env::var("USER_SERVICE_URL").ok(),
            remote_timeout: Duration::from_millis(
                std::env::var("REMOTE_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(2000),
            ),
            breaker_max_failures: std::env::var("BREAKER_MAX_FAILURES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            breaker_cooldown: Duration::from_secs(
                std::env::var("BREAKER_COOLDOWN_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
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
            stock_service_url: None,
            user_service_url: None,
            remote_timeout: Duration::from_millis(2000),
            breaker_max_failures: 5,
            breaker_cooldown: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
        assert_eq!(config.remote_timeout, Duration::from_millis(2000));
        assert_eq!(config.breaker_max_failures, 5);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
