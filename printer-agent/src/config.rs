//! Agent configuration
//!
//! All settings come from environment variables (a `.env` file is
//! loaded first when present). Defaults cover everything except the
//! restaurant binding; validation runs once at startup and malformed
//! values are fatal.
//!
//! | Environment variable | Default | Meaning |
//! |----------------------|---------|---------|
//! | BACKEND_ADDR | 127.0.0.1:8081 | Backend channel endpoint |
//! | RESTAURANT_ID | (required) | Restaurant this agent serves |
//! | PRINTER_ADDR | 192.168.1.100:9100 | Printer network address |
//! | LOCALE | default | Locale hint for receipt text |
//! | CURRENCY | THB | Currency label on receipts |
//! | PAPER_WIDTH | 32 | Paper width in characters |
//! | POLL_INTERVAL_MS | 2000 | Availability poll cadence |
//! | PROBE_TIMEOUT_MS | 2000 | Availability probe bound |
//! | RETRY_MAX_ATTEMPTS | 3 | Print attempts per job |
//! | RETRY_BASE_DELAY_MS | 1000 | First inter-attempt delay |
//! | HEARTBEAT_INTERVAL_MS | 5000 | Status heartbeat cadence |
//! | SETTLE_DELAY_MS | 1000 | Pause before the post-join status |
//! | RECONNECT_DELAY_MS | 500 | Reconnect backoff start |
//! | MAX_RECONNECT_DELAY_MS | 10000 | Reconnect backoff ceiling |
//! | SHUTDOWN_TIMEOUT_MS | 10000 | Graceful shutdown bound |
//! | LOG_LEVEL | info | Log filter level |
//! | LOG_DIR | (unset) | Daily rolling log directory |

use comanda_printer::RetryPolicy;
use std::net::SocketAddr;
use std::time::Duration;

/// Agent configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub backend_addr: String,
    pub restaurant_id: String,
    pub printer_addr: String,
    pub locale: String,
    pub currency: String,
    pub paper_width: usize,
    pub poll_interval_ms: u64,
    pub probe_timeout_ms: u64,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub settle_delay_ms: u64,
    pub reconnect_delay_ms: u64,
    pub max_reconnect_delay_ms: u64,
    pub shutdown_timeout_ms: u64,
    pub log_level: String,
    pub log_dir: Option<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AgentConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            backend_addr: std::env::var("BACKEND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8081".into()),
            restaurant_id: std::env::var("RESTAURANT_ID").unwrap_or_default(),
            printer_addr: std::env::var("PRINTER_ADDR")
                .unwrap_or_else(|_| "192.168.1.100:9100".into()),
            locale: std::env::var("LOCALE").unwrap_or_else(|_| "default".into()),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "THB".into()),
            paper_width: env_or("PAPER_WIDTH", 32),
            poll_interval_ms: env_or("POLL_INTERVAL_MS", 2000),
            probe_timeout_ms: env_or("PROBE_TIMEOUT_MS", 2000),
            retry_max_attempts: env_or("RETRY_MAX_ATTEMPTS", 3),
            retry_base_delay_ms: env_or("RETRY_BASE_DELAY_MS", 1000),
            heartbeat_interval_ms: env_or("HEARTBEAT_INTERVAL_MS", 5000),
            settle_delay_ms: env_or("SETTLE_DELAY_MS", 1000),
            reconnect_delay_ms: env_or("RECONNECT_DELAY_MS", 500),
            max_reconnect_delay_ms: env_or("MAX_RECONNECT_DELAY_MS", 10000),
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    /// Check the loaded configuration; errors here abort startup
    pub fn validate(&self) -> Result<(), String> {
        if self.restaurant_id.trim().is_empty() {
            return Err("RESTAURANT_ID must be set".to_string());
        }
        if self.printer_addr.parse::<SocketAddr>().is_err() {
            return Err(format!(
                "PRINTER_ADDR is not a valid socket address: {}",
                self.printer_addr
            ));
        }
        if self.backend_addr.trim().is_empty() {
            return Err("BACKEND_ADDR must be set".to_string());
        }
        if self.retry_max_attempts == 0 {
            return Err("RETRY_MAX_ATTEMPTS must be at least 1".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("POLL_INTERVAL_MS must be positive".to_string());
        }
        if self.paper_width < 16 {
            return Err("PAPER_WIDTH must be at least 16 characters".to_string());
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
