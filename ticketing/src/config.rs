//! Configuration management for the box office.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Values that fail to parse fall back to their default.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Simulated latency and timeouts
    pub runtime: RuntimeConfig,
    /// Mock payment gateway behaviour
    pub gateway: GatewayConfig,
    /// Booking rules
    pub policy: PolicyConfig,
    /// Seeded administrator account
    pub admin: AdminConfig,
}

/// Latency and timeout settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Artificial delay before every reply and query, in milliseconds
    pub latency_ms: u64,
    /// How long the facade waits for a reply, in seconds
    pub reply_timeout_secs: u64,
    /// Period of the hold-expiry sweep, in seconds
    pub sweep_interval_secs: u64,
}

/// Mock gateway settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Simulated processing time, in milliseconds
    pub latency_ms: u64,
    /// Probability in `[0, 1]` that a charge is declined
    pub failure_rate: f64,
}

/// Booking rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Seat hold duration, in minutes
    pub hold_minutes: i64,
    /// Bookings cannot be cancelled fewer than this many days before the event
    pub cancellation_window_days: i64,
    /// Maximum waiting entries per event
    pub waitlist_capacity: usize,
}

/// Seeded administrator account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Login e-mail
    pub email: String,
    /// Initial password
    pub password: String,
}

impl Config {
    /// Loads `.env` (if present) and then reads the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            runtime: RuntimeConfig {
                latency_ms: parse_var(&lookup, "BOXOFFICE_LATENCY_MS").unwrap_or(300),
                reply_timeout_secs: parse_var(&lookup, "BOXOFFICE_REPLY_TIMEOUT_SECS").unwrap_or(30),
                sweep_interval_secs: parse_var(&lookup, "BOXOFFICE_SWEEP_INTERVAL_SECS")
                    .filter(|secs: &u64| *secs > 0)
                    .unwrap_or(60),
            },
            gateway: GatewayConfig {
                latency_ms: parse_var(&lookup, "BOXOFFICE_GATEWAY_LATENCY_MS").unwrap_or(2_000),
                failure_rate: parse_var::<f64, _>(&lookup, "BOXOFFICE_PAYMENT_FAILURE_RATE")
                    .filter(|rate| rate.is_finite())
                    .map_or(0.05, |rate| rate.clamp(0.0, 1.0)),
            },
            policy: PolicyConfig {
                hold_minutes: parse_var(&lookup, "BOXOFFICE_HOLD_MINUTES")
                    .filter(|minutes: &i64| *minutes > 0)
                    .unwrap_or(10),
                cancellation_window_days: parse_var(&lookup, "BOXOFFICE_CANCELLATION_WINDOW_DAYS")
                    .filter(|days: &i64| *days >= 0)
                    .unwrap_or(7),
                waitlist_capacity: parse_var(&lookup, "BOXOFFICE_WAITLIST_CAPACITY").unwrap_or(50),
            },
            admin: AdminConfig {
                email: lookup("BOXOFFICE_ADMIN_EMAIL")
                    .unwrap_or_else(|| "admin@helpevents.com".to_string()),
                password: lookup("BOXOFFICE_ADMIN_PASSWORD")
                    .unwrap_or_else(|| "Admin@123".to_string()),
            },
        }
    }

    /// Reply/query latency
    #[must_use]
    pub const fn latency(&self) -> Duration {
        Duration::from_millis(self.runtime.latency_ms)
    }

    /// Reply timeout
    #[must_use]
    pub const fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.runtime.reply_timeout_secs)
    }

    /// Sweep period
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.runtime.sweep_interval_secs)
    }
}

/// Parses one variable, `None` when absent or malformed
fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|value| value.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
