//! Injected dependencies and booking rules shared by every reducer.

use crate::config::Config;
use crate::notifier::{ConsoleNotifier, Notifier};
use crate::payment_gateway::{MockPaymentGateway, PaymentGateway};
use boxoffice_core::environment::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Booking rules
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookingPolicy {
    /// How long a seat stays held for a pending booking
    pub hold_duration: chrono::Duration,
    /// Cancellation needs at least this many whole days before the event
    pub cancellation_window_days: i64,
    /// Most WAITING entries per event
    pub waitlist_capacity: usize,
    /// Seats generated per row
    pub seats_per_row: u32,
    /// `max_per_booking` when a category does not set one
    pub default_max_per_booking: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            hold_duration: chrono::Duration::minutes(10),
            cancellation_window_days: 7,
            waitlist_capacity: 50,
            seats_per_row: 10,
            default_max_per_booking: 10,
        }
    }
}

impl BookingPolicy {
    /// Policy from loaded configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            hold_duration: chrono::Duration::minutes(config.policy.hold_minutes),
            cancellation_window_days: config.policy.cancellation_window_days,
            waitlist_capacity: config.policy.waitlist_capacity,
            ..Self::default()
        }
    }
}

/// Environment for [`crate::aggregates::BoxOfficeReducer`]
#[derive(Clone)]
pub struct BoxOfficeEnvironment {
    /// Clock for timestamps, hold expiry and windows
    pub clock: Arc<dyn Clock>,
    /// Card processor
    pub gateway: Arc<dyn PaymentGateway>,
    /// Notification delivery
    pub notifier: Arc<dyn Notifier>,
    /// Artificial delay before every reply
    pub latency: Duration,
    /// Booking rules
    pub policy: BookingPolicy,
}

impl BoxOfficeEnvironment {
    /// Environment with no reply latency and the default policy
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, gateway: Arc<dyn PaymentGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            clock,
            gateway,
            notifier,
            latency: Duration::ZERO,
            policy: BookingPolicy::default(),
        }
    }

    /// Production wiring: wall clock, mock gateway and console notifier
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let gateway = MockPaymentGateway::new(
            Duration::from_millis(config.gateway.latency_ms),
            config.gateway.failure_rate,
        );
        Self {
            clock: Arc::new(SystemClock),
            gateway: gateway.shared(),
            notifier: Arc::new(ConsoleNotifier),
            latency: config.latency(),
            policy: BookingPolicy::from_config(config),
        }
    }

    /// Replace the reply latency
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Replace the booking rules
    #[must_use]
    pub const fn with_policy(mut self, policy: BookingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current time
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl std::fmt::Debug for BoxOfficeEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxOfficeEnvironment")
            .field("now", &self.clock.now())
            .field("latency", &self.latency)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
