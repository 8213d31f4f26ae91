//! # Box Office Testing
//!
//! Testing utilities and helpers for the Box Office reducer architecture.
//!
//! This crate provides:
//! - Deterministic clocks (`FixedClock`, `ManualClock`)
//! - A Given-When-Then builder for reducers (`ReducerTest`)
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(BookingReducer)
//!     .with_env(test_environment())
//!     .given_state(seeded_database())
//!     .when_action(create_booking_command())
//!     .then_state(|db| assert_eq!(db.bookings.len(), 1))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use boxoffice_core::environment::Clock;


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::Duration;
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use boxoffice_testing::mocks::FixedClock;
    /// use boxoffice_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// A clock that only moves when told to
    ///
    /// Clones share the same instant, so a test can keep one clone and hand
    /// another to the environment under test. Used for hold expiry and
    /// cancellation-window scenarios.
    ///
    /// ```
    /// use boxoffice_testing::mocks::ManualClock;
    /// use boxoffice_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let start = Utc::now();
    /// let clock = ManualClock::new(start);
    /// clock.advance(Duration::minutes(11));
    /// assert_eq!(clock.now(), start + Duration::minutes(11));
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock frozen at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Jump to an absolute instant
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = to;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2026-03-01 09:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_instant())
    }

    /// The instant [`test_clock`] is frozen at
    #[must_use]
    pub fn test_instant() -> DateTime<Utc> {
        DateTime::from_timestamp(1_772_355_600, 0).unwrap_or_default()
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, test_clock, test_instant};
pub use reducer_test::{ReducerTest, assertions};
