//! Box Office - event ticketing booking core
//!
//! Organizers publish events with priced ticket categories and generated
//! seats. Attendees hold seats, pay, and receive a QR code they present at
//! the door. Sold-out events keep a FIFO waitlist that is offered released
//! seats when a booking is cancelled.
//!
//! # Architecture
//!
//! ```text
//!                ┌────────────────────────────────────────────┐
//!  BoxOffice ──▶ │ Store<Database, BoxOfficeAction, ...>      │
//!  (facade)      │                                            │
//!                │  Accounts  Catalog  Booking  Payment       │
//!                │  Waitlist  Notification   (reducers)       │
//!                └──────────────┬─────────────────────────────┘
//!                               │ effects
//!                ┌──────────────┴──────────────┐
//!                │ Clock  PaymentGateway  Notifier │
//!                └─────────────────────────────┘
//! ```
//!
//! Every command is a [`BoxOfficeAction`] reduced against the in-memory
//! [`Database`]. The reducer answers with a [`BoxOfficeAction::Replied`]
//! after the configured latency; the [`BoxOffice`] facade turns that into an
//! async call. Gateway charges and refunds run as effects and feed their
//! outcome back into the store.
//!
//! # Seat lifecycle
//!
//! ```text
//! Available ──create──▶ Held{until} ──confirm──▶ Booked
//!     ▲                    │                       │
//!     └──── sweep/cancel ──┴──────── cancel ───────┘
//! ```
//!
//! Reports in [`analytics`] are pure functions over a state snapshot.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregates;
pub mod analytics;
pub mod app;
pub mod card;
pub mod config;
pub mod environment;
pub mod error;
pub mod metrics;
pub mod notifier;
pub mod payment_gateway;
pub mod qr;
pub mod types;

pub use aggregates::{BoxOfficeAction, BoxOfficeReducer, Reply};
pub use app::{BoxOffice, BoxOfficeStore, HoldSweeper, SweeperHandle};
pub use config::Config;
pub use environment::{BookingPolicy, BoxOfficeEnvironment};
pub use error::{BoxOfficeError, CardError, ServiceError};
pub use types::*;
