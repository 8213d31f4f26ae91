//! Error types for the box office.
//!
//! [`BoxOfficeError`] is the domain rejection carried back in replies; its
//! `Display` text is the message shown to the user. [`ServiceError`] is what
//! the [`crate::app::BoxOffice`] facade returns.

use boxoffice_runtime::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Card details rejected before reaching the gateway
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardError {
    /// Not 16 digits after removing whitespace
    #[error("Invalid card number. Must be 16 digits.")]
    InvalidLength,
    /// Expiry is not `MM/YY` with a month in 1..=12
    #[error("Invalid expiry date. Format should be MM/YY.")]
    InvalidExpiryFormat,
    /// CVV is not 3 or 4 digits
    #[error("Invalid CVV. Must be 3 or 4 digits.")]
    InvalidCvv,
    /// Expiry month is in the past
    #[error("Card has expired.")]
    Expired,
    /// Luhn checksum failed
    #[error("Invalid card number.")]
    FailedChecksum,
    /// Card method chosen but no card supplied
    #[error("Card details are required for card payments.")]
    Missing,
}

/// Domain rejections
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxOfficeError {
    // ----- accounts -----
    /// Login failed
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// Login to a deactivated account
    #[error("Account is inactive. Please contact administrator.")]
    AccountInactive,
    /// Self-registration with a taken e-mail
    #[error("Email already registered")]
    EmailAlreadyRegistered,
    /// Organizer registration with a taken e-mail
    #[error("Email already registered by another user")]
    EmailTakenByAnotherUser,
    /// Unknown user
    #[error("User not found")]
    UserNotFound,
    /// Password change with the wrong current password
    #[error("Current password is incorrect")]
    IncorrectPassword,
    /// Malformed registration input
    #[error("{0}")]
    InvalidAccount(String),

    // ----- catalog -----
    /// Unknown event
    #[error("Event not found")]
    EventNotFound,
    /// The auditorium already hosts an event that day
    #[error("This date is already booked for another event")]
    DateAlreadyBooked,
    /// Lifecycle move not allowed
    #[error("Event cannot move from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },
    /// Event details or category rejected
    #[error("{0}")]
    InvalidEvent(String),
    /// Unknown ticket category
    #[error("Ticket category not found")]
    TicketCategoryNotFound,
    /// Promotional code rejected
    #[error("{0}")]
    InvalidPromoCode(String),
    /// Unknown promotional code
    #[error("Promotional code not found")]
    PromoCodeNotFound,

    // ----- bookings -----
    /// Event is not published or ongoing
    #[error("Event is not open for booking")]
    EventNotBookable,
    /// Empty seat selection
    #[error("At least one seat must be selected")]
    NoSeatsSelected,
    /// Same seat requested twice
    #[error("Duplicate seat in booking request")]
    DuplicateSeat,
    /// Seat unknown, held or sold
    #[error("One or more selected seats are no longer available")]
    SeatsUnavailable,
    /// Too many seats of one category
    #[error("At most {max} {ticket_type} tickets can be booked at once")]
    TooManySeats {
        /// Category ticket type label
        ticket_type: String,
        /// Category limit
        max: u32,
    },
    /// Unknown booking
    #[error("Booking not found")]
    BookingNotFound,
    /// Confirming or paying for a booking that is not pending
    #[error("Booking is not awaiting payment")]
    BookingNotPending,
    /// Confirming a booking that owes money without a completed payment
    #[error("Booking has not been paid")]
    BookingNotPaid,
    /// Booking was cancelled already
    #[error("Booking is already cancelled")]
    BookingAlreadyCancelled,
    /// Checked-in bookings are final
    #[error("Checked-in bookings cannot be cancelled")]
    BookingCheckedIn,
    /// Too close to the event
    #[error("Cancellation is not allowed within {days} days of the event")]
    CancellationWindowClosed {
        /// Window length
        days: i64,
    },
    /// QR does not match
    #[error("Invalid QR code")]
    InvalidQrCode,
    /// Check-in of an unconfirmed booking
    #[error("Booking is not confirmed")]
    BookingNotConfirmed,

    // ----- payments -----
    /// Card rejected by local validation
    #[error(transparent)]
    Card(#[from] CardError),
    /// Booking already has a completed payment
    #[error("Booking has already been paid")]
    AlreadyPaid,
    /// Booking has a payment at the gateway
    #[error("A payment is already in progress for this booking")]
    PaymentInProgress,
    /// Gateway declined the charge
    #[error("Payment processing failed. Please try again.")]
    PaymentFailed,
    /// Unknown payment
    #[error("Payment not found")]
    PaymentNotFound,
    /// Refund of a payment that is not completed
    #[error("Only completed payments can be refunded")]
    RefundNotAllowed,
    /// Gateway refused the refund
    #[error("Refund failed: {0}")]
    RefundFailed(String),

    // ----- waitlist -----
    /// Queue full
    #[error("Waitlist capacity has been reached for this event")]
    WaitlistFull,
    /// Attendee already waiting
    #[error("You are already on the waitlist for this event")]
    AlreadyOnWaitlist,
    /// Unknown waitlist entry
    #[error("Waitlist entry not found")]
    WaitlistEntryNotFound,
    /// Quantity of zero
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    // ----- notifications -----
    /// Unknown notification
    #[error("Notification not found")]
    NotificationNotFound,
}

impl BoxOfficeError {
    /// Rejection for a disallowed event status change
    #[must_use]
    pub fn transition<S: std::fmt::Debug>(from: S, to: S) -> Self {
        Self::InvalidStatusTransition {
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        }
    }
}

/// Errors returned by the [`crate::app::BoxOffice`] facade
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The command was rejected by domain rules
    #[error(transparent)]
    Rejected(#[from] BoxOfficeError),

    /// The store could not process the command
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A reply arrived with a payload of the wrong shape
    #[error("Unexpected reply for {operation}")]
    UnexpectedReply {
        /// Facade operation that received it
        operation: &'static str,
    },
}

impl ServiceError {
    /// The domain rejection, if this is one
    #[must_use]
    pub const fn rejection(&self) -> Option<&BoxOfficeError> {
        match self {
            Self::Rejected(error) => Some(error),
            _ => None,
        }
    }
}
