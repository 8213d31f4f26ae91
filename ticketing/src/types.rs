//! Domain types for the box office.
//!
//! This module contains the identifiers, value objects, entities and the
//! in-memory [`Database`] that every reducer operates on.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a user account
    UserId
);
entity_id!(
    /// Unique identifier for an event
    EventId
);
entity_id!(
    /// Unique identifier for a ticket category
    TicketCategoryId
);
entity_id!(
    /// Unique identifier for a seat
    SeatId
);
entity_id!(
    /// Unique identifier for a promotional code
    PromoCodeId
);
entity_id!(
    /// Unique identifier for a booking
    BookingId
);
entity_id!(
    /// Unique identifier for a payment
    PaymentId
);
entity_id!(
    /// Unique identifier for a waitlist entry
    WaitlistId
);
entity_id!(
    /// Unique identifier for a notification
    NotificationId
);
entity_id!(
    /// Ties a command to the reply it eventually produces
    CorrelationId
);

// ============================================================================
// Value Objects
// ============================================================================

/// Money amount in cents (avoids floating point errors)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero dollars
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole dollars, saturating on overflow
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars.saturating_mul(100))
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount in dollars (rounded down)
    #[must_use]
    pub const fn dollars(&self) -> u64 {
        self.0 / 100
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Adds two money amounts, saturating at the maximum
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtracts, flooring at zero
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// The smaller of two amounts
    #[must_use]
    pub const fn min(self, other: Self) -> Self {
        if self.0 <= other.0 { self } else { other }
    }

    /// `percent`% of this amount, rounded half up to the nearest cent
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)] // bounded by the branch
    pub const fn percentage(self, percent: u8) -> Self {
        let cents = ((self.0 as u128) * (percent as u128) + 50) / 100;
        if cents > u64::MAX as u128 {
            Self(u64::MAX)
        } else {
            Self(cents as u64)
        }
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Promotional discount: a percentage OR a flat amount, never both
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Percent off the eligible subtotal (1..=100)
    Percentage(u8),
    /// Fixed amount off the booking
    Flat(Money),
}

impl Discount {
    /// Discount owed on a booking.
    ///
    /// `eligible` is the subtotal of seats the code applies to and `total` the
    /// whole booking; the result never exceeds `total`.
    #[must_use]
    pub const fn amount_off(&self, eligible: Money, total: Money) -> Money {
        let raw = match self {
            Self::Percentage(percent) => eligible.percentage(*percent),
            Self::Flat(amount) => *amount,
        };
        raw.min(total)
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Account role
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Venue administrator
    Admin,
    /// Creates and runs events
    EventOrganizer,
    /// Books tickets
    Attendee,
}

/// Event lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Being set up, not visible to attendees
    Draft,
    /// Open for booking
    Published,
    /// Happening now; still bookable
    Ongoing,
    /// Over
    Completed,
    /// Called off
    Cancelled,
}

impl EventStatus {
    /// Whether attendees may create bookings
    #[must_use]
    pub const fn is_bookable(self) -> bool {
        matches!(self, Self::Published | Self::Ongoing)
    }

    /// Whether no further transitions are possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Allowed lifecycle moves: forward one step, or cancel from any
    /// non-terminal state
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Published)
                | (Self::Published, Self::Ongoing)
                | (Self::Ongoing, Self::Completed)
                | (Self::Draft | Self::Published | Self::Ongoing, Self::Cancelled)
        )
    }
}

/// Ticket type offered by a category
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketType {
    /// Standard ticket
    GeneralAdmission,
    /// Premium ticket
    Vip,
    /// Concession for seniors
    SeniorCitizen,
    /// Concession for children
    Child,
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::GeneralAdmission => "General Admission",
            Self::Vip => "VIP",
            Self::SeniorCitizen => "Senior Citizen",
            Self::Child => "Child",
        };
        f.write_str(label)
    }
}

/// Auditorium section
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatSection {
    /// Closest to the stage
    Front,
    /// Centre block
    Middle,
    /// Rear block
    Back,
}

impl SeatSection {
    /// Every section, front to back
    pub const ALL: [Self; 3] = [Self::Front, Self::Middle, Self::Back];
}

/// Booking lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Seats held, awaiting payment
    Pending,
    /// Paid, QR issued
    Confirmed,
    /// Admitted at the door
    CheckedIn,
    /// Cancelled by the attendee
    Cancelled,
}

impl BookingStatus {
    /// Bookings that count as sold tickets
    #[must_use]
    pub const fn is_sold(self) -> bool {
        matches!(self, Self::Confirmed | Self::CheckedIn)
    }
}

/// Payment method chosen at checkout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Credit card
    CreditCard,
    /// Debit card
    DebitCard,
    /// Wallet provider
    EWallet,
    /// Direct transfer
    BankTransfer,
}

impl PaymentMethod {
    /// Whether card details must accompany the payment
    #[must_use]
    pub const fn requires_card(self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }
}

/// Payment status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Submitted to the gateway
    Pending,
    /// Charged
    Completed,
    /// Declined by the gateway
    Failed,
    /// Money returned
    Refunded,
}

/// Waitlist entry status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitlistStatus {
    /// In the queue
    Waiting,
    /// Told that tickets are available
    Notified,
    /// Went on to book
    Converted,
    /// Offer lapsed
    Expired,
}

/// Notification delivery channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationChannel {
    /// E-mail
    Email,
    /// Text message
    Sms,
    /// Shown in the application
    InApp,
}

// ============================================================================
// Entities
// ============================================================================

/// A user account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,
    /// Login e-mail, unique across accounts
    pub email: String,
    /// Stored as given; there is no real authentication backend
    pub password: String,
    /// Role
    pub role: UserRole,
    /// Display name
    pub full_name: String,
    /// Contact number
    pub phone_number: Option<String>,
    /// Organizer's company
    pub organization_name: Option<String>,
    /// Set for generated credentials until the first change
    pub must_change_password: bool,
    /// Deactivated accounts cannot log in
    pub is_active: bool,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

/// A scheduled event in the auditorium
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier
    pub id: EventId,
    /// Owning organizer
    pub organizer_id: UserId,
    /// Title
    pub name: String,
    /// Description
    pub description: String,
    /// Calendar day (one event per day)
    pub date: NaiveDate,
    /// Doors open
    pub start_time: NaiveTime,
    /// Finish
    pub end_time: NaiveTime,
    /// Venue
    pub location: String,
    /// Poster image reference
    pub poster_url: Option<String>,
    /// Lifecycle status
    pub status: EventStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// The instant the event starts (dates and times are taken as UTC)
    #[must_use]
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.date.and_time(self.start_time).and_utc()
    }
}

/// A priced ticket category of an event; owns a block of seats
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCategory {
    /// Unique identifier
    pub id: TicketCategoryId,
    /// Event
    pub event_id: EventId,
    /// Ticket type
    pub ticket_type: TicketType,
    /// Price per seat
    pub price: Money,
    /// Seats created for this category
    pub quantity: u32,
    /// Seats not yet sold
    pub available_quantity: u32,
    /// Section the seats sit in
    pub section: SeatSection,
    /// Free-text conditions (age limits, ID required, ...)
    pub restrictions: Option<String>,
    /// Most seats of this category one booking may take
    pub max_per_booking: u32,
}

/// Occupancy of a single seat
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SeatStatus {
    /// Free to book
    Available,
    /// Soft lock for a pending booking, released by the sweep after `until`
    Held {
        /// Booking holding the seat
        booking_id: BookingId,
        /// Hold expiry
        until: DateTime<Utc>,
    },
    /// Sold to a confirmed booking
    Booked {
        /// Owning booking
        booking_id: BookingId,
    },
}

impl SeatStatus {
    /// Not held and not booked
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }

    /// Currently under a hold
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        matches!(self, Self::Held { .. })
    }

    /// When the hold lapses
    #[must_use]
    pub const fn reserved_until(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Held { until, .. } => Some(*until),
            _ => None,
        }
    }

    /// Booking that holds or owns the seat
    #[must_use]
    pub const fn booking(&self) -> Option<BookingId> {
        match self {
            Self::Held { booking_id, .. } | Self::Booked { booking_id } => Some(*booking_id),
            Self::Available => None,
        }
    }
}

/// A physical seat
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Unique identifier
    pub id: SeatId,
    /// Event
    pub event_id: EventId,
    /// Category that prices the seat
    pub ticket_category_id: TicketCategoryId,
    /// Section
    pub section: SeatSection,
    /// Row letter
    pub row: char,
    /// Number within the row, from 1
    pub number: u32,
    /// Occupancy
    pub status: SeatStatus,
}

impl Seat {
    /// Human label such as `A7`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}{}", self.row, self.number)
    }
}

/// A discount code scoped to one event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionalCode {
    /// Unique identifier
    pub id: PromoCodeId,
    /// Event
    pub event_id: EventId,
    /// Upper-cased code
    pub code: String,
    /// Discount granted
    pub discount: Discount,
    /// Window start
    pub valid_from: DateTime<Utc>,
    /// Window end (inclusive)
    pub valid_until: DateTime<Utc>,
    /// Maximum redemptions
    pub usage_limit: Option<u32>,
    /// Redemptions so far
    pub usage_count: u32,
    /// Ticket types the code applies to; empty means all
    pub applicable_ticket_types: Vec<TicketType>,
    /// Switched off by the organizer when false
    pub is_active: bool,
}

impl PromotionalCode {
    /// Active, inside the validity window and under the usage limit
    #[must_use]
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && now >= self.valid_from
            && now <= self.valid_until
            && self.usage_limit.is_none_or(|limit| self.usage_count < limit)
    }

    /// Whether the code covers seats of `ticket_type`
    #[must_use]
    pub fn applies_to(&self, ticket_type: TicketType) -> bool {
        self.applicable_ticket_types.is_empty() || self.applicable_ticket_types.contains(&ticket_type)
    }
}

/// Seat snapshot embedded in a booking
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSeat {
    /// Seat
    pub seat_id: SeatId,
    /// Category at booking time
    pub ticket_category_id: TicketCategoryId,
    /// Ticket type at booking time
    pub ticket_type: TicketType,
    /// Section
    pub section: SeatSection,
    /// Row letter
    pub row: char,
    /// Seat number
    pub number: u32,
    /// Price at booking time
    pub price: Money,
}

/// An attendee's booking
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier
    pub id: BookingId,
    /// Attendee
    pub attendee_id: UserId,
    /// Event
    pub event_id: EventId,
    /// Seats as booked
    pub seats: Vec<BookingSeat>,
    /// Sum of seat prices
    pub total_amount: Money,
    /// Promotional discount, never above `total_amount`
    pub discount_amount: Money,
    /// `total_amount - discount_amount`
    pub final_amount: Money,
    /// Code that produced the discount
    pub promo_code: Option<String>,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Admission token, issued on confirmation
    pub qr_code: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Confirmation time
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Admission time
    pub checked_in_at: Option<DateTime<Utc>>,
    /// Cancellation time
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// A payment attempt for a booking
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Booking paid for
    pub booking_id: BookingId,
    /// Amount charged
    pub amount: Money,
    /// Method
    pub method: PaymentMethod,
    /// Status
    pub status: PaymentStatus,
    /// Gateway reference, set on completion
    pub transaction_id: Option<String>,
    /// Last four card digits
    pub card_last_four: Option<String>,
    /// Gateway decline message
    pub failure_reason: Option<String>,
    /// Completion time
    pub paid_at: Option<DateTime<Utc>>,
    /// Refund time
    pub refunded_at: Option<DateTime<Utc>>,
    /// Submission time
    pub created_at: DateTime<Utc>,
}

/// A place in an event's waitlist
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    /// Unique identifier
    pub id: WaitlistId,
    /// Event
    pub event_id: EventId,
    /// Attendee
    pub attendee_id: UserId,
    /// Contact e-mail
    pub email: String,
    /// Contact number
    pub phone_number: Option<String>,
    /// Wanted ticket type
    pub ticket_type: TicketType,
    /// Wanted number of tickets
    pub quantity: u32,
    /// Status
    pub status: WaitlistStatus,
    /// Defines queue order
    pub joined_at: DateTime<Utc>,
    /// When tickets were offered
    pub notified_at: Option<DateTime<Utc>>,
}

/// A message sent to a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: NotificationId,
    /// Recipient
    pub user_id: UserId,
    /// Channel
    pub channel: NotificationChannel,
    /// Subject line
    pub subject: String,
    /// Body
    pub message: String,
    /// Send time
    pub sent_at: DateTime<Utc>,
    /// Read flag
    pub is_read: bool,
}

// ============================================================================
// State
// ============================================================================

/// The whole box office state, owned by the store.
///
/// Collections keyed by id are `HashMap`s; the waitlist and notification log
/// are `Vec`s kept in insertion order. Query helpers return results in a
/// stable order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Database {
    /// User accounts
    pub users: HashMap<UserId, User>,
    /// Events
    pub events: HashMap<EventId, Event>,
    /// Ticket categories
    pub ticket_categories: HashMap<TicketCategoryId, TicketCategory>,
    /// Seats
    pub seats: HashMap<SeatId, Seat>,
    /// Promotional codes
    pub promo_codes: HashMap<PromoCodeId, PromotionalCode>,
    /// Bookings
    pub bookings: HashMap<BookingId, Booking>,
    /// Payments
    pub payments: HashMap<PaymentId, Payment>,
    /// Waitlist entries in join order
    pub waitlist: Vec<WaitlistEntry>,
    /// Notification log in send order
    pub notifications: Vec<Notification>,
}

impl Database {
    /// Creates an empty database
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Account with this e-mail (case-insensitive)
    #[must_use]
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.email.eq_ignore_ascii_case(email.trim()))
    }

    /// Organizer accounts ordered by registration
    #[must_use]
    pub fn organizers(&self) -> Vec<User> {
        let mut organizers: Vec<User> = self
            .users
            .values()
            .filter(|u| u.role == UserRole::EventOrganizer)
            .cloned()
            .collect();
        organizers.sort_by_key(|u| (u.created_at, u.email.clone()));
        organizers
    }

    /// Events matching `filter`, ordered by date
    #[must_use]
    pub fn events_where(&self, filter: impl Fn(&Event) -> bool) -> Vec<Event> {
        let mut events: Vec<Event> = self.events.values().filter(|e| filter(e)).cloned().collect();
        events.sort_by_key(|e| (e.date, e.start_time, e.id));
        events
    }

    /// Non-cancelled event already scheduled on `date`
    #[must_use]
    pub fn event_on(&self, date: NaiveDate) -> Option<&Event> {
        self.events
            .values()
            .find(|e| e.date == date && e.status != EventStatus::Cancelled)
    }

    /// Categories of an event ordered by section and ticket type
    #[must_use]
    pub fn categories_for_event(&self, event_id: EventId) -> Vec<TicketCategory> {
        let mut categories: Vec<TicketCategory> = self
            .ticket_categories
            .values()
            .filter(|c| c.event_id == event_id)
            .cloned()
            .collect();
        categories.sort_by_key(|c| (c.section, c.ticket_type, c.id));
        categories
    }

    /// Seats of an event ordered by section, row and number
    #[must_use]
    pub fn seats_for_event(&self, event_id: EventId) -> Vec<Seat> {
        let mut seats: Vec<Seat> = self
            .seats
            .values()
            .filter(|s| s.event_id == event_id)
            .cloned()
            .collect();
        seats.sort_by_key(|s| (s.section, s.ticket_category_id, s.row, s.number));
        seats
    }

    /// Bookable seats of an event, optionally restricted to one category
    #[must_use]
    pub fn available_seats(&self, event_id: EventId, category: Option<TicketCategoryId>) -> Vec<Seat> {
        self.seats_for_event(event_id)
            .into_iter()
            .filter(|s| s.status.is_available())
            .filter(|s| category.is_none_or(|c| s.ticket_category_id == c))
            .collect()
    }

    /// Redeemable-or-not code of an event, matched case-insensitively
    #[must_use]
    pub fn promo_code(&self, event_id: EventId, code: &str) -> Option<&PromotionalCode> {
        let wanted = code.trim().to_uppercase();
        self.promo_codes
            .values()
            .find(|p| p.event_id == event_id && p.code == wanted)
    }

    /// Active codes of an event ordered by code
    #[must_use]
    pub fn promo_codes_for_event(&self, event_id: EventId) -> Vec<PromotionalCode> {
        let mut codes: Vec<PromotionalCode> = self
            .promo_codes
            .values()
            .filter(|p| p.event_id == event_id && p.is_active)
            .cloned()
            .collect();
        codes.sort_by(|a, b| a.code.cmp(&b.code));
        codes
    }

    /// Bookings matching `filter`, newest first
    #[must_use]
    pub fn bookings_where(&self, filter: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self.bookings.values().filter(|b| filter(b)).cloned().collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        bookings
    }

    /// Most recent payment of a booking
    #[must_use]
    pub fn payment_for_booking(&self, booking_id: BookingId) -> Option<&Payment> {
        self.payments
            .values()
            .filter(|p| p.booking_id == booking_id)
            .max_by_key(|p| p.created_at)
    }

    /// Payment of a booking in `status`
    #[must_use]
    pub fn booking_payment_in(&self, booking_id: BookingId, status: PaymentStatus) -> Option<&Payment> {
        self.payments
            .values()
            .find(|p| p.booking_id == booking_id && p.status == status)
    }

    /// Whether every seat of `booking` is held by it or free again
    #[must_use]
    pub fn seats_free_for(&self, booking: &Booking) -> bool {
        booking.seats.iter().all(|line| {
            self.seats.get(&line.seat_id).is_some_and(|seat| match seat.status {
                SeatStatus::Available => true,
                SeatStatus::Held { booking_id, .. } => booking_id == booking.id,
                SeatStatus::Booked { .. } => false,
            })
        })
    }

    /// Hold every seat of a booking for it until `until`
    pub fn hold_seats_for(&mut self, booking_id: BookingId, until: DateTime<Utc>) {
        let Some(booking) = self.bookings.get(&booking_id) else {
            return;
        };
        for line in &booking.seats {
            if let Some(seat) = self.seats.get_mut(&line.seat_id) {
                seat.status = SeatStatus::Held { booking_id, until };
            }
        }
    }

    /// Waitlist of an event in queue order (join time, then insertion)
    #[must_use]
    pub fn waitlist_for_event(&self, event_id: EventId) -> Vec<WaitlistEntry> {
        let mut entries: Vec<WaitlistEntry> = self
            .waitlist
            .iter()
            .filter(|w| w.event_id == event_id)
            .cloned()
            .collect();
        // stable sort keeps insertion order for equal join times
        entries.sort_by_key(|w| w.joined_at);
        entries
    }

    /// Waiting entries of an event in queue order
    #[must_use]
    pub fn waiting_for_event(&self, event_id: EventId) -> Vec<WaitlistEntry> {
        self.waitlist_for_event(event_id)
            .into_iter()
            .filter(|w| w.status == WaitlistStatus::Waiting)
            .collect()
    }

    /// 1-indexed position of an attendee among the waiting entries of an event
    #[must_use]
    pub fn waitlist_position(&self, event_id: EventId, attendee_id: UserId) -> Option<usize> {
        self.waiting_for_event(event_id)
            .iter()
            .position(|w| w.attendee_id == attendee_id)
            .map(|index| index + 1)
    }

    /// Notifications of a user, newest first
    #[must_use]
    pub fn notifications_for_user(&self, user_id: UserId) -> Vec<Notification> {
        let mut notifications: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        // reverse first so equal timestamps keep newest-inserted first
        notifications.reverse();
        notifications.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_money_display_and_arithmetic() {
        let price = Money::from_cents(4_999);
        assert_eq!(price.to_string(), "$49.99");
        assert_eq!(Money::from_dollars(50).cents(), 5_000);
        assert_eq!(price.saturating_sub(Money::from_dollars(100)), Money::ZERO);
        assert_eq!(
            [Money::from_dollars(10), Money::from_cents(5)].into_iter().sum::<Money>(),
            Money::from_cents(1_005)
        );
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(Money::from_cents(999).percentage(10), Money::from_cents(100));
        assert_eq!(Money::from_cents(1_000).percentage(15), Money::from_cents(150));
        assert_eq!(Money::from_cents(333).percentage(50), Money::from_cents(167));
        assert_eq!(Money::from_cents(123).percentage(100), Money::from_cents(123));
    }

    #[test]
    fn test_discount_is_capped_at_total() {
        let total = Money::from_dollars(30);
        assert_eq!(Discount::Flat(Money::from_dollars(50)).amount_off(total, total), total);
        assert_eq!(
            Discount::Percentage(20).amount_off(Money::from_dollars(10), total),
            Money::from_dollars(2)
        );
    }

    #[test]
    fn test_event_status_transitions() {
        assert!(EventStatus::Draft.can_transition_to(EventStatus::Published));
        assert!(EventStatus::Published.can_transition_to(EventStatus::Cancelled));
        assert!(!EventStatus::Draft.can_transition_to(EventStatus::Completed));
        assert!(!EventStatus::Cancelled.can_transition_to(EventStatus::Published));
        assert!(!EventStatus::Completed.can_transition_to(EventStatus::Cancelled));
        assert!(EventStatus::Ongoing.is_bookable());
        assert!(!EventStatus::Draft.is_bookable());
    }

    #[test]
    fn test_seat_status_helpers() {
        let booking_id = BookingId::new();
        let until = Utc::now() + Duration::minutes(10);
        let held = SeatStatus::Held { booking_id, until };

        assert!(held.is_reserved());
        assert!(!held.is_available());
        assert_eq!(held.reserved_until(), Some(until));
        assert_eq!(held.booking(), Some(booking_id));
        assert_eq!(SeatStatus::Available.booking(), None);
    }

    #[test]
    fn test_promo_code_window_and_limit() {
        let now = Utc::now();
        let mut promo = PromotionalCode {
            id: PromoCodeId::new(),
            event_id: EventId::new(),
            code: "EARLY".to_string(),
            discount: Discount::Percentage(10),
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            usage_limit: Some(1),
            usage_count: 0,
            applicable_ticket_types: vec![TicketType::Vip],
            is_active: true,
        };

        assert!(promo.is_redeemable_at(now));
        assert!(!promo.is_redeemable_at(now + Duration::days(2)));
        assert!(promo.applies_to(TicketType::Vip));
        assert!(!promo.applies_to(TicketType::Child));

        promo.usage_count = 1;
        assert!(!promo.is_redeemable_at(now));
    }

    #[test]
    fn test_waitlist_position_counts_waiting_only() {
        let event_id = EventId::new();
        let now = Utc::now();
        let entry = |attendee_id, status, offset| WaitlistEntry {
            id: WaitlistId::new(),
            event_id,
            attendee_id,
            email: "fan@example.com".to_string(),
            phone_number: None,
            ticket_type: TicketType::GeneralAdmission,
            quantity: 1,
            status,
            joined_at: now + Duration::seconds(offset),
            notified_at: None,
        };
        let (first, second, third) = (UserId::new(), UserId::new(), UserId::new());

        let db = Database {
            waitlist: vec![
                entry(third, WaitlistStatus::Waiting, 20),
                entry(first, WaitlistStatus::Notified, 0),
                entry(second, WaitlistStatus::Waiting, 10),
            ],
            ..Database::default()
        };

        assert_eq!(db.waitlist_position(event_id, first), None);
        assert_eq!(db.waitlist_position(event_id, second), Some(1));
        assert_eq!(db.waitlist_position(event_id, third), Some(2));
    }
}
