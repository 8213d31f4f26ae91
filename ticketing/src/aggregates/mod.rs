//! Aggregate reducers for the box office.
//!
//! Every aggregate is a reducer over the shared [`Database`] state and the
//! root [`BoxOfficeAction`]. Each one handles its own action variant and
//! ignores the rest; [`BoxOfficeReducer`] runs them all.
//!
//! Commands carry a [`CorrelationId`]. The reducer answers with a
//! [`BoxOfficeAction::Replied`] action scheduled through `Effect::Delay`, so
//! every answer arrives after the configured latency, the way a remote call
//! would.
//!
//! - Accounts: registration, passwords and activation
//! - Catalog: events, ticket categories, seats and promotional codes
//! - Booking: seat holds, confirmation, cancellation, check-in and the hold sweep
//! - Payment: card validation, gateway charges and refunds
//! - Waitlist: FIFO queue per event
//! - Notification: the notification log

pub mod accounts;
pub mod booking;
pub mod catalog;
pub mod notification;
pub mod payment;
pub mod waitlist;

pub use accounts::{AccountsAction, AccountsReducer, OrganizerProfile, Registration};
pub use booking::{BookingAction, BookingReducer};
pub use catalog::{CatalogAction, CatalogReducer, EventDetails, NewPromoCode, NewTicketCategory};
pub use notification::{NotificationAction, NotificationReducer};
pub use payment::{PaymentAction, PaymentReducer};
pub use waitlist::{JoinWaitlist, WaitlistAction, WaitlistReducer};

use crate::environment::BoxOfficeEnvironment;
use crate::error::BoxOfficeError;
use crate::types::{
    Booking, CorrelationId, Database, Event, Notification, Payment, PromotionalCode, TicketCategory, User,
    WaitlistEntry,
};
use boxoffice_core::composition::{CombinedReducer, combine_reducers};
use boxoffice_core::effect::Effect;
use boxoffice_core::reducer::Reducer;
use boxoffice_core::{SmallVec, smallvec};

/// Root action of the box office store
#[derive(Clone, Debug)]
pub enum BoxOfficeAction {
    /// Account commands
    Accounts(AccountsAction),
    /// Catalog commands
    Catalog(CatalogAction),
    /// Booking commands
    Booking(BookingAction),
    /// Payment commands and gateway responses
    Payment(PaymentAction),
    /// Waitlist commands
    Waitlist(WaitlistAction),
    /// Notification commands
    Notification(NotificationAction),
    /// Answer to the command carrying `correlation_id`
    Replied {
        /// Command being answered
        correlation_id: CorrelationId,
        /// Outcome
        reply: Result<Reply, BoxOfficeError>,
    },
}

impl BoxOfficeAction {
    /// The correlation id if this is a reply
    #[must_use]
    pub const fn reply_to(&self) -> Option<CorrelationId> {
        match self {
            Self::Replied { correlation_id, .. } => Some(*correlation_id),
            _ => None,
        }
    }
}

/// Successful command outcome
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Created or updated account
    User(User),
    /// Created or updated event
    Event(Event),
    /// Created ticket category
    TicketCategory(TicketCategory),
    /// Created or updated promotional code
    PromoCode(PromotionalCode),
    /// Created or updated booking
    Booking(Booking),
    /// Created or updated payment
    Payment(Payment),
    /// Created or updated waitlist entry
    Waitlist(WaitlistEntry),
    /// Sent or updated notification
    Notification(Notification),
    /// Whether a waitlist pass notified anyone
    Notified(bool),
    /// Command applied, nothing to return
    Done,
}

/// Schedule the reply to a command after the configured latency
pub(crate) fn reply(
    env: &BoxOfficeEnvironment,
    correlation_id: CorrelationId,
    result: Result<Reply, BoxOfficeError>,
) -> Effect<BoxOfficeAction> {
    if let Err(error) = &result {
        tracing::warn!(%correlation_id, %error, "Command rejected");
        metrics::counter!("boxoffice.commands.rejected").increment(1);
    }
    Effect::Delay {
        duration: env.latency,
        action: Box::new(BoxOfficeAction::Replied {
            correlation_id,
            reply: result,
        }),
    }
}

/// Shorthand for a single reply effect
pub(crate) fn respond(
    env: &BoxOfficeEnvironment,
    correlation_id: CorrelationId,
    result: Result<Reply, BoxOfficeError>,
) -> SmallVec<[Effect<BoxOfficeAction>; 4]> {
    smallvec![reply(env, correlation_id, result)]
}

/// All aggregates combined into the store's reducer
pub struct BoxOfficeReducer {
    inner: CombinedReducer<Database, BoxOfficeAction, BoxOfficeEnvironment>,
}

impl BoxOfficeReducer {
    /// Combine every aggregate reducer
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: combine_reducers(vec![
                Box::new(AccountsReducer::new()),
                Box::new(CatalogReducer::new()),
                Box::new(BookingReducer::new()),
                Box::new(PaymentReducer::new()),
                Box::new(WaitlistReducer::new()),
                Box::new(NotificationReducer::new()),
            ]),
        }
    }
}

impl Default for BoxOfficeReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for BoxOfficeReducer {
    type State = Database;
    type Action = BoxOfficeAction;
    type Environment = BoxOfficeEnvironment;

    fn reduce(
        &self,
        state: &mut Database,
        action: BoxOfficeAction,
        env: &BoxOfficeEnvironment,
    ) -> SmallVec<[Effect<BoxOfficeAction>; 4]> {
        self.inner.reduce(state, action, env)
    }
}

/// Shared fixtures for reducer tests
#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod fixtures {
    use super::{BoxOfficeAction, Reply};
    use crate::environment::BoxOfficeEnvironment;
    use crate::error::BoxOfficeError;
    use crate::notifier::RecordingNotifier;
    use crate::payment_gateway::MockPaymentGateway;
    use crate::types::{
        CorrelationId, Database, Event, EventId, EventStatus, Money, Seat, SeatId, SeatSection, SeatStatus,
        TicketCategory, TicketCategoryId, TicketType, User, UserId, UserRole,
    };
    use boxoffice_core::effect::Effect;
    use boxoffice_testing::assertions::delayed_actions;
    use boxoffice_testing::mocks::{test_clock, test_instant};
    use chrono::{Duration, NaiveTime};
    use std::sync::Arc;

    pub fn env() -> BoxOfficeEnvironment {
        BoxOfficeEnvironment::new(
            Arc::new(test_clock()),
            MockPaymentGateway::always_succeeds().shared(),
            Arc::new(RecordingNotifier::new()),
        )
    }

    pub fn user(role: UserRole, email: &str) -> User {
        User {
            id: UserId::new(),
            email: email.to_string(),
            password: "Secret@123".to_string(),
            role,
            full_name: "Test User".to_string(),
            phone_number: None,
            organization_name: None,
            must_change_password: false,
            is_active: true,
            created_at: test_instant(),
        }
    }

    /// A published event 30 days out with one 20-seat general admission
    /// category at $50.
    pub struct Venue {
        pub db: Database,
        pub organizer: UserId,
        pub attendee: UserId,
        pub event: EventId,
        pub category: TicketCategoryId,
        pub seats: Vec<SeatId>,
    }

    pub fn venue() -> Venue {
        let mut db = Database::new();
        let organizer = user(UserRole::EventOrganizer, "organizer@example.com");
        let attendee = user(UserRole::Attendee, "fan@example.com");
        let now = test_instant();

        let event = Event {
            id: EventId::new(),
            organizer_id: organizer.id,
            name: "Spring Gala".to_string(),
            description: "Annual concert".to_string(),
            date: (now + Duration::days(30)).date_naive(),
            start_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap_or_default(),
            end_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default(),
            location: "Main Auditorium".to_string(),
            poster_url: None,
            status: EventStatus::Published,
            created_at: now,
            updated_at: now,
        };

        let category = TicketCategory {
            id: TicketCategoryId::new(),
            event_id: event.id,
            ticket_type: TicketType::GeneralAdmission,
            price: Money::from_dollars(50),
            quantity: 20,
            available_quantity: 20,
            section: SeatSection::Middle,
            restrictions: None,
            max_per_booking: 10,
        };

        let seats: Vec<Seat> = (0..20u32)
            .map(|i| Seat {
                id: SeatId::new(),
                event_id: event.id,
                ticket_category_id: category.id,
                section: SeatSection::Middle,
                row: if i < 10 { 'A' } else { 'B' },
                number: i % 10 + 1,
                status: SeatStatus::Available,
            })
            .collect();

        let venue_ids = (organizer.id, attendee.id, event.id, category.id);
        let seat_ids = seats.iter().map(|s| s.id).collect();

        db.users.insert(organizer.id, organizer);
        db.users.insert(attendee.id, attendee);
        db.events.insert(event.id, event);
        db.ticket_categories.insert(category.id, category);
        for seat in seats {
            db.seats.insert(seat.id, seat);
        }

        let (organizer, attendee, event, category) = venue_ids;
        Venue {
            db,
            organizer,
            attendee,
            event,
            category,
            seats: seat_ids,
        }
    }

    /// The reply scheduled for `correlation_id`
    pub fn reply_in(effects: &[Effect<BoxOfficeAction>], correlation_id: CorrelationId) -> Result<Reply, BoxOfficeError> {
        delayed_actions(effects)
            .into_iter()
            .find_map(|action| match action {
                BoxOfficeAction::Replied {
                    correlation_id: id,
                    reply,
                } if *id == correlation_id => Some(reply.clone()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no reply for {correlation_id} in {effects:?}"))
    }
}
