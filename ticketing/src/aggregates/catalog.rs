//! Event catalog: events, ticket categories, seats and promotional codes.
//!
//! The venue is a single auditorium, so at most one live event is scheduled
//! per calendar day. Adding a ticket category generates its seats.

use super::{BoxOfficeAction, Reply, respond};
use crate::environment::BoxOfficeEnvironment;
use crate::error::BoxOfficeError;
use crate::types::{
    CorrelationId, Database, Discount, Event, EventId, EventStatus, PromoCodeId, PromotionalCode, Seat, SeatId,
    SeatSection, SeatStatus, TicketCategory, TicketCategoryId, TicketType, UserId, UserRole,
};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

const ROW_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Editable event fields
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    /// Title
    pub name: String,
    /// Description
    pub description: String,
    /// Calendar day
    pub date: NaiveDate,
    /// Start
    pub start_time: NaiveTime,
    /// Finish
    pub end_time: NaiveTime,
    /// Venue
    pub location: String,
    /// Poster image reference
    pub poster_url: Option<String>,
}

/// A ticket category to add to an event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicketCategory {
    /// Ticket type
    pub ticket_type: TicketType,
    /// Price per seat
    pub price: crate::types::Money,
    /// Number of seats to generate
    pub quantity: u32,
    /// Section the seats sit in
    pub section: SeatSection,
    /// Free-text conditions
    pub restrictions: Option<String>,
    /// Per-booking limit, the policy default when `None`
    pub max_per_booking: Option<u32>,
}

/// A promotional code to create
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPromoCode {
    /// Code as typed; stored upper-cased
    pub code: String,
    /// Discount
    pub discount: Discount,
    /// Window start
    pub valid_from: DateTime<Utc>,
    /// Window end
    pub valid_until: DateTime<Utc>,
    /// Maximum redemptions
    pub usage_limit: Option<u32>,
    /// Ticket types covered; empty means all
    pub applicable_ticket_types: Vec<TicketType>,
}

/// Catalog commands
#[derive(Clone, Debug)]
pub enum CatalogAction {
    /// Schedule a new DRAFT event
    CreateEvent {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Owner
        organizer_id: UserId,
        /// Event fields
        details: EventDetails,
    },
    /// Edit the fields of an event
    UpdateEventDetails {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Event
        event_id: EventId,
        /// Replacement fields
        details: EventDetails,
    },
    /// Move an event through its lifecycle
    ChangeEventStatus {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Event
        event_id: EventId,
        /// Target status
        status: EventStatus,
    },
    /// Add a priced category and generate its seats
    AddTicketCategory {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Event
        event_id: EventId,
        /// Category fields
        category: NewTicketCategory,
    },
    /// Create a promotional code for an event
    CreatePromoCode {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Event
        event_id: EventId,
        /// Code fields
        promo: NewPromoCode,
    },
    /// Switch a promotional code off
    DeactivatePromoCode {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Code
        promo_code_id: PromoCodeId,
    },
}

/// The redeemable code `code` of an event, if any
#[must_use]
pub fn validate_promotional_code(
    state: &Database,
    event_id: EventId,
    code: &str,
    now: DateTime<Utc>,
) -> Option<PromotionalCode> {
    state
        .promo_code(event_id, code)
        .filter(|promo| promo.is_redeemable_at(now))
        .cloned()
}

fn check_details(details: &EventDetails, today: NaiveDate) -> Result<(), BoxOfficeError> {
    if details.name.trim().is_empty() {
        return Err(BoxOfficeError::InvalidEvent("Event name is required".to_string()));
    }
    if details.end_time <= details.start_time {
        return Err(BoxOfficeError::InvalidEvent("End time must be after start time".to_string()));
    }
    if details.date < today {
        return Err(BoxOfficeError::InvalidEvent("Event date cannot be in the past".to_string()));
    }
    Ok(())
}

fn date_taken(state: &Database, date: NaiveDate, except: Option<EventId>) -> bool {
    state
        .event_on(date)
        .is_some_and(|event| Some(event.id) != except)
}

/// Seats of a new category: `per_row` to a row, rows lettered from A
fn generate_seats(category: &TicketCategory, per_row: u32) -> Vec<Seat> {
    let per_row = per_row.max(1);
    (0..category.quantity)
        .map(|index| {
            let row_index = (index / per_row) as usize % ROW_LETTERS.len();
            Seat {
                id: SeatId::new(),
                event_id: category.event_id,
                ticket_category_id: category.id,
                section: category.section,
                row: char::from(ROW_LETTERS[row_index]),
                number: index % per_row + 1,
                status: SeatStatus::Available,
            }
        })
        .collect()
}

fn check_promo(state: &Database, event_id: EventId, promo: &NewPromoCode) -> Result<String, BoxOfficeError> {
    let invalid = |message: &str| Err(BoxOfficeError::InvalidPromoCode(message.to_string()));

    let code = promo.code.trim().to_uppercase();
    if code.is_empty() {
        return invalid("Promotional code is required");
    }
    if state.promo_code(event_id, &code).is_some() {
        return invalid("Promotional code already exists for this event");
    }
    match promo.discount {
        Discount::Percentage(percent) if !(1..=100).contains(&percent) => {
            return invalid("Percentage discount must be between 1 and 100");
        },
        Discount::Flat(amount) if amount.is_zero() => {
            return invalid("Flat discount must be greater than zero");
        },
        _ => {},
    }
    if promo.valid_from > promo.valid_until {
        return invalid("Valid from must not be after valid until");
    }
    if promo.usage_limit == Some(0) {
        return invalid("Usage limit must be at least 1");
    }
    Ok(code)
}

/// Reducer for the event catalog
#[derive(Clone, Debug, Default)]
pub struct CatalogReducer;

impl CatalogReducer {
    /// Creates a new `CatalogReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn create_event(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        organizer_id: UserId,
        details: EventDetails,
    ) -> Result<Reply, BoxOfficeError> {
        let organizer = state.users.get(&organizer_id).ok_or(BoxOfficeError::UserNotFound)?;
        if !matches!(organizer.role, UserRole::EventOrganizer | UserRole::Admin) {
            return Err(BoxOfficeError::InvalidEvent(
                "Only event organizers can create events".to_string(),
            ));
        }

        let now = env.now();
        check_details(&details, now.date_naive())?;
        if date_taken(state, details.date, None) {
            return Err(BoxOfficeError::DateAlreadyBooked);
        }

        let event = Event {
            id: EventId::new(),
            organizer_id,
            name: details.name,
            description: details.description,
            date: details.date,
            start_time: details.start_time,
            end_time: details.end_time,
            location: details.location,
            poster_url: details.poster_url,
            status: EventStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        state.events.insert(event.id, event.clone());
        metrics::counter!("boxoffice.events.created").increment(1);
        tracing::info!(event_id = %event.id, date = %event.date, "Event created");
        Ok(Reply::Event(event))
    }

    fn update_event(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        event_id: EventId,
        details: EventDetails,
    ) -> Result<Reply, BoxOfficeError> {
        let status = state.events.get(&event_id).ok_or(BoxOfficeError::EventNotFound)?.status;
        if status.is_terminal() {
            return Err(BoxOfficeError::InvalidEvent(
                "Completed or cancelled events cannot be edited".to_string(),
            ));
        }
        let now = env.now();
        check_details(&details, now.date_naive())?;
        if date_taken(state, details.date, Some(event_id)) {
            return Err(BoxOfficeError::DateAlreadyBooked);
        }

        let event = state.events.get_mut(&event_id).ok_or(BoxOfficeError::EventNotFound)?;
        event.name = details.name;
        event.description = details.description;
        event.date = details.date;
        event.start_time = details.start_time;
        event.end_time = details.end_time;
        event.location = details.location;
        event.poster_url = details.poster_url;
        event.updated_at = now;
        Ok(Reply::Event(event.clone()))
    }

    fn change_status(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        event_id: EventId,
        status: EventStatus,
    ) -> Result<Reply, BoxOfficeError> {
        let event = state.events.get_mut(&event_id).ok_or(BoxOfficeError::EventNotFound)?;
        if !event.status.can_transition_to(status) {
            return Err(BoxOfficeError::transition(event.status, status));
        }
        tracing::info!(%event_id, from = ?event.status, to = ?status, "Event status changed");
        event.status = status;
        event.updated_at = env.now();
        Ok(Reply::Event(event.clone()))
    }

    fn add_category(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        event_id: EventId,
        category: NewTicketCategory,
    ) -> Result<Reply, BoxOfficeError> {
        let event = state.events.get(&event_id).ok_or(BoxOfficeError::EventNotFound)?;
        if event.status.is_terminal() {
            return Err(BoxOfficeError::InvalidEvent(
                "Completed or cancelled events cannot be edited".to_string(),
            ));
        }
        if category.quantity == 0 {
            return Err(BoxOfficeError::InvalidEvent("Quantity must be greater than zero".to_string()));
        }
        let max_per_booking = category
            .max_per_booking
            .unwrap_or(env.policy.default_max_per_booking);
        if max_per_booking == 0 {
            return Err(BoxOfficeError::InvalidEvent(
                "Maximum tickets per booking must be at least 1".to_string(),
            ));
        }

        let category = TicketCategory {
            id: TicketCategoryId::new(),
            event_id,
            ticket_type: category.ticket_type,
            price: category.price,
            quantity: category.quantity,
            available_quantity: category.quantity,
            section: category.section,
            restrictions: category.restrictions,
            max_per_booking,
        };
        for seat in generate_seats(&category, env.policy.seats_per_row) {
            state.seats.insert(seat.id, seat);
        }
        state.ticket_categories.insert(category.id, category.clone());
        tracing::info!(%event_id, category_id = %category.id, seats = category.quantity, "Ticket category added");
        Ok(Reply::TicketCategory(category))
    }

    fn create_promo(state: &mut Database, event_id: EventId, promo: NewPromoCode) -> Result<Reply, BoxOfficeError> {
        if !state.events.contains_key(&event_id) {
            return Err(BoxOfficeError::EventNotFound);
        }
        let code = check_promo(state, event_id, &promo)?;
        let promo = PromotionalCode {
            id: PromoCodeId::new(),
            event_id,
            code,
            discount: promo.discount,
            valid_from: promo.valid_from,
            valid_until: promo.valid_until,
            usage_limit: promo.usage_limit,
            usage_count: 0,
            applicable_ticket_types: promo.applicable_ticket_types,
            is_active: true,
        };
        state.promo_codes.insert(promo.id, promo.clone());
        tracing::info!(%event_id, code = %promo.code, "Promotional code created");
        Ok(Reply::PromoCode(promo))
    }
}

impl Reducer for CatalogReducer {
    type State = Database;
    type Action = BoxOfficeAction;
    type Environment = BoxOfficeEnvironment;

    fn reduce(
        &self,
        state: &mut Database,
        action: BoxOfficeAction,
        env: &BoxOfficeEnvironment,
    ) -> SmallVec<[Effect<BoxOfficeAction>; 4]> {
        let BoxOfficeAction::Catalog(action) = action else {
            return SmallVec::new();
        };

        match action {
            CatalogAction::CreateEvent {
                correlation_id,
                organizer_id,
                details,
            } => respond(env, correlation_id, Self::create_event(state, env, organizer_id, details)),

            CatalogAction::UpdateEventDetails {
                correlation_id,
                event_id,
                details,
            } => respond(env, correlation_id, Self::update_event(state, env, event_id, details)),

            CatalogAction::ChangeEventStatus {
                correlation_id,
                event_id,
                status,
            } => respond(env, correlation_id, Self::change_status(state, env, event_id, status)),

            CatalogAction::AddTicketCategory {
                correlation_id,
                event_id,
                category,
            } => respond(env, correlation_id, Self::add_category(state, env, event_id, category)),

            CatalogAction::CreatePromoCode {
                correlation_id,
                event_id,
                promo,
            } => respond(env, correlation_id, Self::create_promo(state, event_id, promo)),

            CatalogAction::DeactivatePromoCode {
                correlation_id,
                promo_code_id,
            } => {
                let result = state
                    .promo_codes
                    .get_mut(&promo_code_id)
                    .map(|promo| {
                        promo.is_active = false;
                        Reply::PromoCode(promo.clone())
                    })
                    .ok_or(BoxOfficeError::PromoCodeNotFound);
                respond(env, correlation_id, result)
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::aggregates::fixtures::{env, reply_in, user, venue};
    use crate::types::Money;
    use boxoffice_testing::ReducerTest;
    use boxoffice_testing::mocks::test_instant;
    use chrono::Duration;

    fn details(date: NaiveDate) -> EventDetails {
        EventDetails {
            name: "Jazz Night".to_string(),
            description: "Live quartet".to_string(),
            date,
            start_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            location: "Main Auditorium".to_string(),
            poster_url: None,
        }
    }

    fn in_days(days: i64) -> NaiveDate {
        (test_instant() + Duration::days(days)).date_naive()
    }

    fn catalog(action: CatalogAction) -> BoxOfficeAction {
        BoxOfficeAction::Catalog(action)
    }

    #[test]
    fn test_create_event_starts_as_draft() {
        let venue = venue();
        let organizer = venue.organizer;
        let correlation_id = CorrelationId::new();

        ReducerTest::new(CatalogReducer::new())
            .with_env(env())
            .given_state(venue.db)
            .when_action(catalog(CatalogAction::CreateEvent {
                correlation_id,
                organizer_id: organizer,
                details: details(in_days(45)),
            }))
            .then_state(|db| assert_eq!(db.events.len(), 2))
            .then_effects(move |effects| match reply_in(effects, correlation_id) {
                Ok(Reply::Event(event)) => {
                    assert_eq!(event.status, EventStatus::Draft);
                    assert_eq!(event.organizer_id, organizer);
                },
                other => panic!("unexpected reply {other:?}"),
            })
            .run();
    }

    #[test]
    fn test_create_event_rejects_booked_date() {
        let venue = venue();
        let correlation_id = CorrelationId::new();

        ReducerTest::new(CatalogReducer::new())
            .with_env(env())
            .given_state(venue.db)
            .when_action(catalog(CatalogAction::CreateEvent {
                correlation_id,
                organizer_id: venue.organizer,
                details: details(in_days(30)),
            }))
            .then_state(|db| assert_eq!(db.events.len(), 1))
            .then_effects(move |effects| {
                assert_eq!(reply_in(effects, correlation_id), Err(BoxOfficeError::DateAlreadyBooked));
            })
            .run();
    }

    #[test]
    fn test_cancelled_event_frees_its_date() {
        let mut venue = venue();
        venue.db.events.get_mut(&venue.event).unwrap().status = EventStatus::Cancelled;
        let correlation_id = CorrelationId::new();

        ReducerTest::new(CatalogReducer::new())
            .with_env(env())
            .given_state(venue.db)
            .when_action(catalog(CatalogAction::CreateEvent {
                correlation_id,
                organizer_id: venue.organizer,
                details: details(in_days(30)),
            }))
            .then_effects(move |effects| {
                assert!(matches!(reply_in(effects, correlation_id), Ok(Reply::Event(_))));
            })
            .run();
    }

    #[test]
    fn test_attendees_cannot_create_events() {
        let mut db = Database::new();
        let attendee = user(UserRole::Attendee, "fan@example.com");
        let attendee_id = attendee.id;
        db.users.insert(attendee_id, attendee);
        let correlation_id = CorrelationId::new();

        ReducerTest::new(CatalogReducer::new())
            .with_env(env())
            .given_state(db)
            .when_action(catalog(CatalogAction::CreateEvent {
                correlation_id,
                organizer_id: attendee_id,
                details: details(in_days(10)),
            }))
            .then_effects(move |effects| {
                assert!(matches!(
                    reply_in(effects, correlation_id),
                    Err(BoxOfficeError::InvalidEvent(_))
                ));
            })
            .run();
    }

    #[test]
    fn test_status_transitions_are_enforced() {
        let venue = venue();
        let event_id = venue.event;
        let correlation_id = CorrelationId::new();

        ReducerTest::new(CatalogReducer::new())
            .with_env(env())
            .given_state(venue.db)
            .when_action(catalog(CatalogAction::ChangeEventStatus {
                correlation_id,
                event_id,
                status: EventStatus::Completed,
            }))
            .then_state(move |db| assert_eq!(db.events[&event_id].status, EventStatus::Published))
            .then_effects(move |effects| {
                assert_eq!(
                    reply_in(effects, correlation_id),
                    Err(BoxOfficeError::transition(EventStatus::Published, EventStatus::Completed))
                );
            })
            .run();
    }

    #[test]
    fn test_published_event_can_be_cancelled() {
        let venue = venue();
        let event_id = venue.event;

        ReducerTest::new(CatalogReducer::new())
            .with_env(env())
            .given_state(venue.db)
            .when_action(catalog(CatalogAction::ChangeEventStatus {
                correlation_id: CorrelationId::new(),
                event_id,
                status: EventStatus::Cancelled,
            }))
            .then_state(move |db| assert_eq!(db.events[&event_id].status, EventStatus::Cancelled))
            .run();
    }

    #[test]
    fn test_add_ticket_category_generates_rows() {
        let venue = venue();
        let event_id = venue.event;
        let correlation_id = CorrelationId::new();

        ReducerTest::new(CatalogReducer::new())
            .with_env(env())
            .given_state(venue.db)
            .when_action(catalog(CatalogAction::AddTicketCategory {
                correlation_id,
                event_id,
                category: NewTicketCategory {
                    ticket_type: TicketType::Vip,
                    price: Money::from_dollars(120),
                    quantity: 25,
                    section: SeatSection::Front,
                    restrictions: Some("18+".to_string()),
                    max_per_booking: None,
                },
            }))
            .then_state(move |db| {
                let category = db
                    .categories_for_event(event_id)
                    .into_iter()
                    .find(|c| c.ticket_type == TicketType::Vip)
                    .unwrap();
                assert_eq!(category.max_per_booking, 10);
                assert_eq!(category.available_quantity, 25);

                let seats: Vec<Seat> = db
                    .seats_for_event(event_id)
                    .into_iter()
                    .filter(|s| s.ticket_category_id == category.id)
                    .collect();
                assert_eq!(seats.len(), 25);
                assert_eq!(seats.iter().filter(|s| s.row == 'A').count(), 10);
                assert_eq!(seats.iter().filter(|s| s.row == 'B').count(), 10);
                assert_eq!(seats.iter().filter(|s| s.row == 'C').count(), 5);
                assert!(seats.iter().all(|s| (1..=10).contains(&s.number)));
                assert!(seats.iter().all(|s| s.section == SeatSection::Front));
            })
            .then_effects(move |effects| {
                assert!(matches!(reply_in(effects, correlation_id), Ok(Reply::TicketCategory(_))));
            })
            .run();
    }

    #[test]
    fn test_row_letters_cycle_after_z() {
        let category = TicketCategory {
            id: TicketCategoryId::new(),
            event_id: EventId::new(),
            ticket_type: TicketType::GeneralAdmission,
            price: Money::ZERO,
            quantity: 270,
            available_quantity: 270,
            section: SeatSection::Back,
            restrictions: None,
            max_per_booking: 10,
        };
        let seats = generate_seats(&category, 10);
        assert_eq!(seats[259].row, 'Z');
        assert_eq!(seats[260].row, 'A');
        assert_eq!(seats[269].number, 10);
    }

    #[test]
    fn test_promo_codes_are_uppercased_and_unique() {
        let venue = venue();
        let event_id = venue.event;
        let now = test_instant();
        let promo = NewPromoCode {
            code: " early20 ".to_string(),
            discount: Discount::Percentage(20),
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(7),
            usage_limit: Some(100),
            applicable_ticket_types: Vec::new(),
        };
        let (first, second) = (CorrelationId::new(), CorrelationId::new());

        ReducerTest::new(CatalogReducer::new())
            .with_env(env())
            .given_state(venue.db)
            .when_action(catalog(CatalogAction::CreatePromoCode {
                correlation_id: first,
                event_id,
                promo: promo.clone(),
            }))
            .when_action(catalog(CatalogAction::CreatePromoCode {
                correlation_id: second,
                event_id,
                promo: NewPromoCode {
                    code: "EARLY20".to_string(),
                    ..promo
                },
            }))
            .then_state(move |db| {
                assert_eq!(db.promo_codes.len(), 1);
                assert!(validate_promotional_code(db, event_id, "early20", now).is_some());
                assert!(validate_promotional_code(db, event_id, "early20", now + Duration::days(8)).is_none());
                assert!(validate_promotional_code(db, EventId::new(), "early20", now).is_none());
            })
            .then_effects(move |effects| {
                assert!(matches!(
                    reply_in(effects, second),
                    Err(BoxOfficeError::InvalidPromoCode(_))
                ));
            })
            .run();
    }

    #[test]
    fn test_invalid_promo_discounts_are_rejected() {
        let venue = venue();
        let now = test_instant();
        for discount in [Discount::Percentage(0), Discount::Percentage(101), Discount::Flat(Money::ZERO)] {
            let promo = NewPromoCode {
                code: "BAD".to_string(),
                discount,
                valid_from: now,
                valid_until: now,
                usage_limit: None,
                applicable_ticket_types: Vec::new(),
            };
            assert!(matches!(
                check_promo(&venue.db, venue.event, &promo),
                Err(BoxOfficeError::InvalidPromoCode(_))
            ));
        }
    }
}
