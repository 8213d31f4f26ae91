//! Waitlist aggregate: a FIFO queue of attendees per event.
//!
//! Queue order is join time, ties broken by insertion order. Only WAITING
//! entries count toward capacity and position. A cancelled booking advances
//! the queue by exactly one entry through [`WaitlistAction::SeatsReleased`].

use super::notification::notify;
use super::{BoxOfficeAction, Reply, respond};
use crate::environment::BoxOfficeEnvironment;
use crate::error::BoxOfficeError;
use crate::types::{
    CorrelationId, Database, EventId, TicketType, UserId, WaitlistEntry, WaitlistId, WaitlistStatus,
};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer};
use serde::{Deserialize, Serialize};

/// Request to join an event's waitlist
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinWaitlist {
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
}

/// Waitlist commands
#[derive(Clone, Debug)]
pub enum WaitlistAction {
    /// Queue an attendee
    Join {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Who and what
        request: JoinWaitlist,
    },
    /// Remove an entry
    Leave {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Entry
        waitlist_id: WaitlistId,
    },
    /// Offer tickets to the first WAITING entry
    NotifyNext {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Event
        event_id: EventId,
    },
    /// Seats of the event went back on sale; advance the queue by one
    SeatsReleased {
        /// Event
        event_id: EventId,
    },
    /// The attendee went on to book
    Convert {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Entry
        waitlist_id: WaitlistId,
    },
    /// The offer lapsed
    Expire {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Entry
        waitlist_id: WaitlistId,
    },
    /// Tell everyone still waiting that the event is near
    NotifyEventApproaching {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Event
        event_id: EventId,
    },
}

/// Reducer for waitlists
#[derive(Clone, Debug, Default)]
pub struct WaitlistReducer;

impl WaitlistReducer {
    /// Creates a new `WaitlistReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn event_label(state: &Database, event_id: EventId) -> String {
        state
            .events
            .get(&event_id)
            .map_or_else(|| event_id.to_string(), |event| event.name.clone())
    }

    fn join(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        request: JoinWaitlist,
    ) -> Result<(WaitlistEntry, Effect<BoxOfficeAction>), BoxOfficeError> {
        if !state.events.contains_key(&request.event_id) {
            return Err(BoxOfficeError::EventNotFound);
        }
        if !state.users.contains_key(&request.attendee_id) {
            return Err(BoxOfficeError::UserNotFound);
        }
        if request.quantity == 0 {
            return Err(BoxOfficeError::InvalidQuantity);
        }

        let waiting = state.waiting_for_event(request.event_id);
        if waiting.len() >= env.policy.waitlist_capacity {
            return Err(BoxOfficeError::WaitlistFull);
        }
        if waiting.iter().any(|entry| entry.attendee_id == request.attendee_id) {
            return Err(BoxOfficeError::AlreadyOnWaitlist);
        }

        let entry = WaitlistEntry {
            id: WaitlistId::new(),
            event_id: request.event_id,
            attendee_id: request.attendee_id,
            email: request.email,
            phone_number: request.phone_number,
            ticket_type: request.ticket_type,
            quantity: request.quantity,
            status: WaitlistStatus::Waiting,
            joined_at: env.now(),
            notified_at: None,
        };
        state.waitlist.push(entry.clone());
        tracing::info!(
            waitlist_id = %entry.id,
            event_id = %entry.event_id,
            position = waiting.len() + 1,
            "Attendee joined waitlist"
        );

        let event = Self::event_label(state, entry.event_id);
        let (_, confirmation) = notify(
            state,
            env,
            entry.attendee_id,
            "Waitlist Confirmation",
            format!(
                "You have successfully joined the waitlist!\n\n\
                 Event: {event}\n\
                 Ticket Type: {}\n\
                 Quantity: {}\n\n\
                 We will notify you via email if tickets become available.\n\n\
                 Thank you for your patience!\n\
                 HELP Events Team",
                entry.ticket_type, entry.quantity
            ),
        );

        Ok((entry, confirmation))
    }

    /// Advance the first WAITING entry to NOTIFIED. Returns the delivery
    /// effect, or `None` when nobody is waiting.
    fn notify_next(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        event_id: EventId,
    ) -> Option<Effect<BoxOfficeAction>> {
        let next_id = state.waiting_for_event(event_id).first().map(|entry| entry.id)?;
        let now = env.now();
        let entry = state.waitlist.iter_mut().find(|entry| entry.id == next_id)?;
        entry.status = WaitlistStatus::Notified;
        entry.notified_at = Some(now);
        let entry = entry.clone();

        metrics::counter!("boxoffice.waitlist.notified").increment(1);
        tracing::info!(waitlist_id = %entry.id, %event_id, "Notified next attendee on waitlist");

        let event = Self::event_label(state, event_id);
        let (_, offer) = notify(
            state,
            env,
            entry.attendee_id,
            "Tickets Available - Waitlist Notification",
            format!(
                "Good news! Tickets are now available for your waitlisted event!\n\n\
                 Event: {event}\n\
                 Ticket Type: {}\n\
                 Quantity: {}\n\n\
                 Please log in to complete your booking within the next 24 hours.\n\
                 This is a first-come, first-served opportunity.\n\n\
                 HELP Events Team",
                entry.ticket_type, entry.quantity
            ),
        );
        Some(offer)
    }

    /// Move an entry to a final status. Entries already CONVERTED or EXPIRED
    /// are returned unchanged.
    fn close(
        state: &mut Database,
        waitlist_id: WaitlistId,
        status: WaitlistStatus,
    ) -> Result<WaitlistEntry, BoxOfficeError> {
        let entry = state
            .waitlist
            .iter_mut()
            .find(|entry| entry.id == waitlist_id)
            .ok_or(BoxOfficeError::WaitlistEntryNotFound)?;
        if matches!(entry.status, WaitlistStatus::Waiting | WaitlistStatus::Notified) {
            entry.status = status;
            tracing::debug!(%waitlist_id, ?status, "Waitlist entry closed");
        }
        Ok(entry.clone())
    }

    fn approaching(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        event_id: EventId,
    ) -> Result<Vec<Effect<BoxOfficeAction>>, BoxOfficeError> {
        let event = state
            .events
            .get(&event_id)
            .map(|event| event.name.clone())
            .ok_or(BoxOfficeError::EventNotFound)?;

        let recipients: Vec<UserId> = state
            .waiting_for_event(event_id)
            .iter()
            .map(|entry| entry.attendee_id)
            .collect();
        tracing::info!(%event_id, recipients = recipients.len(), "Notifying waitlist that the event is approaching");

        Ok(recipients
            .into_iter()
            .map(|attendee_id| {
                notify(
                    state,
                    env,
                    attendee_id,
                    "Event Approaching - Waitlist Update",
                    format!(
                        "The event you are waitlisted for is approaching.\n\n\
                         Event: {event}\n\n\
                         Unfortunately, no tickets have become available.\n\
                         We apologize for any inconvenience.\n\n\
                         Please check our website for other upcoming events.\n\n\
                         HELP Events Team"
                    ),
                )
                .1
            })
            .collect())
    }
}

impl Reducer for WaitlistReducer {
    type State = Database;
    type Action = BoxOfficeAction;
    type Environment = BoxOfficeEnvironment;

    fn reduce(
        &self,
        state: &mut Database,
        action: BoxOfficeAction,
        env: &BoxOfficeEnvironment,
    ) -> SmallVec<[Effect<BoxOfficeAction>; 4]> {
        let BoxOfficeAction::Waitlist(action) = action else {
            return SmallVec::new();
        };

        match action {
            WaitlistAction::Join {
                correlation_id,
                request,
            } => match Self::join(state, env, request) {
                Ok((entry, confirmation)) => {
                    let mut effects = respond(env, correlation_id, Ok(Reply::Waitlist(entry)));
                    effects.push(confirmation);
                    effects
                },
                Err(error) => respond(env, correlation_id, Err(error)),
            },

            WaitlistAction::Leave {
                correlation_id,
                waitlist_id,
            } => {
                let before = state.waitlist.len();
                state.waitlist.retain(|entry| entry.id != waitlist_id);
                let result = if state.waitlist.len() < before {
                    tracing::info!(%waitlist_id, "Attendee left waitlist");
                    Ok(Reply::Done)
                } else {
                    Err(BoxOfficeError::WaitlistEntryNotFound)
                };
                respond(env, correlation_id, result)
            },

            WaitlistAction::NotifyNext {
                correlation_id,
                event_id,
            } => {
                let offer = Self::notify_next(state, env, event_id);
                let mut effects = respond(env, correlation_id, Ok(Reply::Notified(offer.is_some())));
                effects.extend(offer);
                effects
            },

            WaitlistAction::SeatsReleased { event_id } => {
                let offer = Self::notify_next(state, env, event_id);
                if offer.is_none() {
                    tracing::debug!(%event_id, "Seats released with nobody waiting");
                }
                offer.into_iter().collect()
            },

            WaitlistAction::Convert {
                correlation_id,
                waitlist_id,
            } => {
                let result = Self::close(state, waitlist_id, WaitlistStatus::Converted);
                respond(env, correlation_id, result.map(Reply::Waitlist))
            },

            WaitlistAction::Expire {
                correlation_id,
                waitlist_id,
            } => {
                let result = Self::close(state, waitlist_id, WaitlistStatus::Expired);
                respond(env, correlation_id, result.map(Reply::Waitlist))
            },

            WaitlistAction::NotifyEventApproaching {
                correlation_id,
                event_id,
            } => match Self::approaching(state, env, event_id) {
                Ok(deliveries) => {
                    let mut effects = respond(env, correlation_id, Ok(Reply::Done));
                    effects.extend(deliveries);
                    effects
                },
                Err(error) => respond(env, correlation_id, Err(error)),
            },
        }
    }
}
