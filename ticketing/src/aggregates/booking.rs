//! Booking aggregate: the seat-hold, confirmation and cancellation workflow.
//!
//! # Seat lifecycle
//!
//! ```text
//! Available ──create──▶ Held { booking, until } ──confirm──▶ Booked { booking }
//!     ▲                        │                                   │
//!     └──────sweep (until passed) / cancel ◀────────────cancel─────┘
//! ```
//!
//! Every command runs under the store's write lock, so the availability check
//! and the hold it guards are a single step. Two bookings racing for the same
//! seat cannot both win.
//!
//! The sweep only frees seats. A PENDING booking whose hold lapsed stays
//! PENDING and may still be paid and confirmed if its seats are free again.
//! Paying re-holds the seats, and the sweep leaves alone the holds of a
//! booking whose charge is in flight or settled. A booking cannot be
//! cancelled while its charge is at the gateway.

use super::notification::notify;
use super::waitlist::WaitlistAction;
use super::{BoxOfficeAction, Reply, respond};
use crate::environment::BoxOfficeEnvironment;
use crate::error::BoxOfficeError;
use crate::qr;
use crate::types::{
    Booking, BookingId, BookingSeat, BookingStatus, CorrelationId, Database, EventId, Money, PaymentStatus,
    SeatId, SeatStatus, TicketCategoryId, UserId,
};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer};
use std::collections::{HashMap, HashSet};

/// Booking commands
#[derive(Clone, Debug)]
pub enum BookingAction {
    /// Hold seats for an attendee and open a PENDING booking
    Create {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Attendee
        attendee_id: UserId,
        /// Event
        event_id: EventId,
        /// Seats to hold
        seat_ids: Vec<SeatId>,
        /// Optional promotional code
        promo_code: Option<String>,
    },
    /// Confirm a paid booking and issue its QR code
    Confirm {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Booking
        booking_id: BookingId,
    },
    /// Cancel a booking and release its seats
    Cancel {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Booking
        booking_id: BookingId,
    },
    /// Admit a confirmed booking at the door
    CheckIn {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Booking
        booking_id: BookingId,
        /// Scanned QR payload
        qr_code: String,
    },
    /// Release every hold whose expiry has passed
    SweepExpiredHolds,
}

/// Follow-up effects of a successful command
type Followups = Vec<Effect<BoxOfficeAction>>;

/// Reducer for bookings
#[derive(Clone, Debug, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Creates a new `BookingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolve the requested seats into booking lines, enforcing availability
    /// and per-category limits
    fn resolve_seats(
        state: &Database,
        event_id: EventId,
        seat_ids: &[SeatId],
    ) -> Result<Vec<BookingSeat>, BoxOfficeError> {
        if seat_ids.is_empty() {
            return Err(BoxOfficeError::NoSeatsSelected);
        }
        let unique: HashSet<SeatId> = seat_ids.iter().copied().collect();
        if unique.len() != seat_ids.len() {
            return Err(BoxOfficeError::DuplicateSeat);
        }

        let mut lines = Vec::with_capacity(seat_ids.len());
        let mut per_category: HashMap<TicketCategoryId, u32> = HashMap::new();

        for seat_id in seat_ids {
            let seat = state
                .seats
                .get(seat_id)
                .filter(|seat| seat.event_id == event_id && seat.status.is_available())
                .ok_or(BoxOfficeError::SeatsUnavailable)?;
            let category = state
                .ticket_categories
                .get(&seat.ticket_category_id)
                .ok_or(BoxOfficeError::TicketCategoryNotFound)?;

            let count = per_category.entry(category.id).or_default();
            *count += 1;
            if *count > category.max_per_booking {
                return Err(BoxOfficeError::TooManySeats {
                    ticket_type: category.ticket_type.to_string(),
                    max: category.max_per_booking,
                });
            }

            lines.push(BookingSeat {
                seat_id: seat.id,
                ticket_category_id: category.id,
                ticket_type: category.ticket_type,
                section: seat.section,
                row: seat.row,
                number: seat.number,
                price: category.price,
            });
        }

        Ok(lines)
    }

    fn create(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        attendee_id: UserId,
        event_id: EventId,
        seat_ids: &[SeatId],
        promo_code: Option<&str>,
    ) -> Result<Booking, BoxOfficeError> {
        let event = state.events.get(&event_id).ok_or(BoxOfficeError::EventNotFound)?;
        if !event.status.is_bookable() {
            return Err(BoxOfficeError::EventNotBookable);
        }
        if !state.users.contains_key(&attendee_id) {
            return Err(BoxOfficeError::UserNotFound);
        }

        let seats = Self::resolve_seats(state, event_id, seat_ids)?;
        let now = env.now();
        let total_amount: Money = seats.iter().map(|line| line.price).sum();

        // a code that does not apply is ignored rather than rejected
        let promo = promo_code
            .and_then(|code| state.promo_code(event_id, code))
            .filter(|promo| promo.is_redeemable_at(now))
            .filter(|promo| seats.iter().any(|line| promo.applies_to(line.ticket_type)));

        let (discount_amount, applied) = match promo {
            Some(promo) => {
                let eligible: Money = seats
                    .iter()
                    .filter(|line| promo.applies_to(line.ticket_type))
                    .map(|line| line.price)
                    .sum();
                (promo.discount.amount_off(eligible, total_amount), Some((promo.id, promo.code.clone())))
            },
            None => (Money::ZERO, None),
        };

        let booking_id = BookingId::new();
        let until = now + env.policy.hold_duration;
        for line in &seats {
            if let Some(seat) = state.seats.get_mut(&line.seat_id) {
                seat.status = SeatStatus::Held { booking_id, until };
            }
        }

        let promo_code = applied.map(|(promo_id, code)| {
            if let Some(promo) = state.promo_codes.get_mut(&promo_id) {
                promo.usage_count += 1;
            }
            code
        });

        let booking = Booking {
            id: booking_id,
            attendee_id,
            event_id,
            seats,
            total_amount,
            discount_amount,
            final_amount: total_amount.saturating_sub(discount_amount),
            promo_code,
            status: BookingStatus::Pending,
            qr_code: None,
            created_at: now,
            confirmed_at: None,
            checked_in_at: None,
            cancelled_at: None,
        };
        state.bookings.insert(booking_id, booking.clone());

        metrics::counter!("boxoffice.bookings.created").increment(1);
        tracing::info!(
            %booking_id,
            %event_id,
            seats = booking.seats.len(),
            total = %booking.total_amount,
            discount = %booking.discount_amount,
            hold_until = %until,
            "Seats held for pending booking"
        );

        Ok(booking)
    }

    fn confirm(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        booking_id: BookingId,
    ) -> Result<(Booking, Followups), BoxOfficeError> {
        let booking = state.bookings.get(&booking_id).ok_or(BoxOfficeError::BookingNotFound)?;
        match booking.status {
            BookingStatus::Confirmed => return Ok((booking.clone(), Vec::new())),
            BookingStatus::Pending => {},
            BookingStatus::CheckedIn | BookingStatus::Cancelled => {
                return Err(BoxOfficeError::BookingNotPending);
            },
        }
        if !booking.final_amount.is_zero()
            && state.booking_payment_in(booking_id, PaymentStatus::Completed).is_none()
        {
            return Err(BoxOfficeError::BookingNotPaid);
        }

        // ours, or released by the sweep and still free
        if !state.seats_free_for(booking) {
            return Err(BoxOfficeError::SeatsUnavailable);
        }

        let lines: Vec<(SeatId, TicketCategoryId)> = booking
            .seats
            .iter()
            .map(|line| (line.seat_id, line.ticket_category_id))
            .collect();
        for (seat_id, category_id) in lines {
            if let Some(seat) = state.seats.get_mut(&seat_id) {
                seat.status = SeatStatus::Booked { booking_id };
            }
            if let Some(category) = state.ticket_categories.get_mut(&category_id) {
                category.available_quantity = category.available_quantity.saturating_sub(1);
            }
        }

        let now = env.now();
        let Some(booking) = state.bookings.get_mut(&booking_id) else {
            return Err(BoxOfficeError::BookingNotFound);
        };
        booking.status = BookingStatus::Confirmed;
        booking.confirmed_at = Some(now);
        booking.qr_code = Some(qr::generate(booking_id, booking.attendee_id, booking.event_id, now));
        let booking = booking.clone();

        metrics::counter!("boxoffice.bookings.confirmed").increment(1);
        tracing::info!(%booking_id, amount = %booking.final_amount, "Booking confirmed");

        let (_, confirmation) = notify(
            state,
            env,
            booking.attendee_id,
            "Booking Confirmation",
            format!(
                "Your booking has been confirmed!\n\n\
                 Booking ID: {}\n\
                 Number of Tickets: {}\n\
                 Total Amount: {}\n\n\
                 Please present your QR code at the event entrance.\n\n\
                 Thank you for booking with HELP Events!",
                booking.id,
                booking.seats.len(),
                booking.final_amount
            ),
        );

        Ok((booking, vec![confirmation]))
    }

    fn cancel(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        booking_id: BookingId,
    ) -> Result<(Booking, Followups), BoxOfficeError> {
        let booking = state.bookings.get(&booking_id).ok_or(BoxOfficeError::BookingNotFound)?;
        match booking.status {
            BookingStatus::Cancelled => return Err(BoxOfficeError::BookingAlreadyCancelled),
            BookingStatus::CheckedIn => return Err(BoxOfficeError::BookingCheckedIn),
            BookingStatus::Pending | BookingStatus::Confirmed => {},
        }
        if state.booking_payment_in(booking_id, PaymentStatus::Pending).is_some() {
            return Err(BoxOfficeError::PaymentInProgress);
        }

        let now = env.now();
        let window = env.policy.cancellation_window_days;
        let event = state.events.get(&booking.event_id).ok_or(BoxOfficeError::EventNotFound)?;
        let days_until_event = (event.starts_at() - now).num_days();
        if days_until_event < window {
            return Err(BoxOfficeError::CancellationWindowClosed { days: window });
        }

        let lines: Vec<(SeatId, TicketCategoryId)> = booking
            .seats
            .iter()
            .map(|line| (line.seat_id, line.ticket_category_id))
            .collect();
        for (seat_id, category_id) in lines {
            let Some(seat) = state.seats.get_mut(&seat_id) else {
                continue;
            };
            match seat.status {
                SeatStatus::Held { booking_id: holder, .. } if holder == booking_id => {
                    seat.status = SeatStatus::Available;
                },
                SeatStatus::Booked { booking_id: owner } if owner == booking_id => {
                    seat.status = SeatStatus::Available;
                    if let Some(category) = state.ticket_categories.get_mut(&category_id) {
                        category.available_quantity = (category.available_quantity + 1).min(category.quantity);
                    }
                },
                // released by the sweep, possibly taken by someone else since
                _ => {},
            }
        }

        let Some(booking) = state.bookings.get_mut(&booking_id) else {
            return Err(BoxOfficeError::BookingNotFound);
        };
        booking.status = BookingStatus::Cancelled;
        booking.cancelled_at = Some(now);
        let booking = booking.clone();

        metrics::counter!("boxoffice.bookings.cancelled").increment(1);
        tracing::info!(%booking_id, days_until_event, "Booking cancelled");

        let (_, cancellation) = notify(
            state,
            env,
            booking.attendee_id,
            "Booking Cancelled",
            format!(
                "Your booking has been cancelled.\n\n\
                 Booking ID: {}\n\
                 Refund Amount: {}\n\n\
                 Your refund will be processed within 5-7 business days.\n\n\
                 Thank you for using HELP Events.",
                booking.id, booking.final_amount
            ),
        );

        let event_id = booking.event_id;
        let waitlist_pass = Effect::Future(Box::pin(async move {
            Some(BoxOfficeAction::Waitlist(WaitlistAction::SeatsReleased { event_id }))
        }));

        Ok((booking, vec![cancellation, waitlist_pass]))
    }

    fn check_in(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        booking_id: BookingId,
        qr_code: &str,
    ) -> Result<Booking, BoxOfficeError> {
        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or(BoxOfficeError::BookingNotFound)?;
        if booking.qr_code.as_deref() != Some(qr_code.trim()) {
            return Err(BoxOfficeError::InvalidQrCode);
        }
        if booking.status != BookingStatus::Confirmed {
            return Err(BoxOfficeError::BookingNotConfirmed);
        }

        booking.status = BookingStatus::CheckedIn;
        booking.checked_in_at = Some(env.now());
        metrics::counter!("boxoffice.bookings.checked_in").increment(1);
        tracing::info!(%booking_id, "Attendee checked in");
        Ok(booking.clone())
    }

    /// Release holds that lapsed strictly before now. Holds of a booking
    /// with a charge in flight or settled are kept for its confirmation.
    fn sweep(state: &mut Database, env: &BoxOfficeEnvironment) -> usize {
        let now = env.now();
        let paying: HashSet<BookingId> = state
            .payments
            .values()
            .filter(|payment| matches!(payment.status, PaymentStatus::Pending | PaymentStatus::Completed))
            .map(|payment| payment.booking_id)
            .collect();

        let mut released = 0;
        for seat in state.seats.values_mut() {
            let SeatStatus::Held { booking_id, until } = seat.status else {
                continue;
            };
            if until < now && !paying.contains(&booking_id) {
                seat.status = SeatStatus::Available;
                released += 1;
            }
        }
        if released > 0 {
            metrics::counter!("boxoffice.holds.expired").increment(released as u64);
            tracing::info!(released, "Released expired seat holds");
        } else {
            tracing::debug!("No expired seat holds");
        }
        released
    }
}

/// Reply with the booking plus any follow-up effects
fn respond_with(
    env: &BoxOfficeEnvironment,
    correlation_id: CorrelationId,
    result: Result<(Booking, Followups), BoxOfficeError>,
) -> SmallVec<[Effect<BoxOfficeAction>; 4]> {
    match result {
        Ok((booking, followups)) => {
            let mut effects = respond(env, correlation_id, Ok(Reply::Booking(booking)));
            effects.extend(followups);
            effects
        },
        Err(error) => respond(env, correlation_id, Err(error)),
    }
}

impl Reducer for BookingReducer {
    type State = Database;
    type Action = BoxOfficeAction;
    type Environment = BoxOfficeEnvironment;

    fn reduce(
        &self,
        state: &mut Database,
        action: BoxOfficeAction,
        env: &BoxOfficeEnvironment,
    ) -> SmallVec<[Effect<BoxOfficeAction>; 4]> {
        let BoxOfficeAction::Booking(action) = action else {
            return SmallVec::new();
        };

        match action {
            BookingAction::Create {
                correlation_id,
                attendee_id,
                event_id,
                seat_ids,
                promo_code,
            } => {
                let result = Self::create(state, env, attendee_id, event_id, &seat_ids, promo_code.as_deref());
                respond(env, correlation_id, result.map(Reply::Booking))
            },

            BookingAction::Confirm {
                correlation_id,
                booking_id,
            } => respond_with(env, correlation_id, Self::confirm(state, env, booking_id)),

            BookingAction::Cancel {
                correlation_id,
                booking_id,
            } => respond_with(env, correlation_id, Self::cancel(state, env, booking_id)),

            BookingAction::CheckIn {
                correlation_id,
                booking_id,
                qr_code,
            } => {
                let result = Self::check_in(state, env, booking_id, &qr_code);
                respond(env, correlation_id, result.map(Reply::Booking))
            },

            BookingAction::SweepExpiredHolds => {
                Self::sweep(state, env);
                SmallVec::new()
            },
        }
    }
}
