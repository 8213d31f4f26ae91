//! Payment aggregate.
//!
//! Card details are checked locally before anything reaches the gateway. The
//! charge itself runs as an `Effect::Future` whose outcome comes back into the
//! store as [`PaymentAction::GatewayResponded`]; only then is the caller's
//! command answered. Refunds follow the same round trip.
//!
//! Opening a charge re-holds the booking's seats, so a hold that lapsed before
//! payment is renewed and nobody else can take the seats while it settles.

use super::{BoxOfficeAction, Reply, respond};
use crate::card::CardDetails;
use crate::environment::BoxOfficeEnvironment;
use crate::error::{BoxOfficeError, CardError};
use crate::payment_gateway::{ChargeRequest, GatewayError};
use crate::types::{
    BookingId, BookingStatus, CorrelationId, Database, Payment, PaymentId, PaymentMethod, PaymentStatus,
};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::sync::Arc;

/// Payment commands and gateway responses
#[derive(Clone, Debug)]
pub enum PaymentAction {
    /// Charge the outstanding amount of a pending booking
    Process {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Booking to pay for
        booking_id: BookingId,
        /// Payment method
        method: PaymentMethod,
        /// Required for card methods
        card: Option<CardDetails>,
    },
    /// Gateway finished a charge
    GatewayResponded {
        /// Command being answered
        correlation_id: CorrelationId,
        /// Payment charged
        payment_id: PaymentId,
        /// Transaction id or decline
        outcome: Result<String, GatewayError>,
    },
    /// Return the money of a completed payment
    Refund {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Payment to refund
        payment_id: PaymentId,
    },
    /// Gateway finished a refund
    RefundResponded {
        /// Command being answered
        correlation_id: CorrelationId,
        /// Payment refunded
        payment_id: PaymentId,
        /// Refund reference or rejection
        outcome: Result<String, GatewayError>,
    },
}

/// Reducer for payments
#[derive(Clone, Debug, Default)]
pub struct PaymentReducer;

impl PaymentReducer {
    /// Creates a new `PaymentReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validate the request and record a PENDING payment
    fn open(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        booking_id: BookingId,
        method: PaymentMethod,
        card: Option<&CardDetails>,
    ) -> Result<Payment, BoxOfficeError> {
        let booking = state.bookings.get(&booking_id).ok_or(BoxOfficeError::BookingNotFound)?;
        if booking.status != BookingStatus::Pending {
            return Err(BoxOfficeError::BookingNotPending);
        }
        if state.booking_payment_in(booking_id, PaymentStatus::Completed).is_some() {
            return Err(BoxOfficeError::AlreadyPaid);
        }
        if state.booking_payment_in(booking_id, PaymentStatus::Pending).is_some() {
            return Err(BoxOfficeError::PaymentInProgress);
        }
        if !state.seats_free_for(booking) {
            return Err(BoxOfficeError::SeatsUnavailable);
        }

        let now = env.now();
        let card_last_four = if method.requires_card() {
            let card = card.ok_or(CardError::Missing)?;
            Some(card.validate(now.date_naive())?)
        } else {
            None
        };

        let payment = Payment {
            id: PaymentId::new(),
            booking_id,
            amount: booking.final_amount,
            method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            card_last_four,
            failure_reason: None,
            paid_at: None,
            refunded_at: None,
            created_at: now,
        };
        state.payments.insert(payment.id, payment.clone());
        state.hold_seats_for(booking_id, now + env.policy.hold_duration);
        Ok(payment)
    }

    fn settle(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        payment_id: PaymentId,
        outcome: Result<String, GatewayError>,
    ) -> Result<Payment, BoxOfficeError> {
        let payment = state
            .payments
            .get_mut(&payment_id)
            .ok_or(BoxOfficeError::PaymentNotFound)?;

        match outcome {
            Ok(transaction_id) => {
                payment.status = PaymentStatus::Completed;
                payment.transaction_id = Some(transaction_id);
                payment.paid_at = Some(env.now());
                metrics::counter!("boxoffice.payments.completed").increment(1);
                metrics::counter!("boxoffice.payments.revenue_cents").increment(payment.amount.cents());
                tracing::info!(
                    %payment_id,
                    booking_id = %payment.booking_id,
                    amount = %payment.amount,
                    "Payment completed"
                );
                Ok(payment.clone())
            },
            Err(error) => {
                payment.status = PaymentStatus::Failed;
                payment.failure_reason = Some(error.to_string());
                metrics::counter!("boxoffice.payments.failed").increment(1);
                tracing::warn!(%payment_id, booking_id = %payment.booking_id, %error, "Payment declined");
                Err(BoxOfficeError::PaymentFailed)
            },
        }
    }

    fn refundable(state: &Database, payment_id: PaymentId) -> Result<(Payment, String), BoxOfficeError> {
        let payment = state.payments.get(&payment_id).ok_or(BoxOfficeError::PaymentNotFound)?;
        match (&payment.status, &payment.transaction_id) {
            (PaymentStatus::Completed, Some(transaction_id)) => Ok((payment.clone(), transaction_id.clone())),
            _ => Err(BoxOfficeError::RefundNotAllowed),
        }
    }

    fn refunded(
        state: &mut Database,
        env: &BoxOfficeEnvironment,
        payment_id: PaymentId,
        outcome: Result<String, GatewayError>,
    ) -> Result<Payment, BoxOfficeError> {
        let payment = state
            .payments
            .get_mut(&payment_id)
            .ok_or(BoxOfficeError::PaymentNotFound)?;

        match outcome {
            Ok(reference) => {
                if payment.status == PaymentStatus::Completed {
                    payment.status = PaymentStatus::Refunded;
                    payment.refunded_at = Some(env.now());
                    metrics::counter!("boxoffice.payments.refunded").increment(1);
                    tracing::info!(%payment_id, %reference, amount = %payment.amount, "Payment refunded");
                }
                Ok(payment.clone())
            },
            Err(GatewayError::RefundRejected { reason } | GatewayError::Declined { reason }) => {
                tracing::warn!(%payment_id, %reason, "Refund rejected by gateway");
                Err(BoxOfficeError::RefundFailed(reason))
            },
        }
    }
}

impl Reducer for PaymentReducer {
    type State = Database;
    type Action = BoxOfficeAction;
    type Environment = BoxOfficeEnvironment;

    fn reduce(
        &self,
        state: &mut Database,
        action: BoxOfficeAction,
        env: &BoxOfficeEnvironment,
    ) -> SmallVec<[Effect<BoxOfficeAction>; 4]> {
        let BoxOfficeAction::Payment(action) = action else {
            return SmallVec::new();
        };

        match action {
            PaymentAction::Process {
                correlation_id,
                booking_id,
                method,
                card,
            } => match Self::open(state, env, booking_id, method, card.as_ref()) {
                Ok(payment) => {
                    tracing::debug!(payment_id = %payment.id, %booking_id, "Submitting charge to gateway");
                    let gateway = Arc::clone(&env.gateway);
                    let request = ChargeRequest {
                        payment_id: payment.id,
                        amount: payment.amount,
                        method,
                    };
                    smallvec![Effect::Future(Box::pin(async move {
                        let outcome = gateway.charge(request.clone()).await;
                        Some(BoxOfficeAction::Payment(PaymentAction::GatewayResponded {
                            correlation_id,
                            payment_id: request.payment_id,
                            outcome,
                        }))
                    }))]
                },
                Err(error) => respond(env, correlation_id, Err(error)),
            },

            PaymentAction::GatewayResponded {
                correlation_id,
                payment_id,
                outcome,
            } => {
                let result = Self::settle(state, env, payment_id, outcome);
                respond(env, correlation_id, result.map(Reply::Payment))
            },

            PaymentAction::Refund {
                correlation_id,
                payment_id,
            } => match Self::refundable(state, payment_id) {
                Ok((payment, transaction_id)) => {
                    let gateway = Arc::clone(&env.gateway);
                    smallvec![Effect::Future(Box::pin(async move {
                        let outcome = gateway.refund(&transaction_id, payment.amount).await;
                        Some(BoxOfficeAction::Payment(PaymentAction::RefundResponded {
                            correlation_id,
                            payment_id,
                            outcome,
                        }))
                    }))]
                },
                Err(error) => respond(env, correlation_id, Err(error)),
            },

            PaymentAction::RefundResponded {
                correlation_id,
                payment_id,
                outcome,
            } => {
                let result = Self::refunded(state, env, payment_id, outcome);
                respond(env, correlation_id, result.map(Reply::Payment))
            },
        }
    }
}
