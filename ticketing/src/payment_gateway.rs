//! Mock payment gateway for development and testing.
//!
//! The booking workflow only talks to the [`PaymentGateway`] trait, so a real
//! processor can replace [`MockPaymentGateway`] without touching the reducers.

use crate::types::{Money, PaymentId, PaymentMethod};
use rand::Rng;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Payment gateway result
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Boxed future returned by gateway calls
pub type GatewayFuture<T> = Pin<Box<dyn Future<Output = GatewayResult<T>> + Send>>;

/// Payment gateway error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The processor declined the charge
    #[error("Card declined: {reason}")]
    Declined {
        /// Decline reason
        reason: String,
    },
    /// The processor refused a refund
    #[error("Refund rejected: {reason}")]
    RefundRejected {
        /// Rejection reason
        reason: String,
    },
}

/// A charge submitted to the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    /// Internal payment id
    pub payment_id: PaymentId,
    /// Amount to charge
    pub amount: Money,
    /// Payment method
    pub method: PaymentMethod,
}

/// Payment gateway trait
///
/// Abstraction over payment processors. Both calls return `'static` futures
/// so they can be moved into an `Effect::Future`.
pub trait PaymentGateway: Send + Sync {
    /// Charge a payment, resolving to the gateway transaction id
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Declined`] if the processor declines.
    fn charge(&self, request: ChargeRequest) -> GatewayFuture<String>;

    /// Refund a completed charge, resolving to the refund reference
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RefundRejected`] if the processor refuses.
    fn refund(&self, transaction_id: &str, amount: Money) -> GatewayFuture<String>;
}

const REFERENCE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Mock payment gateway
///
/// Waits for a simulated processing time, then declines a configurable share
/// of charges at random. Refunds always succeed.
#[derive(Clone, Debug)]
pub struct MockPaymentGateway {
    latency: Duration,
    failure_rate: f64,
}

impl MockPaymentGateway {
    /// Creates a gateway; `failure_rate` is clamped to `[0, 1]`
    #[must_use]
    pub fn new(latency: Duration, failure_rate: f64) -> Self {
        let failure_rate = if failure_rate.is_finite() {
            failure_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            latency,
            failure_rate,
        }
    }

    /// Instant gateway that never declines
    #[must_use]
    pub fn always_succeeds() -> Self {
        Self::new(Duration::ZERO, 0.0)
    }

    /// Instant gateway that declines every charge
    #[must_use]
    pub fn always_declines() -> Self {
        Self::new(Duration::ZERO, 1.0)
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(self) -> Arc<dyn PaymentGateway> {
        Arc::new(self)
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new(Duration::from_millis(2_000), 0.05)
    }
}

/// `<prefix>-<unix millis>-<8 upper-case base36 characters>`
fn reference(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..8)
        .map(|_| char::from(REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())]))
        .collect();
    format!("{prefix}-{}-{suffix}", chrono::Utc::now().timestamp_millis())
}

impl PaymentGateway for MockPaymentGateway {
    fn charge(&self, request: ChargeRequest) -> GatewayFuture<String> {
        // decide before the await; the thread rng is not Send
        let declined = rand::thread_rng().gen_bool(self.failure_rate);
        let transaction_id = reference("TXN");
        let latency = self.latency;

        Box::pin(async move {
            tokio::time::sleep(latency).await;

            if declined {
                tracing::info!(
                    payment_id = %request.payment_id,
                    amount = request.amount.cents(),
                    "Mock gateway declined charge"
                );
                return Err(GatewayError::Declined {
                    reason: "Payment processing failed. Please try again.".to_string(),
                });
            }

            tracing::info!(
                payment_id = %request.payment_id,
                amount = request.amount.cents(),
                method = ?request.method,
                transaction_id = %transaction_id,
                "Mock payment processed successfully"
            );
            Ok(transaction_id)
        })
    }

    fn refund(&self, transaction_id: &str, amount: Money) -> GatewayFuture<String> {
        let transaction_id = transaction_id.to_string();
        let refund_id = reference("RFD");
        let latency = self.latency;

        Box::pin(async move {
            tokio::time::sleep(latency).await;

            tracing::info!(
                transaction_id = %transaction_id,
                amount = amount.cents(),
                refund_id = %refund_id,
                "Mock refund processed successfully"
            );
            Ok(refund_id)
        })
    }
}
