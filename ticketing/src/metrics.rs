//! Business metrics for the box office.
//!
//! Reducers record through the `metrics` facade; nothing is exported unless
//! the binary installs a recorder.
//!
//! # Counters
//! - `boxoffice.bookings.{created,confirmed,cancelled,checked_in}`
//! - `boxoffice.holds.expired` - seats released by the sweep
//! - `boxoffice.payments.{completed,failed,refunded}`
//! - `boxoffice.payments.revenue_cents` - cents charged
//! - `boxoffice.waitlist.notified`
//! - `boxoffice.events.created`
//! - `boxoffice.notifications.sent`
//! - `boxoffice.commands.rejected`

use metrics::{Unit, describe_counter};

/// Register descriptions for every business metric.
///
/// Call once at startup, after the recorder is installed.
pub fn describe_business_metrics() {
    describe_counter!("boxoffice.bookings.created", "Bookings opened with held seats");
    describe_counter!("boxoffice.bookings.confirmed", "Bookings confirmed after payment");
    describe_counter!("boxoffice.bookings.cancelled", "Bookings cancelled by attendees");
    describe_counter!("boxoffice.bookings.checked_in", "Bookings admitted at the door");
    describe_counter!("boxoffice.holds.expired", "Seat holds released by the expiry sweep");

    describe_counter!("boxoffice.payments.completed", "Charges accepted by the gateway");
    describe_counter!("boxoffice.payments.failed", "Charges declined by the gateway");
    describe_counter!("boxoffice.payments.refunded", "Payments refunded");
    describe_counter!(
        "boxoffice.payments.revenue_cents",
        Unit::Count,
        "Amount charged through completed payments, in cents"
    );

    describe_counter!("boxoffice.waitlist.notified", "Waitlist entries offered tickets");
    describe_counter!("boxoffice.events.created", "Events scheduled");
    describe_counter!("boxoffice.notifications.sent", "Notifications delivered");
    describe_counter!("boxoffice.commands.rejected", "Commands answered with an error");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_without_recorder() {
        // The no-op recorder accepts descriptions.
        describe_business_metrics();
        metrics::counter!("boxoffice.bookings.created").increment(1);
    }
}
