//! Admission QR payloads.
//!
//! A QR payload is the string `booking:attendee:event:millis:nonce`. Only the
//! string is produced here; rendering it as an image is left to callers.

use crate::types::{BookingId, EventId, UserId};
use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

const NONCE_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const NONCE_LEN: usize = 13;

/// Fields recovered from a QR payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrPayload {
    /// Booking
    pub booking_id: BookingId,
    /// Attendee
    pub attendee_id: UserId,
    /// Event
    pub event_id: EventId,
    /// Issue time in unix milliseconds
    pub issued_at_millis: i64,
}

/// Builds a fresh payload for a confirmed booking
#[must_use]
pub fn generate(booking_id: BookingId, attendee_id: UserId, event_id: EventId, now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let nonce: String = (0..NONCE_LEN)
        .map(|_| char::from(NONCE_ALPHABET[rng.gen_range(0..NONCE_ALPHABET.len())]))
        .collect();
    format!(
        "{booking_id}:{attendee_id}:{event_id}:{}:{nonce}",
        now.timestamp_millis()
    )
}

/// Parses a payload; `None` if it is not one this module produced
#[must_use]
pub fn decode(qr_code: &str) -> Option<QrPayload> {
    let mut parts = qr_code.trim().split(':');
    let booking = Uuid::parse_str(parts.next()?).ok()?;
    let attendee = Uuid::parse_str(parts.next()?).ok()?;
    let event = Uuid::parse_str(parts.next()?).ok()?;
    let issued_at_millis = parts.next()?.parse().ok()?;
    let nonce = parts.next()?;
    if nonce.is_empty() || parts.next().is_some() {
        return None;
    }

    Some(QrPayload {
        booking_id: BookingId::from_uuid(booking),
        attendee_id: UserId::from_uuid(attendee),
        event_id: EventId::from_uuid(event),
        issued_at_millis,
    })
}

/// Whether the payload was issued for `booking_id`
#[must_use]
pub fn matches_booking(qr_code: &str, booking_id: BookingId) -> bool {
    decode(qr_code).is_some_and(|payload| payload.booking_id == booking_id)
}
