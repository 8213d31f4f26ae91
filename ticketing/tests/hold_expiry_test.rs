//! Seat hold expiry with a manually advanced clock.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use boxoffice::{BookingStatus, BoxOfficeError, HoldSweeper, PaymentMethod, SeatStatus, ServiceError};
use chrono::Duration;
use common::{attendee, harness, published_show};

#[tokio::test]
async fn test_expired_hold_is_released_by_sweep() {
    let h = harness();
    let show = published_show(&h.office, "Spring Gala", 30, 4).await;
    let sam = attendee(&h.office, "sam@example.com").await;

    h.office
        .create_booking(sam.id, show.event.id, vec![show.seats[0]], None)
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(9));
    h.office.sweep_expired_holds().await.unwrap();
    assert_eq!(h.office.available_seats(show.event.id, None).await.len(), 3);

    // still live at its expiry instant
    h.clock.advance(Duration::minutes(1));
    h.office.sweep_expired_holds().await.unwrap();
    assert_eq!(h.office.available_seats(show.event.id, None).await.len(), 3);

    h.clock.advance(Duration::seconds(1));
    h.office.sweep_expired_holds().await.unwrap();
    assert_eq!(h.office.available_seats(show.event.id, None).await.len(), 4);
}

#[tokio::test]
async fn test_released_seat_goes_to_the_next_buyer() {
    let h = harness();
    let show = published_show(&h.office, "Spring Gala", 30, 4).await;
    let sam = attendee(&h.office, "sam@example.com").await;
    let alex = attendee(&h.office, "alex@example.com").await;
    let seat = show.seats[0];

    let slow = h
        .office
        .create_booking(sam.id, show.event.id, vec![seat], None)
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(11));
    h.office.sweep_expired_holds().await.unwrap();

    let fast = h
        .office
        .create_booking(alex.id, show.event.id, vec![seat], None)
        .await
        .unwrap();

    // The lapsed booking is not charged for a seat that now belongs to someone else.
    let result = h
        .office
        .process_payment(slow.id, PaymentMethod::BankTransfer, None)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Rejected(BoxOfficeError::SeatsUnavailable))
    ));
    assert!(h.office.payment_for_booking(slow.id).await.is_none());
    let result = h.office.confirm_booking(slow.id).await;
    assert!(matches!(result, Err(ServiceError::Rejected(BoxOfficeError::BookingNotPaid))));

    let confirmed = h
        .office
        .checkout(fast.id, PaymentMethod::BankTransfer, None)
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_expired_hold_confirms_when_seat_is_still_free() {
    let h = harness();
    let show = published_show(&h.office, "Spring Gala", 30, 4).await;
    let sam = attendee(&h.office, "sam@example.com").await;
    let seat = show.seats[1];

    let booking = h
        .office
        .create_booking(sam.id, show.event.id, vec![seat], None)
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(30));
    h.office.sweep_expired_holds().await.unwrap();

    let confirmed = h
        .office
        .checkout(booking.id, PaymentMethod::BankTransfer, None)
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let seats = h.office.seats_for_event(show.event.id).await;
    let status = seats.iter().find(|s| s.id == seat).map(|s| s.status).unwrap();
    assert_eq!(status, SeatStatus::Booked { booking_id: booking.id });
}

#[tokio::test]
async fn test_paid_hold_survives_the_sweep() {
    let h = harness();
    let show = published_show(&h.office, "Spring Gala", 30, 4).await;
    let sam = attendee(&h.office, "sam@example.com").await;
    let alex = attendee(&h.office, "alex@example.com").await;
    let seat = show.seats[2];

    let booking = h
        .office
        .create_booking(sam.id, show.event.id, vec![seat], None)
        .await
        .unwrap();
    h.office
        .process_payment(booking.id, PaymentMethod::BankTransfer, None)
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(30));
    h.office.sweep_expired_holds().await.unwrap();

    let rival = h.office.create_booking(alex.id, show.event.id, vec![seat], None).await;
    assert!(matches!(
        rival,
        Err(ServiceError::Rejected(BoxOfficeError::SeatsUnavailable))
    ));

    let confirmed = h.office.confirm_booking(booking.id).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
}

#[tokio::test(start_paused = true)]
async fn test_background_sweeper_releases_holds() {
    let h = harness();
    let show = published_show(&h.office, "Spring Gala", 30, 4).await;
    let sam = attendee(&h.office, "sam@example.com").await;

    h.office
        .create_booking(sam.id, show.event.id, show.seats[..2].to_vec(), None)
        .await
        .unwrap();

    let sweeper = HoldSweeper::new(h.office.store().clone(), std::time::Duration::from_secs(60)).spawn();
    h.clock.advance(Duration::minutes(11));

    let office = h.office.clone();
    let event_id = show.event.id;
    let released = common::eventually(|| {
        let office = office.clone();
        async move { office.available_seats(event_id, None).await.len() == 4 }
    })
    .await;
    assert!(!released, "nothing is swept before the first tick");

    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    let released = common::eventually(|| {
        let office = office.clone();
        async move { office.available_seats(event_id, None).await.len() == 4 }
    })
    .await;
    assert!(released);

    sweeper.stop().await;
}
