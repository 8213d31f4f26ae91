//! Shared fixtures for the box office integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use boxoffice::aggregates::{EventDetails, NewTicketCategory, OrganizerProfile, Registration};
use boxoffice::notifier::RecordingNotifier;
use boxoffice::payment_gateway::MockPaymentGateway;
use boxoffice::{
    BoxOffice, BoxOfficeEnvironment, Config, Event, Money, SeatId, SeatSection, TicketCategory, TicketType, User,
};
use boxoffice_testing::mocks::{ManualClock, test_instant};
use chrono::{Duration, NaiveTime};
use std::sync::Arc;

/// A box office with a controllable clock and a notification log
pub struct Harness {
    pub office: BoxOffice,
    pub clock: ManualClock,
    pub notifier: RecordingNotifier,
}

pub fn harness() -> Harness {
    harness_with(MockPaymentGateway::always_succeeds())
}

pub fn harness_with(gateway: MockPaymentGateway) -> Harness {
    let clock = ManualClock::new(test_instant());
    let notifier = RecordingNotifier::new();
    let env = BoxOfficeEnvironment::new(Arc::new(clock.clone()), gateway.shared(), Arc::new(notifier.clone()));
    let office = BoxOffice::new(env, &Config::default());
    Harness {
        office,
        clock,
        notifier,
    }
}

pub async fn attendee(office: &BoxOffice, email: &str) -> User {
    office
        .register_attendee(Registration {
            email: email.to_string(),
            password: "secret".to_string(),
            full_name: format!("Attendee {email}"),
            phone_number: None,
        })
        .await
        .unwrap()
}

pub async fn organizer(office: &BoxOffice, email: &str, name: &str) -> User {
    office
        .register_organizer(OrganizerProfile {
            email: email.to_string(),
            full_name: name.to_string(),
            phone_number: None,
            organization_name: Some(format!("{name} Productions")),
        })
        .await
        .unwrap()
}

pub fn details(name: &str, days_ahead: i64) -> EventDetails {
    EventDetails {
        name: name.to_string(),
        description: format!("{name} at the auditorium"),
        date: (test_instant() + Duration::days(days_ahead)).date_naive(),
        start_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        location: "Main Auditorium".to_string(),
        poster_url: None,
    }
}

pub fn category(ticket_type: TicketType, dollars: u64, quantity: u32) -> NewTicketCategory {
    NewTicketCategory {
        ticket_type,
        price: Money::from_dollars(dollars),
        quantity,
        section: SeatSection::Middle,
        restrictions: None,
        max_per_booking: None,
    }
}

/// A published event with one category of seats
pub struct Show {
    pub organizer: User,
    pub event: Event,
    pub category: TicketCategory,
    pub seats: Vec<SeatId>,
}

pub async fn published_show(office: &BoxOffice, name: &str, days_ahead: i64, seats: u32) -> Show {
    let email = format!("{}@organizers.example", name.to_lowercase().replace(' ', "."));
    let organizer = organizer(office, &email, name).await;
    let event = office.create_event(organizer.id, details(name, days_ahead)).await.unwrap();
    let category = office
        .add_ticket_category(event.id, category(TicketType::GeneralAdmission, 50, seats))
        .await
        .unwrap();
    let event = office.publish_event(event.id).await.unwrap();
    let seats = office
        .available_seats(event.id, Some(category.id))
        .await
        .into_iter()
        .map(|seat| seat.id)
        .collect();
    Show {
        organizer,
        event,
        category,
        seats,
    }
}

/// Poll `check` until it holds or a second has passed
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    false
}
