//! Box office demo
//!
//! Walks one event through its whole life against the in-memory store:
//! organizer onboarding, publishing, a discounted booking paid by card,
//! check-in, a cancellation that advances the waitlist, and the reports.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=boxoffice=debug cargo run --bin boxoffice-demo
//! ```

use anyhow::Context;
use boxoffice::aggregates::{EventDetails, JoinWaitlist, NewPromoCode, NewTicketCategory, OrganizerProfile, Registration};
use boxoffice::analytics::ReportPeriod;
use boxoffice::card::CardDetails;
use boxoffice::{
    Booking, BookingId, BoxOffice, BoxOfficeError, Config, Discount, HoldSweeper, Money, PaymentMethod, SeatSection,
    ServiceError, TicketType,
};
use chrono::{Duration, NaiveTime, Utc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "boxoffice=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    boxoffice::metrics::describe_business_metrics();

    let office = BoxOffice::from_config(&config);
    let sweeper = HoldSweeper::new(office.store().clone(), config.sweep_interval()).spawn();

    println!("\n🎫 ============================================");
    println!("   Box Office - Live Demo");
    println!("============================================\n");

    // ========== Accounts ==========

    let admin = office
        .authenticate(&config.admin.email, &config.admin.password)
        .await
        .context("administrator login")?;
    println!("1️⃣  Administrator signed in: {}", admin.email);

    let organizer = office
        .register_organizer(OrganizerProfile {
            email: "events@riverside.example".to_string(),
            full_name: "Dana Reyes".to_string(),
            phone_number: None,
            organization_name: Some("Riverside Arts".to_string()),
        })
        .await?;
    println!("   ✓ Organizer created: {} (temporary password issued)", organizer.email);

    let organizer = office
        .change_password(organizer.id, &organizer.password, "stage-door-42")
        .await?;

    let attendee = office
        .register_attendee(Registration {
            email: "sam@example.com".to_string(),
            password: "front-row".to_string(),
            full_name: "Sam Ortiz".to_string(),
            phone_number: Some("555-0101".to_string()),
        })
        .await?;
    let late_comer = office
        .register_attendee(Registration {
            email: "alex@example.com".to_string(),
            password: "balcony".to_string(),
            full_name: "Alex Kim".to_string(),
            phone_number: None,
        })
        .await?;
    println!("   ✓ Attendees registered: {}, {}\n", attendee.email, late_comer.email);

    // ========== Catalog ==========

    println!("2️⃣  Scheduling the event...");
    let date = (Utc::now() + Duration::days(30)).date_naive();
    let event = office
        .create_event(
            organizer.id,
            EventDetails {
                name: "Spring Gala".to_string(),
                description: "An evening of chamber music".to_string(),
                date,
                start_time: NaiveTime::from_hms_opt(19, 0, 0).context("start time")?,
                end_time: NaiveTime::from_hms_opt(22, 0, 0).context("end time")?,
                location: "Main Auditorium".to_string(),
                poster_url: None,
            },
        )
        .await?;

    let category = office
        .add_ticket_category(
            event.id,
            NewTicketCategory {
                ticket_type: TicketType::Vip,
                price: Money::from_dollars(120),
                quantity: 2,
                section: SeatSection::Front,
                restrictions: Some("Includes reception".to_string()),
                max_per_booking: Some(2),
            },
        )
        .await?;

    office
        .create_promotional_code(
            event.id,
            NewPromoCode {
                code: "gala10".to_string(),
                discount: Discount::Percentage(10),
                valid_from: Utc::now() - Duration::days(1),
                valid_until: Utc::now() + Duration::days(20),
                usage_limit: Some(100),
                applicable_ticket_types: vec![TicketType::Vip],
            },
        )
        .await?;

    let event = office.publish_event(event.id).await?;
    println!(
        "   ✓ {} on {} is {:?} with {} {} seats at {}\n",
        event.name, event.date, event.status, category.quantity, category.ticket_type, category.price
    );

    // ========== Booking ==========

    println!("3️⃣  Booking every VIP seat with code GALA10...");
    let seats: Vec<_> = office
        .available_seats(event.id, Some(category.id))
        .await
        .into_iter()
        .map(|seat| seat.id)
        .collect();
    let booking = office
        .create_booking(attendee.id, event.id, seats, Some("gala10"))
        .await?;
    println!(
        "   ✓ Held {} seats: {} - {} = {}",
        booking.seats.len(),
        booking.total_amount,
        booking.discount_amount,
        booking.final_amount
    );

    let card = CardDetails::new("4242 4242 4242 4242", "12/30", "123");
    let booking = checkout(&office, booking.id, PaymentMethod::CreditCard, Some(card)).await?;
    let qr_code = booking.qr_code.clone().context("confirmed booking has a QR code")?;
    println!("   ✓ Paid and confirmed, QR issued\n");

    // ========== Waitlist ==========

    println!("4️⃣  Sold out: second attendee joins the waitlist...");
    let entry = office
        .join_waitlist(JoinWaitlist {
            event_id: event.id,
            attendee_id: late_comer.id,
            email: late_comer.email.clone(),
            phone_number: None,
            ticket_type: TicketType::Vip,
            quantity: 2,
        })
        .await?;
    let position = office.waitlist_position(event.id, late_comer.id).await;
    println!("   ✓ Waitlist entry {} at position {position:?}\n", entry.id);

    println!("5️⃣  First attendee cancels and is refunded...");
    let booking = office.cancel_booking(booking.id).await?;
    if let Some(payment) = office.payment_for_booking(booking.id).await {
        let payment = office.refund_payment(payment.id).await?;
        println!("   ✓ Refunded {} ({:?})", payment.amount, payment.status);
    }

    // The waitlist pass runs as an effect of the cancellation.
    tokio::time::sleep(config.latency() * 2).await;
    for entry in office.waitlist_for_event(event.id).await {
        println!("   ✓ Waitlist entry {} is now {:?}", entry.id, entry.status);
    }
    for notification in office.unread_notifications(late_comer.id).await {
        println!("   ✉ {}: {}", late_comer.email, notification.subject);
    }
    println!();

    // ========== Rebook and check in ==========

    println!("6️⃣  Waitlisted attendee books and checks in...");
    let seats: Vec<_> = office
        .available_seats(event.id, Some(category.id))
        .await
        .into_iter()
        .map(|seat| seat.id)
        .collect();
    let rebooked = office.create_booking(late_comer.id, event.id, seats, None).await?;
    let rebooked = checkout(&office, rebooked.id, PaymentMethod::EWallet, None).await?;
    office.convert_waitlist_entry(entry.id).await?;
    let rebooked_qr = rebooked.qr_code.clone().context("confirmed booking has a QR code")?;
    let admitted = office.check_in_booking(rebooked.id, &rebooked_qr).await?;
    println!("   ✓ Booking {} is {:?}", admitted.id, admitted.status);

    match office.check_in_booking(rebooked.id, &qr_code).await {
        Ok(_) => println!("   ✗ Old QR code was accepted"),
        Err(error) => println!("   ✓ Old QR code refused: {error}"),
    }
    println!();

    // ========== Reports ==========

    println!("7️⃣  Reports");
    let today = Utc::now().date_naive();
    let sales = office
        .ticket_sales_report(event.id, ReportPeriod::Monthly, today)
        .await?;
    println!("   Sales ({}): {} tickets, {}", sales.period, sales.total_tickets_sold, sales.total_revenue);

    let revenue = office.revenue_report(ReportPeriod::Monthly, today, None).await;
    println!("   Revenue ({}): {}", revenue.period, revenue.total_revenue);

    let occupancy = office.seat_occupancy_report(event.id).await?;
    println!(
        "   Occupancy: {}/{} seats ({:.1}%)",
        occupancy.booked_seats, occupancy.total_seats, occupancy.occupancy_rate
    );
    println!("{}", serde_json::to_string_pretty(&occupancy.occupancy_by_section)?);

    let usage = office.auditorium_usage_report(ReportPeriod::Monthly, date).await;
    println!("   Auditorium ({}): {} events\n", usage.period, usage.total_events);

    sweeper.stop().await;
    office.shutdown(std::time::Duration::from_secs(5)).await?;

    println!("============================================");
    println!("   Demo complete");
    println!("============================================\n");
    Ok(())
}

/// Pay and confirm, retrying when the mock gateway declines
async fn checkout(
    office: &BoxOffice,
    booking_id: BookingId,
    method: PaymentMethod,
    card: Option<CardDetails>,
) -> anyhow::Result<Booking> {
    const ATTEMPTS: u32 = 3;

    for attempt in 1..=ATTEMPTS {
        match office.checkout(booking_id, method, card.clone()).await {
            Ok(booking) => return Ok(booking),
            Err(ServiceError::Rejected(BoxOfficeError::PaymentFailed)) if attempt < ATTEMPTS => {
                println!("   ⚠ Payment declined, retrying ({attempt}/{ATTEMPTS})");
            },
            Err(error) => return Err(error.into()),
        }
    }
    anyhow::bail!("payment declined {ATTEMPTS} times")
}
