//! Sales, revenue and occupancy reports.
//!
//! Reports are computed on demand from a [`Database`] snapshot. A booking
//! counts as sold when it is CONFIRMED or CHECKED_IN; revenue is the sum of
//! sold bookings' final amounts. Periods are calendar ranges in UTC.

use crate::error::BoxOfficeError;
use crate::types::{Booking, Database, Event, EventId, Money, SeatSection, SeatStatus, TicketType, UserId};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Reporting period around a reference date
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    /// The reference day
    Daily,
    /// Sunday through Saturday
    Weekly,
    /// The calendar month
    Monthly,
}

impl ReportPeriod {
    /// First and last day of the period containing `date`, inclusive
    #[must_use]
    pub fn range(self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Self::Daily => (date, date),
            Self::Weekly => {
                let start = date - Duration::days(i64::from(date.weekday().num_days_from_sunday()));
                (start, start + Duration::days(6))
            },
            Self::Monthly => {
                let start = date.with_day(1).unwrap_or(date);
                let next_month = if date.month() == 12 {
                    NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
                };
                let end = next_month.and_then(|day| day.pred_opt()).unwrap_or(date);
                (start, end)
            },
        }
    }

    /// Human label, e.g. `October 2026`
    #[must_use]
    pub fn label(self, date: NaiveDate) -> String {
        const DAY: &str = "%B %-d, %Y";
        match self {
            Self::Daily => date.format(DAY).to_string(),
            Self::Weekly => {
                let (start, end) = self.range(date);
                format!("{} - {}", start.format(DAY), end.format(DAY))
            },
            Self::Monthly => date.format("%B %Y").to_string(),
        }
    }

    fn contains(self, reference: NaiveDate, day: NaiveDate) -> bool {
        let (start, end) = self.range(reference);
        (start..=end).contains(&day)
    }
}

/// Tickets and revenue of one ticket type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTypeSales {
    /// Ticket type
    pub ticket_type: TicketType,
    /// Seats sold
    pub quantity: u32,
    /// Sum of seat prices
    pub revenue: Money,
}

/// Sales of one event in a period
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSalesReport {
    /// Event
    pub event_id: EventId,
    /// Event name
    pub event_name: String,
    /// Period label
    pub period: String,
    /// Seats in sold bookings
    pub total_tickets_sold: u32,
    /// Breakdown by ticket type
    pub tickets_by_type: Vec<TicketTypeSales>,
    /// Sum of final amounts
    pub total_revenue: Money,
    /// `total_revenue / total_tickets_sold`, rounded down
    pub average_ticket_price: Money,
}

/// Revenue of one event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRevenue {
    /// Event
    pub event_id: EventId,
    /// Event name
    pub event_name: String,
    /// Sum of final amounts
    pub revenue: Money,
    /// Seats sold
    pub tickets_sold: u32,
}

/// Revenue across events in a period
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueReport {
    /// Period label
    pub period: String,
    /// Sum of final amounts
    pub total_revenue: Money,
    /// Events that earned anything, by date
    pub revenue_by_event: Vec<EventRevenue>,
    /// Seat revenue by ticket type
    pub revenue_by_ticket_type: Vec<(TicketType, Money)>,
}

/// Occupancy of one section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionOccupancy {
    /// Section
    pub section: SeatSection,
    /// Seats in the section
    pub total: usize,
    /// Booked seats
    pub booked: usize,
    /// Percentage booked
    pub rate: f64,
}

/// Seat occupancy of an event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeatOccupancyReport {
    /// Event
    pub event_id: EventId,
    /// Event name
    pub event_name: String,
    /// Seats generated for the event
    pub total_seats: usize,
    /// Seats sold to confirmed bookings
    pub booked_seats: usize,
    /// Percentage booked
    pub occupancy_rate: f64,
    /// Front, middle and back
    pub occupancy_by_section: Vec<SectionOccupancy>,
}

/// Events and revenue of one organizer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerUsage {
    /// Organizer
    pub organizer_id: UserId,
    /// Organizer name, `Unknown` if the account is gone
    pub organizer_name: String,
    /// Events in the period
    pub event_count: usize,
    /// Revenue of those events
    pub revenue: Money,
}

/// Auditorium usage in a period
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditoriumUsageReport {
    /// Period label
    pub period: String,
    /// Events dated in the period
    pub total_events: usize,
    /// Sold bookings for those events
    pub total_bookings: usize,
    /// Revenue of those bookings
    pub total_revenue: Money,
    /// Mean occupancy percentage of the events
    pub average_occupancy: f64,
    /// Breakdown by organizer
    pub events_by_organizer: Vec<OrganizerUsage>,
}

fn revenue_of<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> Money {
    bookings.into_iter().map(|booking| booking.final_amount).sum()
}

fn tickets_in<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> u32 {
    let seats: usize = bookings.into_iter().map(|booking| booking.seats.len()).sum();
    u32::try_from(seats).unwrap_or(u32::MAX)
}

#[allow(clippy::cast_precision_loss)] // seat counts are small
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Sold bookings created inside the period
fn sold_in(db: &Database, period: ReportPeriod, date: NaiveDate, event: impl Fn(EventId) -> bool) -> Vec<Booking> {
    db.bookings_where(|booking| {
        booking.status.is_sold() && event(booking.event_id) && period.contains(date, booking.created_at.date_naive())
    })
}

/// Booked and total seats of an event
fn occupancy_of(db: &Database, event_id: EventId) -> (usize, usize) {
    let seats = db.seats_for_event(event_id);
    let booked = seats
        .iter()
        .filter(|seat| matches!(seat.status, SeatStatus::Booked { .. }))
        .count();
    (booked, seats.len())
}

/// Ticket sales of an event for bookings created in the period
///
/// # Errors
///
/// [`BoxOfficeError::EventNotFound`] if the event does not exist.
pub fn ticket_sales_report(
    db: &Database,
    event_id: EventId,
    period: ReportPeriod,
    date: NaiveDate,
) -> Result<TicketSalesReport, BoxOfficeError> {
    let event = db.events.get(&event_id).ok_or(BoxOfficeError::EventNotFound)?;
    let bookings = sold_in(db, period, date, |id| id == event_id);

    let mut by_type: BTreeMap<TicketType, (u32, Money)> = BTreeMap::new();
    for seat in bookings.iter().flat_map(|booking| &booking.seats) {
        let (quantity, revenue) = by_type.entry(seat.ticket_type).or_insert((0, Money::ZERO));
        *quantity += 1;
        *revenue = revenue.saturating_add(seat.price);
    }

    let total_tickets_sold = tickets_in(&bookings);
    let total_revenue = revenue_of(&bookings);
    let average_ticket_price = if total_tickets_sold == 0 {
        Money::ZERO
    } else {
        Money::from_cents(total_revenue.cents() / u64::from(total_tickets_sold))
    };

    Ok(TicketSalesReport {
        event_id,
        event_name: event.name.clone(),
        period: period.label(date),
        total_tickets_sold,
        tickets_by_type: by_type
            .into_iter()
            .map(|(ticket_type, (quantity, revenue))| TicketTypeSales {
                ticket_type,
                quantity,
                revenue,
            })
            .collect(),
        total_revenue,
        average_ticket_price,
    })
}

/// Revenue of sold bookings created in the period, optionally limited to one
/// organizer's events
#[must_use]
pub fn revenue_report(
    db: &Database,
    period: ReportPeriod,
    date: NaiveDate,
    organizer: Option<UserId>,
) -> RevenueReport {
    let events = db.events_where(|event| organizer.is_none_or(|id| event.organizer_id == id));
    let bookings = sold_in(db, period, date, |id| events.iter().any(|event| event.id == id));

    let revenue_by_event = events
        .iter()
        .map(|event| {
            let sold: Vec<&Booking> = bookings.iter().filter(|booking| booking.event_id == event.id).collect();
            EventRevenue {
                event_id: event.id,
                event_name: event.name.clone(),
                revenue: revenue_of(sold.iter().copied()),
                tickets_sold: tickets_in(sold.iter().copied()),
            }
        })
        .filter(|entry| !entry.revenue.is_zero())
        .collect();

    let mut by_type: BTreeMap<TicketType, Money> = BTreeMap::new();
    for seat in bookings.iter().flat_map(|booking| &booking.seats) {
        let revenue = by_type.entry(seat.ticket_type).or_insert(Money::ZERO);
        *revenue = revenue.saturating_add(seat.price);
    }

    RevenueReport {
        period: period.label(date),
        total_revenue: revenue_of(&bookings),
        revenue_by_event,
        revenue_by_ticket_type: by_type.into_iter().collect(),
    }
}

/// Booked seats of an event, overall and per section
///
/// # Errors
///
/// [`BoxOfficeError::EventNotFound`] if the event does not exist.
pub fn seat_occupancy_report(db: &Database, event_id: EventId) -> Result<SeatOccupancyReport, BoxOfficeError> {
    let event = db.events.get(&event_id).ok_or(BoxOfficeError::EventNotFound)?;
    let seats = db.seats_for_event(event_id);
    let (booked_seats, total_seats) = occupancy_of(db, event_id);

    let occupancy_by_section = SeatSection::ALL
        .into_iter()
        .map(|section| {
            let in_section: Vec<_> = seats.iter().filter(|seat| seat.section == section).collect();
            let booked = in_section
                .iter()
                .filter(|seat| matches!(seat.status, SeatStatus::Booked { .. }))
                .count();
            SectionOccupancy {
                section,
                total: in_section.len(),
                booked,
                rate: percentage(booked, in_section.len()),
            }
        })
        .collect();

    Ok(SeatOccupancyReport {
        event_id,
        event_name: event.name.clone(),
        total_seats,
        booked_seats,
        occupancy_rate: percentage(booked_seats, total_seats),
        occupancy_by_section,
    })
}

/// Events dated in the period with their sold bookings, occupancy and
/// organizers
#[must_use]
pub fn auditorium_usage_report(db: &Database, period: ReportPeriod, date: NaiveDate) -> AuditoriumUsageReport {
    let events: Vec<Event> = db.events_where(|event| period.contains(date, event.date));
    let bookings = db.bookings_where(|booking| {
        booking.status.is_sold() && events.iter().any(|event| event.id == booking.event_id)
    });

    let rates: Vec<f64> = events
        .iter()
        .map(|event| {
            let (booked, total) = occupancy_of(db, event.id);
            percentage(booked, total)
        })
        .collect();
    #[allow(clippy::cast_precision_loss)]
    let average_occupancy = if rates.is_empty() {
        0.0
    } else {
        rates.iter().sum::<f64>() / rates.len() as f64
    };

    let mut by_organizer: HashMap<UserId, (usize, Money)> = HashMap::new();
    for event in &events {
        let revenue = revenue_of(bookings.iter().filter(|booking| booking.event_id == event.id));
        let (count, total) = by_organizer.entry(event.organizer_id).or_insert((0, Money::ZERO));
        *count += 1;
        *total = total.saturating_add(revenue);
    }
    let mut events_by_organizer: Vec<OrganizerUsage> = by_organizer
        .into_iter()
        .map(|(organizer_id, (event_count, revenue))| OrganizerUsage {
            organizer_id,
            organizer_name: db
                .users
                .get(&organizer_id)
                .map_or_else(|| "Unknown".to_string(), |user| user.full_name.clone()),
            event_count,
            revenue,
        })
        .collect();
    events_by_organizer.sort_by(|a, b| a.organizer_name.cmp(&b.organizer_name).then(a.organizer_id.cmp(&b.organizer_id)));

    AuditoriumUsageReport {
        period: period.label(date),
        total_events: events.len(),
        total_bookings: bookings.len(),
        total_revenue: revenue_of(&bookings),
        average_occupancy,
        events_by_organizer,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{BookingId, BookingSeat, BookingStatus, Seat, SeatId, TicketCategoryId};
    use chrono::{DateTime, NaiveTime, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(date: NaiveDate) -> DateTime<Utc> {
        date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()).and_utc()
    }

    fn event(db: &mut Database, organizer: UserId, name: &str, date: NaiveDate) -> EventId {
        let event = Event {
            id: EventId::new(),
            organizer_id: organizer,
            name: name.to_string(),
            description: String::new(),
            date,
            start_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            location: "Main Auditorium".to_string(),
            poster_url: None,
            status: crate::types::EventStatus::Published,
            created_at: at(date),
            updated_at: at(date),
        };
        let id = event.id;
        db.events.insert(id, event);
        id
    }

    fn seat(db: &mut Database, event_id: EventId, section: SeatSection, status: SeatStatus) -> SeatId {
        let seat = Seat {
            id: SeatId::new(),
            event_id,
            ticket_category_id: TicketCategoryId::new(),
            section,
            row: 'A',
            number: 1,
            status,
        };
        let id = seat.id;
        db.seats.insert(id, seat);
        id
    }

    fn booking(
        db: &mut Database,
        event_id: EventId,
        status: BookingStatus,
        created: NaiveDate,
        prices: &[(TicketType, u64)],
        final_amount: Money,
    ) {
        let seats: Vec<BookingSeat> = prices
            .iter()
            .map(|(ticket_type, dollars)| BookingSeat {
                seat_id: SeatId::new(),
                ticket_category_id: TicketCategoryId::new(),
                ticket_type: *ticket_type,
                section: SeatSection::Middle,
                row: 'A',
                number: 1,
                price: Money::from_dollars(*dollars),
            })
            .collect();
        let total_amount: Money = seats.iter().map(|seat| seat.price).sum();
        let booking = Booking {
            id: BookingId::new(),
            attendee_id: UserId::new(),
            event_id,
            seats,
            total_amount,
            discount_amount: total_amount.saturating_sub(final_amount),
            final_amount,
            promo_code: None,
            status,
            qr_code: None,
            created_at: at(created),
            confirmed_at: None,
            checked_in_at: None,
            cancelled_at: None,
        };
        db.bookings.insert(booking.id, booking);
    }

    #[test]
    fn test_period_ranges_and_labels() {
        // a Monday
        let date = day(2026, 10, 19);

        assert_eq!(ReportPeriod::Daily.range(date), (date, date));
        assert_eq!(ReportPeriod::Weekly.range(date), (day(2026, 10, 18), day(2026, 10, 24)));
        assert_eq!(ReportPeriod::Monthly.range(date), (day(2026, 10, 1), day(2026, 10, 31)));
        assert_eq!(ReportPeriod::Monthly.range(day(2026, 12, 5)), (day(2026, 12, 1), day(2026, 12, 31)));
        assert_eq!(ReportPeriod::Monthly.range(day(2028, 2, 10)).1, day(2028, 2, 29));

        assert_eq!(ReportPeriod::Daily.label(date), "October 19, 2026");
        assert_eq!(ReportPeriod::Weekly.label(date), "October 18, 2026 - October 24, 2026");
        assert_eq!(ReportPeriod::Monthly.label(date), "October 2026");
    }

    #[test]
    fn test_ticket_sales_counts_sold_bookings_in_period() {
        let mut db = Database::new();
        let gala = event(&mut db, UserId::new(), "Gala", day(2026, 11, 20));
        let week = day(2026, 10, 19);
        booking(
            &mut db,
            gala,
            BookingStatus::Confirmed,
            week,
            &[(TicketType::Vip, 100), (TicketType::GeneralAdmission, 50)],
            Money::from_dollars(135),
        );
        booking(&mut db, gala, BookingStatus::CheckedIn, day(2026, 10, 24), &[(TicketType::Vip, 100)], Money::from_dollars(100));
        booking(&mut db, gala, BookingStatus::Pending, week, &[(TicketType::Vip, 100)], Money::from_dollars(100));
        booking(&mut db, gala, BookingStatus::Cancelled, week, &[(TicketType::Vip, 100)], Money::from_dollars(100));
        booking(&mut db, gala, BookingStatus::Confirmed, day(2026, 10, 25), &[(TicketType::Vip, 100)], Money::from_dollars(100));

        let report = ticket_sales_report(&db, gala, ReportPeriod::Weekly, week).unwrap();

        assert_eq!(report.total_tickets_sold, 3);
        assert_eq!(report.total_revenue, Money::from_dollars(235));
        assert_eq!(report.average_ticket_price, Money::from_cents(7_833));
        assert_eq!(
            report.tickets_by_type,
            vec![
                TicketTypeSales {
                    ticket_type: TicketType::GeneralAdmission,
                    quantity: 1,
                    revenue: Money::from_dollars(50),
                },
                TicketTypeSales {
                    ticket_type: TicketType::Vip,
                    quantity: 2,
                    revenue: Money::from_dollars(200),
                },
            ]
        );
        assert_eq!(
            ticket_sales_report(&db, EventId::new(), ReportPeriod::Daily, week),
            Err(BoxOfficeError::EventNotFound)
        );
    }

    #[test]
    fn test_revenue_report_filters_by_organizer() {
        let mut db = Database::new();
        let (alice, bob) = (UserId::new(), UserId::new());
        let gala = event(&mut db, alice, "Gala", day(2026, 11, 20));
        let recital = event(&mut db, bob, "Recital", day(2026, 11, 21));
        let quiet = event(&mut db, alice, "Quiet Night", day(2026, 11, 22));
        let date = day(2026, 10, 5);
        booking(&mut db, gala, BookingStatus::Confirmed, date, &[(TicketType::Vip, 100)], Money::from_dollars(100));
        booking(&mut db, recital, BookingStatus::Confirmed, date, &[(TicketType::Child, 20)], Money::from_dollars(20));
        booking(&mut db, quiet, BookingStatus::Pending, date, &[(TicketType::Child, 20)], Money::from_dollars(20));

        let all = revenue_report(&db, ReportPeriod::Monthly, date, None);
        assert_eq!(all.period, "October 2026");
        assert_eq!(all.total_revenue, Money::from_dollars(120));
        assert_eq!(all.revenue_by_event.len(), 2, "events without revenue are left out");
        assert_eq!(
            all.revenue_by_ticket_type,
            vec![(TicketType::Vip, Money::from_dollars(100)), (TicketType::Child, Money::from_dollars(20))]
        );

        let alices = revenue_report(&db, ReportPeriod::Monthly, date, Some(alice));
        assert_eq!(alices.total_revenue, Money::from_dollars(100));
        assert_eq!(alices.revenue_by_event.len(), 1);
        assert_eq!(alices.revenue_by_event[0].event_name, "Gala");
        assert_eq!(alices.revenue_by_event[0].tickets_sold, 1);
    }

    #[test]
    fn test_seat_occupancy_counts_booked_seats_only() {
        let mut db = Database::new();
        let gala = event(&mut db, UserId::new(), "Gala", day(2026, 11, 20));
        let owner = BookingId::new();
        seat(&mut db, gala, SeatSection::Front, SeatStatus::Booked { booking_id: owner });
        seat(&mut db, gala, SeatSection::Front, SeatStatus::Available);
        seat(
            &mut db,
            gala,
            SeatSection::Middle,
            SeatStatus::Held {
                booking_id: owner,
                until: at(day(2026, 10, 19)),
            },
        );
        seat(&mut db, gala, SeatSection::Middle, SeatStatus::Booked { booking_id: owner });

        let report = seat_occupancy_report(&db, gala).unwrap();

        assert_eq!(report.total_seats, 4);
        assert_eq!(report.booked_seats, 2);
        assert!((report.occupancy_rate - 50.0).abs() < f64::EPSILON);
        let sections: Vec<_> = report
            .occupancy_by_section
            .iter()
            .map(|s| (s.section, s.total, s.booked))
            .collect();
        assert_eq!(
            sections,
            vec![
                (SeatSection::Front, 2, 1),
                (SeatSection::Middle, 2, 1),
                (SeatSection::Back, 0, 0)
            ]
        );
        assert!(report.occupancy_by_section[2].rate.abs() < f64::EPSILON);
    }

    #[test]
    fn test_auditorium_usage_by_event_date() {
        let mut db = Database::new();
        let organizer = crate::types::User {
            id: UserId::new(),
            email: "org@example.com".to_string(),
            password: "Event@1234".to_string(),
            role: crate::types::UserRole::EventOrganizer,
            full_name: "Olivia Organizer".to_string(),
            phone_number: None,
            organization_name: None,
            must_change_password: true,
            is_active: true,
            created_at: at(day(2026, 1, 1)),
        };
        let known = organizer.id;
        db.users.insert(known, organizer);
        let ghost = UserId::new();

        let gala = event(&mut db, known, "Gala", day(2026, 10, 20));
        let recital = event(&mut db, ghost, "Recital", day(2026, 10, 22));
        let _outside = event(&mut db, known, "Later", day(2026, 11, 20));
        seat(&mut db, gala, SeatSection::Front, SeatStatus::Booked { booking_id: BookingId::new() });
        seat(&mut db, gala, SeatSection::Front, SeatStatus::Available);
        seat(&mut db, recital, SeatSection::Back, SeatStatus::Available);
        // sold long before the event week still counts
        booking(&mut db, gala, BookingStatus::Confirmed, day(2026, 9, 1), &[(TicketType::Vip, 80)], Money::from_dollars(80));

        let report = auditorium_usage_report(&db, ReportPeriod::Weekly, day(2026, 10, 19));

        assert_eq!(report.total_events, 2);
        assert_eq!(report.total_bookings, 1);
        assert_eq!(report.total_revenue, Money::from_dollars(80));
        assert!((report.average_occupancy - 25.0).abs() < f64::EPSILON);
        let organizers: Vec<_> = report
            .events_by_organizer
            .iter()
            .map(|o| (o.organizer_name.as_str(), o.event_count, o.revenue))
            .collect();
        assert_eq!(
            organizers,
            vec![("Olivia Organizer", 1, Money::from_dollars(80)), ("Unknown", 1, Money::ZERO)]
        );
    }
}
