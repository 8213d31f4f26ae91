//! Async facade over the box office store.
//!
//! Every command goes through [`Store::send_and_wait_for`] and waits for the
//! [`BoxOfficeAction::Replied`] action carrying its correlation id. Queries
//! wait for the configured latency, then read a snapshot of the state.

use crate::aggregates::{
    AccountsAction, BookingAction, BoxOfficeAction, BoxOfficeReducer, CatalogAction, EventDetails, JoinWaitlist,
    NewPromoCode, NewTicketCategory, NotificationAction, OrganizerProfile, PaymentAction, Registration, Reply,
    WaitlistAction, accounts, catalog,
};
use crate::analytics::{self, AuditoriumUsageReport, ReportPeriod, RevenueReport, SeatOccupancyReport, TicketSalesReport};
use crate::card::CardDetails;
use crate::config::Config;
use crate::environment::BoxOfficeEnvironment;
use crate::error::ServiceError;
use crate::types::{
    Booking, BookingId, CorrelationId, Database, Event, EventId, EventStatus, Notification, NotificationChannel,
    NotificationId, Payment, PaymentId, PaymentMethod, PromoCodeId, PromotionalCode, Seat, SeatId, TicketCategory,
    TicketCategoryId, User, UserId, WaitlistEntry, WaitlistId,
};
use boxoffice_runtime::Store;
use chrono::NaiveDate;
use std::time::Duration;

/// The store type behind the facade
pub type BoxOfficeStore = Store<Database, BoxOfficeAction, BoxOfficeEnvironment, BoxOfficeReducer>;

/// Match the reply payload or report an unexpected shape
macro_rules! expect_reply {
    ($reply:expr, $variant:path, $operation:literal) => {
        match $reply {
            $variant(value) => Ok(value),
            _ => Err(ServiceError::UnexpectedReply { operation: $operation }),
        }
    };
}

/// Box office service
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct BoxOffice {
    store: BoxOfficeStore,
    reply_timeout: Duration,
    admin_id: UserId,
}

impl BoxOffice {
    /// Build a box office over an empty database with the administrator
    /// account seeded
    #[must_use]
    pub fn new(env: BoxOfficeEnvironment, config: &Config) -> Self {
        let mut db = Database::new();
        let admin_id = accounts::seed_admin(&mut db, &config.admin, env.now());
        tracing::info!(%admin_id, email = %config.admin.email, "Seeded administrator account");

        Self {
            store: Store::new(db, BoxOfficeReducer::new(), env),
            reply_timeout: config.reply_timeout(),
            admin_id,
        }
    }

    /// Build a box office wired from configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(BoxOfficeEnvironment::from_config(config), config)
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &BoxOfficeStore {
        &self.store
    }

    /// The seeded administrator
    #[must_use]
    pub const fn admin_id(&self) -> UserId {
        self.admin_id
    }

    /// Stop accepting commands and wait for running effects
    ///
    /// # Errors
    ///
    /// [`ServiceError::Store`] if effects are still running after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), ServiceError> {
        Ok(self.store.shutdown(timeout).await?)
    }

    /// Send a command and wait for its reply
    async fn execute(&self, command: impl FnOnce(CorrelationId) -> BoxOfficeAction) -> Result<Reply, ServiceError> {
        let correlation_id = CorrelationId::new();
        let action = self
            .store
            .send_and_wait_for(
                command(correlation_id),
                move |action| action.reply_to() == Some(correlation_id),
                self.reply_timeout,
            )
            .await?;

        match action {
            BoxOfficeAction::Replied { reply, .. } => Ok(reply?),
            _ => Err(ServiceError::UnexpectedReply { operation: "execute" }),
        }
    }

    /// Read the state after the simulated latency
    async fn query<T>(&self, read: impl FnOnce(&Database) -> T) -> T {
        let latency = self.store.environment().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.store.state(read).await
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Sign up an attendee
    ///
    /// # Errors
    ///
    /// Rejected when the e-mail is taken or the details are malformed.
    pub async fn register_attendee(&self, registration: Registration) -> Result<User, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Accounts(AccountsAction::RegisterAttendee {
                    correlation_id,
                    registration,
                })
            })
            .await?;
        expect_reply!(reply, Reply::User, "register_attendee")
    }

    /// Create an organizer account with a generated password
    ///
    /// # Errors
    ///
    /// Rejected when the e-mail is taken or the details are malformed.
    pub async fn register_organizer(&self, profile: OrganizerProfile) -> Result<User, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Accounts(AccountsAction::RegisterOrganizer {
                    correlation_id,
                    profile,
                })
            })
            .await?;
        expect_reply!(reply, Reply::User, "register_organizer")
    }

    /// Check credentials
    ///
    /// # Errors
    ///
    /// Rejected on a wrong e-mail or password, or an inactive account.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        Ok(self.query(|db| accounts::authenticate(db, email, password)).await?)
    }

    /// Replace a password
    ///
    /// # Errors
    ///
    /// Rejected for an unknown user or a wrong current password.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<User, ServiceError> {
        let (current_password, new_password) = (current_password.to_string(), new_password.to_string());
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Accounts(AccountsAction::ChangePassword {
                    correlation_id,
                    user_id,
                    current_password,
                    new_password,
                })
            })
            .await?;
        expect_reply!(reply, Reply::User, "change_password")
    }

    async fn set_active(&self, user_id: UserId, active: bool) -> Result<User, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Accounts(AccountsAction::SetActive {
                    correlation_id,
                    user_id,
                    active,
                })
            })
            .await?;
        expect_reply!(reply, Reply::User, "set_active")
    }

    /// Re-enable an account
    ///
    /// # Errors
    ///
    /// Rejected for an unknown user.
    pub async fn activate_user(&self, user_id: UserId) -> Result<User, ServiceError> {
        self.set_active(user_id, true).await
    }

    /// Disable an account
    ///
    /// # Errors
    ///
    /// Rejected for an unknown user.
    pub async fn deactivate_user(&self, user_id: UserId) -> Result<User, ServiceError> {
        self.set_active(user_id, false).await
    }

    /// Account by id
    pub async fn user(&self, user_id: UserId) -> Option<User> {
        self.query(|db| db.users.get(&user_id).cloned()).await
    }

    /// Organizer accounts
    pub async fn list_organizers(&self) -> Vec<User> {
        self.query(Database::organizers).await
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    /// Schedule a DRAFT event
    ///
    /// # Errors
    ///
    /// Rejected for invalid details, a non-organizer or a taken date.
    pub async fn create_event(&self, organizer_id: UserId, details: EventDetails) -> Result<Event, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Catalog(CatalogAction::CreateEvent {
                    correlation_id,
                    organizer_id,
                    details,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Event, "create_event")
    }

    /// Edit an event
    ///
    /// # Errors
    ///
    /// Rejected for an unknown or finished event, invalid details or a taken date.
    pub async fn update_event_details(&self, event_id: EventId, details: EventDetails) -> Result<Event, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Catalog(CatalogAction::UpdateEventDetails {
                    correlation_id,
                    event_id,
                    details,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Event, "update_event_details")
    }

    /// Move an event to another lifecycle status
    ///
    /// # Errors
    ///
    /// Rejected for an unknown event or a disallowed transition.
    pub async fn change_event_status(&self, event_id: EventId, status: EventStatus) -> Result<Event, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Catalog(CatalogAction::ChangeEventStatus {
                    correlation_id,
                    event_id,
                    status,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Event, "change_event_status")
    }

    /// Open a DRAFT event for booking
    ///
    /// # Errors
    ///
    /// Rejected for an unknown event or one that is not a draft.
    pub async fn publish_event(&self, event_id: EventId) -> Result<Event, ServiceError> {
        self.change_event_status(event_id, EventStatus::Published).await
    }

    /// Add a priced category and generate its seats
    ///
    /// # Errors
    ///
    /// Rejected for an unknown or finished event or invalid category values.
    pub async fn add_ticket_category(
        &self,
        event_id: EventId,
        category: NewTicketCategory,
    ) -> Result<TicketCategory, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Catalog(CatalogAction::AddTicketCategory {
                    correlation_id,
                    event_id,
                    category,
                })
            })
            .await?;
        expect_reply!(reply, Reply::TicketCategory, "add_ticket_category")
    }

    /// Create a promotional code
    ///
    /// # Errors
    ///
    /// Rejected for an unknown event, a duplicate code or invalid values.
    pub async fn create_promotional_code(
        &self,
        event_id: EventId,
        promo: NewPromoCode,
    ) -> Result<PromotionalCode, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Catalog(CatalogAction::CreatePromoCode {
                    correlation_id,
                    event_id,
                    promo,
                })
            })
            .await?;
        expect_reply!(reply, Reply::PromoCode, "create_promotional_code")
    }

    /// Switch a code off
    ///
    /// # Errors
    ///
    /// Rejected for an unknown code.
    pub async fn deactivate_promotional_code(&self, promo_code_id: PromoCodeId) -> Result<PromotionalCode, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Catalog(CatalogAction::DeactivatePromoCode {
                    correlation_id,
                    promo_code_id,
                })
            })
            .await?;
        expect_reply!(reply, Reply::PromoCode, "deactivate_promotional_code")
    }

    /// Event by id
    pub async fn event(&self, event_id: EventId) -> Option<Event> {
        self.query(|db| db.events.get(&event_id).cloned()).await
    }

    /// Every event by date
    pub async fn events(&self) -> Vec<Event> {
        self.query(|db| db.events_where(|_| true)).await
    }

    /// Events of one organizer by date
    pub async fn events_by_organizer(&self, organizer_id: UserId) -> Vec<Event> {
        self.query(|db| db.events_where(|event| event.organizer_id == organizer_id))
            .await
    }

    /// Events attendees can see by date
    pub async fn published_events(&self) -> Vec<Event> {
        self.query(|db| db.events_where(|event| event.status == EventStatus::Published))
            .await
    }

    /// Categories of an event
    pub async fn categories_for_event(&self, event_id: EventId) -> Vec<TicketCategory> {
        self.query(|db| db.categories_for_event(event_id)).await
    }

    /// Seats of an event
    pub async fn seats_for_event(&self, event_id: EventId) -> Vec<Seat> {
        self.query(|db| db.seats_for_event(event_id)).await
    }

    /// Bookable seats, optionally of one category
    pub async fn available_seats(&self, event_id: EventId, category: Option<TicketCategoryId>) -> Vec<Seat> {
        self.query(|db| db.available_seats(event_id, category)).await
    }

    /// Active promotional codes of an event
    pub async fn promo_codes_for_event(&self, event_id: EventId) -> Vec<PromotionalCode> {
        self.query(|db| db.promo_codes_for_event(event_id)).await
    }

    /// The code if it is redeemable right now
    pub async fn validate_promotional_code(&self, event_id: EventId, code: &str) -> Option<PromotionalCode> {
        let now = self.store.environment().now();
        self.query(|db| catalog::validate_promotional_code(db, event_id, code, now))
            .await
    }

    // ------------------------------------------------------------------
    // Bookings
    // ------------------------------------------------------------------

    /// Hold seats and open a PENDING booking
    ///
    /// # Errors
    ///
    /// Rejected when the event is not bookable or a seat is unavailable.
    pub async fn create_booking(
        &self,
        attendee_id: UserId,
        event_id: EventId,
        seat_ids: Vec<SeatId>,
        promo_code: Option<&str>,
    ) -> Result<Booking, ServiceError> {
        let promo_code = promo_code.map(str::to_string);
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Booking(BookingAction::Create {
                    correlation_id,
                    attendee_id,
                    event_id,
                    seat_ids,
                    promo_code,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Booking, "create_booking")
    }

    /// Confirm a paid booking
    ///
    /// # Errors
    ///
    /// Rejected when the booking is unpaid, not pending or its seats were taken.
    pub async fn confirm_booking(&self, booking_id: BookingId) -> Result<Booking, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Booking(BookingAction::Confirm {
                    correlation_id,
                    booking_id,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Booking, "confirm_booking")
    }

    /// Cancel a booking
    ///
    /// # Errors
    ///
    /// Rejected inside the cancellation window or for a cancelled or
    /// checked-in booking.
    pub async fn cancel_booking(&self, booking_id: BookingId) -> Result<Booking, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Booking(BookingAction::Cancel {
                    correlation_id,
                    booking_id,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Booking, "cancel_booking")
    }

    /// Admit a booking at the door
    ///
    /// # Errors
    ///
    /// Rejected for a wrong QR code or an unconfirmed booking.
    pub async fn check_in_booking(&self, booking_id: BookingId, qr_code: &str) -> Result<Booking, ServiceError> {
        let qr_code = qr_code.to_string();
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Booking(BookingAction::CheckIn {
                    correlation_id,
                    booking_id,
                    qr_code,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Booking, "check_in_booking")
    }

    /// Pay for a booking and confirm it
    ///
    /// # Errors
    ///
    /// Whatever [`Self::process_payment`] or [`Self::confirm_booking`] rejects.
    pub async fn checkout(
        &self,
        booking_id: BookingId,
        method: PaymentMethod,
        card: Option<CardDetails>,
    ) -> Result<Booking, ServiceError> {
        let outstanding = self
            .query(|db| db.bookings.get(&booking_id).map(|booking| booking.final_amount))
            .await;
        if outstanding.is_some_and(|amount| !amount.is_zero()) {
            self.process_payment(booking_id, method, card).await?;
        }
        self.confirm_booking(booking_id).await
    }

    /// Release expired holds now instead of waiting for the sweeper
    ///
    /// # Errors
    ///
    /// [`ServiceError::Store`] if the store is shutting down.
    pub async fn sweep_expired_holds(&self) -> Result<(), ServiceError> {
        self.store
            .send(BoxOfficeAction::Booking(BookingAction::SweepExpiredHolds))
            .await?;
        Ok(())
    }

    /// Booking by id
    pub async fn booking(&self, booking_id: BookingId) -> Option<Booking> {
        self.query(|db| db.bookings.get(&booking_id).cloned()).await
    }

    /// Bookings of an attendee, newest first
    pub async fn bookings_by_attendee(&self, attendee_id: UserId) -> Vec<Booking> {
        self.query(|db| db.bookings_where(|booking| booking.attendee_id == attendee_id))
            .await
    }

    /// Bookings of an event, newest first
    pub async fn bookings_by_event(&self, event_id: EventId) -> Vec<Booking> {
        self.query(|db| db.bookings_where(|booking| booking.event_id == event_id))
            .await
    }

    // ------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------

    /// Charge a pending booking
    ///
    /// # Errors
    ///
    /// Rejected for invalid card details, a duplicate payment or a gateway
    /// decline.
    pub async fn process_payment(
        &self,
        booking_id: BookingId,
        method: PaymentMethod,
        card: Option<CardDetails>,
    ) -> Result<Payment, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Payment(PaymentAction::Process {
                    correlation_id,
                    booking_id,
                    method,
                    card,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Payment, "process_payment")
    }

    /// Refund a completed payment
    ///
    /// # Errors
    ///
    /// Rejected for an unknown or uncompleted payment, or a gateway refusal.
    pub async fn refund_payment(&self, payment_id: PaymentId) -> Result<Payment, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Payment(PaymentAction::Refund {
                    correlation_id,
                    payment_id,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Payment, "refund_payment")
    }

    /// Latest payment of a booking
    pub async fn payment_for_booking(&self, booking_id: BookingId) -> Option<Payment> {
        self.query(|db| db.payment_for_booking(booking_id).cloned()).await
    }

    /// Every payment, oldest first
    pub async fn all_payments(&self) -> Vec<Payment> {
        self.query(|db| {
            let mut payments: Vec<Payment> = db.payments.values().cloned().collect();
            payments.sort_by_key(|payment| (payment.created_at, payment.id));
            payments
        })
        .await
    }

    // ------------------------------------------------------------------
    // Waitlist
    // ------------------------------------------------------------------

    /// Queue an attendee for an event
    ///
    /// # Errors
    ///
    /// Rejected when the queue is full, the attendee is already waiting or
    /// the quantity is zero.
    pub async fn join_waitlist(&self, request: JoinWaitlist) -> Result<WaitlistEntry, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Waitlist(WaitlistAction::Join {
                    correlation_id,
                    request,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Waitlist, "join_waitlist")
    }

    /// Remove an entry
    ///
    /// # Errors
    ///
    /// Rejected for an unknown entry.
    pub async fn leave_waitlist(&self, waitlist_id: WaitlistId) -> Result<(), ServiceError> {
        self.execute(|correlation_id| {
            BoxOfficeAction::Waitlist(WaitlistAction::Leave {
                correlation_id,
                waitlist_id,
            })
        })
        .await
        .map(drop)
    }

    /// Offer tickets to the first waiting attendee; `false` if nobody waits
    ///
    /// # Errors
    ///
    /// [`ServiceError::Store`] if the store does not answer.
    pub async fn notify_next_in_line(&self, event_id: EventId) -> Result<bool, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Waitlist(WaitlistAction::NotifyNext {
                    correlation_id,
                    event_id,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Notified, "notify_next_in_line")
    }

    /// Mark an entry as converted into a booking
    ///
    /// # Errors
    ///
    /// Rejected for an unknown entry.
    pub async fn convert_waitlist_entry(&self, waitlist_id: WaitlistId) -> Result<WaitlistEntry, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Waitlist(WaitlistAction::Convert {
                    correlation_id,
                    waitlist_id,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Waitlist, "convert_waitlist_entry")
    }

    /// Mark an entry as expired
    ///
    /// # Errors
    ///
    /// Rejected for an unknown entry.
    pub async fn expire_waitlist_entry(&self, waitlist_id: WaitlistId) -> Result<WaitlistEntry, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Waitlist(WaitlistAction::Expire {
                    correlation_id,
                    waitlist_id,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Waitlist, "expire_waitlist_entry")
    }

    /// Tell every waiting attendee the event is near
    ///
    /// # Errors
    ///
    /// Rejected for an unknown event.
    pub async fn notify_event_approaching(&self, event_id: EventId) -> Result<(), ServiceError> {
        self.execute(|correlation_id| {
            BoxOfficeAction::Waitlist(WaitlistAction::NotifyEventApproaching {
                correlation_id,
                event_id,
            })
        })
        .await
        .map(drop)
    }

    /// Waitlist of an event in queue order
    pub async fn waitlist_for_event(&self, event_id: EventId) -> Vec<WaitlistEntry> {
        self.query(|db| db.waitlist_for_event(event_id)).await
    }

    /// Waitlist entries of an attendee in join order
    pub async fn waitlist_for_attendee(&self, attendee_id: UserId) -> Vec<WaitlistEntry> {
        self.query(|db| {
            db.waitlist
                .iter()
                .filter(|entry| entry.attendee_id == attendee_id)
                .cloned()
                .collect()
        })
        .await
    }

    /// 1-indexed position among waiting entries
    pub async fn waitlist_position(&self, event_id: EventId, attendee_id: UserId) -> Option<usize> {
        self.query(|db| db.waitlist_position(event_id, attendee_id)).await
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Record and deliver a notification
    ///
    /// # Errors
    ///
    /// Rejected for an unknown user.
    pub async fn send_notification(
        &self,
        user_id: UserId,
        channel: NotificationChannel,
        subject: &str,
        message: &str,
    ) -> Result<Notification, ServiceError> {
        let (subject, message) = (subject.to_string(), message.to_string());
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Notification(NotificationAction::Send {
                    correlation_id,
                    user_id,
                    channel,
                    subject,
                    message,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Notification, "send_notification")
    }

    /// Mark one notification read
    ///
    /// # Errors
    ///
    /// Rejected for an unknown notification.
    pub async fn mark_notification_read(&self, notification_id: NotificationId) -> Result<Notification, ServiceError> {
        let reply = self
            .execute(|correlation_id| {
                BoxOfficeAction::Notification(NotificationAction::MarkRead {
                    correlation_id,
                    notification_id,
                })
            })
            .await?;
        expect_reply!(reply, Reply::Notification, "mark_notification_read")
    }

    /// Mark every notification of a user read
    ///
    /// # Errors
    ///
    /// [`ServiceError::Store`] if the store does not answer.
    pub async fn mark_all_notifications_read(&self, user_id: UserId) -> Result<(), ServiceError> {
        self.execute(|correlation_id| {
            BoxOfficeAction::Notification(NotificationAction::MarkAllRead {
                correlation_id,
                user_id,
            })
        })
        .await
        .map(drop)
    }

    /// Remove a notification
    ///
    /// # Errors
    ///
    /// Rejected for an unknown notification.
    pub async fn delete_notification(&self, notification_id: NotificationId) -> Result<(), ServiceError> {
        self.execute(|correlation_id| {
            BoxOfficeAction::Notification(NotificationAction::Delete {
                correlation_id,
                notification_id,
            })
        })
        .await
        .map(drop)
    }

    /// Notifications of a user, newest first
    pub async fn notifications_for_user(&self, user_id: UserId) -> Vec<Notification> {
        self.query(|db| db.notifications_for_user(user_id)).await
    }

    /// Unread notifications of a user, newest first
    pub async fn unread_notifications(&self, user_id: UserId) -> Vec<Notification> {
        self.query(|db| {
            db.notifications_for_user(user_id)
                .into_iter()
                .filter(|notification| !notification.is_read)
                .collect()
        })
        .await
    }

    // ------------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------------

    /// Ticket sales of an event
    ///
    /// # Errors
    ///
    /// Rejected for an unknown event.
    pub async fn ticket_sales_report(
        &self,
        event_id: EventId,
        period: ReportPeriod,
        date: NaiveDate,
    ) -> Result<TicketSalesReport, ServiceError> {
        Ok(self
            .query(|db| analytics::ticket_sales_report(db, event_id, period, date))
            .await?)
    }

    /// Revenue across events, optionally of one organizer
    pub async fn revenue_report(
        &self,
        period: ReportPeriod,
        date: NaiveDate,
        organizer: Option<UserId>,
    ) -> RevenueReport {
        self.query(|db| analytics::revenue_report(db, period, date, organizer))
            .await
    }

    /// Seat occupancy of an event
    ///
    /// # Errors
    ///
    /// Rejected for an unknown event.
    pub async fn seat_occupancy_report(&self, event_id: EventId) -> Result<SeatOccupancyReport, ServiceError> {
        Ok(self.query(|db| analytics::seat_occupancy_report(db, event_id)).await?)
    }

    /// Auditorium usage in a period
    pub async fn auditorium_usage_report(&self, period: ReportPeriod, date: NaiveDate) -> AuditoriumUsageReport {
        self.query(|db| analytics::auditorium_usage_report(db, period, date))
            .await
    }
}

impl std::fmt::Debug for BoxOffice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxOffice")
            .field("reply_timeout", &self.reply_timeout)
            .field("admin_id", &self.admin_id)
            .finish_non_exhaustive()
    }
}
