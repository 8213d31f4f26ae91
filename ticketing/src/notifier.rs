//! Notification delivery.
//!
//! Reducers record every [`Notification`] in the database and hand it to a
//! [`Notifier`] through an effect. Nothing is actually mailed.

use crate::types::{Notification, NotificationChannel};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

/// Delivers recorded notifications to the outside world
pub trait Notifier: Send + Sync {
    /// Deliver one notification; delivery failures are the notifier's concern
    fn deliver(&self, notification: Notification) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// Console notifier (logs instead of sending)
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn deliver(&self, notification: Notification) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            let channel = match notification.channel {
                NotificationChannel::Email => "email",
                NotificationChannel::Sms => "sms",
                NotificationChannel::InApp => "in-app",
            };
            info!(
                notification_id = %notification.id,
                user_id = %notification.user_id,
                channel,
                subject = %notification.subject,
                "\n\n=== MOCK {channel} SENT ===\nSubject: {}\n{}\n",
                notification.subject,
                notification.message.trim()
            );
        })
    }
}

/// Keeps every delivered notification in memory
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    delivered: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in delivery order
    #[must_use]
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn deliver(&self, notification: Notification) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        let delivered = Arc::clone(&self.delivered);
        Box::pin(async move {
            delivered
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notification);
        })
    }
}
