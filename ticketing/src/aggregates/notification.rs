//! Notification log.
//!
//! Other aggregates record notifications through [`notify`], which appends the
//! record and returns the delivery effect.

use super::{BoxOfficeAction, Reply, respond};
use crate::environment::BoxOfficeEnvironment;
use crate::error::BoxOfficeError;
use crate::types::{CorrelationId, Database, Notification, NotificationChannel, NotificationId, UserId};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer};
use std::sync::Arc;

/// Notification commands
#[derive(Clone, Debug)]
pub enum NotificationAction {
    /// Record and deliver a notification
    Send {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Recipient
        user_id: UserId,
        /// Channel
        channel: NotificationChannel,
        /// Subject
        subject: String,
        /// Body
        message: String,
    },
    /// Mark one notification as read
    MarkRead {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Notification
        notification_id: NotificationId,
    },
    /// Mark every notification of a user as read
    MarkAllRead {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Recipient
        user_id: UserId,
    },
    /// Remove a notification from the log
    Delete {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Notification
        notification_id: NotificationId,
    },
}

/// Append a notification to the log and return the effect that delivers it
pub(crate) fn notify(
    state: &mut Database,
    env: &BoxOfficeEnvironment,
    user_id: UserId,
    subject: impl Into<String>,
    message: impl Into<String>,
) -> (Notification, Effect<BoxOfficeAction>) {
    record(state, env, user_id, NotificationChannel::Email, subject.into(), message.into())
}

fn record(
    state: &mut Database,
    env: &BoxOfficeEnvironment,
    user_id: UserId,
    channel: NotificationChannel,
    subject: String,
    message: String,
) -> (Notification, Effect<BoxOfficeAction>) {
    let notification = Notification {
        id: NotificationId::new(),
        user_id,
        channel,
        subject,
        message,
        sent_at: env.now(),
        is_read: false,
    };
    state.notifications.push(notification.clone());
    metrics::counter!("boxoffice.notifications.sent").increment(1);
    tracing::debug!(notification_id = %notification.id, %user_id, subject = %notification.subject, "Notification recorded");

    let notifier = Arc::clone(&env.notifier);
    let delivery = notification.clone();
    let effect = Effect::Future(Box::pin(async move {
        notifier.deliver(delivery).await;
        None
    }));

    (notification, effect)
}

/// Reducer for the notification log
#[derive(Clone, Debug, Default)]
pub struct NotificationReducer;

impl NotificationReducer {
    /// Creates a new `NotificationReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for NotificationReducer {
    type State = Database;
    type Action = BoxOfficeAction;
    type Environment = BoxOfficeEnvironment;

    fn reduce(
        &self,
        state: &mut Database,
        action: BoxOfficeAction,
        env: &BoxOfficeEnvironment,
    ) -> SmallVec<[Effect<BoxOfficeAction>; 4]> {
        let BoxOfficeAction::Notification(action) = action else {
            return SmallVec::new();
        };

        match action {
            NotificationAction::Send {
                correlation_id,
                user_id,
                channel,
                subject,
                message,
            } => {
                if !state.users.contains_key(&user_id) {
                    return respond(env, correlation_id, Err(BoxOfficeError::UserNotFound));
                }
                let (notification, delivery) = record(state, env, user_id, channel, subject, message);
                let mut effects = respond(env, correlation_id, Ok(Reply::Notification(notification)));
                effects.push(delivery);
                effects
            },

            NotificationAction::MarkRead {
                correlation_id,
                notification_id,
            } => {
                let result = state
                    .notifications
                    .iter_mut()
                    .find(|n| n.id == notification_id)
                    .map(|n| {
                        n.is_read = true;
                        Reply::Notification(n.clone())
                    })
                    .ok_or(BoxOfficeError::NotificationNotFound);
                respond(env, correlation_id, result)
            },

            NotificationAction::MarkAllRead {
                correlation_id,
                user_id,
            } => {
                state
                    .notifications
                    .iter_mut()
                    .filter(|n| n.user_id == user_id)
                    .for_each(|n| n.is_read = true);
                respond(env, correlation_id, Ok(Reply::Done))
            },

            NotificationAction::Delete {
                correlation_id,
                notification_id,
            } => {
                let before = state.notifications.len();
                state.notifications.retain(|n| n.id != notification_id);
                let result = if state.notifications.len() < before {
                    Ok(Reply::Done)
                } else {
                    Err(BoxOfficeError::NotificationNotFound)
                };
                respond(env, correlation_id, result)
            },
        }
    }
}
