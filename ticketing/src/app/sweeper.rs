//! Periodic release of expired seat holds.

use super::facade::BoxOfficeStore;
use crate::aggregates::{BookingAction, BoxOfficeAction};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Background task sending [`BookingAction::SweepExpiredHolds`] on a fixed
/// interval
pub struct HoldSweeper {
    store: BoxOfficeStore,
    interval: Duration,
}

/// Handle to a running [`HoldSweeper`]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl HoldSweeper {
    /// Sweeper over `store` ticking every `interval`
    #[must_use]
    pub const fn new(store: BoxOfficeStore, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Spawn the sweep loop
    ///
    /// The first sweep runs one interval after spawning. The loop ends when
    /// the handle stops it or the store starts shutting down.
    #[must_use]
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown, mut stop) = watch::channel(false);
        let Self { store, interval } = self;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(interval_secs = interval.as_secs(), "Hold sweeper started");

            while !*stop.borrow() {
                tokio::select! {
                    _ = ticker.tick() => {
                        if store.is_shutting_down() {
                            break;
                        }
                        if let Err(error) = store
                            .send(BoxOfficeAction::Booking(BookingAction::SweepExpiredHolds))
                            .await
                        {
                            tracing::warn!(%error, "Hold sweep not dispatched");
                            break;
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Hold sweeper stopped");
        });

        SweeperHandle { shutdown, task }
    }
}

impl SweeperHandle {
    /// Signal the loop to stop and wait for it
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(error) = self.task.await {
            tracing::error!(%error, "Hold sweeper task failed");
        }
    }
}
