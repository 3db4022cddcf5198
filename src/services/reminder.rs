//! Periodic reminder loop.
//!
//! Owned by the supervising runtime: spawned once at startup, scans for
//! overdue and unassigned tasks on a fixed interval and hands the result to
//! the notifier. Every failure is logged and the loop keeps running.

use crate::{config::ReminderConfig, repository::TaskRepository, services::Notifier};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

pub struct ReminderLoop {
    db: PgPool,
    notifier: Arc<Notifier>,
    config: ReminderConfig,
}

impl ReminderLoop {
    pub fn new(db: PgPool, notifier: Arc<Notifier>, config: ReminderConfig) -> Self {
        Self {
            db,
            notifier,
            config,
        }
    }

    /// Run forever. The first tick fires after one full interval, not at
    /// startup.
    pub async fn run(self) {
        let period = Duration::from_secs(self.config.interval_hours * 3600);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        tracing::info!(
            interval_hours = self.config.interval_hours,
            "Reminder loop started"
        );

        loop {
            ticker.tick().await;
            self.scan_and_notify().await;
        }
    }

    async fn scan_and_notify(&self) {
        let repo = TaskRepository::new(self.db.clone());

        let overdue = match repo.overdue().await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "Reminder scan for overdue tasks failed");
                return;
            }
        };

        let unassigned = match repo.unassigned().await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "Reminder scan for unassigned tasks failed");
                return;
            }
        };

        if overdue.is_empty() && unassigned.is_empty() {
            tracing::debug!("Reminder scan found nothing to report");
            return;
        }

        tracing::info!(
            overdue = overdue.len(),
            unassigned = unassigned.len(),
            "Dispatching reminder"
        );

        self.notifier.notify_reminder(&overdue, &unassigned).await;
    }
}
