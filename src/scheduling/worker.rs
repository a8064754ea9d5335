use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::reminder::Reminder;
use crate::storage::{ReminderStorage, StorageError, TaskStorage};
use crate::task::Task;

use super::ReminderDeliveryChannel;

/// A hung delivery must not stall the rest of the cycle.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FiringOutcome {
    /// Notification sent; reminder marked fired and removed (one-shot).
    Delivered,
    /// The referenced task no longer exists; reminder purged, not delivered.
    Orphaned,
    /// Transient delivery failure; reminder left untouched for the next poll.
    Retrying,
}

/// Periodic poller that fires due reminders. At-least-once delivery: a
/// failed send keeps the reminder active and it is retried every cycle
/// until it goes through. Assumes a single instance per store; two
/// concurrent pollers may observe the same due row and double-send.
pub struct FiringLoop {
    reminders: Arc<dyn ReminderStorage>,
    tasks: Arc<dyn TaskStorage>,
    delivery: Arc<dyn ReminderDeliveryChannel>,
    poll_interval: Duration,
}

impl FiringLoop {
    pub fn new(
        reminders: Arc<dyn ReminderStorage>,
        tasks: Arc<dyn TaskStorage>,
        delivery: Arc<dyn ReminderDeliveryChannel>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            reminders,
            tasks,
            delivery,
            poll_interval,
        }
    }

    /// Runs until the token is cancelled. No firing-time error is fatal:
    /// a failed cycle is logged and the next one runs on schedule.
    pub async fn run(&self, cancellation_token: CancellationToken) {
        log::info!(
            "firing loop started, poll interval {:?}",
            self.poll_interval
        );
        // Poll right away so reminders already due at startup do not wait
        // out a full interval.
        loop {
            if let Err(error) = self.poll_and_fire(Utc::now()).await {
                log::error!("reminder poll cycle failed: {error}");
            }
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    log::info!("firing loop shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// One poll cycle. A failure on one reminder never aborts the rest.
    pub async fn poll_and_fire(&self, now: DateTime<Utc>) -> Result<(), StorageError> {
        let due = self.reminders.get_due(now).await?;
        if due.is_empty() {
            return Ok(());
        }

        log::debug!("{} reminder(s) due at {}", due.len(), now);
        for reminder in due {
            let id = reminder.id;
            if let Err(error) = self.fire_one(&reminder, now).await {
                log::error!("failed to process reminder {id}: {error}");
            }
        }

        Ok(())
    }

    async fn fire_one(
        &self,
        reminder: &Reminder,
        now: DateTime<Utc>,
    ) -> Result<FiringOutcome, StorageError> {
        let Some(record) = self.tasks.get(reminder.user_id, reminder.task_id).await? else {
            log::warn!(
                "reminder {} references missing task {}, purging",
                reminder.id,
                reminder.task_id
            );
            self.reminders.delete(reminder.id).await?;
            return Ok(FiringOutcome::Orphaned);
        };

        let text = notification_text(&record.task);
        let sent = tokio::time::timeout(
            DELIVERY_TIMEOUT,
            self.delivery.send_message(reminder.user_id, &text),
        )
        .await;

        match sent {
            Ok(Ok(())) => {
                self.reminders.mark_fired(reminder.id, now).await?;
                self.reminders.delete(reminder.id).await?;
                log::info!("reminder {} delivered to user {}", reminder.id, reminder.user_id);
                Ok(FiringOutcome::Delivered)
            }
            Ok(Err(error)) => {
                log::warn!(
                    "delivery failed for reminder {}, retrying next cycle: {error}",
                    reminder.id
                );
                Ok(FiringOutcome::Retrying)
            }
            Err(_) => {
                log::warn!(
                    "delivery timed out for reminder {}, retrying next cycle",
                    reminder.id
                );
                Ok(FiringOutcome::Retrying)
            }
        }
    }
}

fn notification_text(task: &Task) -> String {
    format!("🔔 Напоминание: {}", task.title)
}

#[cfg(test)]
mod tests;
