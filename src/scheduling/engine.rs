use std::sync::Arc;

use chrono::{DateTime, LocalResult, NaiveDate, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use crate::reminder::{Reminder, ReminderFireTime, ReminderId, UserId};
use crate::storage::{NewReminder, ReminderStorage, StorageError};
use crate::task::TaskId;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid reminder time {0:?}, expected HH:MM")]
    InvalidTime(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Computes when a reminder for the given wall-clock time fires next.
///
/// The candidate is today at `fire_time` in `tz`; if that instant is at or
/// before local now it rolls forward by one civil day. Civil-day addition
/// keeps the wall-clock time across DST transitions, so the result is
/// strictly in the future and at most ~24h (plus the DST shift) away.
pub fn compute_next_fire_at(fire_time: &ReminderFireTime, now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local_now = now.with_timezone(&tz);
    let today = local_now.date_naive();

    let same_day = resolve_local(today, fire_time, tz).filter(|candidate| *candidate > local_now);
    let candidate = same_day.unwrap_or_else(|| {
        let mut date = today;
        loop {
            date = date.succ_opt().expect("Not realistic to overflow");
            if let Some(candidate) = resolve_local(date, fire_time, tz) {
                break candidate;
            }
        }
    });

    candidate.with_timezone(&Utc)
}

fn resolve_local(date: NaiveDate, fire_time: &ReminderFireTime, tz: Tz) -> Option<DateTime<Tz>> {
    let naive = date.and_time(*fire_time.time());
    match naive.and_local_timezone(tz) {
        LocalResult::Single(candidate) => Some(candidate),
        // Fall-back transition repeats the wall-clock hour; take the first hit.
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        // Spring-forward gap: the wall clock skips this time entirely, land
        // just past the transition instead (gaps are one hour in practice).
        LocalResult::None => (naive + chrono::Duration::hours(1))
            .and_local_timezone(tz)
            .single(),
    }
}

/// Create/list/cancel operations over the reminder store, with next-fire
/// computation in the configured timezone.
pub struct SchedulingEngine {
    reminders: Arc<dyn ReminderStorage>,
    timezone: Tz,
}

impl SchedulingEngine {
    pub fn new(reminders: Arc<dyn ReminderStorage>, timezone: Tz) -> Self {
        Self {
            reminders,
            timezone,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Persists a new active reminder. Does not check that `task_id`
    /// exists; an orphaned reminder is purged by the firing loop instead.
    pub async fn schedule_reminder(
        &self,
        user_id: UserId,
        task_id: TaskId,
        hhmm: &str,
    ) -> Result<Reminder, ScheduleError> {
        self.schedule_reminder_at(user_id, task_id, hhmm, Utc::now())
            .await
    }

    pub(crate) async fn schedule_reminder_at(
        &self,
        user_id: UserId,
        task_id: TaskId,
        hhmm: &str,
        now: DateTime<Utc>,
    ) -> Result<Reminder, ScheduleError> {
        let fire_time = ReminderFireTime::parse(hhmm)
            .map_err(|_| ScheduleError::InvalidTime(hhmm.to_owned()))?;
        let next_fire_at = compute_next_fire_at(&fire_time, now, self.timezone);

        let reminder = self
            .reminders
            .insert(NewReminder {
                user_id,
                task_id,
                fire_time,
                next_fire_at,
            })
            .await?;

        log::info!(
            "scheduled reminder {} for task {} of user {}, next fire at {}",
            reminder.id,
            task_id,
            user_id,
            next_fire_at
        );

        Ok(reminder)
    }

    pub async fn list_active_reminders(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Reminder>, ScheduleError> {
        Ok(self.reminders.list_active(user_id).await?)
    }

    /// Idempotent; cancelling an unknown id is a no-op.
    pub async fn cancel_reminder(&self, id: ReminderId) -> Result<(), ScheduleError> {
        self.reminders.delete(id).await?;
        Ok(())
    }

    pub async fn cancel_all_for_task(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> Result<(), ScheduleError> {
        self.reminders.delete_by_task(user_id, task_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
