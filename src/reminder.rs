use chrono::{DateTime, NaiveTime, Timelike, Utc};

use crate::task::TaskId;

pub type ReminderId = i64;
pub type UserId = i64;

/// Wall-clock firing time of a reminder, minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderFireTime(NaiveTime);

impl ReminderFireTime {
    pub fn new(inner: NaiveTime) -> Self {
        let normalized_time = inner
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .expect("Will never fail.");
        Self(normalized_time)
    }

    /// Parses the `HH:MM` form users type in chat.
    pub fn parse(value: &str) -> Result<Self, chrono::ParseError> {
        NaiveTime::parse_from_str(value, "%H:%M").map(Self::new)
    }

    pub fn time(&self) -> &NaiveTime {
        &self.0
    }

    pub fn to_hhmm(&self) -> String {
        self.0.format("%H:%M").to_string()
    }
}

/// A scheduled notification for a task. References the task by id but does
/// not own it; the task may be deleted independently, in which case the
/// reminder is purged at fire time instead of being delivered.
///
/// `next_fire_at` is always UTC, regardless of the timezone it was
/// computed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: ReminderId,
    pub user_id: UserId,
    pub task_id: TaskId,
    pub fire_time: ReminderFireTime,
    pub next_fire_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_fired_at: Option<DateTime<Utc>>,
}
