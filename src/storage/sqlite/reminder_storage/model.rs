use chrono::{DateTime, SecondsFormat, Utc};

use crate::reminder::{Reminder, ReminderFireTime};

/// Stored timestamp form, second precision. A single fixed format keeps
/// the `next_fire_at <= ?` comparison valid as plain text ordering.
pub(crate) fn format_utc(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_utc(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

#[derive(sqlx::FromRow)]
pub struct ReminderStorageModel {
    pub id: i64,
    pub user_id: i64,
    pub task_id: i64,
    pub time_hhmm: String,
    pub next_fire_at: String,
    pub is_active: i64,
    pub created_at: String,
    pub last_fired_at: Option<String>,
}

impl TryFrom<ReminderStorageModel> for Reminder {
    type Error = chrono::ParseError;

    fn try_from(value: ReminderStorageModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            user_id: value.user_id,
            task_id: value.task_id,
            fire_time: ReminderFireTime::parse(&value.time_hhmm)?,
            next_fire_at: parse_utc(&value.next_fire_at)?,
            is_active: value.is_active != 0,
            created_at: parse_utc(&value.created_at)?,
            last_fired_at: value.last_fired_at.as_deref().map(parse_utc).transpose()?,
        })
    }
}
