mod model;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{ReminderStorageModel, format_utc};

use crate::reminder::{Reminder, ReminderId, UserId};
use crate::storage::{NewReminder, ReminderStorage, StorageError};
use crate::task::TaskId;

pub struct SqliteReminderStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteReminderStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderStorage for SqliteReminderStorage {
    async fn insert(&self, reminder: NewReminder) -> Result<Reminder, StorageError> {
        let NewReminder {
            user_id,
            task_id,
            fire_time,
            next_fire_at,
        } = reminder;
        let created_at = format_utc(Utc::now());

        let created = sqlx::query_as::<_, ReminderStorageModel>(
            "INSERT INTO reminders (user_id, task_id, time_hhmm, next_fire_at, is_active, created_at, last_fired_at)
             VALUES (?, ?, ?, ?, 1, ?, NULL) RETURNING *",
        )
        .bind(user_id)
        .bind(task_id)
        .bind(fire_time.to_hhmm())
        .bind(format_utc(next_fire_at))
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created.try_into()?)
    }

    async fn get_due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, StorageError> {
        let reminders = sqlx::query_as::<_, ReminderStorageModel>(
            "SELECT * FROM reminders WHERE is_active = 1 AND next_fire_at <= ?",
        )
        .bind(format_utc(now))
        .fetch_all(&self.pool)
        .await?;

        reminders
            .into_iter()
            .map(|r| r.try_into().map_err(StorageError::from))
            .collect()
    }

    async fn list_active(&self, user_id: UserId) -> Result<Vec<Reminder>, StorageError> {
        let reminders = sqlx::query_as::<_, ReminderStorageModel>(
            "SELECT * FROM reminders
             WHERE user_id = ? AND is_active = 1
             ORDER BY next_fire_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        reminders
            .into_iter()
            .map(|r| r.try_into().map_err(StorageError::from))
            .collect()
    }

    async fn mark_fired(
        &self,
        id: ReminderId,
        fired_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query("UPDATE reminders SET last_fired_at = ? WHERE id = ?")
            .bind(format_utc(fired_at))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: ReminderId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM reminders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_by_task(&self, user_id: UserId, task_id: TaskId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM reminders WHERE user_id = ? AND task_id = ?")
            .bind(user_id)
            .bind(task_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
