mod memory;
pub mod sqlite;

pub use memory::{InMemoryReminderStorage, InMemoryTaskStorage};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::reminder::{Reminder, ReminderFireTime, ReminderId, UserId};
use crate::task::{Task, TaskId, TaskRecord};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("corrupt value in storage: {0}")]
    Corrupt(#[from] chrono::ParseError),
}

pub struct NewTask {
    pub user_id: UserId,
    pub task: Task,
}

pub struct NewReminder {
    pub user_id: UserId,
    pub task_id: TaskId,
    pub fire_time: ReminderFireTime,
    pub next_fire_at: DateTime<Utc>,
}

#[async_trait]
pub trait TaskStorage: Send + Sync {
    async fn insert(&self, task: NewTask) -> Result<TaskRecord, StorageError>;

    /// Scoped to the owner; a task id belonging to another user is absent.
    async fn get(&self, user_id: UserId, task_id: TaskId)
    -> Result<Option<TaskRecord>, StorageError>;

    async fn list(&self, user_id: UserId) -> Result<Vec<TaskRecord>, StorageError>;

    /// Deleting a nonexistent task is a no-op.
    async fn delete(&self, task_id: TaskId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait ReminderStorage: Send + Sync {
    async fn insert(&self, reminder: NewReminder) -> Result<Reminder, StorageError>;

    /// Active reminders with `next_fire_at` at or before `now`, any user.
    async fn get_due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, StorageError>;

    /// Active reminders of one user, ascending by `next_fire_at`.
    async fn list_active(&self, user_id: UserId) -> Result<Vec<Reminder>, StorageError>;

    async fn mark_fired(
        &self,
        id: ReminderId,
        fired_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Deleting a nonexistent reminder is a no-op.
    async fn delete(&self, id: ReminderId) -> Result<(), StorageError>;

    async fn delete_by_task(&self, user_id: UserId, task_id: TaskId) -> Result<(), StorageError>;
}
