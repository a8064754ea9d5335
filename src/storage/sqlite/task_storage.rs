mod model;

use async_trait::async_trait;
use model::{TaskStorageModel, format_date};

use crate::reminder::UserId;
use crate::storage::{NewTask, StorageError, TaskStorage};
use crate::task::{TaskId, TaskRecord};

pub struct SqliteTaskStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteTaskStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStorage for SqliteTaskStorage {
    async fn insert(&self, task: NewTask) -> Result<TaskRecord, StorageError> {
        let created = sqlx::query_as::<_, TaskStorageModel>(
            "INSERT INTO tasks (user_id, title, due_date) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(task.user_id)
        .bind(&task.task.title)
        .bind(task.task.due_date.map(format_date))
        .fetch_one(&self.pool)
        .await?;

        Ok(created.try_into()?)
    }

    async fn get(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> Result<Option<TaskRecord>, StorageError> {
        let task = sqlx::query_as::<_, TaskStorageModel>(
            "SELECT * FROM tasks WHERE id = ? AND user_id = ?",
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task.map(TryInto::try_into).transpose()?)
    }

    async fn list(&self, user_id: UserId) -> Result<Vec<TaskRecord>, StorageError> {
        let tasks = sqlx::query_as::<_, TaskStorageModel>(
            "SELECT * FROM tasks WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        tasks
            .into_iter()
            .map(|t| t.try_into().map_err(StorageError::from))
            .collect()
    }

    async fn delete(&self, task_id: TaskId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
