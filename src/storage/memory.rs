use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::reminder::{Reminder, ReminderId, UserId};
use crate::task::{TaskId, TaskRecord};

use super::{NewReminder, NewTask, ReminderStorage, StorageError, TaskStorage};

struct InMemoryTaskStore {
    current_id: TaskId,
    tasks: BTreeMap<TaskId, (UserId, TaskRecord)>,
}

/// Map-backed [`TaskStorage`] used by tests and local experiments.
pub struct InMemoryTaskStorage {
    store: RwLock<InMemoryTaskStore>,
}

impl InMemoryTaskStorage {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(InMemoryTaskStore {
                current_id: 0,
                tasks: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryTaskStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStorage for InMemoryTaskStorage {
    async fn insert(&self, task: NewTask) -> Result<TaskRecord, StorageError> {
        let mut store = self.store.write().await;
        store.current_id += 1;
        let record = TaskRecord {
            id: store.current_id,
            task: task.task,
        };
        store
            .tasks
            .insert(record.id, (task.user_id, record.clone()));
        Ok(record)
    }

    async fn get(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> Result<Option<TaskRecord>, StorageError> {
        let store = self.store.read().await;
        Ok(store
            .tasks
            .get(&task_id)
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, record)| record.clone()))
    }

    async fn list(&self, user_id: UserId) -> Result<Vec<TaskRecord>, StorageError> {
        let store = self.store.read().await;
        Ok(store
            .tasks
            .values()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn delete(&self, task_id: TaskId) -> Result<(), StorageError> {
        self.store.write().await.tasks.remove(&task_id);
        Ok(())
    }
}

struct InMemoryReminderStore {
    current_id: ReminderId,
    reminders: BTreeMap<ReminderId, Reminder>,
}

/// Map-backed [`ReminderStorage`] used by tests and local experiments.
pub struct InMemoryReminderStorage {
    store: RwLock<InMemoryReminderStore>,
}

impl InMemoryReminderStorage {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(InMemoryReminderStore {
                current_id: 0,
                reminders: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryReminderStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReminderStorage for InMemoryReminderStorage {
    async fn insert(&self, reminder: NewReminder) -> Result<Reminder, StorageError> {
        let mut store = self.store.write().await;
        store.current_id += 1;
        let inserted = Reminder {
            id: store.current_id,
            user_id: reminder.user_id,
            task_id: reminder.task_id,
            fire_time: reminder.fire_time,
            next_fire_at: reminder.next_fire_at,
            is_active: true,
            created_at: Utc::now(),
            last_fired_at: None,
        };
        store.reminders.insert(inserted.id, inserted.clone());
        Ok(inserted)
    }

    async fn get_due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, StorageError> {
        let store = self.store.read().await;
        Ok(store
            .reminders
            .values()
            .filter(|r| r.is_active && r.next_fire_at <= now)
            .cloned()
            .collect())
    }

    async fn list_active(&self, user_id: UserId) -> Result<Vec<Reminder>, StorageError> {
        let store = self.store.read().await;
        let mut reminders: Vec<Reminder> = store
            .reminders
            .values()
            .filter(|r| r.is_active && r.user_id == user_id)
            .cloned()
            .collect();
        reminders.sort_by_key(|r| r.next_fire_at);
        Ok(reminders)
    }

    async fn mark_fired(
        &self,
        id: ReminderId,
        fired_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut store = self.store.write().await;
        if let Some(reminder) = store.reminders.get_mut(&id) {
            reminder.last_fired_at = Some(fired_at);
        }
        Ok(())
    }

    async fn delete(&self, id: ReminderId) -> Result<(), StorageError> {
        self.store.write().await.reminders.remove(&id);
        Ok(())
    }

    async fn delete_by_task(&self, user_id: UserId, task_id: TaskId) -> Result<(), StorageError> {
        self.store
            .write()
            .await
            .reminders
            .retain(|_, r| !(r.user_id == user_id && r.task_id == task_id));
        Ok(())
    }
}
