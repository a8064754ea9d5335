use chrono::NaiveDate;

pub type TaskId = i64;

/// A task item extracted from a user message. Immutable once created;
/// identified by a [`TaskId`] only after it has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub title: String,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub task: Task,
}
