use chrono::NaiveDate;

use crate::task::{Task, TaskRecord};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn format_date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

#[derive(sqlx::FromRow)]
pub struct TaskStorageModel {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub due_date: Option<String>,
}

impl TryFrom<TaskStorageModel> for TaskRecord {
    type Error = chrono::ParseError;

    fn try_from(value: TaskStorageModel) -> Result<Self, Self::Error> {
        let due_date = value
            .due_date
            .as_deref()
            .map(|d| NaiveDate::parse_from_str(d, DATE_FORMAT))
            .transpose()?;

        Ok(Self {
            id: value.id,
            task: Task {
                title: value.title,
                due_date,
            },
        })
    }
}
