use std::sync::Arc;

use chrono::{Duration, Utc};
use dptree::case;
use teloxide::dispatching::UpdateHandler;
use teloxide::dispatching::dialogue::GetChatId;
use teloxide::payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::scheduling::SchedulingEngine;
use crate::storage::TaskStorage;

use super::{GlobalCommand, GlobalState, HandlerResult, messages, user_id};

const DELETE_PREFIX: &str = "remind_del:";

fn format_remaining(delta: Duration) -> String {
    let total_seconds = delta.num_seconds();
    if total_seconds <= 0 {
        let overdue = total_seconds.unsigned_abs();
        if overdue < 60 {
            return "просрочено на <1 мин".to_owned();
        }
        return format!("просрочено на {} мин", overdue / 60);
    }

    let minutes = total_seconds / 60;
    let (hours, minutes) = (minutes / 60, minutes % 60);
    let (days, hours) = (hours / 24, hours % 24);

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days} д"));
    }
    if hours > 0 {
        parts.push(format!("{hours} ч"));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!("{minutes} мин"));
    }
    parts.join(" ")
}

async fn build_reminders_list(
    engine: &SchedulingEngine,
    storage: &Arc<dyn TaskStorage>,
    chat_id: ChatId,
) -> Result<(String, Option<InlineKeyboardMarkup>), anyhow::Error> {
    let owner = user_id(chat_id);
    let reminders = engine.list_active_reminders(owner).await?;
    if reminders.is_empty() {
        return Ok((messages::REMIND_LIST_EMPTY.to_owned(), None));
    }

    let now = Utc::now();
    let mut lines = vec![messages::REMIND_LIST_HEADER.to_owned()];
    let mut buttons = Vec::new();
    for (index, reminder) in reminders.iter().enumerate() {
        let title = match storage.get(owner, reminder.task_id).await? {
            Some(record) => record.task.title,
            None => messages::TASK_TITLE_MISSING.to_owned(),
        };

        let local = reminder.next_fire_at.with_timezone(&engine.timezone());
        lines.push(format!(
            "- {} в {} (через {}, {})",
            title,
            reminder.fire_time.to_hhmm(),
            format_remaining(reminder.next_fire_at - now),
            local.format("%Y-%m-%d %H:%M %Z"),
        ));
        buttons.push(vec![InlineKeyboardButton::callback(
            format!("🗑 {}", index + 1),
            format!("{DELETE_PREFIX}{}", reminder.id),
        )]);
    }

    Ok((lines.join("\n"), Some(InlineKeyboardMarkup::new(buttons))))
}

async fn list_reminders(
    bot: Bot,
    engine: Arc<SchedulingEngine>,
    storage: Arc<dyn TaskStorage>,
    msg: Message,
) -> HandlerResult {
    let (text, markup) = build_reminders_list(&engine, &storage, msg.chat.id).await?;
    let mut request = bot.send_message(msg.chat.id, text);
    if let Some(markup) = markup {
        request = request.reply_markup(markup);
    }
    request.await?;
    Ok(())
}

async fn delete_reminder_callback(
    bot: Bot,
    engine: Arc<SchedulingEngine>,
    storage: Arc<dyn TaskStorage>,
    query: CallbackQuery,
) -> HandlerResult {
    let (Some(chat_id), Some(reminder_id)) = (
        query.chat_id(),
        super::callback_id(&query, DELETE_PREFIX),
    ) else {
        bot.answer_callback_query(query.id).await?;
        return Ok(());
    };

    engine.cancel_reminder(reminder_id).await?;

    if let Some(message) = query.regular_message() {
        let (text, markup) = build_reminders_list(&engine, &storage, chat_id).await?;
        let mut request = bot.edit_message_text(chat_id, message.id, text);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        request.await?;
    }

    bot.answer_callback_query(query.id)
        .text(messages::REMIND_DELETED)
        .await?;
    Ok(())
}

pub(super) fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(
            case![GlobalState::Idle].branch(
                Update::filter_message().branch(
                    teloxide::filter_command::<GlobalCommand, _>()
                        .branch(case![GlobalCommand::Reminders].endpoint(list_reminders)),
                ),
            ),
        )
        .branch(
            case![GlobalState::Idle].branch(
                Update::filter_callback_query()
                    .filter(|query: CallbackQuery| {
                        super::callback_data_has_prefix(&query, DELETE_PREFIX)
                    })
                    .endpoint(delete_reminder_callback),
            ),
        )
}

#[cfg(test)]
mod tests {
    use super::format_remaining;
    use chrono::Duration;

    #[test]
    fn remaining_breaks_into_days_hours_minutes() {
        assert_eq!(format_remaining(Duration::minutes(5)), "5 мин");
        assert_eq!(format_remaining(Duration::minutes(125)), "2 ч 5 мин");
        assert_eq!(
            format_remaining(Duration::days(1) + Duration::hours(3)),
            "1 д 3 ч"
        );
        assert_eq!(format_remaining(Duration::seconds(30)), "0 мин");
    }

    #[test]
    fn overdue_is_reported_in_minutes() {
        assert_eq!(format_remaining(Duration::seconds(-30)), "просрочено на <1 мин");
        assert_eq!(format_remaining(Duration::minutes(-5)), "просрочено на 5 мин");
    }
}
