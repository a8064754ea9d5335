use std::sync::Arc;

use chrono::Utc;
use dptree::case;
use teloxide::dispatching::UpdateHandler;
use teloxide::dispatching::dialogue::GetChatId;
use teloxide::payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::extraction::extract_tasks;
use crate::scheduling::SchedulingEngine;
use crate::storage::{NewTask, TaskStorage};

use super::{GlobalCommand, GlobalState, HandlerResult, messages, user_id};

const DELETE_PREFIX: &str = "task_del:";

/// Every plain text message is treated as a task list to capture; there is
/// no separate "add task" command, matching the original bot.
async fn handle_text(
    bot: Bot,
    engine: Arc<SchedulingEngine>,
    storage: Arc<dyn TaskStorage>,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    create_tasks_from_text(&bot, &engine, &storage, msg.chat.id, text).await
}

pub(super) async fn create_tasks_from_text(
    bot: &Bot,
    engine: &SchedulingEngine,
    storage: &Arc<dyn TaskStorage>,
    chat_id: ChatId,
    text: &str,
) -> HandlerResult {
    let today = Utc::now().with_timezone(&engine.timezone()).date_naive();
    let tasks = extract_tasks(text, today);

    if tasks.is_empty() {
        bot.send_message(chat_id, messages::NO_TASKS_FOUND).await?;
        return Ok(());
    }

    let mut lines = vec![messages::TASKS_HEADER.to_owned()];
    for (index, task) in tasks.into_iter().enumerate() {
        let record = storage
            .insert(NewTask {
                user_id: user_id(chat_id),
                task,
            })
            .await?;

        let date = record
            .task
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| messages::NO_DUE_DATE.to_owned());
        lines.push(format!("{}. {} — {}", index + 1, record.task.title, date));
    }

    bot.send_message(chat_id, lines.join("\n")).await?;
    Ok(())
}

async fn build_task_list(
    storage: &Arc<dyn TaskStorage>,
    chat_id: ChatId,
) -> Result<(String, Option<InlineKeyboardMarkup>), anyhow::Error> {
    let records = storage.list(user_id(chat_id)).await?;
    if records.is_empty() {
        return Ok((messages::TASK_LIST_EMPTY.to_owned(), None));
    }

    let mut lines = vec![messages::TASKS_HEADER.to_owned()];
    let mut buttons = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let date = record
            .task
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| messages::NO_DUE_DATE.to_owned());
        lines.push(format!("{}. {} — {}", index + 1, record.task.title, date));
        buttons.push(vec![InlineKeyboardButton::callback(
            format!("🗑 {}", index + 1),
            format!("{DELETE_PREFIX}{}", record.id),
        )]);
    }

    Ok((lines.join("\n"), Some(InlineKeyboardMarkup::new(buttons))))
}

async fn list_tasks_command(
    bot: Bot,
    storage: Arc<dyn TaskStorage>,
    msg: Message,
) -> HandlerResult {
    let (text, markup) = build_task_list(&storage, msg.chat.id).await?;
    let mut request = bot.send_message(msg.chat.id, text);
    if let Some(markup) = markup {
        request = request.reply_markup(markup);
    }
    request.await?;
    Ok(())
}

/// Deleting a task also cancels its reminders; otherwise they would linger
/// as orphans until the firing loop purges them.
async fn delete_task_callback(
    bot: Bot,
    engine: Arc<SchedulingEngine>,
    storage: Arc<dyn TaskStorage>,
    query: CallbackQuery,
) -> HandlerResult {
    let (Some(chat_id), Some(task_id)) = (
        query.chat_id(),
        super::callback_id(&query, DELETE_PREFIX),
    ) else {
        bot.answer_callback_query(query.id).await?;
        return Ok(());
    };

    let owner = user_id(chat_id);
    if storage.get(owner, task_id).await?.is_some() {
        storage.delete(task_id).await?;
        engine.cancel_all_for_task(owner, task_id).await?;
    }

    if let Some(message) = query.regular_message() {
        let (text, markup) = build_task_list(&storage, chat_id).await?;
        let mut request = bot.edit_message_text(chat_id, message.id, text);
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        request.await?;
    }

    bot.answer_callback_query(query.id)
        .text(messages::TASK_DELETED)
        .await?;
    Ok(())
}

pub(super) fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(
            case![GlobalState::Idle].branch(
                Update::filter_message()
                    .branch(
                        teloxide::filter_command::<GlobalCommand, _>()
                            .branch(case![GlobalCommand::Tasks].endpoint(list_tasks_command)),
                    )
                    .branch(
                        dptree::filter(|msg: Message| msg.text().is_some())
                            .endpoint(handle_text),
                    ),
            ),
        )
        .branch(
            case![GlobalState::Idle].branch(
                Update::filter_callback_query()
                    .filter(|query: CallbackQuery| {
                        super::callback_data_has_prefix(&query, DELETE_PREFIX)
                    })
                    .endpoint(delete_task_callback),
            ),
        )
}
