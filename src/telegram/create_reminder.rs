use std::sync::Arc;
use std::sync::OnceLock;

use dptree::case;
use regex::Regex;
use teloxide::dispatching::UpdateHandler;
use teloxide::dispatching::dialogue::GetChatId;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::scheduling::{ScheduleError, SchedulingEngine};
use crate::storage::TaskStorage;
use crate::task::TaskId;

use super::{GlobalCommand, GlobalDialogue, GlobalState, HandlerResult, messages, user_id};

const CHOOSE_PREFIX: &str = "remind_task:";
const TITLE_LIMIT: usize = 40;

/// Strict `HH:MM`, two digits each; range checking is the engine's job.
fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{2}:\d{2}$").expect("Will never fail."))
}

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub(super) enum CreateReminderState {
    #[default]
    Start,
    WaitingForTaskChoice,
    WaitingForFiringTime {
        task_id: TaskId,
    },
}

fn shorten(title: &str) -> String {
    if title.chars().count() <= TITLE_LIMIT {
        return title.to_owned();
    }
    let cut: String = title.chars().take(TITLE_LIMIT - 3).collect();
    format!("{cut}...")
}

async fn remind_start(
    bot: Bot,
    dialogue: GlobalDialogue,
    storage: Arc<dyn TaskStorage>,
    msg: Message,
) -> HandlerResult {
    let records = storage.list(user_id(msg.chat.id)).await?;
    if records.is_empty() {
        bot.send_message(msg.chat.id, messages::REMIND_NO_TASKS)
            .await?;
        return Ok(());
    }

    let buttons: Vec<Vec<InlineKeyboardButton>> = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            vec![InlineKeyboardButton::callback(
                format!("{}. {}", index + 1, shorten(&record.task.title)),
                format!("{CHOOSE_PREFIX}{}", record.id),
            )]
        })
        .collect();

    bot.send_message(msg.chat.id, messages::REMIND_CHOOSE_TASK)
        .reply_markup(InlineKeyboardMarkup::new(buttons))
        .await?;

    dialogue
        .update(GlobalState::CreatingReminder(
            CreateReminderState::WaitingForTaskChoice,
        ))
        .await?;

    Ok(())
}

async fn choose_task(
    bot: Bot,
    dialogue: GlobalDialogue,
    query: CallbackQuery,
) -> HandlerResult {
    let Some(task_id) = super::callback_id(&query, CHOOSE_PREFIX) else {
        bot.answer_callback_query(query.id).await?;
        return Ok(());
    };

    dialogue
        .update(GlobalState::CreatingReminder(
            CreateReminderState::WaitingForFiringTime { task_id },
        ))
        .await?;

    if let Some(chat_id) = query.chat_id() {
        bot.send_message(chat_id, messages::REMIND_ASK_TIME).await?;
    }
    bot.answer_callback_query(query.id).await?;

    Ok(())
}

async fn receive_firing_time(
    bot: Bot,
    dialogue: GlobalDialogue,
    engine: Arc<SchedulingEngine>,
    task_id: TaskId,
    msg: Message,
) -> HandlerResult {
    let value = msg.text().map(str::trim).unwrap_or_default();
    if !time_pattern().is_match(value) {
        bot.send_message(msg.chat.id, messages::REMIND_BAD_TIME)
            .await?;
        return Ok(());
    }

    match engine
        .schedule_reminder(user_id(msg.chat.id), task_id, value)
        .await
    {
        Ok(reminder) => {
            let local_fire = reminder.next_fire_at.with_timezone(&engine.timezone());
            bot.send_message(
                msg.chat.id,
                format!(
                    "Готово! Напомню в {} ({})",
                    reminder.fire_time.to_hhmm(),
                    local_fire.format("%Y-%m-%d %H:%M %Z")
                ),
            )
            .await?;
            dialogue.exit().await?;
        }
        Err(ScheduleError::InvalidTime(_)) => {
            bot.send_message(msg.chat.id, messages::REMIND_BAD_TIME)
                .await?;
        }
        Err(error) => return Err(error.into()),
    }

    Ok(())
}

pub(super) fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    teloxide::filter_command::<GlobalCommand, _>().branch(
                        case![GlobalState::Idle]
                            .branch(case![GlobalCommand::Remind].endpoint(remind_start)),
                    ),
                )
                .branch(
                    case![GlobalState::CreatingReminder(x)].branch(
                        case![CreateReminderState::WaitingForFiringTime { task_id }]
                            .endpoint(receive_firing_time),
                    ),
                ),
        )
        .branch(
            Update::filter_callback_query().branch(
                case![GlobalState::CreatingReminder(x)].branch(
                    case![CreateReminderState::WaitingForTaskChoice].endpoint(choose_task),
                ),
            ),
        )
}
