mod create_reminder;
mod delivery;
mod list_reminders;
pub mod messages;
mod tasks;
mod voice;

pub use delivery::TelegramDeliveryChannel;
pub use voice::VoiceConfig;

use std::sync::Arc;

use create_reminder::CreateReminderState;
use dptree::case;
use teloxide::{
    dispatching::dialogue, dispatching::dialogue::InMemStorage, macros::BotCommands, prelude::*,
};

use crate::asr::Transcriber;
use crate::pending::ExpiringMap;
use crate::reminder::UserId;
use crate::scheduling::SchedulingEngine;
use crate::storage::TaskStorage;

type GlobalDialogue = Dialogue<GlobalState, InMemStorage<GlobalState>>;
type HandlerResult = anyhow::Result<()>;
pub type PendingTranscripts = ExpiringMap<UserId, String>;

#[derive(Default, Clone, Debug, PartialEq, Eq)]
enum GlobalState {
    #[default]
    Idle,
    CreatingReminder(CreateReminderState),
}

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum GlobalCommand {
    Start,
    Tasks,
    Remind,
    Reminders,
    Cancel,
}

pub struct TelegramInteractionInterface;

impl TelegramInteractionInterface {
    pub async fn start(
        bot: Bot,
        engine: Arc<SchedulingEngine>,
        task_storage: Arc<dyn TaskStorage>,
        transcriber: Arc<dyn Transcriber>,
        voice_config: VoiceConfig,
    ) {
        log::info!("Starting Telegram interaction interface");

        let pending_transcripts: Arc<PendingTranscripts> =
            Arc::new(ExpiringMap::new(voice::TRANSCRIPT_TTL));

        let command_handler = Update::filter_message().branch(
            teloxide::filter_command::<GlobalCommand, _>()
                .branch(case![GlobalCommand::Start].endpoint(start_command))
                .branch(case![GlobalCommand::Cancel].endpoint(cancel)),
        );

        let invalid_callback_handler =
            Update::filter_callback_query().branch(dptree::endpoint(invalid_query));

        let schema = dialogue::enter::<Update, InMemStorage<GlobalState>, GlobalState, _>()
            .branch(command_handler)
            .branch(create_reminder::schema())
            .branch(list_reminders::schema())
            .branch(voice::schema())
            // Free-text task capture is the fallthrough for plain messages.
            .branch(tasks::schema())
            .branch(invalid_callback_handler);

        Dispatcher::builder(bot, schema)
            .dependencies(dptree::deps![
                InMemStorage::<GlobalState>::new(),
                engine,
                task_storage,
                transcriber,
                voice_config,
                pending_transcripts
            ])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await
    }
}

/// The chat id doubles as the user identifier; this is a private-chat bot,
/// and the firing loop delivers to the same id.
fn user_id(chat_id: ChatId) -> UserId {
    chat_id.0
}

fn callback_data_has_prefix(query: &CallbackQuery, prefix: &str) -> bool {
    query
        .data
        .as_deref()
        .is_some_and(|data| data.starts_with(prefix))
}

/// Extracts the numeric id from callback data of the form `<prefix><id>`.
fn callback_id(query: &CallbackQuery, prefix: &str) -> Option<i64> {
    query
        .data
        .as_deref()
        .and_then(|data| data.strip_prefix(prefix))
        .and_then(|id| id.parse().ok())
}

async fn start_command(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, messages::GREETING).await?;
    Ok(())
}

async fn cancel(bot: Bot, dialogue: GlobalDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, messages::CANCELLED).await?;
    dialogue.exit().await?;
    Ok(())
}

async fn invalid_query(bot: Bot, dialogue: GlobalDialogue, query: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(query.id).await?;
    bot.send_message(dialogue.chat_id(), messages::INVALID_QUERY)
        .await?;
    Ok(())
}
