mod appsettings;
mod asr;
mod extraction;
mod pending;
mod reminder;
mod scheduling;
mod storage;
mod task;
mod telegram;

use std::sync::Arc;
use std::time::Duration;

use teloxide::Bot;
use tokio_util::sync::CancellationToken;

use crate::asr::{Transcriber, WhisperCliTranscriber};
use crate::scheduling::{FiringLoop, SchedulingEngine};
use crate::storage::sqlite::reminder_storage::SqliteReminderStorage;
use crate::storage::sqlite::task_storage::SqliteTaskStorage;
use crate::storage::{ReminderStorage, TaskStorage};
use crate::telegram::{TelegramDeliveryChannel, TelegramInteractionInterface, VoiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init_timed();

    let settings = appsettings::get();
    let pool = storage::sqlite::connect(&settings.database.url).await?;

    let reminder_storage: Arc<dyn ReminderStorage> =
        Arc::new(SqliteReminderStorage::new(pool.clone()));
    let task_storage: Arc<dyn TaskStorage> = Arc::new(SqliteTaskStorage::new(pool));

    let bot = Bot::new(settings.telegram.token.clone());
    let engine = Arc::new(SchedulingEngine::new(
        reminder_storage.clone(),
        settings.scheduler.timezone,
    ));

    let firing_loop = FiringLoop::new(
        reminder_storage,
        task_storage.clone(),
        Arc::new(TelegramDeliveryChannel::new(bot.clone())),
        Duration::from_secs(settings.scheduler.poll_interval_seconds),
    );
    let shutdown = CancellationToken::new();
    let loop_token = shutdown.child_token();
    let loop_handle = tokio::spawn(async move { firing_loop.run(loop_token).await });

    let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperCliTranscriber::new(
        settings.asr.whisper_model.clone(),
        settings.asr.language.clone(),
    ));
    let voice_config = VoiceConfig {
        audio_dir: settings.asr.audio_dir.clone(),
    };

    TelegramInteractionInterface::start(bot, engine, task_storage, transcriber, voice_config)
        .await;

    shutdown.cancel();
    loop_handle.await?;
    Ok(())
}
