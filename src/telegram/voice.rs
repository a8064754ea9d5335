use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dptree::case;
use teloxide::dispatching::UpdateHandler;
use teloxide::dispatching::dialogue::GetChatId;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use uuid::Uuid;

use crate::asr::Transcriber;
use crate::scheduling::SchedulingEngine;
use crate::storage::TaskStorage;

use super::{GlobalState, HandlerResult, PendingTranscripts, messages, tasks, user_id};

/// How long a transcript waits for the user to confirm task creation.
pub(super) const TRANSCRIPT_TTL: Duration = Duration::from_secs(600);
const CONFIRM_DATA: &str = "voice_confirm";

#[derive(Clone)]
pub struct VoiceConfig {
    pub audio_dir: PathBuf,
}

async fn handle_voice(
    bot: Bot,
    transcriber: Arc<dyn Transcriber>,
    config: VoiceConfig,
    pending: Arc<PendingTranscripts>,
    msg: Message,
) -> HandlerResult {
    let Some(voice) = msg.voice() else {
        return Ok(());
    };

    bot.send_message(msg.chat.id, messages::VOICE_PROCESSING)
        .await?;

    tokio::fs::create_dir_all(&config.audio_dir).await?;
    let ogg_path = config.audio_dir.join(format!("{}.ogg", Uuid::new_v4()));

    let file = bot.get_file(voice.file.id.clone()).await?;
    let mut destination = tokio::fs::File::create(&ogg_path).await?;
    bot.download_file(&file.path, &mut destination).await?;

    let transcription = transcriber.transcribe(&ogg_path).await;
    cleanup_artifacts(&ogg_path).await;

    let transcript = match transcription {
        Ok(transcript) if !transcript.is_empty() => transcript,
        Ok(_) => {
            bot.send_message(msg.chat.id, messages::VOICE_FAILED).await?;
            return Ok(());
        }
        Err(error) => {
            log::warn!("transcription failed: {error:#}");
            bot.send_message(msg.chat.id, messages::VOICE_FAILED).await?;
            return Ok(());
        }
    };

    let confirm_button =
        InlineKeyboardButton::callback(messages::VOICE_CONFIRM_BUTTON, CONFIRM_DATA);
    bot.send_message(msg.chat.id, format!("📝 Я услышал:\n{transcript}"))
        .reply_markup(InlineKeyboardMarkup::new(vec![vec![confirm_button]]))
        .await?;

    // Parked until the user confirms; evicted after TRANSCRIPT_TTL.
    pending.insert(user_id(msg.chat.id), transcript).await;

    Ok(())
}

/// Removes the downloaded note and the wav/txt siblings the transcriber
/// leaves next to it.
async fn cleanup_artifacts(ogg_path: &Path) {
    for path in [
        ogg_path.to_path_buf(),
        ogg_path.with_extension("wav"),
        ogg_path.with_extension("txt"),
    ] {
        if let Err(error) = tokio::fs::remove_file(&path).await {
            if error.kind() != std::io::ErrorKind::NotFound {
                log::warn!("failed to remove {}: {error}", path.display());
            }
        }
    }
}

async fn confirm_transcript(
    bot: Bot,
    engine: Arc<SchedulingEngine>,
    storage: Arc<dyn TaskStorage>,
    pending: Arc<PendingTranscripts>,
    query: CallbackQuery,
) -> HandlerResult {
    let chat_id = query.chat_id();
    bot.answer_callback_query(query.id).await?;
    let Some(chat_id) = chat_id else {
        return Ok(());
    };

    match pending.take(&user_id(chat_id)).await {
        Some(transcript) => {
            tasks::create_tasks_from_text(&bot, &engine, &storage, chat_id, &transcript).await?;
        }
        None => {
            bot.send_message(chat_id, messages::VOICE_EXPIRED).await?;
        }
    }

    Ok(())
}

pub(super) fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(
            case![GlobalState::Idle].branch(
                Update::filter_message()
                    .filter(|msg: Message| msg.voice().is_some())
                    .endpoint(handle_voice),
            ),
        )
        .branch(
            case![GlobalState::Idle].branch(
                Update::filter_callback_query()
                    .filter(|query: CallbackQuery| query.data.as_deref() == Some(CONFIRM_DATA))
                    .endpoint(confirm_transcript),
            ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cleanup_removes_every_transcription_artifact() {
        let dir = std::env::temp_dir().join(format!("napomni-voice-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let ogg = dir.join("note.ogg");
        for path in [
            ogg.clone(),
            ogg.with_extension("wav"),
            ogg.with_extension("txt"),
        ] {
            tokio::fs::write(&path, b"x").await.unwrap();
        }

        cleanup_artifacts(&ogg).await;

        for extension in ["ogg", "wav", "txt"] {
            assert!(!ogg.with_extension(extension).exists());
        }
        tokio::fs::remove_dir(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn cleanup_tolerates_missing_artifacts() {
        let ogg = std::env::temp_dir().join(format!("napomni-missing-{}.ogg", Uuid::new_v4()));
        cleanup_artifacts(&ogg).await;
    }
}
