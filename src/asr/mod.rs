use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;

/// External speech model behind a narrow interface; the rest of the system
/// only ever sees the transcript text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> anyhow::Result<String>;
}

/// Shells out to `ffmpeg` for OGG → 16 kHz mono WAV conversion and to the
/// `whisper` CLI for the actual transcription.
pub struct WhisperCliTranscriber {
    model: String,
    language: String,
}

impl WhisperCliTranscriber {
    pub fn new(model: String, language: String) -> Self {
        Self { model, language }
    }

    async fn ogg_to_wav(&self, ogg_path: &Path) -> anyhow::Result<PathBuf> {
        let wav_path = ogg_path.with_extension("wav");
        let status = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(ogg_path)
            .args(["-ar", "16000", "-ac", "1"])
            .arg(&wav_path)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .context("failed to spawn ffmpeg")?;

        anyhow::ensure!(status.success(), "ffmpeg exited with {status}");
        Ok(wav_path)
    }
}

#[async_trait]
impl Transcriber for WhisperCliTranscriber {
    async fn transcribe(&self, audio: &Path) -> anyhow::Result<String> {
        let wav_path = self.ogg_to_wav(audio).await?;
        let output_dir = wav_path
            .parent()
            .context("audio path has no parent directory")?;

        let status = Command::new("whisper")
            .arg(&wav_path)
            .args(["--model", &self.model])
            .args(["--language", &self.language])
            .args(["--output_format", "txt"])
            .arg("--output_dir")
            .arg(output_dir)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .context("failed to spawn whisper")?;

        anyhow::ensure!(status.success(), "whisper exited with {status}");

        let transcript_path = wav_path.with_extension("txt");
        let transcript = tokio::fs::read_to_string(&transcript_path)
            .await
            .with_context(|| format!("missing transcript {}", transcript_path.display()))?;

        Ok(transcript.trim().to_owned())
    }
}
