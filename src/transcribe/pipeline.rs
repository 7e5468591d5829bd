use super::TranscribeError;
use crate::config::TranscriptionConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info};

/// Shape of the recognizer's stdout
#[derive(Debug, Deserialize)]
struct RecognizerOutput {
    #[serde(default)]
    text: String,
}

/// Runs the transcode + recognize pipeline for one question at a time,
/// bounded by a semaphore so concurrent transcribe requests cannot fork
/// an unbounded number of child processes.
pub struct Transcriber {
    config: TranscriptionConfig,
    permits: Semaphore,
}

impl Transcriber {
    pub fn new(config: TranscriptionConfig) -> Self {
        let permits = Semaphore::new(config.max_concurrent.max(1));
        Self { config, permits }
    }

    /// Transcribe one recorded artifact.
    ///
    /// Extracts a mono 16 kHz waveform next to the artifact, then runs
    /// the recognizer against it. Nothing is cached: calling this again
    /// re-runs both tools and overwrites the waveform extract.
    pub async fn transcribe(
        &self,
        artifact: &Path,
        waveform: &Path,
    ) -> Result<String, TranscribeError> {
        if !artifact.exists() {
            return Err(TranscribeError::MissingArtifact(artifact.to_path_buf()));
        }

        let _permit = self.permits.acquire().await.map_err(|_| {
            TranscribeError::Io(std::io::Error::other("transcription pool closed"))
        })?;

        self.extract_waveform(artifact, waveform).await?;
        self.recognize(waveform).await
    }

    /// Transcoder step: `<transcoder> -y -i <in> -ar 16000 -ac 1 <out>`
    async fn extract_waveform(
        &self,
        artifact: &Path,
        waveform: &Path,
    ) -> Result<(), TranscribeError> {
        debug!(
            "Extracting waveform: {} -> {}",
            artifact.display(),
            waveform.display()
        );

        let mut cmd = Command::new(&self.config.transcoder_path);
        cmd.arg("-y")
            .arg("-i")
            .arg(artifact)
            .arg("-ar")
            .arg("16000")
            .arg("-ac")
            .arg("1")
            .arg(waveform);

        self.run_tool("transcoder", cmd).await?;
        Ok(())
    }

    /// Recognizer step: `<recognizer> -i <wav> -m <model dir>`
    async fn recognize(&self, waveform: &Path) -> Result<String, TranscribeError> {
        let mut cmd = Command::new(&self.config.recognizer_path);
        cmd.arg("-i")
            .arg(waveform)
            .arg("-m")
            .arg(&self.config.model_dir);

        let stdout = self.run_tool("recognizer", cmd).await?;

        let parsed: RecognizerOutput =
            serde_json::from_slice(&stdout).map_err(|e| TranscribeError::Tool {
                tool: "recognizer".to_string(),
                detail: format!(
                    "unparsable output ({}): {}",
                    e,
                    String::from_utf8_lossy(&stdout)
                ),
            })?;

        info!("Recognized {} characters", parsed.text.len());
        Ok(parsed.text)
    }

    /// Run one external tool to completion, capped at the configured
    /// timeout. The child is killed if the timeout fires.
    async fn run_tool(&self, tool: &str, mut cmd: Command) -> Result<Vec<u8>, TranscribeError> {
        let secs = self.config.step_timeout_secs;
        cmd.kill_on_drop(true);

        let output = match timeout(Duration::from_secs(secs), cmd.output()).await {
            Err(_) => {
                return Err(TranscribeError::TimedOut {
                    tool: tool.to_string(),
                    secs,
                })
            }
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(out)) => out,
        };

        if !output.status.success() {
            return Err(TranscribeError::Tool {
                tool: tool.to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}
