use super::api::InterviewApi;
use super::recorder::{Artifact, Recorder};
use anyhow::{bail, Context, Result};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Total upload attempts per explicit user retry
const UPLOAD_RETRY_ATTEMPTS: u32 = 3;

/// Base backoff delay, doubled per attempt (2s, then 4s)
const UPLOAD_RETRY_BASE: Duration = Duration::from_secs(2);

/// Where the session currently is. One pipeline step per state; the
/// next question's recording never starts until the previous question
/// is uploaded, transcribed and saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    SessionStarting,
    Recording(u32),
    Stopping(u32),
    Uploading(u32),
    Transcribing(u32),
    Saving(u32),
    /// Upload failed; waiting for an explicit user retry
    RetryUpload(u32),
    Finished,
}

/// One entry of the post-interview playback view: the artifact URL is
/// reconstructed from folder + question index, nothing is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackEntry {
    pub question: u32,
    pub prompt: String,
    /// Path relative to the service origin
    pub media_path: String,
}

/// Drives one interview session through its per-question pipeline.
///
/// All session state (cursor, phase, finalized artifact, folder) lives
/// here rather than in globals, so several clients can coexist in one
/// process. Every method takes `&mut self`: steps are strictly
/// sequential and pipelines for two questions can never overlap.
pub struct InterviewClient<A, R> {
    api: A,
    recorder: R,
    questions: Vec<String>,
    token: String,
    display_name: String,
    folder: Option<String>,
    phase: Phase,
    /// Finalized artifact awaiting upload (kept for retries)
    pending: Option<Artifact>,
    progress: watch::Sender<u8>,
    progress_rx: watch::Receiver<u8>,
}

impl<A: InterviewApi, R: Recorder> InterviewClient<A, R> {
    pub fn new(
        api: A,
        recorder: R,
        questions: Vec<String>,
        token: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        let (progress, progress_rx) = watch::channel(0);

        Self {
            api,
            recorder,
            questions,
            token: token.into(),
            display_name: display_name.into(),
            folder: None,
            phase: Phase::Idle,
            pending: None,
            progress,
            progress_rx,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    /// Whether the advance action should be offered to the user
    pub fn can_advance(&self) -> bool {
        matches!(self.phase, Phase::Recording(_))
    }

    /// Observe upload progress (0-100) for the in-flight transfer
    pub fn upload_progress(&self) -> watch::Receiver<u8> {
        self.progress_rx.clone()
    }

    /// Start the session: authenticate, capture the folder, acquire
    /// the device and begin recording question 1.
    ///
    /// No automatic retry here; any failure returns the machine to
    /// `Idle` and surfaces to the user.
    pub async fn start_session(&mut self) -> Result<()> {
        if self.phase != Phase::Idle {
            bail!("session already started (phase {:?})", self.phase);
        }
        self.phase = Phase::SessionStarting;

        let started = async {
            let folder = self
                .api
                .start_session(&self.token, &self.display_name)
                .await
                .context("session start request failed")?;
            self.folder = Some(folder);

            self.recorder
                .acquire()
                .await
                .context("recording device unavailable")?;
            self.recorder.start(1).await?;
            Ok::<_, anyhow::Error>(())
        }
        .await;

        if let Err(e) = started {
            self.phase = Phase::Idle;
            return Err(e);
        }

        self.phase = Phase::Recording(1);
        info!("Session started in folder {:?}", self.folder);
        Ok(())
    }

    /// Advance past the current question: stop recording, finalize the
    /// artifact, then run upload -> transcribe -> save, ending either
    /// recording the next question or `Finished`.
    ///
    /// Only legal while recording; the caller should gate its advance
    /// control on [`can_advance`](Self::can_advance).
    pub async fn advance(&mut self) -> Result<Phase> {
        let q = match self.phase {
            Phase::Recording(q) => q,
            other => bail!("cannot advance from {:?}", other),
        };

        self.phase = Phase::Stopping(q);
        let artifact = self.recorder.stop().await?;
        self.pending = Some(artifact);

        self.phase = Phase::Uploading(q);
        if let Err(e) = self.upload_pending().await {
            warn!("Upload failed for question {}: {:#}", q, e);
            self.phase = Phase::RetryUpload(q);
            return Err(e.context(format!("upload failed for question {}", q)));
        }

        self.after_upload(q).await
    }

    /// Explicit user retry after an upload failure: up to 3 attempts,
    /// waiting 2s then 4s between them, re-sending the complete
    /// artifact each time. After the last failure the machine stays in
    /// `RetryUpload` so the user can try again.
    pub async fn retry_upload(&mut self) -> Result<Phase> {
        let q = match self.phase {
            Phase::RetryUpload(q) => q,
            other => bail!("no upload to retry from {:?}", other),
        };

        self.phase = Phase::Uploading(q);
        let mut attempt = 0u32;

        loop {
            match self.upload_pending().await {
                Ok(saved_as) => {
                    info!("Retry succeeded for question {} ({})", q, saved_as);
                    break;
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= UPLOAD_RETRY_ATTEMPTS {
                        self.phase = Phase::RetryUpload(q);
                        return Err(e.context(format!(
                            "upload failed after {} attempts",
                            attempt
                        )));
                    }

                    let wait = UPLOAD_RETRY_BASE * 2u32.pow(attempt - 1);
                    warn!(
                        "Upload attempt {} failed, retrying in {:?}: {:#}",
                        attempt, wait, e
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }

        self.after_upload(q).await
    }

    /// Close out a finished interview: notify the service, then build
    /// the playback view.
    pub async fn finish(&mut self) -> Result<Vec<PlaybackEntry>> {
        if self.phase != Phase::Finished {
            bail!("cannot finish from {:?}", self.phase);
        }
        let folder = self.folder.clone().context("no active session")?;

        self.api
            .finish_session(&self.token, &folder, self.questions.len() as u32)
            .await
            .context("session finish request failed")?;

        Ok(self.playback_entries())
    }

    /// Deterministic playback view: one entry per question, URL rebuilt
    /// from folder + index
    pub fn playback_entries(&self) -> Vec<PlaybackEntry> {
        let folder = self.folder.as_deref().unwrap_or_default();

        self.questions
            .iter()
            .enumerate()
            .map(|(i, prompt)| {
                let question = i as u32 + 1;
                PlaybackEntry {
                    question,
                    prompt: prompt.clone(),
                    media_path: format!("uploads/{}/Q{}.webm", folder, question),
                }
            })
            .collect()
    }

    async fn upload_pending(&mut self) -> Result<String> {
        let artifact = self.pending.as_ref().context("no finalized artifact")?;
        let folder = self.folder.as_deref().context("no active session")?;

        let _ = self.progress.send(0);
        self.api
            .upload_artifact(folder, artifact, &self.progress)
            .await
    }

    /// Post-upload pipeline: transcribe, save, then move the cursor or
    /// finish the session
    async fn after_upload(&mut self, q: u32) -> Result<Phase> {
        let folder = self.folder.clone().context("no active session")?;

        self.phase = Phase::Transcribing(q);
        let text = self
            .api
            .transcribe(&folder, q)
            .await
            .context("transcription request failed")?;

        self.phase = Phase::Saving(q);
        self.api
            .save_transcript(&folder, q, &text)
            .await
            .context("save-transcript request failed")?;

        self.pending = None;

        let next = q + 1;
        if next as usize > self.questions.len() {
            self.recorder.release().await?;
            self.phase = Phase::Finished;
            info!("Interview finished after {} questions", q);
        } else {
            self.recorder.start(next).await?;
            self.phase = Phase::Recording(next);
            info!("Recording question {}", next);
        }

        Ok(self.phase)
    }
}
