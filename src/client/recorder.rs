use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// One finalized answer recording: the complete buffered media for a
/// single question, immutable once produced by [`Recorder::stop`].
#[derive(Debug, Clone)]
pub struct Artifact {
    /// 1-based question index this recording answers
    pub question: u32,

    /// Complete media bytes, composed from all chunks since recording
    /// started
    pub bytes: Bytes,
}

impl Artifact {
    pub fn new(question: u32, bytes: impl Into<Bytes>) -> Self {
        Self {
            question,
            bytes: bytes.into(),
        }
    }

    /// Upload file name, matching the service's storage key
    pub fn file_name(&self) -> String {
        format!("Q{}.webm", self.question)
    }
}

/// Abstraction over the local recording device.
///
/// The state machine only ever drives one recorder and never overlaps
/// recording with upload: `stop` must return the complete artifact
/// before any network transfer begins.
#[async_trait]
pub trait Recorder: Send {
    /// Acquire the capture device (camera + microphone). Called once
    /// per session, before the first recording starts.
    async fn acquire(&mut self) -> Result<()>;

    /// Begin buffering chunks for the given question
    async fn start(&mut self, question: u32) -> Result<()>;

    /// Stop capture and materialize everything buffered since `start`
    /// as one immutable artifact
    async fn stop(&mut self) -> Result<Artifact>;

    /// Release the capture device; no further recording can happen
    async fn release(&mut self) -> Result<()>;
}
