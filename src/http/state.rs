use crate::config::Config;
use crate::storage::{AuditLog, SessionStore};
use crate::transcribe::Transcriber;
use anyhow::Result;
use std::sync::Arc;

/// Shared application state for HTTP handlers.
///
/// All durable state lives on disk; this only holds the handles to
/// reach it, so per-request concurrency across sessions is safe.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<SessionStore>,
    pub transcriber: Arc<Transcriber>,
    pub audit: Arc<AuditLog>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let store = SessionStore::new(
            config.storage.uploads_root.clone(),
            config.storage.max_artifact_bytes,
        )?;
        let audit = AuditLog::new(config.storage.logs_root.clone())?;
        let transcriber = Transcriber::new(config.transcription.clone());

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            transcriber: Arc::new(transcriber),
            audit: Arc::new(audit),
        })
    }
}
