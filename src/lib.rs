pub mod client;
pub mod config;
pub mod http;
pub mod storage;
pub mod transcribe;

pub use client::{
    default_questions, Artifact, HttpApi, InterviewApi, InterviewClient, Phase, PlaybackEntry,
    Recorder,
};
pub use config::Config;
pub use http::{create_router, ApiError, AppState};
pub use storage::{sanitize_display_name, AuditLog, SavedArtifact, SessionStore, StoreError};
pub use transcribe::{TranscribeError, Transcriber};
