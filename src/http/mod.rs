//! HTTP API for the session/transcription service
//!
//! Routes:
//! - POST /api/session/start - create a session folder (shared token)
//! - POST /api/upload-one - multipart upload of one answer artifact
//! - POST /api/transcribe - run the external transcription pipeline
//! - POST /api/save-transcript - append one transcript block
//! - POST /api/session/finish - close out a session (shared token)
//! - GET /uploads/... - static playback of recorded artifacts
//! - GET /health - health check

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
