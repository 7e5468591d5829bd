use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    // Playback fetches artifacts straight from the uploads tree
    let uploads = ServeDir::new(state.store.uploads_root());

    // A bit above the artifact cap so the store's mid-stream check (and
    // its partial-file cleanup) is what rejects oversized uploads
    let body_limit = state.config.storage.max_artifact_bytes as usize + 64 * 1024;

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/api/session/start", post(handlers::start_session))
        .route("/api/session/finish", post(handlers::finish_session))
        // Per-question pipeline
        .route("/api/upload-one", post(handlers::upload_artifact))
        .route("/api/transcribe", post(handlers::transcribe))
        .route("/api/save-transcript", post(handlers::save_transcript))
        // Static playback of recorded artifacts
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
