use super::error::ApiError;
use super::state::AppState;
use axum::{
    extract::{Multipart, State},
    response::Json,
};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub token: String,

    /// Display name used to derive the session folder
    #[serde(default, rename = "userName")]
    pub user_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub ok: bool,
    pub folder: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    #[serde(rename = "savedAs")]
    pub saved_as: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    pub folder: String,
    #[serde(rename = "questionIndex")]
    pub question_index: u32,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub ok: bool,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveTranscriptRequest {
    pub folder: String,
    #[serde(rename = "questionIndex")]
    pub question_index: u32,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct FinishSessionRequest {
    pub token: String,
    pub folder: String,
    #[serde(default, rename = "questionsCount")]
    pub questions_count: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/session/start
///
/// Validates the shared token, allocates a fresh session folder and
/// records the start in the audit log. A bad token mutates nothing.
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<Json<StartSessionResponse>, ApiError> {
    if req.token != state.config.auth.shared_token {
        warn!("Rejected session start: bad token");
        return Err(ApiError::Unauthorized);
    }

    let folder = state
        .store
        .create_session(req.user_name.as_deref())
        .await?;
    state.audit.session_started(&folder).await?;

    info!("Session started: {}", folder);
    Ok(Json(StartSessionResponse { ok: true, folder }))
}

/// POST /api/upload-one
///
/// Multipart upload of one answer. `folder` and `questionIndex` fields
/// must precede `file` so the destination is known before the body is
/// consumed; the store streams the body to disk under the size cap.
pub async fn upload_artifact(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut folder: Option<String> = None;
    let mut question: Option<u32> = None;
    let mut saved = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "folder" => folder = Some(field.text().await.map_err(bad_multipart)?),
            "questionIndex" => {
                let raw = field.text().await.map_err(bad_multipart)?;
                let parsed = raw.trim().parse().map_err(|_| {
                    ApiError::Validation(format!("questionIndex is not an integer: {:?}", raw))
                })?;
                question = Some(parsed);
            }
            // No auth is enforced on uploads; the token field is accepted
            // and ignored
            "token" => {
                let _ = field.text().await;
            }
            "file" => {
                let folder = folder
                    .as_deref()
                    .ok_or_else(|| ApiError::Validation("folder must precede file".to_string()))?;
                let question = question.ok_or_else(|| {
                    ApiError::Validation("questionIndex must precede file".to_string())
                })?;

                let body = Box::pin(field.map_err(anyhow::Error::new));
                saved = Some(state.store.save_artifact(folder, question, body).await?);
            }
            _ => {
                debug!("Ignoring unknown multipart field: {}", name);
                let _ = field.bytes().await;
            }
        }
    }

    let saved = saved.ok_or_else(|| ApiError::Validation("missing file field".to_string()))?;

    Ok(Json(UploadResponse {
        ok: true,
        saved_as: saved.saved_as,
    }))
}

/// POST /api/transcribe
///
/// Runs the external transcode + recognize pipeline for one stored
/// artifact. Uncached: a repeat call re-runs both tools and overwrites
/// the waveform extract.
pub async fn transcribe(
    State(state): State<AppState>,
    Json(req): Json<TranscribeRequest>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let artifact = state.store.artifact_path(&req.folder, req.question_index)?;
    let waveform = state.store.waveform_path(&req.folder, req.question_index)?;

    info!("Transcribing {}/Q{}", req.folder, req.question_index);
    let text = state.transcriber.transcribe(&artifact, &waveform).await?;

    Ok(Json(TranscribeResponse { ok: true, text }))
}

/// POST /api/save-transcript
///
/// Appends one delimited transcript block; blocks land in call order.
pub async fn save_transcript(
    State(state): State<AppState>,
    Json(req): Json<SaveTranscriptRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    state
        .store
        .append_transcript(&req.folder, req.question_index, &req.text)
        .await?;

    Ok(Json(OkResponse { ok: true }))
}

/// POST /api/session/finish
///
/// Validates the shared token and records the completion event. No
/// cleanup or aggregation happens here; the folder is the durable
/// record.
pub async fn finish_session(
    State(state): State<AppState>,
    Json(req): Json<FinishSessionRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    if req.token != state.config.auth.shared_token {
        warn!("Rejected session finish: bad token");
        return Err(ApiError::Unauthorized);
    }

    state.audit.session_finished(&req.folder).await?;

    info!(
        "Session finished: {} ({} questions)",
        req.folder,
        req.questions_count.unwrap_or(0)
    );
    Ok(Json(OkResponse { ok: true }))
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::Validation(format!("malformed multipart body: {}", err))
}
