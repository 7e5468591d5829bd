use super::recorder::Artifact;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::debug;

/// Upload chunk size; each chunk handed to the transport bumps the
/// progress watch
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// The five service operations the client drives, in the order the
/// pipeline calls them. Implemented over HTTP by [`HttpApi`]; tests
/// substitute an in-memory double.
#[async_trait]
pub trait InterviewApi: Send + Sync {
    /// Returns the server-allocated session folder
    async fn start_session(&self, token: &str, user_name: &str) -> Result<String>;

    /// All-or-nothing transfer of one artifact. Fractional progress
    /// (0-100, bytes sent over total) is published through `progress`
    /// while the body streams. Returns the stored file name.
    async fn upload_artifact(
        &self,
        folder: &str,
        artifact: &Artifact,
        progress: &watch::Sender<u8>,
    ) -> Result<String>;

    /// Returns the recognized text for one uploaded question
    async fn transcribe(&self, folder: &str, question: u32) -> Result<String>;

    async fn save_transcript(&self, folder: &str, question: u32, text: &str) -> Result<()>;

    async fn finish_session(&self, token: &str, folder: &str, questions_count: u32) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct StartSessionBody {
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadBody {
    #[serde(rename = "savedAs")]
    saved_as: String,
}

#[derive(Debug, Deserialize)]
struct TranscribeBody {
    text: String,
}

/// reqwest-backed [`InterviewApi`] against one service origin.
///
/// Every failure mode (transport error, non-2xx status, bad body) is
/// surfaced as the same opaque error; the retry logic upstream does
/// not distinguish them.
pub struct HttpApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", path))?
            .error_for_status()
            .with_context(|| format!("POST {} rejected", path))?;

        Ok(resp)
    }
}

#[async_trait]
impl InterviewApi for HttpApi {
    async fn start_session(&self, token: &str, user_name: &str) -> Result<String> {
        let resp = self
            .post_json(
                "/api/session/start",
                json!({ "token": token, "userName": user_name }),
            )
            .await?;

        let body: StartSessionBody = resp.json().await.context("bad session-start response")?;
        Ok(body.folder)
    }

    async fn upload_artifact(
        &self,
        folder: &str,
        artifact: &Artifact,
        progress: &watch::Sender<u8>,
    ) -> Result<String> {
        let url = format!("{}/api/upload-one", self.base_url);
        let total = artifact.bytes.len();

        debug!("Uploading {} ({} bytes)", artifact.file_name(), total);

        // Stream the artifact in fixed chunks, publishing percent-sent
        // as each chunk is handed to the transport
        let bytes = artifact.bytes.clone();
        let tx = progress.clone();
        let body = futures::stream::unfold(0usize, move |offset| {
            let bytes = bytes.clone();
            let tx = tx.clone();
            async move {
                if offset >= bytes.len() {
                    return None;
                }
                let end = (offset + UPLOAD_CHUNK_BYTES).min(bytes.len());
                let percent = (end as u64 * 100 / bytes.len() as u64) as u8;
                let _ = tx.send(percent);
                Some((Ok::<Bytes, std::io::Error>(bytes.slice(offset..end)), end))
            }
        });

        if total == 0 {
            let _ = progress.send(100);
        }

        let part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(body),
            total as u64,
        )
        .file_name(artifact.file_name())
        .mime_str("video/webm")
        .context("bad artifact mime type")?;

        // Field order matters: the service resolves the destination
        // from folder + questionIndex before it reads the file body
        let form = reqwest::multipart::Form::new()
            .text("folder", folder.to_string())
            .text("questionIndex", artifact.question.to_string())
            .part("file", part);

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("upload transfer failed")?
            .error_for_status()
            .context("upload rejected")?;

        let out: UploadBody = resp.json().await.context("bad upload response")?;
        Ok(out.saved_as)
    }

    async fn transcribe(&self, folder: &str, question: u32) -> Result<String> {
        let resp = self
            .post_json(
                "/api/transcribe",
                json!({ "folder": folder, "questionIndex": question }),
            )
            .await?;

        let body: TranscribeBody = resp.json().await.context("bad transcribe response")?;
        Ok(body.text)
    }

    async fn save_transcript(&self, folder: &str, question: u32, text: &str) -> Result<()> {
        self.post_json(
            "/api/save-transcript",
            json!({ "folder": folder, "questionIndex": question, "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn finish_session(&self, token: &str, folder: &str, questions_count: u32) -> Result<()> {
        self.post_json(
            "/api/session/finish",
            json!({ "token": token, "folder": folder, "questionsCount": questions_count }),
        )
        .await?;
        Ok(())
    }
}
