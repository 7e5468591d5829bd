use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use futures::{Stream, StreamExt};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// How many fresh timestamps to try when a folder name collides
const CREATE_ATTEMPTS: u32 = 5;

/// Errors produced by the session store
#[derive(Debug)]
pub enum StoreError {
    /// Caller-supplied folder name is empty or attempts path traversal
    InvalidFolder(String),

    /// Upload exceeded the configured artifact size cap
    ArtifactTooLarge { limit_bytes: u64 },

    /// The upstream byte stream failed mid-upload
    Source(anyhow::Error),

    Io(std::io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidFolder(name) => write!(f, "invalid session folder: {:?}", name),
            StoreError::ArtifactTooLarge { limit_bytes } => {
                write!(f, "artifact exceeds the {} byte limit", limit_bytes)
            }
            StoreError::Source(err) => write!(f, "upload stream failed: {}", err),
            StoreError::Io(err) => write!(f, "storage I/O error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

/// Result of a successful artifact upload
#[derive(Debug, Clone)]
pub struct SavedArtifact {
    /// File name within the session folder (e.g. "Q3.webm")
    pub saved_as: String,

    /// Bytes written to disk
    pub bytes_written: u64,
}

/// Filesystem-backed store for interview sessions.
///
/// Stateless between calls; every operation is keyed by the session
/// folder name. Concurrent writes to the same (folder, question) resolve
/// by last-writer-wins rename, which is the accepted race here.
pub struct SessionStore {
    uploads_root: PathBuf,
    max_artifact_bytes: u64,
}

impl SessionStore {
    pub fn new(uploads_root: impl Into<PathBuf>, max_artifact_bytes: u64) -> Result<Self, StoreError> {
        let uploads_root = uploads_root.into();
        std::fs::create_dir_all(&uploads_root)?;

        Ok(Self {
            uploads_root,
            max_artifact_bytes,
        })
    }

    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    /// Create a fresh session folder for the given display name.
    ///
    /// The folder is `<timestamp>_<sanitized name>`; the timestamp prefix
    /// keeps two sessions for the same person distinct. On the (rare)
    /// same-millisecond collision we retry with a fresh timestamp.
    pub async fn create_session(&self, display_name: Option<&str>) -> Result<String, StoreError> {
        let safe = sanitize_display_name(display_name.unwrap_or(""));

        for _ in 0..CREATE_ATTEMPTS {
            let folder = format!("{}_{}", folder_stamp(), safe);
            match fs::create_dir(self.uploads_root.join(&folder)).await {
                Ok(()) => {
                    info!("Created session folder: {}", folder);
                    return Ok(folder);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    warn!("Session folder collision, retrying: {}", folder);
                    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "could not allocate a unique session folder",
        )))
    }

    /// Absolute path of the media artifact for one question
    pub fn artifact_path(&self, folder: &str, question: u32) -> Result<PathBuf, StoreError> {
        Ok(self.session_dir(folder)?.join(format!("Q{}.webm", question)))
    }

    /// Absolute path of the waveform extract for one question
    pub fn waveform_path(&self, folder: &str, question: u32) -> Result<PathBuf, StoreError> {
        Ok(self.session_dir(folder)?.join(format!("Q{}.wav", question)))
    }

    /// Absolute path of the per-session transcript file
    pub fn transcript_path(&self, folder: &str) -> Result<PathBuf, StoreError> {
        Ok(self.session_dir(folder)?.join("transcript.txt"))
    }

    /// Store one uploaded artifact, replacing any prior file for the
    /// same (folder, question).
    ///
    /// The body is streamed into a `.part` sibling and renamed into place
    /// once complete, so an oversized or interrupted upload never leaves
    /// a partial file at the destination path. The size cap is enforced
    /// mid-stream; the remainder of an oversized body is never read.
    pub async fn save_artifact<S>(
        &self,
        folder: &str,
        question: u32,
        mut body: S,
    ) -> Result<SavedArtifact, StoreError>
    where
        S: Stream<Item = Result<Bytes, anyhow::Error>> + Unpin,
    {
        let dest = self.artifact_path(folder, question)?;

        // The folder is trusted and created on demand, matching the
        // upload contract (see DESIGN.md on the trust boundary).
        if let Some(dir) = dest.parent() {
            fs::create_dir_all(dir).await?;
        }

        let part = dest.with_extension("webm.part");
        let mut file = fs::File::create(&part).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    discard_partial(&mut file, &part).await;
                    return Err(StoreError::Source(e));
                }
            };

            written += chunk.len() as u64;
            if written > self.max_artifact_bytes {
                discard_partial(&mut file, &part).await;
                return Err(StoreError::ArtifactTooLarge {
                    limit_bytes: self.max_artifact_bytes,
                });
            }

            if let Err(e) = file.write_all(&chunk).await {
                discard_partial(&mut file, &part).await;
                return Err(e.into());
            }
        }

        file.flush().await?;
        drop(file);

        // Atomic replace: a re-upload overwrites the prior artifact
        fs::rename(&part, &dest).await?;

        let saved_as = format!("Q{}.webm", question);
        info!("Saved artifact {}/{} ({} bytes)", folder, saved_as, written);

        Ok(SavedArtifact {
            saved_as,
            bytes_written: written,
        })
    }

    /// Append one delimited transcript block.
    ///
    /// Purely append-only: blocks land in call order, repeated saves for
    /// the same question append duplicates, nothing is rewritten.
    pub async fn append_transcript(
        &self,
        folder: &str,
        question: u32,
        text: &str,
    ) -> Result<(), StoreError> {
        let path = self.transcript_path(folder)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let block = format!("===== Question {} =====\n{}\n\n", question, text);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(block.as_bytes()).await?;
        file.flush().await?;

        info!("Appended transcript block for {}/Q{}", folder, question);
        Ok(())
    }

    fn session_dir(&self, folder: &str) -> Result<PathBuf, StoreError> {
        validate_folder(folder)?;
        Ok(self.uploads_root.join(folder))
    }
}

async fn discard_partial(file: &mut fs::File, part: &Path) {
    let _ = file.shutdown().await;
    if let Err(e) = fs::remove_file(part).await {
        warn!("Failed to remove partial upload {}: {}", part.display(), e);
    }
}

/// Reduce a display name to lowercase ASCII alphanumerics and
/// underscores. An absent or empty name becomes "user".
pub fn sanitize_display_name(name: &str) -> String {
    if name.is_empty() {
        return "user".to_string();
    }

    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// UTC timestamp with ':' and '.' replaced so it is filesystem-safe
fn folder_stamp() -> String {
    Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "_")
}

/// The folder name is caller-supplied on upload/save paths; keep it from
/// escaping the uploads root.
fn validate_folder(folder: &str) -> Result<(), StoreError> {
    if folder.is_empty()
        || folder.contains('/')
        || folder.contains('\\')
        || folder.contains("..")
    {
        return Err(StoreError::InvalidFolder(folder.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_punctuation_and_lowercases() {
        assert_eq!(sanitize_display_name("Ada Lovelace!"), "ada_lovelace_");
        assert_eq!(sanitize_display_name("jos\u{e9}"), "jos_");
        assert_eq!(sanitize_display_name("X9"), "x9");
    }

    #[test]
    fn sanitize_defaults_empty_name() {
        assert_eq!(sanitize_display_name(""), "user");
    }

    #[test]
    fn folder_stamp_is_filesystem_safe() {
        let stamp = folder_stamp();
        assert!(!stamp.contains(':'));
        assert!(!stamp.contains('.'));
        assert!(stamp.ends_with('Z'));
    }

    #[test]
    fn traversal_folders_are_rejected() {
        assert!(validate_folder("../etc").is_err());
        assert!(validate_folder("a/b").is_err());
        assert!(validate_folder("").is_err());
        assert!(validate_folder("2026_ada").is_ok());
    }
}
