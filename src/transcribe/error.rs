use std::fmt;
use std::path::PathBuf;

/// Failures from the external transcode + recognize pipeline
#[derive(Debug)]
pub enum TranscribeError {
    /// No recorded artifact exists for the requested question
    MissingArtifact(PathBuf),

    /// A tool exited non-zero or produced unusable output; `detail`
    /// carries its diagnostic text verbatim
    Tool { tool: String, detail: String },

    /// A tool ran past the configured timeout and was killed
    TimedOut { tool: String, secs: u64 },

    Io(std::io::Error),
}

impl fmt::Display for TranscribeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscribeError::MissingArtifact(path) => {
                write!(f, "no recorded artifact at {}", path.display())
            }
            TranscribeError::Tool { tool, detail } => {
                write!(f, "{} failed: {}", tool, detail)
            }
            TranscribeError::TimedOut { tool, secs } => {
                write!(f, "{} timed out after {}s", tool, secs)
            }
            TranscribeError::Io(err) => write!(f, "transcription I/O error: {}", err),
        }
    }
}

impl std::error::Error for TranscribeError {}

impl From<std::io::Error> for TranscribeError {
    fn from(err: std::io::Error) -> Self {
        TranscribeError::Io(err)
    }
}
