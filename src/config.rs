use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one folder per interview session
    pub uploads_root: PathBuf,

    /// Root directory for the session audit log
    pub logs_root: PathBuf,

    /// Maximum accepted size of a single uploaded artifact
    pub max_artifact_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Static secret checked on session start/finish
    pub shared_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    /// Transcoder executable (ffmpeg-compatible CLI)
    pub transcoder_path: PathBuf,

    /// Speech recognizer executable (emits {"text": ...} on stdout)
    pub recognizer_path: PathBuf,

    /// Recognition model directory passed to the recognizer
    pub model_dir: PathBuf,

    /// Upper bound on each external tool invocation, in seconds
    pub step_timeout_secs: u64,

    /// How many transcriptions may run at once
    pub max_concurrent: usize,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "interview-recorder".to_string(),
                http: HttpConfig {
                    bind: "0.0.0.0".to_string(),
                    port: 3000,
                },
            },
            storage: StorageConfig {
                uploads_root: PathBuf::from("uploads"),
                logs_root: PathBuf::from("logs"),
                max_artifact_bytes: 100 * 1024 * 1024, // 100 MiB
            },
            auth: AuthConfig {
                shared_token: "12345".to_string(),
            },
            transcription: TranscriptionConfig {
                transcoder_path: PathBuf::from("bin/ffmpeg"),
                recognizer_path: PathBuf::from("models/vosk-cli"),
                model_dir: PathBuf::from("models/vosk-model-small-en-us-0.15"),
                step_timeout_secs: 120,
                max_concurrent: 2,
            },
        }
    }
}
