use anyhow::Result;
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Append-only audit log of session lifecycle events.
///
/// One timestamped line per event; observability only, never read back
/// by the service.
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(logs_root: impl Into<PathBuf>) -> Result<Self> {
        let logs_root = logs_root.into();
        std::fs::create_dir_all(&logs_root)?;

        Ok(Self {
            path: logs_root.join("sessions.log"),
        })
    }

    pub async fn session_started(&self, folder: &str) -> Result<()> {
        self.record(&format!("START: {}", folder)).await
    }

    pub async fn session_finished(&self, folder: &str) -> Result<()> {
        self.record(&format!("FINISH: {}", folder)).await
    }

    async fn record(&self, event: &str) -> Result<()> {
        let line = format!("[{}] {}\n", Utc::now().to_rfc3339(), event);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        info!("Audit: {}", event);
        Ok(())
    }
}
