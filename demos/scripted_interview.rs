// Drives a full interview against a locally running service using
// canned media bytes instead of a real camera. Start the server first:
//
//   cargo run -- --config config/interview-recorder
//
// then: cargo run --example scripted_interview

use anyhow::Result;
use async_trait::async_trait;
use interview_recorder::{default_questions, Artifact, HttpApi, InterviewClient, Recorder};
use tracing::info;

/// Recorder stand-in that "captures" a synthetic payload per question
struct CannedRecorder {
    current: Option<u32>,
}

#[async_trait]
impl Recorder for CannedRecorder {
    async fn acquire(&mut self) -> Result<()> {
        info!("🎥 Acquired fake capture device");
        Ok(())
    }

    async fn start(&mut self, question: u32) -> Result<()> {
        self.current = Some(question);
        info!("⏺️  Recording question {}", question);
        Ok(())
    }

    async fn stop(&mut self) -> Result<Artifact> {
        let question = self.current.take().expect("not recording");
        let payload = vec![0xAB; 256 * 1024]; // 256 KiB of fake webm
        info!("⏹️  Stopped question {} ({} bytes)", question, payload.len());
        Ok(Artifact::new(question, payload))
    }

    async fn release(&mut self) -> Result<()> {
        info!("📴 Released fake capture device");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let questions = default_questions();
    let total = questions.len();

    let mut client = InterviewClient::new(
        HttpApi::new("http://localhost:3000"),
        CannedRecorder { current: None },
        questions,
        "12345",
        "demo candidate",
    );

    // Watch upload progress from a side task
    let mut progress = client.upload_progress();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            info!("📤 Upload progress: {}%", *progress.borrow());
        }
    });

    // 1. Start the session (auth + device + question 1 recording)
    client.start_session().await?;
    info!("✅ Session folder: {:?}", client.folder());

    // 2. Answer every question in order
    for _ in 0..total {
        let phase = client.advance().await?;
        info!("➡️  Now in {:?}", phase);
    }

    // 3. Finish and show the playback view
    let entries = client.finish().await?;
    for entry in entries {
        info!("🎬 Q{}: {} -> {}", entry.question, entry.prompt, entry.media_path);
    }

    info!("🏁 Interview complete!");
    Ok(())
}
