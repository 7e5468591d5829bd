// Tests for the capture/upload state machine, driven with an injected
// fake recorder and an in-memory service double. A shared event log
// captures the exact order of device and network operations.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use interview_recorder::{Artifact, InterviewApi, InterviewClient, Phase, Recorder};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn count_prefixed(&self, prefix: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

struct FakeRecorder {
    events: EventLog,
    current: Option<u32>,
}

impl FakeRecorder {
    fn new(events: EventLog) -> Self {
        Self {
            events,
            current: None,
        }
    }
}

#[async_trait]
impl Recorder for FakeRecorder {
    async fn acquire(&mut self) -> Result<()> {
        self.events.push("rec:acquire");
        Ok(())
    }

    async fn start(&mut self, question: u32) -> Result<()> {
        self.current = Some(question);
        self.events.push(format!("rec:start:{}", question));
        Ok(())
    }

    async fn stop(&mut self) -> Result<Artifact> {
        let question = self.current.take().context("not recording")?;
        self.events.push(format!("rec:stop:{}", question));
        Ok(Artifact::new(
            question,
            format!("media for question {}", question).into_bytes(),
        ))
    }

    async fn release(&mut self) -> Result<()> {
        self.events.push("rec:release");
        Ok(())
    }
}

/// In-memory service double. `failing_uploads` makes the next N upload
/// calls fail, exercising the retry path.
struct StubApi {
    events: EventLog,
    failing_uploads: AtomicU32,
}

impl StubApi {
    fn new(events: EventLog, failing_uploads: u32) -> Self {
        Self {
            events,
            failing_uploads: AtomicU32::new(failing_uploads),
        }
    }
}

#[async_trait]
impl InterviewApi for StubApi {
    async fn start_session(&self, token: &str, user_name: &str) -> Result<String> {
        assert_eq!(token, "12345");
        self.events.push("api:start");
        Ok(format!("20260829T000000Z_{}", user_name))
    }

    async fn upload_artifact(
        &self,
        _folder: &str,
        artifact: &Artifact,
        progress: &watch::Sender<u8>,
    ) -> Result<String> {
        let remaining = self.failing_uploads.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_uploads.store(remaining - 1, Ordering::SeqCst);
            self.events
                .push(format!("api:upload-fail:{}", artifact.question));
            bail!("simulated transport failure");
        }

        let _ = progress.send(50);
        let _ = progress.send(100);
        self.events.push(format!("api:upload:{}", artifact.question));
        Ok(artifact.file_name())
    }

    async fn transcribe(&self, _folder: &str, question: u32) -> Result<String> {
        self.events.push(format!("api:transcribe:{}", question));
        Ok(format!("answer {}", question))
    }

    async fn save_transcript(&self, _folder: &str, question: u32, text: &str) -> Result<()> {
        assert_eq!(text, format!("answer {}", question));
        self.events.push(format!("api:save:{}", question));
        Ok(())
    }

    async fn finish_session(&self, token: &str, _folder: &str, questions_count: u32) -> Result<()> {
        assert_eq!(token, "12345");
        self.events.push(format!("api:finish:{}", questions_count));
        Ok(())
    }
}

fn two_question_client(
    events: &EventLog,
    failing_uploads: u32,
) -> InterviewClient<StubApi, FakeRecorder> {
    InterviewClient::new(
        StubApi::new(events.clone(), failing_uploads),
        FakeRecorder::new(events.clone()),
        vec!["First question?".to_string(), "Second question?".to_string()],
        "12345",
        "ada",
    )
}

#[tokio::test]
async fn full_session_runs_strictly_in_order() -> Result<()> {
    let events = EventLog::default();
    let mut client = two_question_client(&events, 0);

    assert_eq!(client.phase(), Phase::Idle);
    assert!(!client.can_advance());

    client.start_session().await?;
    assert_eq!(client.phase(), Phase::Recording(1));
    assert_eq!(client.folder(), Some("20260829T000000Z_ada"));
    assert!(client.can_advance());

    assert_eq!(client.advance().await?, Phase::Recording(2));
    assert_eq!(client.advance().await?, Phase::Finished);
    assert!(!client.can_advance());

    let entries = client.finish().await?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].question, 1);
    assert_eq!(entries[0].prompt, "First question?");
    assert_eq!(entries[0].media_path, "uploads/20260829T000000Z_ada/Q1.webm");
    assert_eq!(entries[1].media_path, "uploads/20260829T000000Z_ada/Q2.webm");

    // Recording for a question always fully stops before its upload,
    // and the next recording starts only after the save completes
    assert_eq!(
        events.snapshot(),
        vec![
            "api:start",
            "rec:acquire",
            "rec:start:1",
            "rec:stop:1",
            "api:upload:1",
            "api:transcribe:1",
            "api:save:1",
            "rec:start:2",
            "rec:stop:2",
            "api:upload:2",
            "api:transcribe:2",
            "api:save:2",
            "rec:release",
            "api:finish:2",
        ]
    );

    Ok(())
}

#[tokio::test]
async fn advance_requires_an_active_recording() {
    let events = EventLog::default();
    let mut client = two_question_client(&events, 0);

    assert!(client.advance().await.is_err());
    assert_eq!(client.phase(), Phase::Idle);
}

#[tokio::test]
async fn finish_requires_a_finished_interview() -> Result<()> {
    let events = EventLog::default();
    let mut client = two_question_client(&events, 0);
    client.start_session().await?;

    assert!(client.finish().await.is_err());
    assert_eq!(client.phase(), Phase::Recording(1));

    Ok(())
}

#[tokio::test]
async fn upload_failure_parks_the_machine_for_retry() -> Result<()> {
    let events = EventLog::default();
    let mut client = two_question_client(&events, 1);
    client.start_session().await?;

    assert!(client.advance().await.is_err());
    assert_eq!(client.phase(), Phase::RetryUpload(1));
    assert!(!client.can_advance());

    // Explicit retry re-sends the same finalized artifact and resumes
    // the pipeline
    assert_eq!(client.retry_upload().await?, Phase::Recording(2));
    assert_eq!(events.count_prefixed("api:upload-fail"), 1);
    assert_eq!(events.count_prefixed("api:upload:"), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn retry_backs_off_2s_then_4s_and_stops_after_three_attempts() -> Result<()> {
    let events = EventLog::default();
    // One failure for the initial advance, three more for the retry run
    let mut client = two_question_client(&events, 4);
    client.start_session().await?;
    assert!(client.advance().await.is_err());

    let before = tokio::time::Instant::now();
    assert!(client.retry_upload().await.is_err());

    assert_eq!(before.elapsed(), Duration::from_secs(6), "2s + 4s waits");
    assert_eq!(events.count_prefixed("api:upload-fail"), 4);
    assert_eq!(client.phase(), Phase::RetryUpload(1));

    // The failure is surfaced, not abandoned: another retry can succeed
    assert_eq!(client.retry_upload().await?, Phase::Recording(2));

    Ok(())
}

#[tokio::test]
async fn upload_progress_reaches_completion() -> Result<()> {
    let events = EventLog::default();
    let mut client = two_question_client(&events, 0);
    let progress = client.upload_progress();

    client.start_session().await?;
    client.advance().await?;

    assert_eq!(*progress.borrow(), 100);

    Ok(())
}
