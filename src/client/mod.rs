//! Capture/upload client
//!
//! Drives one interview session as an explicit finite-state machine:
//! start session -> record -> stop -> upload -> transcribe -> save ->
//! advance or finish, with a user-triggered bounded-backoff retry for
//! failed uploads.
//!
//! Media capture sits behind the [`Recorder`] trait and the network
//! behind [`InterviewApi`], so the whole pipeline is testable with
//! injected fake artifacts and an in-memory service.

mod api;
mod machine;
mod questions;
mod recorder;

pub use api::{HttpApi, InterviewApi};
pub use machine::{InterviewClient, Phase, PlaybackEntry};
pub use questions::default_questions;
pub use recorder::{Artifact, Recorder};
