//! External transcription pipeline
//!
//! Two black-box executables do the heavy lifting:
//! - a transcoder (ffmpeg-compatible) that extracts a mono 16 kHz WAV
//!   from the recorded media artifact
//! - a speech recognizer that reads the WAV plus a model directory and
//!   prints `{"text": ...}` JSON on stdout
//!
//! Both run as bounded, timed-out child processes so a stuck tool can
//! never block a request indefinitely or pile up without limit.

mod error;
mod pipeline;

pub use error::TranscribeError;
pub use pipeline::Transcriber;
