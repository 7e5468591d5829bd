//! Durable per-session storage
//!
//! All session state lives on disk under the uploads root:
//! - `<folder>/Q<index>.webm` - one media artifact per question
//! - `<folder>/Q<index>.wav` - transient waveform extract for recognition
//! - `<folder>/transcript.txt` - append-only transcript blocks
//!
//! Plus a process-wide audit log of session start/finish events under
//! the logs root.

mod audit;
mod store;

pub use audit::AuditLog;
pub use store::{sanitize_display_name, SavedArtifact, SessionStore, StoreError};
