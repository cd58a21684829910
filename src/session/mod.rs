//! Per-session state: transcript, student profile, and the state container.

pub mod profile;
pub mod state;
pub mod transcript;

pub use profile::{MasteryLevel, StudentProfile, SubjectStats};
pub use state::AppState;
pub use transcript::{Message, MessageRole, Transcript};
