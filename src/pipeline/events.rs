//! Events published on every application-state mutation.

use serde::Serialize;
use uuid::Uuid;

use crate::pipeline::state::PipelineState;
use crate::pipeline::trace::StageLogEntry;
use crate::session::profile::StudentProfile;
use crate::session::transcript::Message;

/// Default broadcast channel capacity. Streaming emits one event per
/// fragment, so this is sized for a whole solution.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// A change a presentation layer may want to render.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    StateChanged {
        from: PipelineState,
        to: PipelineState,
    },
    MessageAppended {
        message: Message,
    },
    /// The open assistant message grew by `appended`.
    MessageUpdated {
        id: Uuid,
        appended: String,
        content: String,
    },
    LogAppended {
        entry: StageLogEntry,
    },
    LogUpdated {
        entry: StageLogEntry,
    },
    ProfileUpdated {
        profile: StudentProfile,
    },
}

impl PipelineEvent {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "state_changed",
            Self::MessageAppended { .. } => "message_appended",
            Self::MessageUpdated { .. } => "message_updated",
            Self::LogAppended { .. } => "log_appended",
            Self::LogUpdated { .. } => "log_updated",
            Self::ProfileUpdated { .. } => "profile_updated",
        }
    }
}
