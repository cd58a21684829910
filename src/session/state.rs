//! Application state owned by the orchestrator.
//!
//! Transcript, trace, profile and pipeline state live here and change only
//! through the methods below. Every change is broadcast as a
//! [`PipelineEvent`] so a front end can render it as it happens.

use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{HelperError, Result};
use crate::pipeline::events::{DEFAULT_EVENT_CAPACITY, PipelineEvent};
use crate::pipeline::stage::Stage;
use crate::pipeline::state::PipelineState;
use crate::pipeline::trace::{Metadata, TraceLog};
use crate::session::profile::StudentProfile;
use crate::session::transcript::{MessageRole, Transcript};

pub struct AppState {
    pipeline_state: PipelineState,
    transcript: Transcript,
    trace: TraceLog,
    profile: StudentProfile,
    events: broadcast::Sender<PipelineEvent>,
}

impl AppState {
    /// Fresh session state with the welcome message in the transcript.
    pub fn new(profile: StudentProfile) -> Self {
        Self::with_transcript(profile, Transcript::with_welcome())
    }

    pub fn with_transcript(profile: StudentProfile, transcript: Transcript) -> Self {
        let (events, _rx) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self {
            pipeline_state: PipelineState::Idle,
            transcript,
            trace: TraceLog::new(),
            profile,
            events,
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    // ── Read surfaces ───────────────────────────────────────────────

    pub fn pipeline_state(&self) -> PipelineState {
        self.pipeline_state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    pub fn profile(&self) -> &StudentProfile {
        &self.profile
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Move the pipeline to `to`. Only legal transitions are accepted.
    pub fn transition(&mut self, to: PipelineState) -> Result<()> {
        let from = self.pipeline_state;
        if !from.can_transition_to(to) {
            return Err(HelperError::InvalidTransition { from, to });
        }
        self.pipeline_state = to;
        debug!(%from, %to, "Pipeline state changed");
        self.publish(PipelineEvent::StateChanged { from, to });
        Ok(())
    }

    /// Return to idle from wherever the pipeline is. No-op when idle.
    pub fn reset_to_idle(&mut self) {
        if !self.pipeline_state.is_idle() {
            let from = self.pipeline_state;
            self.pipeline_state = PipelineState::Idle;
            debug!(%from, "Pipeline reset to idle");
            self.publish(PipelineEvent::StateChanged {
                from,
                to: PipelineState::Idle,
            });
        }
    }

    pub fn append_message(&mut self, role: MessageRole, content: impl Into<String>) -> Uuid {
        let message = self.transcript.push(role, content).clone();
        let id = message.id;
        self.publish(PipelineEvent::MessageAppended { message });
        id
    }

    /// Append text to the open assistant message.
    pub fn append_to_message(&mut self, id: Uuid, text: &str) -> Result<()> {
        let content = self.transcript.append_content(id, text)?.content.clone();
        trace!(message_id = %id, chars = text.len(), "Message grew");
        self.publish(PipelineEvent::MessageUpdated {
            id,
            appended: text.to_string(),
            content,
        });
        Ok(())
    }

    /// Open a running trace entry. Returns its id.
    pub fn start_log(&mut self, stage: Stage, input: impl Into<String>) -> Uuid {
        let entry = self.trace.start(stage, Some(input.into())).clone();
        let id = entry.id;
        self.publish(PipelineEvent::LogAppended { entry });
        id
    }

    pub fn succeed_log(
        &mut self,
        id: Uuid,
        output: impl Into<String>,
        metadata: Metadata,
        duration: Duration,
    ) -> Result<()> {
        let entry = self.trace.succeed(id, output, metadata, duration)?.clone();
        self.publish(PipelineEvent::LogUpdated { entry });
        Ok(())
    }

    pub fn fail_log(&mut self, id: Uuid, error: impl Into<String>, duration: Duration) -> Result<()> {
        let entry = self.trace.fail(id, error, duration)?.clone();
        self.publish(PipelineEvent::LogUpdated { entry });
        Ok(())
    }

    /// Count one completed interaction on the profile. Returns the new total.
    pub fn record_interaction(&mut self) -> u64 {
        let total = self.profile.record_interaction();
        self.publish(PipelineEvent::ProfileUpdated {
            profile: self.profile.clone(),
        });
        total
    }

    fn publish(&self, event: PipelineEvent) {
        // Ok if nobody is listening
        let _ = self.events.send(event);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(StudentProfile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::trace::StageStatus;

    #[test]
    fn transition_rejects_skips() {
        let mut state = AppState::default();
        let err = state.transition(PipelineState::Solving).unwrap_err();
        assert!(matches!(err, HelperError::InvalidTransition { .. }));
        assert!(state.pipeline_state().is_idle());
    }

    #[test]
    fn reset_to_idle_from_busy() {
        let mut state = AppState::default();
        state.transition(PipelineState::Classifying).unwrap();
        state.transition(PipelineState::Assessing).unwrap();
        state.reset_to_idle();
        assert_eq!(state.pipeline_state(), PipelineState::Idle);
    }

    #[tokio::test]
    async fn mutations_are_broadcast() {
        let mut state = AppState::default();
        let mut rx = state.subscribe();

        state.transition(PipelineState::Classifying).unwrap();
        let log_id = state.start_log(Stage::Classifier, "q");
        state
            .succeed_log(log_id, "{}", Metadata::new(), Duration::from_millis(5))
            .unwrap();
        let total = state.record_interaction();

        let labels: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.label())
            .collect();
        assert_eq!(
            labels,
            vec!["state_changed", "log_appended", "log_updated", "profile_updated"]
        );
        assert_eq!(total, 1);
        assert_eq!(state.trace().entries()[0].status, StageStatus::Success);
    }

    #[test]
    fn append_to_message_publishes_growth() {
        let mut state = AppState::default();
        let mut rx = state.subscribe();
        let id = state.append_message(MessageRole::Assistant, "");
        state.append_to_message(id, "# Step 1").unwrap();

        let _appended = rx.try_recv().unwrap();
        match rx.try_recv().unwrap() {
            PipelineEvent::MessageUpdated { appended, content, .. } => {
                assert_eq!(appended, "# Step 1");
                assert_eq!(content, "# Step 1");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
