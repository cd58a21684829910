//! Pipeline orchestrator: runs one homework question through all stages.
//!
//! Flow per accepted submission:
//! 1. Classify (fatal on error)
//! 2. Assess (fatal on error)
//! 3. Solve, streamed into the assistant message (fatal on error)
//! 4. Practice problems appended (non-fatal)
//! 5. Memory update (local, cannot fail)
//!
//! A fatal error records the failure on that stage's trace entry and
//! returns the pipeline to idle. Whatever was already written to the
//! assistant message stays.

use std::time::Instant;

use futures::StreamExt;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agents::StageClient;
use crate::agents::prompts::PRACTICE_SEPARATOR;
use crate::error::{Result, StageError};
use crate::pipeline::events::PipelineEvent;
use crate::pipeline::stage::Stage;
use crate::pipeline::state::PipelineState;
use crate::pipeline::trace::{Metadata, metadata};
use crate::session::state::AppState;
use crate::session::transcript::MessageRole;

const SOLVER_INPUT: &str = "Starting Step-by-Step Pedagogical Generation...";
const SOLVER_OUTPUT: &str = "Markdown Generated Successfully";
const PRACTICE_INPUT: &str = "Generating related practice problems...";
const PRACTICE_OUTPUT: &str = "Practice Problems Appended";
const MEMORY_INPUT: &str = "Updating Student Profile...";
const MEMORY_OUTPUT: &str = "Profile Synced";

/// Why a submission was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "state", rename_all = "snake_case")]
pub enum RejectReason {
    EmptyQuestion,
    /// A turn is already running.
    Busy(PipelineState),
}

/// What happened to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// All stages ran. `practice_failed` is set when stage 4 errored and the
    /// solution alone stands as the answer.
    Completed {
        assistant_message_id: Uuid,
        practice_failed: bool,
    },
    /// A fatal stage failed; later stages did not run.
    Aborted { stage: Stage, error: String },
    Rejected(RejectReason),
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Drives the fixed stage sequence over the application state.
pub struct Orchestrator {
    client: StageClient,
    state: AppState,
}

impl Orchestrator {
    pub fn new(client: StageClient, state: AppState) -> Self {
        Self { client, state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Mutable access for front ends that drive the state directly.
    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PipelineEvent> {
        self.state.subscribe()
    }

    /// Run one question through the pipeline.
    ///
    /// Rejected (with nothing changed) when the question is blank or a turn
    /// is already in progress. Stage failures are reported through
    /// [`TurnOutcome::Aborted`]; `Err` is reserved for broken internal
    /// invariants.
    pub async fn submit(&mut self, question: &str) -> Result<TurnOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(TurnOutcome::Rejected(RejectReason::EmptyQuestion));
        }
        let current = self.state.pipeline_state();
        if !current.is_idle() {
            warn!(state = %current, "Submission rejected, pipeline busy");
            return Ok(TurnOutcome::Rejected(RejectReason::Busy(current)));
        }

        info!(
            question = %question.chars().take(80).collect::<String>(),
            model = self.client.model_name(),
            "Starting turn"
        );
        self.state.append_message(MessageRole::User, question);

        let result = self.run_turn(question).await;
        self.state.reset_to_idle();

        match &result {
            Ok(TurnOutcome::Completed { practice_failed, .. }) => info!(
                practice_failed,
                total_questions = self.state.profile().total_questions,
                "Turn complete"
            ),
            Ok(TurnOutcome::Aborted { stage, error }) => {
                warn!(stage = %stage, error = %error, "Turn aborted")
            }
            Ok(TurnOutcome::Rejected(_)) => {}
            Err(e) => error!(error = %e, "Turn failed on internal error"),
        }
        result
    }

    async fn run_turn(&mut self, question: &str) -> Result<TurnOutcome> {
        // ── 1. Classify ─────────────────────────────────────────────
        self.state.transition(PipelineState::Classifying)?;
        let started = Instant::now();
        let log_id = self.state.start_log(Stage::Classifier, question);

        let classification = match self.client.classify(question).await {
            Ok(c) => c,
            Err(e) => return self.abort(Stage::Classifier, log_id, started, e),
        };
        self.state.succeed_log(
            log_id,
            pretty_json(&classification),
            metadata([
                ("subject", classification.subject.label().into()),
                ("topic", classification.topic.clone().into()),
                ("confidence", classification.confidence.into()),
            ]),
            started.elapsed(),
        )?;

        // ── 2. Assess ───────────────────────────────────────────────
        self.state.transition(PipelineState::Assessing)?;
        let started = Instant::now();
        let log_id = self
            .state
            .start_log(Stage::Assessor, format!("Subject: {}", classification.subject));

        let assessment = match self.client.assess(question, &classification).await {
            Ok(a) => a,
            Err(e) => return self.abort(Stage::Assessor, log_id, started, e),
        };
        self.state.succeed_log(
            log_id,
            pretty_json(&assessment),
            metadata([
                ("difficulty", assessment.adjusted_difficulty.label().into()),
                ("grade", assessment.grade_level.clone().into()),
            ]),
            started.elapsed(),
        )?;

        // ── 3. Solve (streamed) ─────────────────────────────────────
        self.state.transition(PipelineState::Solving)?;
        let started = Instant::now();
        let log_id = self.state.start_log(Stage::Solver, SOLVER_INPUT);
        // Placeholder first so the front end has somewhere to render fragments.
        let message_id = self.state.append_message(MessageRole::Assistant, "");

        let mut fragments = match self.client.solve(question, &classification, &assessment).await {
            Ok(stream) => stream,
            Err(e) => return self.abort(Stage::Solver, log_id, started, e),
        };

        let mut solution = String::new();
        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(text) => {
                    solution.push_str(&text);
                    self.state.append_to_message(message_id, &text)?;
                }
                Err(e) => return self.abort(Stage::Solver, log_id, started, e),
            }
        }
        self.state.succeed_log(
            log_id,
            SOLVER_OUTPUT,
            metadata([("length", solution.chars().count().into())]),
            started.elapsed(),
        )?;

        // ── 4. Practice (non-fatal) ─────────────────────────────────
        self.state.transition(PipelineState::GeneratingPractice)?;
        let started = Instant::now();
        let log_id = self.state.start_log(Stage::Practice, PRACTICE_INPUT);

        let practice_failed = match self.client.practice(question, &solution).await {
            Ok(practice) => {
                let addition = format!("{PRACTICE_SEPARATOR}{practice}");
                self.state.append_to_message(message_id, &addition)?;
                self.state.succeed_log(
                    log_id,
                    PRACTICE_OUTPUT,
                    Metadata::new(),
                    started.elapsed(),
                )?;
                false
            }
            Err(e) if Stage::Practice.is_fatal_on_error() => {
                return self.abort(Stage::Practice, log_id, started, e);
            }
            Err(e) => {
                warn!(
                    error = %e,
                    kind = e.kind(),
                    "Practice generation failed, keeping solution as final answer"
                );
                self.state.fail_log(log_id, e.to_string(), started.elapsed())?;
                true
            }
        };

        // ── 5. Memory update ────────────────────────────────────────
        self.state.transition(PipelineState::UpdatingMemory)?;
        let started = Instant::now();
        let log_id = self.state.start_log(Stage::Memory, MEMORY_INPUT);
        let new_total = self.state.record_interaction();
        self.state.succeed_log(
            log_id,
            MEMORY_OUTPUT,
            metadata([("new_total", new_total.into())]),
            started.elapsed(),
        )?;
        self.state.transition(PipelineState::Idle)?;

        Ok(TurnOutcome::Completed {
            assistant_message_id: message_id,
            practice_failed,
        })
    }

    /// Record a fatal stage failure and stop the turn.
    fn abort(
        &mut self,
        stage: Stage,
        log_id: Uuid,
        started: Instant,
        err: StageError,
    ) -> Result<TurnOutcome> {
        error!(stage = %stage, kind = err.kind(), error = %err, "Stage failed");
        let error = err.to_string();
        self.state.fail_log(log_id, error.clone(), started.elapsed())?;
        self.state.reset_to_idle();
        Ok(TurnOutcome::Aborted { stage, error })
    }
}

fn pretty_json<T: Serialize + std::fmt::Debug>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_reason_serializes_state() {
        let json = serde_json::to_value(RejectReason::Busy(PipelineState::Solving)).unwrap();
        assert_eq!(json, serde_json::json!({"reason": "busy", "state": "solving"}));
    }

    #[test]
    fn only_completed_is_completed() {
        assert!(
            TurnOutcome::Completed {
                assistant_message_id: Uuid::new_v4(),
                practice_failed: true,
            }
            .is_completed()
        );
        assert!(!TurnOutcome::Rejected(RejectReason::EmptyQuestion).is_completed());
    }
}
