//! Stage client: one method per model-backed stage.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::error::StageError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::stage::Stage;

use super::prompts::{
    ASSESSOR_SYSTEM_PROMPT, CLASSIFIER_SYSTEM_PROMPT, PRACTICE_FALLBACK, PRACTICE_SYSTEM_PROMPT,
    SOLVER_SYSTEM_PROMPT, build_assessor_prompt, build_classifier_prompt, build_practice_prompt,
    build_solver_prompt,
};
use super::types::{AssessorResult, ClassifierResult};

/// Temperature for the structured stages (deterministic-ish).
const STRUCTURED_TEMPERATURE: f32 = 0.1;

/// Solution fragments, in arrival order. Consumed exactly once.
pub type FragmentStream =
    std::pin::Pin<Box<dyn futures::Stream<Item = Result<String, StageError>> + Send>>;

/// Invokes the hosted model for each stage and shapes the results.
pub struct StageClient {
    llm: Arc<dyn LlmProvider>,
}

impl StageClient {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Stage 1: detect subject, topic and subtopic.
    pub async fn classify(&self, question: &str) -> Result<ClassifierResult, StageError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(CLASSIFIER_SYSTEM_PROMPT),
            ChatMessage::user(build_classifier_prompt(question)),
        ])
        .with_json_schema(ClassifierResult::schema())
        .with_temperature(STRUCTURED_TEMPERATURE);

        let raw = self.complete_text(Stage::Classifier, request).await?;
        let result = ClassifierResult::parse(&raw).map_err(|reason| {
            warn!(raw_response = %raw, error = %reason, "Classifier output rejected");
            StageError::Parse {
                stage: Stage::Classifier,
                reason,
            }
        })?;

        info!(
            subject = %result.subject,
            topic = %result.topic,
            confidence = result.confidence,
            "Question classified"
        );
        Ok(result)
    }

    /// Stage 2: judge difficulty and grade level.
    pub async fn assess(
        &self,
        question: &str,
        classification: &ClassifierResult,
    ) -> Result<AssessorResult, StageError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(ASSESSOR_SYSTEM_PROMPT),
            ChatMessage::user(build_assessor_prompt(question, classification)),
        ])
        .with_json_schema(AssessorResult::schema())
        .with_temperature(STRUCTURED_TEMPERATURE);

        let raw = self.complete_text(Stage::Assessor, request).await?;
        let result = AssessorResult::parse(&raw).map_err(|reason| {
            warn!(raw_response = %raw, error = %reason, "Assessor output rejected");
            StageError::Parse {
                stage: Stage::Assessor,
                reason,
            }
        })?;

        info!(
            difficulty = %result.adjusted_difficulty,
            grade = %result.grade_level,
            "Difficulty assessed"
        );
        Ok(result)
    }

    /// Stage 3: open the streamed step-by-step solution.
    pub async fn solve(
        &self,
        question: &str,
        classification: &ClassifierResult,
        assessment: &AssessorResult,
    ) -> Result<FragmentStream, StageError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(SOLVER_SYSTEM_PROMPT),
            ChatMessage::user(build_solver_prompt(question, classification, assessment)),
        ]);

        let stream = self.llm.complete_stream(request).await?;
        debug!(model = self.llm.model_name(), "Solution stream opened");
        Ok(Box::pin(stream.map(|item| item.map_err(StageError::from))))
    }

    /// Stage 4: practice problems. Empty output becomes a fixed placeholder.
    pub async fn practice(&self, question: &str, solution: &str) -> Result<String, StageError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(PRACTICE_SYSTEM_PROMPT),
            ChatMessage::user(build_practice_prompt(question, solution)),
        ]);

        let response = self.llm.complete(request).await?;
        if response.content.trim().is_empty() {
            warn!("Practice generator returned no text, using placeholder");
            return Ok(PRACTICE_FALLBACK.to_string());
        }
        Ok(response.content)
    }

    async fn complete_text(
        &self,
        stage: Stage,
        request: CompletionRequest,
    ) -> Result<String, StageError> {
        let response = self.llm.complete(request).await?;
        debug!(
            stage = %stage,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Stage response received"
        );
        if response.content.trim().is_empty() {
            return Err(StageError::EmptyResponse { stage });
        }
        Ok(response.content)
    }
}
