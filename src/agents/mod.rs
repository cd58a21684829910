//! The model-backed agents: prompts, structured results, and the stage client.

pub mod client;
pub mod json;
pub mod prompts;
pub mod types;

pub use client::{FragmentStream, StageClient};
pub use types::{AssessorResult, ClassifierResult, Difficulty, Subject};
