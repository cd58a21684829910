//! Homework Helper: a four-agent homework pipeline over a hosted LLM.

pub mod agents;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod render;
pub mod session;
