//! The homework pipeline.
//!
//! Every accepted question flows through:
//! 1. `StageClient::classify()`: subject, topic, confidence
//! 2. `StageClient::assess()`: difficulty and grade level
//! 3. `StageClient::solve()`: streamed step-by-step markdown
//! 4. `StageClient::practice()`: three practice problems
//! 5. Profile update
//!
//! **One turn at a time.** Submissions are refused unless the pipeline is idle.

pub mod events;
pub mod orchestrator;
pub mod stage;
pub mod state;
pub mod trace;

pub use events::PipelineEvent;
pub use orchestrator::{Orchestrator, RejectReason, TurnOutcome};
pub use stage::Stage;
pub use state::PipelineState;
pub use trace::{MetaValue, Metadata, StageLogEntry, StageStatus, TraceLog};
