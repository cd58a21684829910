//! The five stages of a turn, with their trace labels.

use serde::{Deserialize, Serialize};

/// A pipeline stage. Declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classifier,
    Assessor,
    Solver,
    Practice,
    Memory,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 5] = [
        Stage::Classifier,
        Stage::Assessor,
        Stage::Solver,
        Stage::Practice,
        Stage::Memory,
    ];

    /// Name shown on the trace panel.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Classifier => "AGENT 1: SUBJECT CLASSIFIER",
            Self::Assessor => "AGENT 2: DIFFICULTY ASSESSOR",
            Self::Solver => "AGENT 3: SOLUTION GENERATOR",
            Self::Practice => "AGENT 4: PRACTICE GENERATOR",
            Self::Memory => "MEMORY SYSTEM",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Classifier => "🔍",
            Self::Assessor => "📊",
            Self::Solver => "✏️",
            Self::Practice => "📝",
            Self::Memory => "🧠",
        }
    }

    /// Whether a failure in this stage stops the rest of the turn.
    pub fn is_fatal_on_error(&self) -> bool {
        matches!(self, Self::Classifier | Self::Assessor | Self::Solver)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
