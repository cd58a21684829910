//! Student profile: the session's "memory".
//!
//! Only `total_questions` is maintained by the pipeline. `subjects` is part
//! of the profile shape and rendered, but no update rule is defined for it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agents::types::Difficulty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MasteryLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// Per-subject statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStats {
    pub questions_asked: u32,
    pub mastery_level: MasteryLevel,
    pub last_difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: String,
    pub name: String,
    pub learning_style: String,
    pub total_questions: u64,
    #[serde(default)]
    pub subjects: BTreeMap<String, SubjectStats>,
}

impl StudentProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, learning_style: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            learning_style: learning_style.into(),
            total_questions: 0,
            subjects: BTreeMap::new(),
        }
    }

    /// Count one completed interaction. Returns the new total.
    pub fn record_interaction(&mut self) -> u64 {
        self.total_questions += 1;
        self.total_questions
    }
}

impl Default for StudentProfile {
    fn default() -> Self {
        Self::new("Demo_Student_001", "Alex", "Visual")
    }
}
