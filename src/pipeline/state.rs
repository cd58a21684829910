//! Pipeline state machine: which step of a turn is running.

use serde::{Deserialize, Serialize};

/// The step the pipeline is on.
///
/// Progresses linearly: Idle → Classifying → Assessing → Solving →
/// GeneratingPractice → UpdatingMemory → Idle. Any busy state may also
/// drop straight back to Idle when a fatal stage error aborts the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Idle,
    Classifying,
    Assessing,
    Solving,
    GeneratingPractice,
    UpdatingMemory,
}

impl PipelineState {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: PipelineState) -> bool {
        use PipelineState::*;
        if target == Idle {
            return *self != Idle;
        }
        self.next() == Some(target)
    }

    /// Get the next state in the linear progression.
    pub fn next(&self) -> Option<PipelineState> {
        use PipelineState::*;
        match self {
            Idle => Some(Classifying),
            Classifying => Some(Assessing),
            Assessing => Some(Solving),
            Solving => Some(GeneratingPractice),
            GeneratingPractice => Some(UpdatingMemory),
            UpdatingMemory => Some(Idle),
        }
    }

    /// Whether a new submission can be accepted.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Progress line shown while the step runs.
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Classifying => "Agent 1: Classifying Subject...",
            Self::Assessing => "Agent 2: Assessing Difficulty...",
            Self::Solving => "Agent 3: Generating Solution...",
            Self::GeneratingPractice => "Agent 4: Creating Practice Problems...",
            Self::UpdatingMemory => "System: Updating Student Profile...",
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Classifying => "classifying",
            Self::Assessing => "assessing",
            Self::Solving => "solving",
            Self::GeneratingPractice => "generating_practice",
            Self::UpdatingMemory => "updating_memory",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineState::*;

    #[test]
    fn linear_progression_is_valid() {
        let mut state = Idle;
        let mut visited = vec![state];
        loop {
            let next = state.next().unwrap();
            assert!(state.can_transition_to(next), "{state} -> {next}");
            state = next;
            if state == Idle {
                break;
            }
            visited.push(state);
        }
        assert_eq!(
            visited,
            vec![Idle, Classifying, Assessing, Solving, GeneratingPractice, UpdatingMemory]
        );
    }

    #[test]
    fn any_busy_state_can_abort_to_idle() {
        for state in [Classifying, Assessing, Solving, GeneratingPractice, UpdatingMemory] {
            assert!(state.can_transition_to(Idle));
        }
        assert!(!Idle.can_transition_to(Idle));
    }

    #[test]
    fn skipping_steps_is_invalid() {
        assert!(!Idle.can_transition_to(Solving));
        assert!(!Classifying.can_transition_to(Solving));
        assert!(!Solving.can_transition_to(Assessing));
    }

    #[test]
    fn display_matches_serde() {
        for state in [Idle, GeneratingPractice, UpdatingMemory] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }

    #[test]
    fn only_idle_is_idle() {
        assert!(Idle.is_idle());
        assert!(!Solving.is_idle());
        assert_eq!(Idle.status_label(), "Ready");
    }
}
