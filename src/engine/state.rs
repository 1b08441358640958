use serde::{Deserialize, Serialize};

/// Pipeline execution states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineState {
    /// Built, first action not yet activated
    #[default]
    Idle,
    Running,
    /// Paused without tearing the current action down
    Suspended,
    Finished,
    Aborted,
}

impl PipelineState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: PipelineState) -> bool {
        use PipelineState::*;

        matches!(
            (self, target),
            // From Idle
            (Idle, Running) |
            (Idle, Aborted) |

            // From Running
            (Running, Suspended) |
            (Running, Finished) |
            (Running, Aborted) |

            // From Suspended
            (Suspended, Running) |
            (Suspended, Aborted)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Aborted)
    }

    /// Get human-readable state name
    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Suspended => "Suspended",
            Self::Finished => "Finished",
            Self::Aborted => "Aborted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(PipelineState::Idle.can_transition_to(PipelineState::Running));
        assert!(!PipelineState::Running.can_transition_to(PipelineState::Idle));
    }

    #[test]
    fn test_running_to_suspended() {
        assert!(PipelineState::Running.can_transition_to(PipelineState::Suspended));
        assert!(PipelineState::Suspended.can_transition_to(PipelineState::Running));
        assert!(!PipelineState::Suspended.can_transition_to(PipelineState::Finished));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for target in [
            PipelineState::Idle,
            PipelineState::Running,
            PipelineState::Suspended,
            PipelineState::Finished,
            PipelineState::Aborted,
        ] {
            assert!(!PipelineState::Finished.can_transition_to(target));
            assert!(!PipelineState::Aborted.can_transition_to(target));
        }
        assert!(PipelineState::Aborted.is_terminal());
        assert!(!PipelineState::Suspended.is_terminal());
    }
}
