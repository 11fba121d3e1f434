//! Orchestration lifecycle state machine

use chrono::Utc;
use mission_types::{MissionPhase, PhaseTransition};

use super::MissionError;

/// Tracks where a run is and every phase it has entered, with timestamps
#[derive(Debug, Clone)]
pub struct MissionState {
    phase: MissionPhase,
    transitions: Vec<PhaseTransition>,
}

impl Default for MissionState {
    fn default() -> Self {
        Self::new()
    }
}

impl MissionState {
    /// A run starts in `received`
    pub fn new() -> Self {
        Self {
            phase: MissionPhase::Received,
            transitions: vec![PhaseTransition {
                phase: MissionPhase::Received,
                at: Utc::now(),
            }],
        }
    }

    pub fn phase(&self) -> MissionPhase {
        self.phase
    }

    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }

    pub fn into_transitions(self) -> Vec<PhaseTransition> {
        self.transitions
    }

    /// Move to `next` if the lifecycle allows it and return the recorded transition
    pub fn advance(&mut self, next: MissionPhase) -> Result<PhaseTransition, MissionError> {
        if !Self::can_transition(self.phase, next) {
            return Err(MissionError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        let transition = PhaseTransition {
            phase: next,
            at: Utc::now(),
        };
        self.phase = next;
        self.transitions.push(transition.clone());
        Ok(transition)
    }

    pub fn can_transition(from: MissionPhase, to: MissionPhase) -> bool {
        use MissionPhase::*;
        matches!(
            (from, to),
            (Received, Analyzing)
                | (Analyzing, Dispatching)
                | (Dispatching, Synthesizing)
                | (Synthesizing, Completed)
                | (Received | Analyzing | Dispatching | Synthesizing, Cancelled)
        )
    }
}
