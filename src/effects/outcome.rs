//! Results and errors of `fire`.

use super::actions::{ActionError, ActionPhase};
use crate::core::StateId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One transition committed by a `fire` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedTransition {
    pub trigger: String,
    /// State the transition is declared on
    pub source: StateId,
    pub dest: StateId,
    /// Exited states, innermost first
    pub exited: Vec<StateId>,
    /// Entered states, outermost first
    pub entered: Vec<StateId>,
}

/// Terminal outcome of a `fire` call that did not fail.
///
/// Unhandled and rejected triggers are normal results, not errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// At least one region committed a transition.
    Committed {
        transitions: Vec<CommittedTransition>,
        /// Active leaves whose candidates were all rejected by guards
        rejected: Vec<StateId>,
        /// Version of the configuration now published
        version: u64,
    },
    /// Candidates existed but every guard list failed.
    GuardsNotSatisfied { rejected: Vec<StateId> },
    /// No active state handles the trigger.
    NoMatchingTransition,
}

impl TransitionOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    pub fn transitions(&self) -> &[CommittedTransition] {
        match self {
            Self::Committed { transitions, .. } => transitions,
            _ => &[],
        }
    }
}

/// Failures of a `fire` call. The active configuration is unchanged.
#[derive(Debug, Error)]
pub enum FireError {
    #[error("Guard '{guard}' is unknown (trigger '{trigger}')")]
    UnknownGuard { guard: String, trigger: String },

    #[error("{phase} action for '{state}' failed during '{trigger}': {source}")]
    ActionFailed {
        trigger: String,
        phase: ActionPhase,
        state: StateId,
        #[source]
        source: ActionError,
    },

    #[error("fire('{trigger}') called from inside a guard or action")]
    ReentrantFire { trigger: String },
}
