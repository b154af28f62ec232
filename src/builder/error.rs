//! Errors raised while assembling a machine.

use crate::definition::MalformedGraphError;
use thiserror::Error;

/// Errors that can occur when building definitions and machines.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Statechart not specified. Call .statechart(chart) or .definition(doc) before .build()")]
    MissingStatechart,

    #[error("Guards referenced by the statechart are not provided: {}", .0.join(", "))]
    UnknownGuards(Vec<String>),

    #[error("Actions registered for undeclared states: {}", .0.join(", "))]
    UnknownActionStates(Vec<String>),

    #[error(transparent)]
    Malformed(#[from] MalformedGraphError),
}
