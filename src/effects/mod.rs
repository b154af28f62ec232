//! Side-effecting shell around the statechart core.
//!
//! This module owns everything that changes over time:
//! - **Actions**: entry, exit and transition callbacks supplied by the domain
//! - **Configuration**: the versioned set of active states
//! - **Machine**: trigger processing, serialization of `fire`, publication
//!
//! Guards are evaluated and actions dispatched only from here; the core
//! stays free of side effects.

mod actions;
mod configuration;
mod machine;
mod outcome;

pub(crate) use configuration::ActiveConfiguration;

pub use actions::{ActionDispatcher, ActionError, ActionPhase, ActionRegistry, NoActions};
pub use configuration::ConfigurationSnapshot;
pub use machine::Machine;
pub use outcome::{CommittedTransition, FireError, TransitionOutcome};
