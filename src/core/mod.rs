//! Core statechart types and lookups.
//!
//! This module holds the immutable parts of the engine:
//! - State identifiers and the containment tree
//! - The transition table and its most-specific-first lookup
//! - Guard predicates and the evaluator seam
//! - Bounded transition history
//!
//! Nothing here performs side effects; those live in `effects`.

mod graph;
mod guard;
mod history;
mod state;
mod table;

pub(crate) use guard::all_hold;

pub use graph::StateGraph;
pub use guard::{Guard, GuardError, GuardEvaluator, GuardRegistry};
pub use history::{TransitionHistory, TransitionRecord};
pub use state::{Region, StateId, StateKind, StateNode};
pub use table::{Transition, TransitionTable};
