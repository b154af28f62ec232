//! Builder API for ergonomic statechart and machine construction.
//!
//! Definitions are usually loaded from YAML or JSON; the builders cover
//! programmatic construction and the validation that ties a statechart to
//! its guard evaluator and action dispatcher.

pub mod definition;
pub mod error;
pub mod machine;

pub use definition::{composite, orthogonal, region, DefinitionBuilder};
pub use error::BuildError;
pub use machine::MachineBuilder;
