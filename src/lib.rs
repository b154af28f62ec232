//! Skyward: a hierarchical state machine engine
//!
//! Skyward interprets declarative statecharts: a tree of simple and
//! composite states, orthogonal regions that are active together, and
//! guarded transitions between them. The statechart itself is immutable
//! data loaded once at startup; guards and actions are supplied by the
//! host and the machine sequences them.
//!
//! # Core Concepts
//!
//! - **Statechart**: validated state graph and transition table, see [`definition`]
//! - **Guards**: named predicates answered by a [`GuardEvaluator`]
//! - **Actions**: entry, exit and transition callbacks run by an [`ActionDispatcher`]
//! - **Machine**: processes triggers and publishes versioned configurations
//! - **History**: bounded record of committed transitions
//!
//! # Example
//!
//! ```rust
//! use skyward::builder::MachineBuilder;
//! use skyward::core::GuardRegistry;
//! use skyward::definition::Statechart;
//! use skyward::effects::NoActions;
//!
//! struct Mount {
//!     has_target: bool,
//! }
//!
//! let chart = Statechart::from_yaml_str(r#"
//! initial: parked
//! states:
//!   - parked
//!   - name: working
//!     children: [scheduling, slewing]
//! transitions:
//!   - { source: parked, dest: working, trigger: schedule }
//!   - { source: scheduling, dest: slewing, trigger: visit, conditions: has_target }
//!   - { source: working, dest: parked, trigger: park }
//! "#).unwrap();
//!
//! let machine = MachineBuilder::new()
//!     .statechart(chart)
//!     .guards(GuardRegistry::new().register("has_target", |m: &Mount| m.has_target))
//!     .actions(NoActions)
//!     .build()
//!     .unwrap();
//!
//! let mount = Mount { has_target: true };
//! machine.fire("schedule", &mount).unwrap();
//! machine.fire("visit", &mount).unwrap();
//! assert!(machine.in_state("slewing"));
//! assert!(machine.in_state("working"));
//!
//! machine.fire("park", &mount).unwrap();
//! assert_eq!(machine.active_leaves(), vec!["parked"]);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod definition;
pub mod effects;

// Re-export commonly used types
pub use builder::{BuildError, DefinitionBuilder, MachineBuilder};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use config::MachineOptions;
pub use core::{GuardEvaluator, GuardRegistry, StateId, Transition};
pub use definition::{Definition, MalformedGraphError, Statechart};
pub use effects::{ActionDispatcher, ActionRegistry, FireError, Machine, TransitionOutcome};
