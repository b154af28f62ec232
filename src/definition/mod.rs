//! Statechart definitions and their loader.
//!
//! A [`Statechart`] is the validated, immutable pair of state graph and
//! transition table built from a [`Definition`] document. It is created
//! once at startup and shared by every machine running it.

mod document;
mod error;
mod loader;

pub use document::{Conditions, Definition, Format, NodeDecl, RegionDecl, StateDecl, TransitionDecl};
pub use error::{GraphProblem, MalformedGraphError};

use crate::core::{StateGraph, Transition, TransitionTable};
use std::path::Path;

/// Validated state graph and transition table.
///
/// # Example
///
/// ```rust
/// use skyward::definition::Statechart;
///
/// let chart = Statechart::from_yaml_str(r#"
/// initial: shutdown
/// states: [shutdown, initialize, parked]
/// transitions:
///   - { source: shutdown, dest: initialize, trigger: get_ready }
///   - { source: initialize, dest: parked, trigger: wakeup, conditions: initialize }
/// "#).unwrap();
///
/// assert_eq!(chart.graph().initial(), "shutdown");
/// assert_eq!(chart.lookup("initialize", "wakeup")[0].guards, vec!["initialize"]);
/// ```
#[derive(Clone, Debug)]
pub struct Statechart {
    graph: StateGraph,
    table: TransitionTable,
}

impl Statechart {
    pub fn from_definition(definition: &Definition) -> Result<Self, MalformedGraphError> {
        let (graph, table) = loader::load(definition)?;
        Ok(Self { graph, table })
    }

    pub fn from_str_as(text: &str, format: Format) -> Result<Self, MalformedGraphError> {
        Self::from_definition(&Definition::from_str_as(text, format)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, MalformedGraphError> {
        Self::from_str_as(text, Format::Yaml)
    }

    pub fn from_json_str(text: &str) -> Result<Self, MalformedGraphError> {
        Self::from_str_as(text, Format::Json)
    }

    /// Load a `.yaml`, `.yml` or `.json` definition file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MalformedGraphError> {
        Self::from_definition(&Definition::from_path(path.as_ref())?)
    }

    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Candidate transitions for `trigger` while `state` is active,
    /// most specific first.
    pub fn lookup(&self, state: &str, trigger: &str) -> Vec<&Transition> {
        self.table.lookup(&self.graph, state, trigger)
    }
}

impl TryFrom<&Definition> for Statechart {
    type Error = MalformedGraphError;

    fn try_from(definition: &Definition) -> Result<Self, Self::Error> {
        Self::from_definition(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_and_yaml_load_the_same_chart() {
        let yaml = Statechart::from_yaml_str(
            "initial: parked\nstates: [parked, sleeping]\ntransitions:\n  - { source: parked, dest: sleeping, trigger: sleep }\n",
        )
        .unwrap();
        let json = Statechart::from_json_str(
            r#"{"initial": "parked", "states": ["parked", "sleeping"],
                "transitions": [{"source": "parked", "dest": "sleeping", "trigger": "sleep"}]}"#,
        )
        .unwrap();

        assert_eq!(yaml.graph().len(), json.graph().len());
        assert_eq!(yaml.table().transitions(), json.table().transitions());
    }

    #[test]
    fn parse_errors_are_malformed_graph_errors() {
        let result = Statechart::from_yaml_str("initial: [not, a, name]\nstates: []\n");
        assert!(matches!(result, Err(MalformedGraphError::Parse(_))));
    }
}
