//! The set of active states.

use crate::core::{StateGraph, StateId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Active leaves of a machine, one per active region, in document order.
///
/// A configuration is a value: `fire` works on a clone and the machine
/// publishes the clone only once every action of the call succeeded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ActiveConfiguration {
    version: u64,
    leaves: Vec<usize>,
}

impl ActiveConfiguration {
    pub(crate) fn initial(graph: &StateGraph) -> Self {
        Self {
            version: 0,
            leaves: graph.initial_leaves(),
        }
    }

    pub(crate) fn from_leaves(version: u64, mut leaves: Vec<usize>) -> Self {
        leaves.sort_unstable();
        Self { version, leaves }
    }

    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn leaves(&self) -> &[usize] {
        &self.leaves
    }

    pub(crate) fn contains_leaf(&self, leaf: usize) -> bool {
        self.leaves.binary_search(&leaf).is_ok()
    }

    /// Leaves plus their ancestors.
    pub(crate) fn active(&self, graph: &StateGraph) -> BTreeSet<usize> {
        graph.closure(&self.leaves)
    }

    /// Replace every leaf inside `root` with `entered` leaves.
    pub(crate) fn replace_within(&mut self, graph: &StateGraph, root: usize, entered: &[usize]) {
        self.leaves.retain(|&leaf| !graph.within(leaf, root));
        self.leaves.extend(
            entered
                .iter()
                .copied()
                .filter(|&i| graph.node(i).is_simple()),
        );
        self.leaves.sort_unstable();
        self.leaves.dedup();
    }

    pub(crate) fn bump(&mut self) {
        self.version += 1;
    }

    pub(crate) fn snapshot(&self, graph: &StateGraph) -> ConfigurationSnapshot {
        ConfigurationSnapshot {
            version: self.version,
            leaves: self
                .leaves
                .iter()
                .map(|&i| graph.id_of(i).clone())
                .collect(),
        }
    }
}

/// Serializable view of an active configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSnapshot {
    /// Incremented by every `fire` call that commits at least one transition
    pub version: u64,
    /// Active leaves in document order
    pub leaves: Vec<StateId>,
}

impl ConfigurationSnapshot {
    pub fn contains(&self, state: &str) -> bool {
        self.leaves.iter().any(|leaf| leaf == state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Statechart;

    fn chart() -> Statechart {
        Statechart::from_yaml_str(
            r#"
initial: visiting
states:
  - parked
  - name: visiting
    regions:
      - name: camera
        children: [exposing, analyzing]
      - name: mount
        children: [tracking, correcting]
"#,
        )
        .unwrap()
    }

    #[test]
    fn initial_configuration_has_one_leaf_per_region() {
        let chart = chart();
        let config = ActiveConfiguration::initial(chart.graph());
        let snapshot = config.snapshot(chart.graph());
        assert_eq!(snapshot.version, 0);
        assert_eq!(snapshot.leaves, vec!["exposing", "tracking"]);
        assert!(snapshot.contains("tracking"));
        assert!(!snapshot.contains("visiting"));
    }

    #[test]
    fn replace_within_only_touches_the_subtree() {
        let chart = chart();
        let graph = chart.graph();
        let mut config = ActiveConfiguration::initial(graph);
        let exposing = graph.idx("exposing").unwrap();
        let analyzing = graph.idx("analyzing").unwrap();

        config.replace_within(graph, exposing, &[analyzing]);

        assert!(config.contains_leaf(analyzing));
        assert!(!config.contains_leaf(exposing));
        assert!(config.contains_leaf(graph.idx("tracking").unwrap()));
        assert_eq!(config.leaves().len(), 2);
    }

    #[test]
    fn active_includes_ancestors() {
        let chart = chart();
        let graph = chart.graph();
        let config = ActiveConfiguration::initial(graph);
        let active: Vec<&str> = config
            .active(graph)
            .into_iter()
            .map(|i| graph.id_of(i).as_str())
            .collect();
        assert_eq!(active, vec!["visiting", "exposing", "tracking"]);
    }
}
