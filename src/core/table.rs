//! Transition lookup by (state, trigger).

use super::graph::StateGraph;
use super::state::StateId;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// A declared transition.
///
/// Guards are ANDed and evaluated left to right. An empty guard list makes
/// the transition unconditional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub source: StateId,
    pub dest: StateId,
    pub trigger: String,
    pub guards: Vec<String>,
    /// Position in the definition document.
    pub order: usize,
    #[serde(skip)]
    pub(crate) source_idx: usize,
    #[serde(skip)]
    pub(crate) dest_idx: usize,
}

impl Transition {
    pub fn is_unconditional(&self) -> bool {
        self.guards.is_empty()
    }

    pub fn is_self_transition(&self) -> bool {
        self.source_idx == self.dest_idx
    }
}

/// Index of transitions keyed by source state and trigger.
#[derive(Clone, Debug, Default)]
pub struct TransitionTable {
    transitions: Vec<Transition>,
    by_source: HashMap<usize, HashMap<String, Vec<usize>>>,
}

impl TransitionTable {
    /// Index transitions that have already been resolved against a graph.
    pub(crate) fn new(transitions: Vec<Transition>) -> Self {
        let mut by_source: HashMap<usize, HashMap<String, Vec<usize>>> = HashMap::new();
        for (i, t) in transitions.iter().enumerate() {
            by_source
                .entry(t.source_idx)
                .or_default()
                .entry(t.trigger.clone())
                .or_default()
                .push(i);
        }
        Self {
            transitions,
            by_source,
        }
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// All transitions in declaration order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Every trigger named by at least one transition.
    pub fn triggers(&self) -> BTreeSet<&str> {
        self.transitions.iter().map(|t| t.trigger.as_str()).collect()
    }

    /// Every guard named by at least one transition.
    pub fn guard_names(&self) -> BTreeSet<&str> {
        self.transitions
            .iter()
            .flat_map(|t| t.guards.iter().map(String::as_str))
            .collect()
    }

    /// Candidate transitions for `trigger` while `state` is active.
    ///
    /// Transitions declared on `state` come first, then those of its
    /// parent, and so on up to the root. Within one state, declaration
    /// order is kept. Unknown states have no candidates.
    pub fn lookup<'a>(&'a self, graph: &StateGraph, state: &str, trigger: &str) -> Vec<&'a Transition> {
        match graph.idx(state) {
            Some(idx) => self
                .candidates(graph, idx, trigger)
                .into_iter()
                .map(|i| &self.transitions[i])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Indices of the candidates for `trigger`, most specific source first.
    pub(crate) fn candidates(&self, graph: &StateGraph, leaf: usize, trigger: &str) -> Vec<usize> {
        std::iter::once(leaf)
            .chain(graph.ancestors_of(leaf))
            .filter_map(|s| self.by_source.get(&s).and_then(|m| m.get(trigger)))
            .flatten()
            .copied()
            .collect()
    }

    pub(crate) fn get(&self, idx: usize) -> &Transition {
        &self.transitions[idx]
    }
}
