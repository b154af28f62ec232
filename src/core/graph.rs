//! Immutable state tree.
//!
//! Nodes are stored in document order (pre-order over the declaration).
//! That order is authoritative wherever the engine visits several regions
//! or leaves in turn.

use super::state::{StateId, StateKind, StateNode};
use std::collections::{BTreeSet, HashMap};

/// The containment hierarchy of a statechart.
///
/// Built once by the definition loader and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct StateGraph {
    nodes: Vec<StateNode>,
    index: HashMap<StateId, usize>,
    top_level: Vec<usize>,
    initial: usize,
}

impl StateGraph {
    /// Assemble a graph from already validated parts.
    pub(crate) fn from_parts(nodes: Vec<StateNode>, top_level: Vec<usize>, initial: usize) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();
        Self {
            nodes,
            index,
            top_level,
            initial,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&StateNode> {
        self.idx(id).map(|i| &self.nodes[i])
    }

    /// The declared root `initial` state.
    pub fn initial(&self) -> &StateId {
        &self.nodes[self.initial].id
    }

    /// All states in document order.
    pub fn states(&self) -> impl Iterator<Item = &StateNode> {
        self.nodes.iter()
    }

    /// All simple (leaf) states in document order.
    pub fn leaves(&self) -> impl Iterator<Item = &StateId> {
        self.nodes
            .iter()
            .filter(|n| n.is_simple())
            .map(|n| &n.id)
    }

    /// Top-level states, which form the exclusive root region.
    pub fn top_level(&self) -> impl Iterator<Item = &StateId> {
        self.top_level.iter().map(|&i| &self.nodes[i].id)
    }

    pub fn parent(&self, id: &str) -> Option<&StateId> {
        let i = self.idx(id)?;
        self.nodes[i].parent.map(|p| &self.nodes[p].id)
    }

    /// Direct children of a state across all of its regions.
    pub fn children(&self, id: &str) -> Vec<&StateId> {
        self.get(id)
            .map(|node| {
                node.regions()
                    .iter()
                    .flat_map(|r| r.children.iter())
                    .map(|&c| &self.nodes[c].id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Proper ancestors of a state, innermost first.
    pub fn ancestors(&self, id: &str) -> Vec<&StateId> {
        self.idx(id)
            .map(|i| self.ancestors_of(i).map(|a| &self.nodes[a].id).collect())
            .unwrap_or_default()
    }

    /// True when `id` is `ancestor` or nested somewhere below it.
    pub fn is_descendant_or_self(&self, id: &str, ancestor: &str) -> bool {
        match (self.idx(id), self.idx(ancestor)) {
            (Some(i), Some(a)) => self.within(i, a),
            _ => false,
        }
    }

    /// Lowest common proper ancestor of two states.
    ///
    /// `None` means the two states only meet at the root region.
    pub fn lca(&self, a: &str, b: &str) -> Option<&StateId> {
        let a = self.idx(a)?;
        let b = self.idx(b)?;
        self.lca_of(a, b).map(|i| &self.nodes[i].id)
    }

    pub(crate) fn idx(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn node(&self, idx: usize) -> &StateNode {
        &self.nodes[idx]
    }

    pub(crate) fn id_of(&self, idx: usize) -> &StateId {
        &self.nodes[idx].id
    }

    pub(crate) fn ancestors_of(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.nodes[idx].parent, move |&p| self.nodes[p].parent)
    }

    pub(crate) fn within(&self, idx: usize, ancestor: usize) -> bool {
        idx == ancestor || self.ancestors_of(idx).any(|a| a == ancestor)
    }

    pub(crate) fn lca_of(&self, a: usize, b: usize) -> Option<usize> {
        let above_a: BTreeSet<usize> = self.ancestors_of(a).collect();
        self.ancestors_of(b).find(|p| above_a.contains(p))
    }

    /// The ancestor-or-self of `target` that sits directly inside `scope`.
    pub(crate) fn child_toward(&self, scope: Option<usize>, target: usize) -> usize {
        let mut current = target;
        while self.nodes[current].parent != scope {
            match self.nodes[current].parent {
                Some(p) => current = p,
                None => break,
            }
        }
        current
    }

    /// Default entry: the state itself, then every region's initial child,
    /// recursively, outermost first.
    pub(crate) fn enter_default(&self, idx: usize, entered: &mut Vec<usize>) {
        entered.push(idx);
        if let StateKind::Composite { regions } = &self.nodes[idx].kind {
            for region in regions {
                self.enter_default(region.initial, entered);
            }
        }
    }

    /// Entry from `from` down to `target`, where `from` contains `target`.
    ///
    /// Regions of orthogonal composites on the way that do not lead to the
    /// target are entered by default, in declaration order.
    pub(crate) fn enter_toward(&self, from: usize, target: usize, entered: &mut Vec<usize>) {
        if from == target {
            self.enter_default(from, entered);
            return;
        }
        entered.push(from);
        let next = self.child_toward(Some(from), target);
        let path_region = self.nodes[next].region;
        for (r, region) in self.nodes[from].regions().iter().enumerate() {
            if r == path_region {
                self.enter_toward(next, target, entered);
            } else {
                self.enter_default(region.initial, entered);
            }
        }
    }

    /// Active states below and including `root`, innermost first.
    pub(crate) fn exit_order(&self, root: usize, active: &BTreeSet<usize>, exited: &mut Vec<usize>) {
        for region in self.nodes[root].regions() {
            if let Some(&child) = region.children.iter().find(|c| active.contains(c)) {
                self.exit_order(child, active, exited);
            }
        }
        exited.push(root);
    }

    /// Leaves of the configuration the machine starts in.
    pub(crate) fn initial_leaves(&self) -> Vec<usize> {
        let top = self.child_toward(None, self.initial);
        let mut entered = Vec::new();
        self.enter_toward(top, self.initial, &mut entered);
        let mut leaves: Vec<usize> = entered
            .into_iter()
            .filter(|&i| self.nodes[i].is_simple())
            .collect();
        leaves.sort_unstable();
        leaves
    }

    /// Leaves plus all their ancestors.
    pub(crate) fn closure(&self, leaves: &[usize]) -> BTreeSet<usize> {
        let mut active = BTreeSet::new();
        for &leaf in leaves {
            active.insert(leaf);
            active.extend(self.ancestors_of(leaf));
        }
        active
    }

    /// Whether `leaves` describe a configuration the engine could reach:
    /// one active state in the root region and one active child in every
    /// region of every active composite.
    pub(crate) fn is_legal(&self, leaves: &[usize]) -> bool {
        if leaves.iter().any(|&l| !self.nodes[l].is_simple()) {
            return false;
        }
        let distinct: BTreeSet<usize> = leaves.iter().copied().collect();
        if distinct.len() != leaves.len() {
            return false;
        }
        let active = self.closure(leaves);
        let top_active = self.top_level.iter().filter(|t| active.contains(t)).count();
        if top_active != 1 {
            return false;
        }
        active.iter().all(|&i| {
            self.nodes[i].regions().iter().all(|region| {
                region.children.iter().filter(|c| active.contains(c)).count() == 1
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::definition::Statechart;

    const NESTED: &str = r#"
initial: parked
states:
  - parked
  - name: working
    children:
      - scheduling
      - name: visiting
        regions:
          - name: camera
            children: [exposing, analyzing]
          - name: mount
            children: [tracking, correcting]
"#;

    fn chart() -> Statechart {
        Statechart::from_yaml_str(NESTED).unwrap()
    }

    #[test]
    fn leaves_and_top_level_follow_document_order() {
        let chart = chart();
        let graph = chart.graph();
        let leaves: Vec<&str> = graph.leaves().map(|s| s.as_str()).collect();
        assert_eq!(
            leaves,
            vec!["parked", "scheduling", "exposing", "analyzing", "tracking", "correcting"]
        );
        let top: Vec<&str> = graph.top_level().map(|s| s.as_str()).collect();
        assert_eq!(top, vec!["parked", "working"]);
    }

    #[test]
    fn ancestors_are_innermost_first() {
        let chart = chart();
        let graph = chart.graph();
        let names: Vec<&str> = graph
            .ancestors("exposing")
            .into_iter()
            .map(|s| s.as_str())
            .collect();
        assert_eq!(names, vec!["visiting", "working"]);
        assert!(graph.ancestors("parked").is_empty());
    }

    #[test]
    fn lca_is_a_proper_ancestor() {
        let chart = chart();
        let graph = chart.graph();
        assert_eq!(graph.lca("exposing", "tracking").unwrap(), "visiting");
        assert_eq!(graph.lca("scheduling", "tracking").unwrap(), "working");
        assert_eq!(graph.lca("visiting", "tracking").unwrap(), "working");
        assert!(graph.lca("parked", "scheduling").is_none());
    }

    #[test]
    fn default_entry_covers_every_region() {
        let chart = chart();
        let graph = chart.graph();
        let idx = graph.idx("working").unwrap();
        let mut entered = Vec::new();
        graph.enter_default(idx, &mut entered);
        let names: Vec<&str> = entered.iter().map(|&i| graph.id_of(i).as_str()).collect();
        assert_eq!(names, vec!["working", "scheduling"]);

        let idx = graph.idx("visiting").unwrap();
        let mut entered = Vec::new();
        graph.enter_default(idx, &mut entered);
        let names: Vec<&str> = entered.iter().map(|&i| graph.id_of(i).as_str()).collect();
        assert_eq!(names, vec!["visiting", "exposing", "tracking"]);
    }

    #[test]
    fn targeted_entry_fills_sibling_regions_by_default() {
        let chart = chart();
        let graph = chart.graph();
        let from = graph.idx("working").unwrap();
        let target = graph.idx("correcting").unwrap();
        let mut entered = Vec::new();
        graph.enter_toward(from, target, &mut entered);
        let names: Vec<&str> = entered.iter().map(|&i| graph.id_of(i).as_str()).collect();
        assert_eq!(names, vec!["working", "visiting", "exposing", "correcting"]);
    }

    #[test]
    fn legality_requires_one_child_per_region() {
        let chart = chart();
        let graph = chart.graph();
        let ids = |names: &[&str]| -> Vec<usize> {
            let mut v: Vec<usize> = names.iter().map(|n| graph.idx(n).unwrap()).collect();
            v.sort_unstable();
            v
        };
        assert!(graph.is_legal(&ids(&["parked"])));
        assert!(graph.is_legal(&ids(&["analyzing", "tracking"])));
        assert!(!graph.is_legal(&ids(&["analyzing"])));
        assert!(!graph.is_legal(&ids(&["parked", "scheduling"])));
        assert!(!graph.is_legal(&ids(&["working"])));
        assert!(!graph.is_legal(&[]));
    }

    #[test]
    fn initial_leaves_descend_into_composites() {
        let chart = Statechart::from_yaml_str(
            r#"
initial: working
states:
  - parked
  - name: working
    children: [scheduling, slewing]
"#,
        )
        .unwrap();
        let graph = chart.graph();
        let leaves = graph.initial_leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(graph.id_of(leaves[0]), "scheduling");
    }
}
