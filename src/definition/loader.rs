//! Turns a definition document into an immutable graph and table.
//!
//! Validation uses `Validation` so a document with several mistakes is
//! reported in one pass.

use super::document::{Definition, NodeDecl, RegionDecl, StateDecl};
use super::error::{GraphProblem, MalformedGraphError};
use crate::core::{Region, StateGraph, StateId, StateKind, StateNode, Transition, TransitionTable};
use std::collections::{HashMap, HashSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<GraphProblem>>;

const ROOT: &str = "<root>";

fn require(ok: bool, problem: impl FnOnce() -> GraphProblem) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(problem())
    }
}

/// Flattens the nested declaration into document-ordered nodes.
struct Flattener {
    nodes: Vec<StateNode>,
    seen: HashMap<String, usize>,
    checks: Vec<Check>,
}

impl Flattener {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            seen: HashMap::new(),
            checks: Vec::new(),
        }
    }

    fn check(&mut self, ok: bool, problem: impl FnOnce() -> GraphProblem) {
        self.checks.push(require(ok, problem));
    }

    fn declare(
        &mut self,
        decl: &StateDecl,
        parent: Option<usize>,
        region: usize,
        depth: usize,
    ) -> Option<usize> {
        let name = decl.name();
        let parent_name = parent.map_or(ROOT, |p| self.nodes[p].id.as_str()).to_string();
        self.check(!name.is_empty(), || GraphProblem::EmptyName {
            parent: parent_name,
        });
        if name.is_empty() {
            return None;
        }
        let unique = !self.seen.contains_key(name);
        self.check(unique, || GraphProblem::DuplicateState(name.to_string()));
        if !unique {
            return None;
        }

        let idx = self.nodes.len();
        self.seen.insert(name.to_string(), idx);
        self.nodes.push(StateNode {
            id: StateId::new(name),
            parent,
            region,
            depth,
            kind: StateKind::Simple,
        });

        if let StateDecl::Node(node) = decl {
            let regions = self.composite(node, idx, depth + 1);
            if !regions.is_empty() {
                self.nodes[idx].kind = StateKind::Composite { regions };
            }
        }
        Some(idx)
    }

    fn composite(&mut self, node: &NodeDecl, idx: usize, depth: usize) -> Vec<Region> {
        let name = node.name.as_str();
        let children = node.children.as_deref();
        let regions = node.regions.as_deref();

        self.check(!(children.is_some() && regions.is_some()), || {
            GraphProblem::ChildrenAndRegions(name.to_string())
        });
        self.check(!(regions.is_some() && node.initial.is_some()), || {
            GraphProblem::OrthogonalInitial(name.to_string())
        });
        let declares_members = children.map_or(true, |c| !c.is_empty())
            && regions.map_or(true, |r| !r.is_empty());
        self.check(declares_members, || {
            GraphProblem::EmptyComposite(name.to_string())
        });

        let regions = match (children, regions) {
            (_, Some(regions)) => regions,
            (Some([]), None) => return Vec::new(),
            (Some(children), None) => {
                return self
                    .region(name, None, children, node.initial.as_deref(), idx, 0, depth)
                    .into_iter()
                    .collect();
            }
            (None, None) => {
                if let Some(initial) = &node.initial {
                    self.checks.push(Validation::fail(GraphProblem::UnknownChildInitial {
                        state: name.to_string(),
                        initial: initial.clone(),
                    }));
                }
                return Vec::new();
            }
        };

        let mut region_names = HashSet::new();
        let mut built = Vec::new();
        for (r, decl) in regions.iter().enumerate() {
            self.check_region_name(name, decl, &mut region_names);
            if let Some(region) = self.region(
                name,
                Some(decl.name.clone()),
                &decl.children,
                decl.initial.as_deref(),
                idx,
                r,
                depth,
            ) {
                built.push(region);
            }
        }
        built
    }

    fn check_region_name(&mut self, state: &str, decl: &RegionDecl, names: &mut HashSet<String>) {
        self.check(!decl.name.is_empty(), || {
            GraphProblem::EmptyRegionName(state.to_string())
        });
        let fresh = names.insert(decl.name.clone());
        self.check(fresh, || GraphProblem::DuplicateRegion {
            state: state.to_string(),
            region: decl.name.clone(),
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn region(
        &mut self,
        state: &str,
        name: Option<String>,
        children: &[StateDecl],
        initial: Option<&str>,
        parent: usize,
        index: usize,
        depth: usize,
    ) -> Option<Region> {
        let members: Vec<usize> = children
            .iter()
            .filter_map(|child| self.declare(child, Some(parent), index, depth))
            .collect();

        self.check(!children.is_empty(), || GraphProblem::EmptyRegion {
            state: state.to_string(),
            region: name.clone().unwrap_or_default(),
        });

        let initial = match initial {
            Some(wanted) => {
                let found = members.iter().copied().find(|&c| self.nodes[c].id == wanted);
                self.check(found.is_some(), || GraphProblem::UnknownChildInitial {
                    state: state.to_string(),
                    initial: wanted.to_string(),
                });
                found?
            }
            None => *members.first()?,
        };

        Some(Region {
            name,
            children: members,
            initial,
        })
    }
}

/// Validate `definition` and build its graph and transition table.
pub(crate) fn load(
    definition: &Definition,
) -> Result<(StateGraph, TransitionTable), MalformedGraphError> {
    let mut flat = Flattener::new();

    flat.check(!definition.states.is_empty(), || GraphProblem::NoStates);
    let top_level: Vec<usize> = definition
        .states
        .iter()
        .filter_map(|decl| flat.declare(decl, None, 0, 0))
        .collect();

    let initial = flat.seen.get(definition.initial.as_str()).copied();
    flat.check(initial.is_some(), || {
        GraphProblem::UnknownInitialState(definition.initial.clone())
    });

    let mut transitions = Vec::with_capacity(definition.transitions.len());
    for (order, decl) in definition.transitions.iter().enumerate() {
        let source = flat.seen.get(decl.source.as_str()).copied();
        let dest = flat.seen.get(decl.dest.as_str()).copied();
        let guards = decl.conditions.names();

        flat.check(!decl.trigger.is_empty(), || GraphProblem::EmptyTrigger { order });
        flat.check(source.is_some(), || GraphProblem::UnknownSource {
            order,
            trigger: decl.trigger.clone(),
            state: decl.source.clone(),
        });
        flat.check(dest.is_some(), || GraphProblem::UnknownDestination {
            order,
            trigger: decl.trigger.clone(),
            state: decl.dest.clone(),
        });
        flat.check(guards.iter().all(|g| !g.is_empty()), || GraphProblem::EmptyGuard {
            order,
            trigger: decl.trigger.clone(),
        });

        if let (Some(source_idx), Some(dest_idx)) = (source, dest) {
            transitions.push(Transition {
                source: StateId::new(decl.source.as_str()),
                dest: StateId::new(decl.dest.as_str()),
                trigger: decl.trigger.clone(),
                guards,
                order,
                source_idx,
                dest_idx,
            });
        }
    }

    let Flattener { nodes, checks, .. } = flat;
    match Validation::all_vec(checks) {
        Validation::Failure(errors) => Err(MalformedGraphError::Invalid {
            problems: errors.iter().cloned().collect(),
        }),
        Validation::Success(_) => {
            let initial = initial.ok_or_else(|| MalformedGraphError::Invalid {
                problems: vec![GraphProblem::UnknownInitialState(definition.initial.clone())],
            })?;
            tracing::debug!(
                states = nodes.len(),
                transitions = transitions.len(),
                initial = %definition.initial,
                "Loaded statechart definition"
            );
            Ok((
                StateGraph::from_parts(nodes, top_level, initial),
                TransitionTable::new(transitions),
            ))
        }
    }
}
