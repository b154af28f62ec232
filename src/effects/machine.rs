//! Machine that processes triggers against a statechart.

use super::actions::{ActionDispatcher, ActionError, ActionPhase};
use super::configuration::{ActiveConfiguration, ConfigurationSnapshot};
use super::outcome::{CommittedTransition, FireError, TransitionOutcome};
use crate::config::MachineOptions;
use crate::core::{
    all_hold, GuardError, GuardEvaluator, StateGraph, StateId, Transition, TransitionHistory,
    TransitionRecord,
};
use crate::definition::Statechart;
use chrono::Utc;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Configuration and history visible to readers.
struct Published {
    config: Arc<ActiveConfiguration>,
    history: TransitionHistory,
}

/// Holds the fire lock for one call and marks the owning thread.
pub(crate) struct Turn<'a> {
    _lock: MutexGuard<'a, ()>,
    owner: &'a Mutex<Option<ThreadId>>,
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        *self.owner.lock() = None;
    }
}

/// A running statechart.
///
/// `fire` calls are serialized: each one runs to completion, including
/// every guard and action it triggers, before the next one starts. Reads
/// such as [`in_state`](Self::in_state) never wait for a running `fire`;
/// they observe the last published configuration.
pub struct Machine<C> {
    chart: Arc<Statechart>,
    guards: Box<dyn GuardEvaluator<C>>,
    actions: Box<dyn ActionDispatcher<C>>,
    options: MachineOptions,
    fire_lock: Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
    published: RwLock<Published>,
}

impl<C> Machine<C> {
    pub(crate) fn from_parts(
        chart: Arc<Statechart>,
        guards: Box<dyn GuardEvaluator<C>>,
        actions: Box<dyn ActionDispatcher<C>>,
        options: MachineOptions,
    ) -> Self {
        let config = ActiveConfiguration::initial(chart.graph());
        let history = TransitionHistory::with_capacity(options.history_capacity);
        tracing::debug!(
            initial = %chart.graph().initial(),
            leaves = config.leaves().len(),
            "Machine created"
        );
        Self {
            chart,
            guards,
            actions,
            options,
            fire_lock: Mutex::new(()),
            owner: Mutex::new(None),
            published: RwLock::new(Published {
                config: Arc::new(config),
                history,
            }),
        }
    }

    pub fn statechart(&self) -> &Statechart {
        &self.chart
    }

    pub fn options(&self) -> &MachineOptions {
        &self.options
    }

    /// Present `trigger` to every active region.
    ///
    /// Every guard is evaluated before any action runs. For each active
    /// leaf, in document order, the candidates declared on the leaf and its
    /// ancestors are tried, most specific first and then in declaration
    /// order; the first whose guards all hold is the leaf's winner.
    ///
    /// Winners whose exit sets overlap conflict. The one declared on the
    /// deeper source wins and the others are shadowed, so a transition on
    /// an orthogonal composite never undoes a commit made inside one of its
    /// regions. Ties go to the earlier leaf, which is how a transition
    /// declared on a shared ancestor commits once.
    ///
    /// On error nothing is published: the configuration stays as it was
    /// before the call.
    pub fn fire(&self, trigger: &str, ctx: &C) -> Result<TransitionOutcome, FireError> {
        let _turn = self.turn(trigger)?;
        let graph = self.chart.graph();
        let table = self.chart.table();
        let before = self.current();
        let active = before.active(graph);
        let mut verdicts = HashMap::new();
        let mut winners = Vec::new();
        let mut rejected = Vec::new();
        let mut matched = false;

        for &leaf in before.leaves() {
            let candidates = table.candidates(graph, leaf, trigger);
            if candidates.is_empty() {
                continue;
            }
            matched = true;
            match self.select(&candidates, trigger, ctx, &mut verdicts)? {
                Some(winner) => winners.push((leaf, table.get(winner))),
                None => rejected.push(leaf),
            }
        }

        let plan = resolve(graph, &active, winners);
        let exiting: BTreeSet<usize> = plan
            .iter()
            .flat_map(|step| step.exited.iter().copied())
            .collect();
        let rejected: Vec<StateId> = rejected
            .into_iter()
            .filter(|leaf| !exiting.contains(leaf))
            .map(|leaf| graph.id_of(leaf).clone())
            .collect();

        let mut working = (*before).clone();
        let mut committed = Vec::with_capacity(plan.len());
        for step in &plan {
            let done = self.apply(step, &mut working, ctx).inspect_err(|err| {
                tracing::warn!(
                    trigger,
                    version = before.version(),
                    error = %err,
                    "Transition aborted; configuration rolled back"
                );
            })?;
            committed.push(done);
        }

        if committed.is_empty() {
            return Ok(if matched {
                tracing::debug!(trigger, ?rejected, "Guards not satisfied");
                TransitionOutcome::GuardsNotSatisfied { rejected }
            } else {
                tracing::debug!(trigger, "No matching transition");
                TransitionOutcome::NoMatchingTransition
            });
        }

        working.bump();
        let version = working.version();
        self.publish(working, &committed);
        tracing::info!(
            trigger,
            version,
            transitions = committed.len(),
            "Committed transitions"
        );
        Ok(TransitionOutcome::Committed {
            transitions: committed,
            rejected,
            version,
        })
    }

    /// Every active state: the active leaves and all their ancestors.
    pub fn current_active_states(&self) -> BTreeSet<StateId> {
        let graph = self.chart.graph();
        self.current()
            .active(graph)
            .into_iter()
            .map(|i| graph.id_of(i).clone())
            .collect()
    }

    /// Active leaves in document order.
    pub fn active_leaves(&self) -> Vec<StateId> {
        self.snapshot().leaves
    }

    /// True if `state` is an active leaf or an ancestor of one.
    pub fn in_state(&self, state: &str) -> bool {
        let graph = self.chart.graph();
        match graph.idx(state) {
            Some(idx) => self
                .current()
                .leaves()
                .iter()
                .any(|&leaf| graph.within(leaf, idx)),
            None => false,
        }
    }

    pub fn snapshot(&self) -> ConfigurationSnapshot {
        self.current().snapshot(self.chart.graph())
    }

    pub fn version(&self) -> u64 {
        self.current().version()
    }

    pub fn history(&self) -> TransitionHistory {
        self.published.read().history.clone()
    }

    pub(crate) fn current(&self) -> Arc<ActiveConfiguration> {
        Arc::clone(&self.published.read().config)
    }

    /// Serialize with `fire`, failing fast when called from a callback.
    pub(crate) fn turn(&self, trigger: &str) -> Result<Turn<'_>, FireError> {
        let me = thread::current().id();
        if *self.owner.lock() == Some(me) {
            tracing::error!(trigger, "Reentrant fire from inside a guard or action");
            return Err(FireError::ReentrantFire {
                trigger: trigger.to_string(),
            });
        }
        let lock = self.fire_lock.lock();
        *self.owner.lock() = Some(me);
        Ok(Turn {
            _lock: lock,
            owner: &self.owner,
        })
    }

    /// Replace the published configuration and history wholesale.
    pub(crate) fn install(&self, config: ActiveConfiguration, history: TransitionHistory) {
        let mut published = self.published.write();
        published.config = Arc::new(config);
        published.history = history;
    }

    fn publish(&self, config: ActiveConfiguration, committed: &[CommittedTransition]) {
        let version = config.version();
        let timestamp = Utc::now();
        let mut published = self.published.write();
        for t in committed {
            published.history.record(TransitionRecord {
                trigger: t.trigger.clone(),
                source: t.source.clone(),
                dest: t.dest.clone(),
                version,
                timestamp,
            });
        }
        published.config = Arc::new(config);
    }

    /// First candidate whose guards all hold. Verdicts are cached per call.
    fn select(
        &self,
        candidates: &[usize],
        trigger: &str,
        ctx: &C,
        verdicts: &mut HashMap<usize, bool>,
    ) -> Result<Option<usize>, FireError> {
        for &candidate in candidates {
            let holds = match verdicts.get(&candidate) {
                Some(&holds) => holds,
                None => {
                    let transition = self.chart.table().get(candidate);
                    let holds = all_hold(self.guards.as_ref(), &transition.guards, ctx)
                        .map_err(|err| match err {
                            GuardError::Unknown(guard) => FireError::UnknownGuard {
                                guard,
                                trigger: trigger.to_string(),
                            },
                        })?;
                    tracing::debug!(
                        trigger,
                        source = %transition.source,
                        dest = %transition.dest,
                        holds,
                        "Evaluated guards"
                    );
                    verdicts.insert(candidate, holds);
                    holds
                }
            };
            if holds {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Run exits, the transition action and entries, then update `working`.
    fn apply(
        &self,
        step: &Step<'_>,
        working: &mut ActiveConfiguration,
        ctx: &C,
    ) -> Result<CommittedTransition, FireError> {
        let graph = self.chart.graph();
        let transition = step.transition;
        let exited = &step.exited;
        let mut entered = Vec::new();
        graph.enter_toward(step.entry_root, transition.dest_idx, &mut entered);

        let failed = |phase: ActionPhase, state: &StateId, source: ActionError| {
            FireError::ActionFailed {
                trigger: transition.trigger.clone(),
                phase,
                state: state.clone(),
                source,
            }
        };

        for &state in exited {
            let id = graph.id_of(state);
            self.actions
                .on_exit(id, ctx)
                .map_err(|e| failed(ActionPhase::Exit, id, e))?;
        }
        self.actions
            .on_transition(transition, ctx)
            .map_err(|e| failed(ActionPhase::Transition, &transition.source, e))?;
        for &state in &entered {
            let id = graph.id_of(state);
            self.actions
                .on_entry(id, ctx)
                .map_err(|e| failed(ActionPhase::Entry, id, e))?;
        }

        working.replace_within(graph, step.exit_root, &entered);

        let names = |states: &[usize]| -> Vec<StateId> {
            states.iter().map(|&i| graph.id_of(i).clone()).collect()
        };
        Ok(CommittedTransition {
            trigger: transition.trigger.clone(),
            source: transition.source.clone(),
            dest: transition.dest.clone(),
            exited: names(exited.as_slice()),
            entered: names(&entered),
        })
    }
}

/// A transition chosen for one `fire` call, with its boundaries.
struct Step<'a> {
    leaf: usize,
    transition: &'a Transition,
    exit_root: usize,
    entry_root: usize,
    /// Exited states, innermost first
    exited: Vec<usize>,
}

/// Drop winners that conflict with a more specific one; order the rest by leaf.
fn resolve<'a>(
    graph: &StateGraph,
    active: &BTreeSet<usize>,
    mut winners: Vec<(usize, &'a Transition)>,
) -> Vec<Step<'a>> {
    winners.sort_by_key(|&(leaf, t)| (Reverse(graph.node(t.source_idx).depth()), leaf));

    let mut exiting = BTreeSet::new();
    let mut plan = Vec::with_capacity(winners.len());
    for (leaf, transition) in winners {
        let (exit_root, entry_root) = boundaries(graph, transition);
        let mut exited = Vec::new();
        graph.exit_order(exit_root, active, &mut exited);
        if exited.iter().any(|state| exiting.contains(state)) {
            tracing::debug!(
                trigger = %transition.trigger,
                source = %transition.source,
                leaf = %graph.id_of(leaf),
                "Shadowed by a more specific transition"
            );
            continue;
        }
        exiting.extend(exited.iter().copied());
        plan.push(Step {
            leaf,
            transition,
            exit_root,
            entry_root,
            exited,
        });
    }
    plan.sort_by_key(|step| step.leaf);
    plan
}

/// Outermost exited and entered states of a transition.
///
/// Both sit directly inside the same region of the transition's scope.
/// The scope starts at the lowest common proper ancestor and widens while
/// source and destination lie in different orthogonal regions of it.
fn boundaries(graph: &StateGraph, transition: &Transition) -> (usize, usize) {
    let mut scope = graph.lca_of(transition.source_idx, transition.dest_idx);
    loop {
        let exit_root = graph.child_toward(scope, transition.source_idx);
        let entry_root = graph.child_toward(scope, transition.dest_idx);
        let same_region = graph.node(exit_root).region == graph.node(entry_root).region;
        match scope {
            Some(s) if !same_region => scope = graph.node(s).parent,
            _ => return (exit_root, entry_root),
        }
    }
}
