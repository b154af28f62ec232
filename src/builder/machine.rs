//! Builder for constructing machines.

use crate::builder::error::BuildError;
use crate::config::MachineOptions;
use crate::core::{GuardEvaluator, GuardRegistry};
use crate::definition::{Definition, Statechart};
use crate::effects::{ActionDispatcher, Machine, NoActions};
use std::sync::Arc;

/// Builder for constructing machines with a fluent API.
///
/// Building validates the pieces against each other: every guard the
/// statechart names must be provided by the evaluator, and every state an
/// action dispatcher has callbacks for must be declared.
///
/// # Example
///
/// ```rust
/// use skyward::builder::MachineBuilder;
/// use skyward::core::GuardRegistry;
/// use skyward::definition::Statechart;
///
/// let chart = Statechart::from_yaml_str(r#"
/// initial: initialize
/// states: [initialize, parked]
/// transitions:
///   - { source: initialize, dest: parked, trigger: wakeup, conditions: initialize }
/// "#).unwrap();
///
/// let machine = MachineBuilder::new()
///     .statechart(chart)
///     .guards(GuardRegistry::new().register("initialize", |ready: &bool| *ready))
///     .build()
///     .unwrap();
///
/// assert!(!machine.fire("wakeup", &false).unwrap().is_committed());
/// assert!(machine.fire("wakeup", &true).unwrap().is_committed());
/// assert!(machine.in_state("parked"));
/// ```
pub struct MachineBuilder<C> {
    chart: Option<Arc<Statechart>>,
    guards: Option<Box<dyn GuardEvaluator<C>>>,
    actions: Option<Box<dyn ActionDispatcher<C>>>,
    options: MachineOptions,
}

impl<C: 'static> MachineBuilder<C> {
    pub fn new() -> Self {
        Self {
            chart: None,
            guards: None,
            actions: None,
            options: MachineOptions::default(),
        }
    }

    /// Set the statechart (required). Accepts an owned or shared chart.
    pub fn statechart(mut self, chart: impl Into<Arc<Statechart>>) -> Self {
        self.chart = Some(chart.into());
        self
    }

    /// Load the statechart from a definition document.
    pub fn definition(self, definition: &Definition) -> Result<Self, BuildError> {
        let chart = Statechart::from_definition(definition)?;
        Ok(self.statechart(chart))
    }

    /// Set the guard evaluator. Defaults to an empty registry.
    pub fn guards<G>(mut self, guards: G) -> Self
    where
        G: GuardEvaluator<C> + 'static,
    {
        self.guards = Some(Box::new(guards));
        self
    }

    /// Set the action dispatcher. Defaults to [`NoActions`].
    pub fn actions<A>(mut self, actions: A) -> Self
    where
        A: ActionDispatcher<C> + 'static,
    {
        self.actions = Some(Box::new(actions));
        self
    }

    pub fn options(mut self, options: MachineOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the machine in the statechart's initial configuration.
    pub fn build(self) -> Result<Machine<C>, BuildError> {
        let chart = self.chart.ok_or(BuildError::MissingStatechart)?;
        let guards = self
            .guards
            .unwrap_or_else(|| Box::new(GuardRegistry::<C>::new()));
        let actions = self.actions.unwrap_or_else(|| Box::new(NoActions));

        if self.options.validate_guards {
            let missing: Vec<String> = chart
                .table()
                .guard_names()
                .into_iter()
                .filter(|name| !guards.provides(name))
                .map(str::to_string)
                .collect();
            if !missing.is_empty() {
                tracing::error!(?missing, "Statechart names guards the evaluator lacks");
                return Err(BuildError::UnknownGuards(missing));
            }
        }

        let undeclared: Vec<String> = actions
            .referenced_states()
            .into_iter()
            .filter(|state| !chart.graph().contains(state))
            .map(str::to_string)
            .collect();
        if !undeclared.is_empty() {
            tracing::error!(?undeclared, "Actions registered for undeclared states");
            return Err(BuildError::UnknownActionStates(undeclared));
        }

        Ok(Machine::from_parts(chart, guards, actions, self.options))
    }
}

impl<C: 'static> Default for MachineBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::ActionRegistry;

    const CHART: &str = r#"
initial: slewing
states: [slewing, tracking]
transitions:
  - { source: slewing, dest: tracking, trigger: track, conditions: [mount_is_tracking, has_visits] }
"#;

    fn chart() -> Statechart {
        Statechart::from_yaml_str(CHART).unwrap()
    }

    #[test]
    fn builder_requires_a_statechart() {
        let result = MachineBuilder::<()>::new().build();
        assert!(matches!(result, Err(BuildError::MissingStatechart)));
    }

    #[test]
    fn builder_reports_every_missing_guard() {
        let result = MachineBuilder::<()>::new()
            .statechart(chart())
            .guards(GuardRegistry::new().register("mount_is_tracking", |_: &()| true))
            .build();

        match result {
            Err(BuildError::UnknownGuards(missing)) => assert_eq!(missing, vec!["has_visits"]),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("missing guards should be rejected"),
        }
    }

    #[test]
    fn guard_validation_can_be_disabled() {
        let machine = MachineBuilder::<()>::new()
            .statechart(chart())
            .options(MachineOptions::default().validate_guards(false))
            .build()
            .unwrap();

        assert!(machine.fire("track", &()).is_err());
    }

    #[test]
    fn builder_rejects_actions_for_undeclared_states() {
        let result = MachineBuilder::<()>::new()
            .statechart(chart())
            .guards(
                GuardRegistry::new()
                    .register("mount_is_tracking", |_: &()| true)
                    .register("has_visits", |_: &()| true),
            )
            .actions(ActionRegistry::new().with_entry("observing", |_: &()| Ok(())))
            .build();

        assert!(matches!(result, Err(BuildError::UnknownActionStates(states)) if states == vec!["observing"]));
    }

    #[test]
    fn shared_statechart_drives_several_machines() {
        let shared = Arc::new(chart());
        let guards = || {
            GuardRegistry::new()
                .register("mount_is_tracking", |_: &()| true)
                .register("has_visits", |_: &()| true)
        };
        let first = MachineBuilder::new()
            .statechart(Arc::clone(&shared))
            .guards(guards())
            .build()
            .unwrap();
        let second = MachineBuilder::new()
            .statechart(Arc::clone(&shared))
            .guards(guards())
            .build()
            .unwrap();

        first.fire("track", &()).unwrap();
        assert!(first.in_state("tracking"));
        assert!(second.in_state("slewing"));
    }
}
