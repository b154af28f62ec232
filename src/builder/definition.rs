//! Builder for definition documents.

use crate::builder::error::BuildError;
use crate::definition::{
    Conditions, Definition, NodeDecl, RegionDecl, StateDecl, Statechart, TransitionDecl,
};

/// Builder for constructing definitions in code rather than from a file.
///
/// # Example
///
/// ```rust
/// use skyward::builder::{composite, DefinitionBuilder};
///
/// let chart = DefinitionBuilder::new()
///     .initial("parked")
///     .state("parked")
///     .state(composite("working", ["scheduling", "slewing"]))
///     .transition("parked", "schedule", "working")
///     .guarded("scheduling", "visit", "slewing", ["has_target"])
///     .statechart()
///     .unwrap();
///
/// assert_eq!(chart.graph().parent("slewing").unwrap(), "working");
/// ```
#[derive(Clone, Debug, Default)]
pub struct DefinitionBuilder {
    initial: Option<String>,
    states: Vec<StateDecl>,
    transitions: Vec<TransitionDecl>,
}

impl DefinitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root initial state (required).
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Add a top-level state.
    pub fn state(mut self, state: impl Into<StateDecl>) -> Self {
        self.states.push(state.into());
        self
    }

    /// Add an unconditional transition.
    pub fn transition(
        self,
        source: impl Into<String>,
        trigger: impl Into<String>,
        dest: impl Into<String>,
    ) -> Self {
        self.guarded(source, trigger, dest, Vec::<String>::new())
    }

    /// Add a transition gated by guards, evaluated in the given order.
    pub fn guarded<I, G>(
        mut self,
        source: impl Into<String>,
        trigger: impl Into<String>,
        dest: impl Into<String>,
        guards: I,
    ) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<String>,
    {
        self.transitions.push(TransitionDecl {
            source: source.into(),
            dest: dest.into(),
            trigger: trigger.into(),
            conditions: Conditions::Many(guards.into_iter().map(Into::into).collect()),
        });
        self
    }

    pub fn build(self) -> Result<Definition, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        Ok(Definition {
            initial,
            states: self.states,
            transitions: self.transitions,
        })
    }

    /// Build and validate in one step.
    pub fn statechart(self) -> Result<Statechart, BuildError> {
        Ok(Statechart::from_definition(&self.build()?)?)
    }
}

/// A composite with mutually exclusive children, the first one initial.
pub fn composite<I, S>(name: impl Into<String>, children: I) -> StateDecl
where
    I: IntoIterator<Item = S>,
    S: Into<StateDecl>,
{
    StateDecl::Node(NodeDecl {
        name: name.into(),
        children: Some(children.into_iter().map(Into::into).collect()),
        regions: None,
        initial: None,
    })
}

/// A composite whose regions are active concurrently.
pub fn orthogonal(name: impl Into<String>, regions: impl IntoIterator<Item = RegionDecl>) -> StateDecl {
    StateDecl::Node(NodeDecl {
        name: name.into(),
        children: None,
        regions: Some(regions.into_iter().collect()),
        initial: None,
    })
}

/// One region of an orthogonal composite, the first child initial.
pub fn region<I, S>(name: impl Into<String>, children: I) -> RegionDecl
where
    I: IntoIterator<Item = S>,
    S: Into<StateDecl>,
{
    RegionDecl {
        name: name.into(),
        children: children.into_iter().map(Into::into).collect(),
        initial: None,
    }
}
