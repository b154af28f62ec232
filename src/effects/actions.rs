//! Entry, exit and transition callbacks.

use crate::core::{StateId, Transition};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Failure reported by a domain action.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ActionError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn from_error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Where in a transition an action ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionPhase {
    Exit,
    Transition,
    Entry,
}

impl fmt::Display for ActionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exit => "exit",
            Self::Transition => "transition",
            Self::Entry => "entry",
        })
    }
}

/// Side effects run while a transition is committed.
///
/// For one transition the machine calls `on_exit` for each exited state
/// (innermost first), then `on_transition`, then `on_entry` for each
/// entered state (outermost first). Any error aborts the whole `fire` call
/// and the active configuration is left as it was.
///
/// Actions run while the machine is locked and must not call
/// [`Machine::fire`](crate::effects::Machine::fire).
pub trait ActionDispatcher<C>: Send + Sync {
    fn on_exit(&self, _state: &StateId, _ctx: &C) -> Result<(), ActionError> {
        Ok(())
    }

    fn on_entry(&self, _state: &StateId, _ctx: &C) -> Result<(), ActionError> {
        Ok(())
    }

    fn on_transition(&self, _transition: &Transition, _ctx: &C) -> Result<(), ActionError> {
        Ok(())
    }

    /// State names this dispatcher has callbacks for, checked against the
    /// statechart when a machine is built.
    fn referenced_states(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// Dispatcher with no actions.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoActions;

impl<C> ActionDispatcher<C> for NoActions {}

type Callback<C> = Box<dyn Fn(&C) -> Result<(), ActionError> + Send + Sync>;

/// Dispatcher backed by per-state callbacks.
///
/// # Example
///
/// ```rust
/// use skyward::effects::{ActionDispatcher, ActionRegistry};
/// use skyward::core::StateId;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// struct Camera {
///     frames: AtomicUsize,
/// }
///
/// let actions = ActionRegistry::new().with_entry("observing", |c: &Camera| {
///     c.frames.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// });
///
/// let camera = Camera { frames: AtomicUsize::new(0) };
/// actions.on_entry(&StateId::new("observing"), &camera).unwrap();
/// assert_eq!(camera.frames.load(Ordering::SeqCst), 1);
/// ```
pub struct ActionRegistry<C> {
    entries: HashMap<String, Vec<Callback<C>>>,
    exits: HashMap<String, Vec<Callback<C>>>,
    transitions: HashMap<String, Vec<Callback<C>>>,
}

impl<C> ActionRegistry<C> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            exits: HashMap::new(),
            transitions: HashMap::new(),
        }
    }

    /// Run `action` every time `state` is entered.
    pub fn with_entry<F>(mut self, state: impl Into<String>, action: F) -> Self
    where
        F: Fn(&C) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.entries.entry(state.into()).or_default().push(Box::new(action));
        self
    }

    /// Run `action` every time `state` is exited.
    pub fn with_exit<F>(mut self, state: impl Into<String>, action: F) -> Self
    where
        F: Fn(&C) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.exits.entry(state.into()).or_default().push(Box::new(action));
        self
    }

    /// Run `action` whenever a transition for `trigger` commits.
    pub fn with_trigger<F>(mut self, trigger: impl Into<String>, action: F) -> Self
    where
        F: Fn(&C) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.transitions
            .entry(trigger.into())
            .or_default()
            .push(Box::new(action));
        self
    }
}

impl<C> Default for ActionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn run_all<C>(callbacks: Option<&Vec<Callback<C>>>, ctx: &C) -> Result<(), ActionError> {
    callbacks
        .into_iter()
        .flatten()
        .try_for_each(|callback| callback(ctx))
}

impl<C> ActionDispatcher<C> for ActionRegistry<C> {
    fn on_exit(&self, state: &StateId, ctx: &C) -> Result<(), ActionError> {
        run_all(self.exits.get(state.as_str()), ctx)
    }

    fn on_entry(&self, state: &StateId, ctx: &C) -> Result<(), ActionError> {
        run_all(self.entries.get(state.as_str()), ctx)
    }

    fn on_transition(&self, transition: &Transition, ctx: &C) -> Result<(), ActionError> {
        run_all(self.transitions.get(transition.trigger.as_str()), ctx)
    }

    fn referenced_states(&self) -> Vec<&str> {
        let mut states: Vec<&str> = self
            .entries
            .keys()
            .chain(self.exits.keys())
            .map(String::as_str)
            .collect();
        states.sort_unstable();
        states.dedup();
        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    impl Log {
        fn push(&self, line: &str) {
            self.0.lock().unwrap().push(line.to_string());
        }
    }

    #[test]
    fn registry_runs_callbacks_in_registration_order() {
        let actions = ActionRegistry::new()
            .with_entry("tracking", |log: &Log| {
                log.push("first");
                Ok(())
            })
            .with_entry("tracking", |log: &Log| {
                log.push("second");
                Ok(())
            });

        let log = Log::default();
        actions.on_entry(&StateId::new("tracking"), &log).unwrap();
        actions.on_entry(&StateId::new("slewing"), &log).unwrap();
        assert_eq!(*log.0.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn registry_stops_at_first_failure() {
        let actions = ActionRegistry::new()
            .with_exit("observing", |_: &Log| Err(ActionError::new("shutter stuck")))
            .with_exit("observing", |log: &Log| {
                log.push("unreachable");
                Ok(())
            });

        let log = Log::default();
        let err = actions.on_exit(&StateId::new("observing"), &log).unwrap_err();
        assert_eq!(err.message(), "shutter stuck");
        assert!(log.0.lock().unwrap().is_empty());
    }

    #[test]
    fn referenced_states_are_deduplicated() {
        let actions = ActionRegistry::new()
            .with_entry("parked", |_: &()| Ok(()))
            .with_exit("parked", |_: &()| Ok(()))
            .with_exit("analyzing", |_: &()| Ok(()));

        assert_eq!(actions.referenced_states(), vec!["analyzing", "parked"]);
    }

    #[test]
    fn action_error_keeps_its_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "dome did not respond");
        let err = ActionError::from_error(io);
        assert_eq!(err.to_string(), "dome did not respond");
        assert!(std::error::Error::source(&err).is_some());
    }
}
