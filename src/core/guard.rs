//! Guard predicates for controlling state transitions.
//!
//! Guards are named boolean reads of the domain context. The engine never
//! interprets guard names itself; it asks a [`GuardEvaluator`] supplied by
//! the domain layer.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors raised while evaluating a guard.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("Unknown guard '{0}'")]
    Unknown(String),
}

/// Evaluates named guard predicates against a domain context.
///
/// Implementations must be pure reads: the engine may evaluate a guard
/// and then discard the verdict, and guards run while the machine is
/// locked.
pub trait GuardEvaluator<C>: Send + Sync {
    /// Evaluate one guard. Unknown names must fail rather than read as `false`.
    fn evaluate(&self, guard: &str, ctx: &C) -> Result<bool, GuardError>;

    /// Whether `guard` is a name this evaluator understands.
    ///
    /// Used to validate a statechart when a machine is built. The default
    /// accepts every name and defers the check to `evaluate`.
    fn provides(&self, _guard: &str) -> bool {
        true
    }
}

/// Pure predicate over the domain context.
///
/// # Example
///
/// ```rust
/// use skyward::core::Guard;
///
/// struct Mount {
///     tracking: bool,
/// }
///
/// let is_tracking = Guard::new(|m: &Mount| m.tracking);
///
/// assert!(is_tracking.check(&Mount { tracking: true }));
/// assert!(!is_tracking.check(&Mount { tracking: false }));
/// ```
pub struct Guard<C> {
    predicate: Box<dyn Fn(&C) -> bool + Send + Sync>,
}

impl<C> Guard<C> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic, free of side effects, and
    /// thread-safe (Send + Sync).
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    pub fn check(&self, ctx: &C) -> bool {
        (self.predicate)(ctx)
    }
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}

/// Guard evaluator backed by a name → predicate map.
///
/// # Example
///
/// ```rust
/// use skyward::core::{GuardEvaluator, GuardRegistry};
///
/// struct Observatory {
///     visits: usize,
/// }
///
/// let guards = GuardRegistry::new().register("has_visits", |o: &Observatory| o.visits > 0);
///
/// assert_eq!(guards.evaluate("has_visits", &Observatory { visits: 2 }), Ok(true));
/// assert!(guards.evaluate("has_target", &Observatory { visits: 2 }).is_err());
/// ```
pub struct GuardRegistry<C> {
    guards: HashMap<String, Guard<C>>,
}

impl<C> GuardRegistry<C> {
    pub fn new() -> Self {
        Self {
            guards: HashMap::new(),
        }
    }

    /// Register a predicate under `name`, replacing any previous one.
    pub fn register<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.guards.insert(name.into(), Guard::new(predicate));
        self
    }

    /// Register an already constructed guard.
    pub fn insert(&mut self, name: impl Into<String>, guard: Guard<C>) {
        self.guards.insert(name.into(), guard);
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl<C> Default for GuardRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> GuardEvaluator<C> for GuardRegistry<C> {
    fn evaluate(&self, guard: &str, ctx: &C) -> Result<bool, GuardError> {
        self.guards
            .get(guard)
            .map(|g| g.check(ctx))
            .ok_or_else(|| GuardError::Unknown(guard.to_string()))
    }

    fn provides(&self, guard: &str) -> bool {
        self.guards.contains_key(guard)
    }
}

/// Evaluate an ordered guard list, stopping at the first `false`.
pub(crate) fn all_hold<C>(
    evaluator: &dyn GuardEvaluator<C>,
    guards: &[String],
    ctx: &C,
) -> Result<bool, GuardError> {
    for guard in guards {
        if !evaluator.evaluate(guard, ctx)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Mount {
        tracking: bool,
        visits: usize,
    }

    #[test]
    fn guard_is_deterministic() {
        let guard = Guard::new(|m: &Mount| m.tracking);
        let mount = Mount {
            tracking: true,
            ..Default::default()
        };

        assert_eq!(guard.check(&mount), guard.check(&mount));
    }

    #[test]
    fn registry_reports_unknown_guards() {
        let guards = GuardRegistry::new().register("mount_is_tracking", |m: &Mount| m.tracking);

        assert!(guards.provides("mount_is_tracking"));
        assert!(!guards.provides("has_visits"));
        assert_eq!(
            guards.evaluate("has_visits", &Mount::default()),
            Err(GuardError::Unknown("has_visits".to_string()))
        );
    }

    #[test]
    fn inserted_guards_are_evaluated() {
        let mut guards = GuardRegistry::new();
        assert!(guards.is_empty());
        guards.insert("has_visits", Guard::new(|m: &Mount| m.visits > 0));

        assert_eq!(guards.len(), 1);
        let mount = Mount {
            visits: 1,
            ..Default::default()
        };
        assert_eq!(guards.evaluate("has_visits", &mount), Ok(true));
        assert_eq!(guards.evaluate("has_visits", &Mount::default()), Ok(false));
    }

    #[test]
    fn all_hold_short_circuits_on_first_false() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let guards = GuardRegistry::new()
            .register("mount_is_tracking", |m: &Mount| m.tracking)
            .register("has_visits", move |m: &Mount| {
                counter.fetch_add(1, Ordering::SeqCst);
                m.visits > 0
            });
        let names = vec!["mount_is_tracking".to_string(), "has_visits".to_string()];

        let idle = Mount::default();
        assert_eq!(all_hold(&guards, &names, &idle), Ok(false));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let busy = Mount {
            tracking: true,
            visits: 1,
        };
        assert_eq!(all_hold(&guards, &names, &busy), Ok(true));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_guard_list_holds() {
        let guards: GuardRegistry<Mount> = GuardRegistry::new();
        assert_eq!(all_hold(&guards, &[], &Mount::default()), Ok(true));
    }

    #[test]
    fn unknown_guard_is_an_error_not_false() {
        let guards: GuardRegistry<Mount> = GuardRegistry::new();
        let names = vec!["initialize".to_string()];
        assert!(all_hold(&guards, &names, &Mount::default()).is_err());
    }
}
