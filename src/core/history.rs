//! Bounded record of committed transitions.

use super::state::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Record of a single committed transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub trigger: String,
    /// State the transition was declared on
    pub source: StateId,
    pub dest: StateId,
    /// Configuration version produced by the `fire` call that committed it
    pub version: u64,
    pub timestamp: DateTime<Utc>,
}

/// Most recent committed transitions, oldest first.
///
/// The history keeps at most `capacity` records and evicts the oldest
/// ones, so a machine cycling forever holds a constant amount of history.
///
/// # Example
///
/// ```rust
/// use skyward::core::{StateId, TransitionHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let mut history = TransitionHistory::with_capacity(2);
/// for (i, dest) in ["scheduling", "slewing", "visiting"].into_iter().enumerate() {
///     history.record(TransitionRecord {
///         trigger: "next".into(),
///         source: StateId::new("any"),
///         dest: StateId::new(dest),
///         version: i as u64 + 1,
///         timestamp: Utc::now(),
///     });
/// }
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.path(), vec!["slewing", "visiting"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionHistory {
    records: VecDeque<TransitionRecord>,
    capacity: usize,
}

impl Default for TransitionHistory {
    fn default() -> Self {
        Self::with_capacity(crate::config::DEFAULT_HISTORY_CAPACITY)
    }
}

impl TransitionHistory {
    /// A capacity of zero disables recording.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, record: TransitionRecord) {
        if self.capacity == 0 {
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    /// Destinations of the retained transitions, in commit order.
    pub fn path(&self) -> Vec<&StateId> {
        self.records.iter().map(|r| &r.dest).collect()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Rebuild a history from exported records, keeping the newest ones.
    pub(crate) fn from_records(records: Vec<TransitionRecord>, capacity: usize) -> Self {
        let mut history = Self::with_capacity(capacity);
        for record in records {
            history.record(record);
        }
        history
    }
}
