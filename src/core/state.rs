//! State identifiers and state tree nodes.
//!
//! States are identified by name. A node is either simple (a leaf) or
//! composite, in which case it owns one or more regions of child states.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique name of a declared state.
///
/// # Example
///
/// ```rust
/// use skyward::core::StateId;
///
/// let parked = StateId::new("parked");
/// assert_eq!(parked.as_str(), "parked");
/// assert_eq!(parked.to_string(), "parked");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(String);

impl StateId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for StateId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StateId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StateId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<str> for StateId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StateId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A set of mutually exclusive children inside a composite state.
///
/// Exactly one child of every region of an active composite is active.
/// Exclusive composites have a single unnamed region; orthogonal
/// composites have named regions that are active concurrently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub(crate) name: Option<String>,
    pub(crate) children: Vec<usize>,
    pub(crate) initial: usize,
}

impl Region {
    /// Region name, `None` for the single region of an exclusive composite.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Structural kind of a state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateKind {
    /// A leaf state.
    Simple,
    /// A state with child regions.
    Composite { regions: Vec<Region> },
}

/// One declared state in the state tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateNode {
    pub(crate) id: StateId,
    pub(crate) parent: Option<usize>,
    pub(crate) region: usize,
    pub(crate) depth: usize,
    pub(crate) kind: StateKind,
}

impl StateNode {
    pub fn id(&self) -> &StateId {
        &self.id
    }

    /// Nesting depth, 0 for top-level states.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_simple(&self) -> bool {
        matches!(self.kind, StateKind::Simple)
    }

    pub fn is_composite(&self) -> bool {
        !self.is_simple()
    }

    /// True for a composite whose regions are named, i.e. run concurrently.
    pub fn is_orthogonal(&self) -> bool {
        self.regions().iter().any(|r| r.name.is_some())
    }

    pub fn kind(&self) -> &StateKind {
        &self.kind
    }

    pub(crate) fn regions(&self) -> &[Region] {
        match &self.kind {
            StateKind::Simple => &[],
            StateKind::Composite { regions } => regions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> StateNode {
        StateNode {
            id: StateId::new(name),
            parent: None,
            region: 0,
            depth: 0,
            kind: StateKind::Simple,
        }
    }

    #[test]
    fn state_id_compares_with_str() {
        let id = StateId::new("scheduling");
        assert_eq!(id, "scheduling");
        assert_ne!(id, "slewing");
    }

    #[test]
    fn state_id_serializes_transparently() {
        let id = StateId::new("parked");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"parked\"");
        let back: StateId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn simple_node_has_no_regions() {
        let node = leaf("parked");
        assert!(node.is_simple());
        assert!(!node.is_orthogonal());
        assert!(node.regions().is_empty());
    }

    #[test]
    fn named_regions_make_a_composite_orthogonal() {
        let exclusive = StateNode {
            kind: StateKind::Composite {
                regions: vec![Region {
                    name: None,
                    children: vec![1, 2],
                    initial: 1,
                }],
            },
            ..leaf("working")
        };
        let orthogonal = StateNode {
            kind: StateKind::Composite {
                regions: vec![
                    Region {
                        name: Some("visit".into()),
                        children: vec![1],
                        initial: 1,
                    },
                    Region {
                        name: Some("guide".into()),
                        children: vec![2],
                        initial: 2,
                    },
                ],
            },
            ..leaf("visiting_tracking")
        };

        assert!(exclusive.is_composite());
        assert!(!exclusive.is_orthogonal());
        assert!(orthogonal.is_orthogonal());
        assert_eq!(orthogonal.regions()[1].name(), Some("guide"));
    }
}
