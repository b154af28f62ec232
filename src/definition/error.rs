//! Load-time errors for statechart definitions.

use std::path::PathBuf;
use thiserror::Error;

/// One structural problem found in a definition document.
///
/// The loader reports every problem it finds, not just the first one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphProblem {
    #[error("definition declares no states")]
    NoStates,

    #[error("a state with an empty name is declared under '{parent}'")]
    EmptyName { parent: String },

    #[error("state '{0}' is declared more than once")]
    DuplicateState(String),

    #[error("root initial state '{0}' is not declared")]
    UnknownInitialState(String),

    #[error("initial '{initial}' of '{state}' is not one of its children")]
    UnknownChildInitial { state: String, initial: String },

    #[error("state '{0}' declares both children and regions")]
    ChildrenAndRegions(String),

    #[error("state '{0}' declares an empty list of children or regions")]
    EmptyComposite(String),

    #[error("state '{0}' has regions; initial children belong to each region")]
    OrthogonalInitial(String),

    #[error("a region of '{0}' has an empty name")]
    EmptyRegionName(String),

    #[error("region '{region}' is declared twice in '{state}'")]
    DuplicateRegion { state: String, region: String },

    #[error("region '{region}' of '{state}' has no children")]
    EmptyRegion { state: String, region: String },

    #[error("transition #{order} has an empty trigger")]
    EmptyTrigger { order: usize },

    #[error("transition #{order} ('{trigger}') has undeclared source '{state}'")]
    UnknownSource {
        order: usize,
        trigger: String,
        state: String,
    },

    #[error("transition #{order} ('{trigger}') has undeclared destination '{state}'")]
    UnknownDestination {
        order: usize,
        trigger: String,
        state: String,
    },

    #[error("transition #{order} ('{trigger}') names an empty guard")]
    EmptyGuard { order: usize, trigger: String },
}

/// The definition cannot be turned into a statechart.
#[derive(Debug, Error)]
pub enum MalformedGraphError {
    #[error("Definition could not be read from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported definition format for {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Definition could not be parsed: {0}")]
    Parse(String),

    #[error("Definition is malformed: {}", summarize(.problems))]
    Invalid { problems: Vec<GraphProblem> },
}

impl MalformedGraphError {
    /// Problems found during validation; empty for read and parse failures.
    pub fn problems(&self) -> &[GraphProblem] {
        match self {
            Self::Invalid { problems } => problems,
            _ => &[],
        }
    }
}

fn summarize(problems: &[GraphProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
