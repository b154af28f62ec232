//! Machine options.
//!
//! Options are plain serde data so hosts can embed them in their own
//! configuration files or load them standalone.

use crate::definition::Format;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Records kept by a machine's transition history unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("Options could not be read from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported options format for {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Options could not be parsed: {0}")]
    Parse(String),
}

/// Tunables of a [`Machine`](crate::effects::Machine).
///
/// # Example
///
/// ```rust
/// use skyward::config::MachineOptions;
/// use skyward::definition::Format;
///
/// let options = MachineOptions::from_str_as("history_capacity: 8", Format::Yaml).unwrap();
/// assert_eq!(options.history_capacity, 8);
/// assert!(options.validate_guards);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineOptions {
    /// Committed transitions retained in memory; 0 disables history
    pub history_capacity: usize,
    /// Reject guard names the evaluator does not provide when building
    pub validate_guards: bool,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            validate_guards: true,
        }
    }
}

impl MachineOptions {
    pub fn from_str_as(text: &str, format: Format) -> Result<Self, OptionsError> {
        format.parse(text).map_err(OptionsError::Parse)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let path = path.as_ref();
        let format = Format::from_path(path)
            .ok_or_else(|| OptionsError::UnsupportedFormat(path.to_path_buf()))?;
        let text = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str_as(&text, format)
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn validate_guards(mut self, validate: bool) -> Self {
        self.validate_guards = validate;
        self
    }
}
