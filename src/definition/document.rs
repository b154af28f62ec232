//! Serde model of a definition document.
//!
//! The document names the root `initial` state, the state tree, and the
//! transition list:
//!
//! ```yaml
//! initial: parked
//! states:
//!   - parked
//!   - name: working
//!     children: [scheduling, slewing]
//! transitions:
//!   - source: parked
//!     dest: working
//!     trigger: schedule
//!   - source: scheduling
//!     dest: slewing
//!     trigger: visit
//!     conditions: has_target
//! ```
//!
//! Compound states whose regions are active together are declared with
//! `regions` instead of `children`. Unknown fields are rejected.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::MalformedGraphError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Definition {
    pub initial: String,
    pub states: Vec<StateDecl>,
    #[serde(default)]
    pub transitions: Vec<TransitionDecl>,
}

/// A state entry: a bare name for a simple state, or a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateDecl {
    Name(String),
    Node(NodeDecl),
}

impl StateDecl {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Node(node) => &node.name,
        }
    }
}

impl From<&str> for StateDecl {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDecl {
    pub name: String,
    /// Mutually exclusive children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<StateDecl>>,
    /// Concurrently active regions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<RegionDecl>>,
    /// Child entered by default; the first child when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionDecl {
    pub name: String,
    pub children: Vec<StateDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionDecl {
    pub source: String,
    pub dest: String,
    pub trigger: String,
    #[serde(default, skip_serializing_if = "Conditions::is_empty")]
    pub conditions: Conditions,
}

/// Guard names of a transition: one name or an ordered list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Conditions {
    One(String),
    Many(Vec<String>),
}

impl Default for Conditions {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl Conditions {
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name.clone()],
            Self::Many(names) => names.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Many(names) if names.is_empty())
    }
}

/// Document encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick the format from a file extension (`.yaml`, `.yml`, `.json`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }

    pub(crate) fn parse<T: DeserializeOwned>(self, text: &str) -> Result<T, String> {
        match self {
            Self::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

impl Definition {
    pub fn from_str_as(text: &str, format: Format) -> Result<Self, MalformedGraphError> {
        format.parse(text).map_err(MalformedGraphError::Parse)
    }

    pub fn from_path(path: &Path) -> Result<Self, MalformedGraphError> {
        let format = Format::from_path(path)
            .ok_or_else(|| MalformedGraphError::UnsupportedFormat(path.to_path_buf()))?;
        let text = std::fs::read_to_string(path).map_err(|source| MalformedGraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str_as(&text, format)
    }
}
