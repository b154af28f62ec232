//! Checkpoint error types.

use thiserror::Error;

/// Errors that can occur while exporting or restoring a checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// A leaf names a state the statechart does not declare
    #[error("Checkpoint names undeclared state '{0}'")]
    UnknownState(String),

    /// A leaf names a composite state
    #[error("Checkpoint lists composite state '{0}' as a leaf")]
    NotALeaf(String),

    /// The leaves do not form one active child per active region
    #[error("Checkpoint configuration is not legal: {0}")]
    ValidationFailed(String),

    #[error("restore() called from inside a guard or action")]
    Reentrant,
}
