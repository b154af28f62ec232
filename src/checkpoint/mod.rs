//! Checkpoint and resume of running machines.
//!
//! A checkpoint captures the active configuration and the retained
//! transition history so a long-running machine can survive a process
//! restart. Guards and actions are code and are never part of it; the
//! statechart is reloaded from its definition and the checkpoint is
//! restored into a freshly built machine.

use crate::core::{TransitionHistory, TransitionRecord};
use crate::effects::{ActiveConfiguration, ConfigurationSnapshot, FireError, Machine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable checkpoint of a machine's runtime state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    pub configuration: ConfigurationSnapshot,

    /// Retained history, oldest first
    pub history: Vec<TransitionRecord>,
}

impl Checkpoint {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str(json).map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }
}

impl<C> Machine<C> {
    /// Capture the last published configuration and history.
    pub fn checkpoint(&self) -> Checkpoint {
        let configuration = self.snapshot();
        let history = self.history().records().cloned().collect();
        Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            configuration,
            history,
        }
    }

    /// Replace the active configuration and history with a checkpoint's.
    ///
    /// The checkpoint is validated against this machine's statechart
    /// first; on error the machine is left untouched. No entry or exit
    /// actions run.
    pub fn restore(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: checkpoint.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        let _turn = self.turn("restore").map_err(|err| match err {
            FireError::ReentrantFire { .. } => CheckpointError::Reentrant,
            other => CheckpointError::ValidationFailed(other.to_string()),
        })?;

        let graph = self.statechart().graph();
        let leaves = checkpoint
            .configuration
            .leaves
            .iter()
            .map(|leaf| {
                let idx = graph
                    .idx(leaf.as_str())
                    .ok_or_else(|| CheckpointError::UnknownState(leaf.to_string()))?;
                if graph.node(idx).is_simple() {
                    Ok(idx)
                } else {
                    Err(CheckpointError::NotALeaf(leaf.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let config = ActiveConfiguration::from_leaves(checkpoint.configuration.version, leaves);
        if !graph.is_legal(config.leaves()) {
            return Err(CheckpointError::ValidationFailed(format!(
                "leaves {:?} are not one active child per active region",
                checkpoint.configuration.leaves
            )));
        }

        let history = TransitionHistory::from_records(
            checkpoint.history.clone(),
            self.options().history_capacity,
        );
        tracing::info!(
            id = %checkpoint.id,
            version = config.version(),
            "Restored checkpoint"
        );
        self.install(config, history);
        Ok(())
    }
}
