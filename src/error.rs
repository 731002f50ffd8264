//! Error types for the simulation engine.
//!
//! Configuration problems, activation failures and broken model plugins are
//! reported through `SimError`. Dropped packets are never errors: they are
//! counted in the statistics and, when enabled, answered with a NACK packet.

use crate::simulation::types::NodeId;

/// Errors raised by the engine, the registry and the model plugins.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A configuration field is missing, out of range or inconsistent.
    InvalidConfig { field: String, reason: String },
    /// The requested project is not present in the registry.
    UnknownProject(String),
    /// No model with this name exists in the given slot of the project.
    UnknownModel { slot: &'static str, name: String },
    /// No node behavior with this name exists in the project.
    UnknownNodeKind(String),
    /// A model or node parameter failed schema validation.
    InvalidParameter { owner: String, field: String, reason: String },
    /// `check_requirements` refused the node; it was not activated.
    Activation { kind: String, reason: String },
    /// A model plugin returned a result outside its contract.
    ModelViolation { model: String, detail: String },
    /// A node id was referenced that is not part of the simulation.
    NodeNotFound(NodeId),
}

impl SimError {
    pub(crate) fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SimError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn violation(model: impl Into<String>, detail: impl Into<String>) -> Self {
        SimError::ModelViolation {
            model: model.into(),
            detail: detail.into(),
        }
    }

    /// True for errors that only affect a single node and leave the
    /// simulation usable.
    pub fn is_node_level(&self) -> bool {
        matches!(self, SimError::Activation { .. } | SimError::NodeNotFound(_))
    }
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::InvalidConfig { field, reason } => {
                write!(f, "invalid configuration field '{}': {}", field, reason)
            }
            SimError::UnknownProject(name) => write!(f, "unknown project '{}'", name),
            SimError::UnknownModel { slot, name } => {
                write!(f, "unknown {} model '{}'", slot, name)
            }
            SimError::UnknownNodeKind(name) => write!(f, "unknown node kind '{}'", name),
            SimError::InvalidParameter { owner, field, reason } => {
                write!(f, "invalid parameter '{}' for {}: {}", field, owner, reason)
            }
            SimError::Activation { kind, reason } => {
                write!(f, "node of kind '{}' failed activation: {}", kind, reason)
            }
            SimError::ModelViolation { model, detail } => {
                write!(f, "model '{}' violated its contract: {}", model, detail)
            }
            SimError::NodeNotFound(id) => write!(f, "node {} not found", id),
        }
    }
}

impl std::error::Error for SimError {}

/// Convenience alias used across the engine.
pub type SimResult<T> = Result<T, SimError>;
