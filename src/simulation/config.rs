//! Simulation configuration record.
//!
//! Immutable once the simulation is built. Usually deserialized from the
//! scene file; every field has a default so a scene only lists what it
//! changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::geometry::Bounds;
use crate::error::{SimError, SimResult};

use super::models::ModelKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// All nodes step once per round.
    #[default]
    Synchronous,
    /// One delivery event per step, in arrival order.
    Asynchronous,
}

/// Stage switches. A disabled stage is the identity and never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Toggles {
    pub mobility: bool,
    pub interference: bool,
    /// Per-round graph refresh. When off the neighbor graph only changes
    /// when nodes are added with `connect_on_add` set.
    pub connectivity: bool,
    /// Interference adds a penalty for the reliability model instead of
    /// dropping the packet.
    pub interference_is_additive: bool,
    /// Answer failed unicasts with a NACK to the sender.
    pub nack_messages: bool,
    /// Refresh the neighbor graph right after nodes are added, whatever
    /// `connectivity` says.
    pub connect_on_add: bool,
}

impl Default for Toggles {
    fn default() -> Self {
        Toggles {
            mobility: true,
            interference: true,
            connectivity: true,
            interference_is_additive: false,
            nack_messages: false,
            connect_on_add: true,
        }
    }
}

/// A model picked by name from the project catalog, with its raw parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub name: String,
    #[serde(default)]
    pub params: Value,
}

impl ModelSelection {
    pub fn new(name: impl Into<String>, params: Value) -> Self {
        ModelSelection {
            name: name.into(),
            params,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }
}

/// One optional selection per slot; `None` means the project default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSelections {
    pub connectivity: Option<ModelSelection>,
    pub mobility: Option<ModelSelection>,
    pub interference: Option<ModelSelection>,
    pub reliability: Option<ModelSelection>,
    pub transmission: Option<ModelSelection>,
    pub distribution: Option<ModelSelection>,
}

impl ModelSelections {
    pub fn get(&self, kind: ModelKind) -> Option<&ModelSelection> {
        match kind {
            ModelKind::Connectivity => self.connectivity.as_ref(),
            ModelKind::Mobility => self.mobility.as_ref(),
            ModelKind::Interference => self.interference.as_ref(),
            ModelKind::Reliability => self.reliability.as_ref(),
            ModelKind::Transmission => self.transmission.as_ref(),
            ModelKind::Distribution => self.distribution.as_ref(),
        }
    }
}

/// A batch of nodes of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddNodes {
    pub kind: String,
    pub count: usize,
    /// Behavior parameters, validated against the kind's schema.
    #[serde(default)]
    pub params: Value,
    /// Placement for this batch only; the simulation's distribution model
    /// is used when absent.
    #[serde(default)]
    pub distribution: Option<ModelSelection>,
}

impl AddNodes {
    pub fn new(kind: impl Into<String>, count: usize) -> Self {
        AddNodes {
            kind: kind.into(),
            count,
            params: Value::Null,
            distribution: None,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn placed_by(mut self, distribution: ModelSelection) -> Self {
        self.distribution = Some(distribution);
        self
    }
}

fn default_project() -> String {
    "default".to_string()
}

fn default_bounds() -> Bounds {
    Bounds::planar(100.0, 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_project")]
    pub project: String,
    #[serde(default = "default_bounds")]
    pub bounds: Bounds,
    #[serde(default)]
    pub mode: SimulationMode,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub toggles: Toggles,
    /// Pairs farther apart are never connected, whatever the model says.
    #[serde(default)]
    pub max_connection_radius: Option<f64>,
    #[serde(default)]
    pub models: ModelSelections,
    #[serde(default)]
    pub verbose: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            project: default_project(),
            bounds: default_bounds(),
            mode: SimulationMode::default(),
            seed: 0,
            toggles: Toggles::default(),
            max_connection_radius: None,
            models: ModelSelections::default(),
            verbose: false,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> SimResult<()> {
        if let Some(axis) = self.bounds.invalid_axis() {
            return Err(SimError::config(
                format!("bounds.{}", axis),
                "min must not exceed max and both must be finite",
            ));
        }
        if let Some(radius) = self.max_connection_radius {
            if !radius.is_finite() || radius < 0.0 {
                return Err(SimError::config(
                    "max_connection_radius",
                    format!("{} is not a finite non-negative distance", radius),
                ));
            }
        }
        if self.project.trim().is_empty() {
            return Err(SimError::config("project", "must not be empty"));
        }
        Ok(())
    }
}
