//! Scene loading, parsing, and validation logic.
//!
//! A scene is a JSON file holding the simulation configuration record
//! (flattened at the top level) and the node batches to add before the
//! first round.

use anyhow::Context;
use serde::Deserialize;
use std::fs;

use crate::simulation::config::{AddNodes, SimulationConfig};

/// Error type for scene loading failures.
#[derive(Debug)]
pub enum SceneLoadError {
    FileReadError(String),
    ParseError(String),
    ValidationError(String),
}

impl std::fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneLoadError::FileReadError(msg) => write!(f, "Failed to read file: {}", msg),
            SceneLoadError::ParseError(msg) => write!(f, "Failed to parse JSON: {}", msg),
            SceneLoadError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for SceneLoadError {}

/// Everything needed to build and populate a simulation.
#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    /// Free-form label shown in logs.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub config: SimulationConfig,
    /// Node batches, added in order.
    #[serde(default)]
    pub nodes: Vec<AddNodes>,
}

impl Scene {
    pub fn total_nodes(&self) -> usize {
        self.nodes.iter().map(|batch| batch.count).sum()
    }
}

/// Load and parse a scene from a file.
///
/// # Parameters
///
/// * `path` - Path to the scene JSON file
///
/// # Returns
///
/// Parsed and validated Scene or an error.
pub fn load_scene(path: &str) -> Result<Scene, SceneLoadError> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path))
        .map_err(|e| SceneLoadError::FileReadError(e.to_string()))?;
    parse_scene(&data)
}

/// Parse and validate scene JSON.
pub fn parse_scene(data: &str) -> Result<Scene, SceneLoadError> {
    let scene: Scene = serde_json::from_str(data)
        .context("Invalid JSON format")
        .map_err(|e| SceneLoadError::ParseError(format!("{:#}", e)))?;

    validate_scene(&scene).map_err(SceneLoadError::ValidationError)?;

    Ok(scene)
}

/// Validate a parsed scene.
///
/// # Returns
///
/// `Ok(())` if validation passes, `Err(String)` with error description otherwise.
pub fn validate_scene(scene: &Scene) -> Result<(), String> {
    const MAX_NODES: usize = 10000;

    scene.config.validate().map_err(|e| e.to_string())?;

    if scene.nodes.is_empty() {
        return Err("Scene must contain at least one node batch".to_string());
    }
    let total = scene.total_nodes();
    if total > MAX_NODES {
        return Err(format!("Node count {} exceeds maximum of {}", total, MAX_NODES));
    }

    for (index, batch) in scene.nodes.iter().enumerate() {
        if batch.kind.trim().is_empty() {
            return Err(format!("Node batch {} has an empty kind", index));
        }
        if batch.count == 0 {
            return Err(format!("Node batch {} ('{}') adds no nodes", index, batch.kind));
        }
        if !(batch.params.is_null() || batch.params.is_object()) {
            return Err(format!("Node batch {} ('{}') params must be an object", index, batch.kind));
        }
    }

    Ok(())
}
