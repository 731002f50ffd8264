//! Runtime configuration for the pacing layer.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::common::scene::SceneLoadError;

fn default_rounds() -> u64 {
    100
}

/// How long and how fast to drive a simulation. Never seen by the engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Rounds to run before exporting the trace.
    #[serde(default = "default_rounds")]
    pub rounds: u64,
    /// Real-time pacing. Absent means as fast as possible.
    #[serde(default)]
    pub rounds_per_second: Option<f64>,
    /// Invoke the refresh callback every this many rounds; 0 disables it.
    #[serde(default)]
    pub refresh_rate: u64,
    /// Where the trace export is written. Absent means no export.
    #[serde(default)]
    pub trace_path: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            rounds: default_rounds(),
            rounds_per_second: None,
            refresh_rate: 0,
            trace_path: None,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `config_path` - Path to the runtime TOML file
    pub fn load(config_path: &Path) -> Result<Self, SceneLoadError> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))
            .map_err(|e| SceneLoadError::FileReadError(format!("{:#}", e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, SceneLoadError> {
        let config: RuntimeConfig = toml::from_str(content)
            .context("Invalid TOML format")
            .map_err(|e| SceneLoadError::ParseError(format!("{:#}", e)))?;
        config.validate().map_err(SceneLoadError::ValidationError)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(rate) = self.rounds_per_second {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(format!("rounds-per-second must be a positive number, got {}", rate));
            }
        }
        Ok(())
    }

    /// Derive the runtime config path from a scene file path.
    ///
    /// Replaces the scene filename with "runtime.toml" in the same directory.
    pub fn config_path_from_scene(scene_path: &str) -> PathBuf {
        let scene = Path::new(scene_path);
        scene.parent().unwrap_or(Path::new(".")).join("runtime.toml")
    }
}
