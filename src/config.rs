// src/config.rs
// Simulation configuration as read from JSON. Every field is optional; missing ones fall back to
// the nominal pendulum evaluated numerically with the direct-inverse solve.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DynamicsError, DynamicsResult};
use crate::math::SolveMode;
use crate::params::PhysicalParameters;

/// Recognized options: evaluator selection, solve mode and the physical parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Route evaluations through the symbolic backend.
    pub symbolic: bool,

    /// Numeric solve for the free-motion acceleration.
    pub solve: SolveMode,

    pub m0: f64,
    pub m1: f64,
    pub l0: f64,
    pub l1: f64,

    /// Restitution coefficient (0 = plastic-like, 1 = elastic).
    pub gamma: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        let p = PhysicalParameters::nominal();
        Self {
            symbolic: false,
            solve: SolveMode::default(),
            m0: p.m0(),
            m1: p.m1(),
            l0: p.l0(),
            l1: p.l1(),
            gamma: p.gamma(),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> DynamicsResult<Self> {
        serde_json::from_str(json).map_err(|e| DynamicsError::Config(e.to_string()))
    }

    /// Reads a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> DynamicsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        info!(path = %path.display(), symbolic = config.symbolic, "loaded configuration");
        Ok(config)
    }

    /// Validated physical parameters.
    pub fn parameters(&self) -> DynamicsResult<PhysicalParameters> {
        PhysicalParameters::new(self.m0, self.m1, self.l0, self.l1, self.gamma)
    }
}
