// -----------------------------------------------------------------------------
// Run configuration (immutable once a Frame or Optimizer is built)
// -----------------------------------------------------------------------------

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FitError, FitResult};

/// Rendering setup shared by every slice of a Frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of z-slices in the real stack.
    pub z_slices: usize,
    /// Depth distance between neighbouring slices.
    pub z_scaling: f64,
    /// Border (px) added on each side of every slice.
    pub padding: usize,
    pub background_color: f32,
    /// Intensity cells are drawn with.
    pub cell_color: f32,
    pub outline_color: [f32; 3],
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            z_slices: 1,
            z_scaling: 1.0,
            padding: 0,
            background_color: 0.0,
            cell_color: 1.0,
            outline_color: [1.0, 0.0, 0.0],
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> FitResult<()> {
        if self.z_slices == 0 {
            return Err(FitError::InvalidConfig("z_slices must be at least 1".into()));
        }
        if !self.z_scaling.is_finite() || self.z_scaling <= 0.0 {
            return Err(FitError::InvalidConfig(format!(
                "z_scaling must be finite and positive, got {}",
                self.z_scaling
            )));
        }
        if !self.background_color.is_finite() || !self.cell_color.is_finite() {
            return Err(FitError::InvalidConfig("colors must be finite".into()));
        }
        if self.outline_color.iter().any(|c| !c.is_finite()) {
            return Err(FitError::InvalidConfig("outline_color must be finite".into()));
        }
        Ok(())
    }
}

/// Finite-difference step sizes. `moving_delta` is the probe shift,
/// `epsilon` the divisor turning the cost change into a gradient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientSettings {
    pub moving_delta: f64,
    pub epsilon: f64,
    pub learning_rate: f64,
}

impl Default for GradientSettings {
    fn default() -> Self {
        Self {
            moving_delta: 1.0,
            epsilon: 1e-3,
            learning_rate: 0.1,
        }
    }
}

impl GradientSettings {
    pub fn validate(&self) -> FitResult<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(FitError::InvalidConfig(format!(
                "gradient epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        if !self.moving_delta.is_finite() || self.moving_delta == 0.0 {
            return Err(FitError::InvalidConfig(format!(
                "gradient moving_delta must be finite and non-zero, got {}",
                self.moving_delta
            )));
        }
        if !self.learning_rate.is_finite() {
            return Err(FitError::InvalidConfig("gradient learning_rate must be finite".into()));
        }
        Ok(())
    }
}

/// How a perturbation trial's cost improvement turns into accept/reject.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AcceptanceConfig {
    /// Accept strictly improving trials only.
    #[default]
    Greedy,
    /// Accept when the improvement exceeds `min_improvement` (may be negative).
    Threshold { min_improvement: f64 },
    /// Metropolis acceptance, temperature cooled geometrically over the run.
    Anneal { start_temp: f64, end_temp: f64 },
}

impl AcceptanceConfig {
    pub fn validate(&self) -> FitResult<()> {
        match *self {
            AcceptanceConfig::Greedy => Ok(()),
            AcceptanceConfig::Threshold { min_improvement } => {
                if min_improvement.is_finite() {
                    Ok(())
                } else {
                    Err(FitError::InvalidConfig("min_improvement must be finite".into()))
                }
            }
            AcceptanceConfig::Anneal { start_temp, end_temp } => {
                if !(start_temp.is_finite() && end_temp.is_finite()) || start_temp <= 0.0 || end_temp <= 0.0 {
                    return Err(FitError::InvalidConfig(format!(
                        "anneal temperatures must be positive, got start={start_temp} end={end_temp}"
                    )));
                }
                if end_temp > start_temp {
                    return Err(FitError::InvalidConfig("anneal end_temp must not exceed start_temp".into()));
                }
                Ok(())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub iterations_per_cell: usize,
    /// Every Nth iteration is a gradient pass; 0 disables gradient passes.
    pub gradient_interval: usize,
    pub acceptance: AcceptanceConfig,
    pub seed: u64,
    /// Progress is logged every `log_interval` iterations; 0 silences it.
    pub log_interval: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            iterations_per_cell: 40,
            gradient_interval: 0,
            acceptance: AcceptanceConfig::Greedy,
            seed: 0x5EED_CE11,
            log_interval: 500,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> FitResult<()> {
        self.acceptance.validate()
    }
}

/// Everything a CLI run needs, as stored on disk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub simulation: SimulationConfig,
    pub gradient: GradientSettings,
    pub optimizer: OptimizerConfig,
}

impl RunConfig {
    pub fn load_json(path: &Path) -> FitResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FitResult<()> {
        self.simulation.validate()?;
        self.gradient.validate()?;
        self.optimizer.validate()
    }
}
