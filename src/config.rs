//! Run configuration loaded from YAML.
//!
//! ```yaml
//! constants:
//!   mass: 0.068          # kg
//!   ke: 6.53e-5          # N·m²/A²
//!   resistance: 10.0     # Ω
//!   inductance: 0.4125   # H
//!   gravity: 9.81        # m/s²
//!   nominal_gap: 0.007   # m
//!
//! simulation:            # optional
//!   horizon: 2.0         # s
//!   sample_count: 1000
//!   method: matrix_exponential
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use maglev_calc::{PhysicalConstants, SimulationSettings};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub constants: PhysicalConstants,
    #[serde(default)]
    pub simulation: SimulationSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            constants: PhysicalConstants::reference(),
            simulation: SimulationSettings::default(),
        }
    }
}

impl RunConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: RunConfig = serde_yaml::from_str(text).context("malformed run configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("cannot open {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Command-line values win over the file.
    pub fn with_overrides(mut self, horizon: Option<f64>, samples: Option<usize>) -> Result<Self> {
        if let Some(horizon) = horizon {
            self.simulation.horizon = horizon;
        }
        if let Some(samples) = samples {
            self.simulation.sample_count = samples;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        self.constants.validate().context("invalid physical constants")?;
        self.simulation.validate().context("invalid simulation settings")?;
        Ok(())
    }
}
