use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calibration::{default_role_matchers, RoleMatcher};
use crate::error::Result;

/// Wavelength window half-width used for band selection, in label units.
pub const DEFAULT_BAND_TOLERANCE_NM: f64 = 0.5;

/// Explicit pipeline configuration. Every run receives one of these; there is
/// no process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Half-width of every band-selection window, in wavelength-label units.
    pub band_tolerance_nm: f64,
    /// Leading path components below the walk root to discard as extraction
    /// scaffolding before the remaining directories become the group key.
    pub scaffold_depth: usize,
    /// Calibration-role matchers, tried in order; first match per role wins.
    pub roles: Vec<RoleMatcher>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            band_tolerance_nm: DEFAULT_BAND_TOLERANCE_NM,
            scaffold_depth: 0,
            roles: default_role_matchers(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a TOML file. Missing keys fall back to the
    /// defaults above.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = toml::from_str(&raw)?;
        Ok(config)
    }
}
