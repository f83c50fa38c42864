//! Resolution parameters.
//!
//! Every global default of the matching engine lives here and is passed into
//! a resolution run explicitly.

use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, Result};

/// Parameters of a single-sample resolution run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Global ceiling on the adaptive deviation bound (retention-time units).
    pub drt_max: f64,
    /// Number of free bound estimations in the first shot before the bound
    /// is carried forward as a floor.
    pub bound_test_limit: usize,
    /// Run the shape-similarity seeding pass before the first shot.
    pub similarity_seed: bool,
    /// Two-pass resolution with a scalar retention-time shift.
    pub shift: ShiftConfig,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            drt_max: 0.02,
            bound_test_limit: 1,
            similarity_seed: true,
            shift: ShiftConfig::default(),
        }
    }
}

impl ResolveConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.drt_max.is_finite() || self.drt_max < 0.0 {
            return Err(ResolveError::InvalidConfig(format!(
                "drt_max must be finite and non-negative, got {}",
                self.drt_max
            )));
        }
        self.shift.validate()
    }
}

/// Scalar retention-time shift estimation between two resolution passes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftConfig {
    pub enabled: bool,
    /// Half-width of the re-centred rt window used in the second pass.
    pub rt_half_width: f64,
    /// Minimum number of matched fragments an analyte needs to contribute.
    pub min_fragments: usize,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rt_half_width: 0.3,
            min_fragments: 3,
        }
    }
}

impl ShiftConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.rt_half_width.is_finite() || self.rt_half_width < 0.0 {
            return Err(ResolveError::InvalidConfig(format!(
                "shift.rt_half_width must be finite and non-negative, got {}",
                self.rt_half_width
            )));
        }
        if self.min_fragments == 0 {
            return Err(ResolveError::InvalidConfig(
                "shift.min_fragments must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tolerances used to derive target windows from expected values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Relative m/z tolerance in parts per million.
    pub mz_ppm: f64,
    /// Half-width of the retention-time window.
    pub rt_half_width: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            mz_ppm: 6.0,
            rt_half_width: 0.3,
        }
    }
}

impl ToleranceConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.mz_ppm.is_finite() || self.mz_ppm < 0.0 {
            return Err(ResolveError::InvalidConfig(format!(
                "mz_ppm must be finite and non-negative, got {}",
                self.mz_ppm
            )));
        }
        if !self.rt_half_width.is_finite() || self.rt_half_width < 0.0 {
            return Err(ResolveError::InvalidConfig(format!(
                "rt_half_width must be finite and non-negative, got {}",
                self.rt_half_width
            )));
        }
        Ok(())
    }
}
