//! Batch configuration, loadable from JSON.

use std::fs;
use std::path::Path;

use gcmatch::{ResolveConfig, ToleranceConfig};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{BatchError, Result};

/// Zero-based column positions in a peak-list table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakColumns {
    pub mz: usize,
    pub rt: usize,
    pub signal: usize,
}

impl Default for PeakColumns {
    fn default() -> Self {
        Self { mz: 0, rt: 1, signal: 3 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub resolve: ResolveConfig,
    pub tolerance: ToleranceConfig,
    pub columns: PeakColumns,
    /// Regex stripped from the signal column header to get the sample name.
    pub sample_suffix: String,
    /// Worker threads; 0 lets rayon decide.
    pub threads: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            resolve: ResolveConfig::default(),
            tolerance: ToleranceConfig::default(),
            columns: PeakColumns::default(),
            sample_suffix: r"\.mzXML Peak area$".to_string(),
            threads: 0,
        }
    }
}

impl BatchConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: BatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| BatchError::io(path, e))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.resolve.validate()?;
        self.tolerance.validate()?;
        self.sample_suffix_regex()?;
        Ok(())
    }

    pub fn sample_suffix_regex(&self) -> Result<Regex> {
        Ok(Regex::new(&self.sample_suffix)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = BatchConfig::from_json_str(r#"{"resolve": {"drt_max": 0.05}, "threads": 4}"#).unwrap();
        assert!(config.resolve.drt_max == 0.05);
        assert_eq!(config.resolve.bound_test_limit, 1);
        assert_eq!(config.threads, 4);
        assert_eq!(config.columns, PeakColumns::default());
    }

    #[test]
    fn test_bad_pattern_is_rejected() {
        let result = BatchConfig::from_json_str(r#"{"sample_suffix": "(unclosed"}"#);
        assert!(matches!(result, Err(BatchError::Regex(_))));
    }

    #[test]
    fn test_bad_ceiling_is_rejected() {
        let result = BatchConfig::from_json_str(r#"{"resolve": {"drt_max": -0.1}}"#);
        assert!(matches!(result, Err(BatchError::Resolve(_))));
    }
}
