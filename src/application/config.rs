use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::ModelError;
use crate::error::ConfigError;

/// Solver-level knobs pushed onto the backend before every solve
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// quiet = true
/// time_limit = 30.0
/// relative_mip_gap = 0.01
/// cache_dir = "target/lp-cache"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Silence the backend's console output
    pub quiet: bool,
    /// Wall-clock limit in seconds
    pub time_limit: Option<f64>,
    pub presolve: bool,
    /// 0 lets the backend decide
    pub threads: usize,
    pub int_feas_tol: Option<f64>,
    pub relative_mip_gap: Option<f64>,
    pub absolute_mip_gap: Option<f64>,
    /// Pass variable start values to the backend
    pub warm_start: bool,
    /// Directory of the result cache; caching is off without one
    pub cache_dir: Option<PathBuf>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            time_limit: None,
            presolve: true,
            threads: 0,
            int_feas_tol: None,
            relative_mip_gap: None,
            absolute_mip_gap: None,
            warm_start: false,
            cache_dir: None,
        }
    }
}

impl SolverConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SolverConfig = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.validate().map_err(|e| ConfigError::InvalidValue {
            field: parameter_of(&e),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::from_toml_str(&text)
    }

    /// Check every numeric knob against its allowed range.
    pub fn validate(&self) -> Result<(), ModelError> {
        check("time_limit", self.time_limit, |v| v > 0.0)?;
        check("int_feas_tol", self.int_feas_tol, |v| v > 0.0)?;
        check("relative_mip_gap", self.relative_mip_gap, |v| v >= 0.0)?;
        check("absolute_mip_gap", self.absolute_mip_gap, |v| v >= 0.0)?;
        Ok(())
    }
}

fn check(
    parameter: &'static str,
    value: Option<f64>,
    valid: impl Fn(f64) -> bool,
) -> Result<(), ModelError> {
    match value {
        Some(value) if !valid(value) => Err(ModelError::InvalidParameter { parameter, value }),
        _ => Ok(()),
    }
}

fn parameter_of(error: &ModelError) -> &'static str {
    match error {
        ModelError::InvalidParameter { parameter, .. } => *parameter,
        _ => "config",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = SolverConfig::from_toml_str("quiet = true\nthreads = 4\n").unwrap();
        assert!(config.quiet);
        assert_eq!(config.threads, 4);
        assert!(config.presolve);
        assert_eq!(config.time_limit, None);
        assert_eq!(config.cache_dir, None);
    }

    #[test]
    fn test_negative_gap_is_rejected() {
        let err = SolverConfig::from_toml_str("absolute_mip_gap = -1.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "absolute_mip_gap",
                ..
            }
        ));
    }

    #[test]
    fn test_unreadable_file() {
        let err = SolverConfig::from_toml_file("/nonexistent/lpkit.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile(_)));
    }
}
