//! Configuration module for agrocast.
//!
//! This module provides structured configuration loading from environment
//! variables, organized by domain: Serving and Calibration.

mod calibration_config;
mod serving_config;

pub use calibration_config::CalibrationEnvConfig;
pub use serving_config::ServingEnvConfig;

use crate::domain::sequence::PaddingPolicy;
use anyhow::Result;
use std::path::PathBuf;

/// Main application configuration.
///
/// Aggregates the sub-configs into flat field access for the rest of the
/// application.
#[derive(Debug, Clone)]
pub struct Config {
    // Serving (from ServingEnvConfig)
    pub model_dir: PathBuf,
    pub seq_length: usize,
    pub forecast_attempts: usize,
    pub default_top_k: usize,

    // Calibration (from CalibrationEnvConfig)
    pub calibration_alpha: f64,
    pub clamp_pct: f64,
    pub trend_nudge_pct: f64,
    pub padding_policy: PaddingPolicy,
    pub primary_model_weight: f64,
    pub ensemble_model_weight: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let serving = ServingEnvConfig::from_env();
        let calibration = CalibrationEnvConfig::from_env()?;
        Ok(Self::from_parts(serving, calibration))
    }

    pub fn from_parts(serving: ServingEnvConfig, calibration: CalibrationEnvConfig) -> Self {
        Self {
            model_dir: serving.model_dir,
            seq_length: serving.seq_length,
            forecast_attempts: serving.forecast_attempts,
            default_top_k: serving.default_top_k,
            calibration_alpha: calibration.alpha,
            clamp_pct: calibration.clamp_pct,
            trend_nudge_pct: calibration.trend_nudge_pct,
            padding_policy: calibration.padding_policy,
            primary_model_weight: calibration.primary_model_weight,
            ensemble_model_weight: calibration.ensemble_model_weight,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_parts(ServingEnvConfig::default(), CalibrationEnvConfig::default())
    }
}
