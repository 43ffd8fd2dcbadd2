//! Serving configuration parsing from environment variables.

use std::env;
use std::path::PathBuf;

/// Serving environment configuration: artifact location and request
/// shape defaults.
#[derive(Debug, Clone)]
pub struct ServingEnvConfig {
    pub model_dir: PathBuf,
    pub seq_length: usize,
    pub forecast_attempts: usize,
    pub default_top_k: usize,
}

impl Default for ServingEnvConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            seq_length: 30,
            forecast_attempts: 3,
            default_top_k: 3,
        }
    }
}

impl ServingEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model_dir: env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            seq_length: env::var("SEQ_LENGTH")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.seq_length),
            forecast_attempts: env::var("FORECAST_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.forecast_attempts),
            default_top_k: env::var("DEFAULT_TOP_K")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.default_top_k),
        }
    }
}
