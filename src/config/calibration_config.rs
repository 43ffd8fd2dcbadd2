//! Calibration configuration parsing from environment variables.
//!
//! Covers the anchor blend, the clamp band, sequence padding, and the
//! static classifier fusion weights.

use crate::domain::sequence::PaddingPolicy;
use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct CalibrationEnvConfig {
    /// Blend weight toward the model prediction, scaled by confidence.
    pub alpha: f64,
    /// Half-width of the clamp band as a fraction of the anchor.
    pub clamp_pct: f64,
    /// Fractional magnitude of the directional anchor nudge; 0 disables.
    pub trend_nudge_pct: f64,
    pub padding_policy: PaddingPolicy,
    /// Static fusion weights for the recommendation classifiers.
    pub primary_model_weight: f64,
    pub ensemble_model_weight: f64,
}

impl Default for CalibrationEnvConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            clamp_pct: 0.15,
            trend_nudge_pct: 0.0,
            padding_policy: PaddingPolicy::RepeatEdge,
            primary_model_weight: 0.6,
            ensemble_model_weight: 0.4,
        }
    }
}

impl CalibrationEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let padding_policy = match env::var("PADDING_POLICY") {
            Ok(raw) => raw
                .parse::<PaddingPolicy>()
                .context("parsing PADDING_POLICY")?,
            Err(_) => defaults.padding_policy,
        };

        Ok(Self {
            alpha: parse_f64("CALIBRATION_ALPHA", defaults.alpha).clamp(0.0, 1.0),
            clamp_pct: parse_f64("CLAMP_PCT", defaults.clamp_pct).max(0.0),
            trend_nudge_pct: parse_f64("TREND_NUDGE_PCT", defaults.trend_nudge_pct).max(0.0),
            padding_policy,
            primary_model_weight: parse_f64("PRIMARY_MODEL_WEIGHT", defaults.primary_model_weight)
                .max(0.0),
            ensemble_model_weight: parse_f64(
                "ENSEMBLE_MODEL_WEIGHT",
                defaults.ensemble_model_weight,
            )
            .max(0.0),
        })
    }
}

fn parse_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_config_defaults() {
        let config = CalibrationEnvConfig::default();
        assert_eq!(config.alpha, 0.6);
        assert_eq!(config.clamp_pct, 0.15);
        assert_eq!(config.trend_nudge_pct, 0.0);
        assert_eq!(config.padding_policy, PaddingPolicy::RepeatEdge);
        assert_eq!(
            config.primary_model_weight + config.ensemble_model_weight,
            1.0
        );
    }
}
