//! Price forecast orchestration: resolve the artifact, prepare the
//! sequence, run the model, calibrate the result.

use crate::application::model_cache::ModelCache;
use crate::config::Config;
use crate::domain::calibration::{
    blend_with_anchor, clamp_band, confidence_for_history, derive_anchor,
};
use crate::domain::errors::ServingError;
use crate::domain::sequence::{PaddingPolicy, normalize_history};
use crate::domain::types::{ForecastResult, ModelKey};
use crate::infrastructure::artifacts::forecast_model::OnnxForecaster;
use crate::infrastructure::artifacts::ArtifactStore;
use statrs::statistics::{Data, OrderStatistics};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reported confidence is capped below certainty regardless of history.
const REPORTED_CONFIDENCE_CAP: f64 = 0.95;

pub struct ForecastService {
    store: Arc<ArtifactStore>,
    cache: Arc<ModelCache<ModelKey, OnnxForecaster>>,
    seq_length: usize,
    attempts: usize,
    alpha: f64,
    clamp_pct: f64,
    trend_nudge_pct: f64,
    padding_policy: PaddingPolicy,
}

impl ForecastService {
    pub fn new(config: &Config, store: Arc<ArtifactStore>) -> Self {
        Self {
            store,
            cache: Arc::new(ModelCache::new()),
            seq_length: config.seq_length,
            attempts: config.forecast_attempts.max(1),
            alpha: config.calibration_alpha,
            clamp_pct: config.clamp_pct,
            trend_nudge_pct: config.trend_nudge_pct,
            padding_policy: config.padding_policy,
        }
    }

    pub fn forecast(
        &self,
        market: &str,
        crop: &str,
        history: &[f64],
        anchor_price: Option<f64>,
    ) -> Result<ForecastResult, ServingError> {
        if market.trim().is_empty() || crop.trim().is_empty() {
            return Err(ServingError::input("Missing market or crop"));
        }

        let key = ModelKey::Forecast {
            market: market.to_string(),
            crop: crop.to_string(),
        };
        let model = self.cache.get_or_load(&key, || {
            self.store.resolve_forecaster(market, crop, self.seq_length)
        })?;

        let sequence = normalize_history(history, self.seq_length, self.padding_policy)?;
        let last_price = sequence.last().copied().unwrap_or(0.0);
        let anchor = derive_anchor(anchor_price, &sequence, self.trend_nudge_pct);

        let model_pred = self.predict_median(&model, &sequence)?;

        let confidence = confidence_for_history(history.len(), self.seq_length);
        let band = clamp_band(anchor, self.clamp_pct, confidence);
        let forecast = blend_with_anchor(model_pred, anchor, self.alpha, self.clamp_pct, confidence);
        debug!(
            "Forecast {market}-{crop}: model={model_pred:.2} anchor={anchor:.2} \
             confidence={confidence:.2} -> {forecast:.2}"
        );

        Ok(ForecastResult {
            forecast,
            model_pred,
            anchor_price: anchor,
            last_price,
            confidence: (confidence * self.alpha).min(REPORTED_CONFIDENCE_CAP),
            prediction_range: (band.lo, band.hi),
        })
    }

    /// Runs the configured number of inference attempts and takes the
    /// median. Individual attempt failures are logged and swallowed;
    /// only total failure is an error.
    fn predict_median(
        &self,
        model: &OnnxForecaster,
        sequence: &[f64],
    ) -> Result<f64, ServingError> {
        let mut predictions = Vec::with_capacity(self.attempts);
        let mut last_error = String::new();

        for attempt in 1..=self.attempts {
            match model.predict_next(sequence) {
                Ok(pred) => predictions.push(pred),
                Err(e) => {
                    warn!("Prediction attempt {attempt}/{} failed: {e}", self.attempts);
                    last_error = e;
                }
            }
        }

        if predictions.is_empty() {
            return Err(ServingError::Prediction {
                attempts: self.attempts,
                reason: last_error,
            });
        }

        let mut samples = Data::new(predictions);
        Ok(samples.median())
    }
}

impl std::fmt::Debug for ForecastService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastService")
            .field("seq_length", &self.seq_length)
            .field("attempts", &self.attempts)
            .field("cached_models", &self.cache.len())
            .finish()
    }
}
