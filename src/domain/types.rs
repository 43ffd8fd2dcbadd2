use crate::domain::errors::ServingError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a trained artifact, used as the cache key.
///
/// Forecast models are trained per (market, crop); recommendation models
/// are keyed by artifact family alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelKey {
    Forecast { market: String, crop: String },
    Recommendation { family: String },
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forecast { market, crop } => write!(f, "forecast:{market}:{crop}"),
            Self::Recommendation { family } => write!(f, "recommendation:{family}"),
        }
    }
}

/// Calibrated price forecast.
///
/// Invariant: `prediction_range.0 <= forecast <= prediction_range.1`.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResult {
    pub forecast: f64,
    pub model_pred: f64,
    pub anchor_price: f64,
    pub last_price: f64,
    pub confidence: f64,
    pub prediction_range: (f64, f64),
}

/// A crop with its fused recommendation score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropScore {
    pub crop: String,
    pub score: f64,
}

/// Ranked crop recommendations for one market/month.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResult {
    pub market: String,
    pub month: u32,
    pub recommended_crops: Vec<String>,
    pub confidence_scores: Vec<f64>,
}

/// Incoming serving request, discriminated by the `task` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum ServingRequest {
    PriceForecast {
        market: String,
        crop: String,
        #[serde(default)]
        history: Vec<f64>,
        #[serde(default)]
        anchor_price: Option<f64>,
    },
    CropRecommendation {
        market: String,
        #[serde(default)]
        month: Option<u32>,
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        top_k: Option<usize>,
    },
}

/// Successful serving outcome, serialized without an outer tag so the
/// response body matches the task that produced it.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ServingOutcome {
    Forecast(ForecastResult),
    Recommendation(RecommendationResult),
}

/// Structured error payload. Every failure path produces one of these,
/// never a partial success.
#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub kind: &'static str,
    pub error: String,
}

impl From<&ServingError> for ErrorPayload {
    fn from(err: &ServingError) -> Self {
        Self {
            kind: err.kind(),
            error: err.to_string(),
        }
    }
}
