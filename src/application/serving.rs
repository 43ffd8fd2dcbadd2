//! Serving root: owns the configuration, the artifact store, and the
//! per-domain services (each with its own model cache). Built once at
//! startup and shared by reference across requests.

use crate::application::forecast::ForecastService;
use crate::application::recommendation::RecommendationService;
use crate::config::Config;
use crate::domain::errors::ServingError;
use crate::domain::types::{ServingOutcome, ServingRequest};
use crate::infrastructure::artifacts::ArtifactStore;
use std::sync::Arc;
use tracing::info;

pub struct ServingContext {
    forecast: ForecastService,
    recommendation: RecommendationService,
}

impl ServingContext {
    pub fn build(config: Config) -> Self {
        let store = Arc::new(ArtifactStore::new(config.model_dir.clone()));
        info!(
            "Serving context ready (model dir: {:?}, seq length: {})",
            store.model_dir(),
            config.seq_length
        );
        Self {
            forecast: ForecastService::new(&config, Arc::clone(&store)),
            recommendation: RecommendationService::new(&config, store),
        }
    }

    /// Dispatches one request to the matching service. Every failure is a
    /// typed `ServingError`; there is no partially successful outcome.
    pub fn handle(&self, request: ServingRequest) -> Result<ServingOutcome, ServingError> {
        match request {
            ServingRequest::PriceForecast {
                market,
                crop,
                history,
                anchor_price,
            } => self
                .forecast
                .forecast(&market, &crop, &history, anchor_price)
                .map(ServingOutcome::Forecast),
            ServingRequest::CropRecommendation {
                market,
                month,
                date,
                top_k,
            } => self
                .recommendation
                .recommend(&market, month, date.as_deref(), top_k)
                .map(ServingOutcome::Recommendation),
        }
    }

}

impl std::fmt::Debug for ServingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServingContext")
            .field("forecast", &self.forecast)
            .field("recommendation", &self.recommendation)
            .finish()
    }
}
