//! Crop recommendation orchestration: resolve the classifier set, collect
//! per-model votes, fuse, filter by market, truncate.

use crate::application::model_cache::ModelCache;
use crate::application::ranker::{filter_allowed, fuse_and_rank};
use crate::config::Config;
use crate::domain::errors::ServingError;
use crate::domain::features::recommendation_features;
use crate::domain::markets::{allowed_crops, resolve_month};
use crate::domain::types::{ModelKey, RecommendationResult};
use crate::infrastructure::artifacts::{ArtifactStore, ClassifierSet};
use chrono::{Datelike, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Artifact family key for the recommendation bundle.
const RECOMMENDATION_FAMILY: &str = "crop_recommendation";

pub struct RecommendationService {
    store: Arc<ArtifactStore>,
    cache: Arc<ModelCache<ModelKey, ClassifierSet>>,
    default_top_k: usize,
    primary_weight: f64,
    ensemble_weight: f64,
}

impl RecommendationService {
    pub fn new(config: &Config, store: Arc<ArtifactStore>) -> Self {
        Self {
            store,
            cache: Arc::new(ModelCache::new()),
            default_top_k: config.default_top_k,
            primary_weight: config.primary_model_weight,
            ensemble_weight: config.ensemble_model_weight,
        }
    }

    pub fn recommend(
        &self,
        market: &str,
        month: Option<u32>,
        date: Option<&str>,
        top_k: Option<usize>,
    ) -> Result<RecommendationResult, ServingError> {
        if market.trim().is_empty() {
            return Err(ServingError::input("Missing market"));
        }
        let month = resolve_month(month, date)?;
        let top_k = top_k.unwrap_or(self.default_top_k);

        let key = ModelKey::Recommendation {
            family: RECOMMENDATION_FAMILY.to_string(),
        };
        let set = self.cache.get_or_load(&key, || {
            self.store
                .resolve_classifier_set(self.primary_weight, self.ensemble_weight)
        })?;

        let market_enc = set.catalog.encode_market(market)?;
        let features = recommendation_features(market_enc, month, Utc::now().year());

        let votes = self.collect_votes(&set, &features)?;
        let ranked = fuse_and_rank(&votes, &set.catalog);
        let filtered = filter_allowed(ranked, allowed_crops(market));

        let (recommended_crops, confidence_scores) = filtered
            .into_iter()
            .take(top_k)
            .map(|entry| (entry.crop, entry.score))
            .unzip();

        Ok(RecommendationResult {
            market: market.to_string(),
            month,
            recommended_crops,
            confidence_scores,
        })
    }

    /// One probability vector per classifier that answered. Per-member
    /// failures are logged and swallowed; weights are renormalized over
    /// the survivors so the fixed weights still sum to 1. Every member
    /// failing is a prediction error.
    fn collect_votes(
        &self,
        set: &ClassifierSet,
        features: &[f64],
    ) -> Result<Vec<(Vec<f64>, f64)>, ServingError> {
        let mut votes = Vec::with_capacity(set.members.len());
        let mut last_error = String::new();

        for member in &set.members {
            match member.model.probabilities(features) {
                Ok(probabilities) => votes.push((probabilities, member.weight)),
                Err(e) => {
                    warn!("Classifier {} failed: {e}", member.model.name());
                    last_error = e;
                }
            }
        }

        if votes.is_empty() {
            return Err(ServingError::Prediction {
                attempts: set.members.len(),
                reason: last_error,
            });
        }

        let total_weight: f64 = votes.iter().map(|(_, w)| w).sum();
        if total_weight > 0.0 {
            for (_, weight) in &mut votes {
                *weight /= total_weight;
            }
        }
        debug!("Fusing {} classifier vote(s)", votes.len());
        Ok(votes)
    }
}

impl std::fmt::Debug for RecommendationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationService")
            .field("default_top_k", &self.default_top_k)
            .field("cached_sets", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn service() -> RecommendationService {
        let config = Config::default();
        let store = Arc::new(ArtifactStore::new("/nonexistent/model/dir"));
        RecommendationService::new(&config, store)
    }

    #[test]
    fn test_missing_market_is_input_error() {
        let err = service().recommend("", None, None, None).unwrap_err();
        assert_eq!(err.kind(), "input_error");
    }

    #[test]
    fn test_bad_month_rejected_before_artifact_resolution() {
        let err = service()
            .recommend("hospet", Some(13), None, None)
            .unwrap_err();
        assert_eq!(err.kind(), "input_error");
    }

    #[test]
    fn test_missing_artifacts_are_unavailable() {
        let err = service()
            .recommend("hospet", Some(3), None, None)
            .unwrap_err();
        assert_eq!(err.kind(), "unavailable");
    }
}
