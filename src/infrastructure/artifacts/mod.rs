//! Artifact resolution and loading.
//!
//! Trained artifacts live in a flat model directory following the training
//! pipeline's naming scheme (`{family}_{market}_{crop}` plus a companion
//! transform, optionally prefixed with a generation tag). Resolution walks
//! the generations most-capable-first and short-circuits on the first
//! candidate whose files all load.

pub mod classifier;
pub mod forecast_model;
pub mod transform;

use crate::domain::errors::ServingError;
use classifier::{CropClassifier, ForestCropClassifier, LabelCatalog, OnnxCropClassifier};
use forecast_model::OnnxForecaster;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use transform::load_feature_scaler;

/// Label catalog written once by the training pipeline; shared by every
/// recommendation model.
pub const CROP_LABEL_CATALOG: &str = "crop_label_catalog.json";

/// Primary recommendation classifier candidates, priority order.
pub const PRIMARY_CLASSIFIERS: &[&str] = &[
    "xgb_enhanced_crop_recommendation.onnx",
    "xgb_crop_recommendation.onnx",
];

pub const ENSEMBLE_CLASSIFIER: &str = "ensemble_crop_recommendation.json";
pub const ENSEMBLE_SCALER: &str = "ensemble_scaler.json";

/// Forecast artifact generations, most capable first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Attention,
    Enhanced,
    Baseline,
}

impl Generation {
    pub const PRIORITY: [Generation; 3] =
        [Generation::Attention, Generation::Enhanced, Generation::Baseline];

    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Attention => "lstm_attention",
            Self::Enhanced => "lstm_enhanced",
            Self::Baseline => "lstm",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Attention => "attention-enhanced",
            Self::Enhanced => "enhanced",
            Self::Baseline => "baseline",
        }
    }
}

/// A loaded classifier with its static fusion weight.
pub struct WeightedClassifier {
    pub model: Box<dyn CropClassifier>,
    pub weight: f64,
}

/// The full recommendation artifact bundle: label catalog plus every
/// classifier that resolved.
pub struct ClassifierSet {
    pub catalog: LabelCatalog,
    pub members: Vec<WeightedClassifier>,
}

impl std::fmt::Debug for ClassifierSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierSet")
            .field("crops", &self.catalog.crops.len())
            .field("members", &self.members.len())
            .finish()
    }
}

/// Filesystem-backed artifact storage. Deserialization here is the only
/// blocking I/O in the serving core.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    model_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Resolves the best available forecast artifact for a (market, crop)
    /// pair. A candidate is usable only if both the model and its
    /// companion transform exist and load cleanly; anything else moves on
    /// to the next generation.
    pub fn resolve_forecaster(
        &self,
        market: &str,
        crop: &str,
        seq_length: usize,
    ) -> Result<OnnxForecaster, ServingError> {
        for generation in Generation::PRIORITY {
            let prefix = generation.file_prefix();
            let model_path = self.model_dir.join(format!("{prefix}_{market}_{crop}.onnx"));
            let transform_path = self
                .model_dir
                .join(format!("{prefix}_{market}_{crop}_scaler.json"));

            if !model_path.exists() || !transform_path.exists() {
                debug!(
                    "No {} candidate for {market}-{crop} (missing model or transform)",
                    generation.label()
                );
                continue;
            }

            match OnnxForecaster::load(&model_path, &transform_path, generation, seq_length) {
                Ok(forecaster) => return Ok(forecaster),
                Err(e) => {
                    warn!(
                        "Skipping unusable {} candidate for {market}-{crop}: {e:#}",
                        generation.label()
                    );
                }
            }
        }

        Err(ServingError::ModelNotFound {
            market: market.to_string(),
            crop: crop.to_string(),
        })
    }

    /// Loads the crop/market label catalog. Its absence is a deployment
    /// problem, distinct from an untrained (market, crop) pair.
    pub fn load_label_catalog(&self) -> Result<LabelCatalog, ServingError> {
        let path = self.model_dir.join(CROP_LABEL_CATALOG);
        LabelCatalog::load(&path).map_err(|e| {
            warn!("Label catalog unusable at {path:?}: {e:#}");
            ServingError::unavailable(CROP_LABEL_CATALOG)
        })
    }

    /// Assembles the recommendation classifier set: the primary classifier
    /// (enhanced generation first) plus the optional ensemble member. At
    /// least one classifier must resolve.
    pub fn resolve_classifier_set(
        &self,
        primary_weight: f64,
        ensemble_weight: f64,
    ) -> Result<ClassifierSet, ServingError> {
        let catalog = self.load_label_catalog()?;
        let mut members: Vec<WeightedClassifier> = Vec::new();

        for file_name in PRIMARY_CLASSIFIERS {
            let path = self.model_dir.join(file_name);
            if !path.exists() {
                continue;
            }
            let name = file_name.trim_end_matches(".onnx");
            match OnnxCropClassifier::load(&path, catalog.n_crops(), name) {
                Ok(model) => {
                    members.push(WeightedClassifier {
                        model: Box::new(model),
                        weight: primary_weight,
                    });
                    break;
                }
                Err(e) => warn!("Skipping unusable primary classifier {path:?}: {e:#}"),
            }
        }

        let forest_path = self.model_dir.join(ENSEMBLE_CLASSIFIER);
        let scaler_path = self.model_dir.join(ENSEMBLE_SCALER);
        if forest_path.exists() && scaler_path.exists() {
            let loaded = load_feature_scaler(&scaler_path).and_then(|scaler| {
                ForestCropClassifier::load(&forest_path, scaler, catalog.n_crops())
            });
            match loaded {
                Ok(model) => members.push(WeightedClassifier {
                    model: Box::new(model),
                    weight: ensemble_weight,
                }),
                Err(e) => warn!("Skipping unusable ensemble member: {e:#}"),
            }
        } else if forest_path.exists() != scaler_path.exists() {
            warn!(
                "Ensemble member incomplete (model present: {}, scaler present: {}); skipping",
                forest_path.exists(),
                scaler_path.exists()
            );
        }

        if members.is_empty() {
            return Err(ServingError::unavailable("crop recommendation classifier"));
        }
        Ok(ClassifierSet { catalog, members })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_priority_order() {
        assert_eq!(Generation::PRIORITY[0], Generation::Attention);
        assert_eq!(Generation::PRIORITY[2], Generation::Baseline);
        assert_eq!(Generation::Baseline.file_prefix(), "lstm");
        assert_eq!(Generation::Attention.file_prefix(), "lstm_attention");
    }

    #[test]
    fn test_resolver_not_found_when_no_tier_present() {
        let store = ArtifactStore::new("/nonexistent/model/dir");
        let err = store
            .resolve_forecaster("davangere", "Cotton", 30)
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert!(err.to_string().contains("davangere-Cotton"));
    }

    #[test]
    fn test_missing_catalog_is_unavailable() {
        let store = ArtifactStore::new("/nonexistent/model/dir");
        let err = store.load_label_catalog().unwrap_err();
        assert_eq!(err.kind(), "unavailable");
    }
}
