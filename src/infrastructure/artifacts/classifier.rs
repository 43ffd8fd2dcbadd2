//! Crop recommendation classifiers.
//!
//! Two artifact styles are supported: ONNX classifiers exposing a full
//! probability vector, and smartcore forests that only emit hard labels
//! (their vote is synthesized into a probability vector). Both align to
//! the crop label catalog.

use super::transform::FeatureScaler;
use crate::domain::errors::ServingError;
use anyhow::Context;
use ort::session::Session;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::RandomForestClassifier;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Confidence assigned to the predicted label when a model exposes only
/// hard labels; the remainder is spread uniformly over the other crops.
const HARD_LABEL_CONFIDENCE: f64 = 0.8;

/// Interface for loaded crop classifiers. Implementations return a
/// probability vector aligned with the crop label catalog.
pub trait CropClassifier: Send + Sync {
    fn probabilities(&self, features: &[f64]) -> Result<Vec<f64>, String>;

    /// Model name/type, used for logging and weight attribution.
    fn name(&self) -> &str;
}

/// Label classes written by the training pipeline: index order is the
/// encoding order for markets and the class order for crops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelCatalog {
    pub markets: Vec<String>,
    pub crops: Vec<String>,
}

impl LabelCatalog {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)?;
        let catalog: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing label catalog {path:?}"))?;
        Ok(catalog)
    }

    /// Unseen categorical encoding is an input error, not a silent default.
    pub fn encode_market(&self, market: &str) -> Result<usize, ServingError> {
        self.markets
            .iter()
            .position(|m| m == market)
            .ok_or_else(|| ServingError::input(format!("Unknown market: {market}")))
    }

    pub fn decode_crop(&self, index: usize) -> Option<&str> {
        self.crops.get(index).map(String::as_str)
    }

    pub fn n_crops(&self) -> usize {
        self.crops.len()
    }
}

/// ONNX classifier with probability output of shape [1, n_crops].
pub struct OnnxCropClassifier {
    session: Mutex<Session>,
    n_crops: usize,
    name: String,
}

impl OnnxCropClassifier {
    pub fn load(model_path: &Path, n_crops: usize, name: &str) -> anyhow::Result<Self> {
        let session = Session::builder()?
            .commit_from_file(model_path)
            .with_context(|| format!("loading ONNX classifier {model_path:?}"))?;
        info!("Loaded {} classifier from {:?}", name, model_path);
        Ok(Self {
            session: Mutex::new(session),
            n_crops,
            name: name.to_string(),
        })
    }
}

impl CropClassifier for OnnxCropClassifier {
    fn probabilities(&self, features: &[f64]) -> Result<Vec<f64>, String> {
        let row: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let shape = vec![1, row.len()];
        let input_value = ort::value::Value::from_array((shape.as_slice(), row))
            .map_err(|e| format!("Input value creation failed: {e}"))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Session lock failed: {e}"))?;
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| e.to_string())?;

        let output_value = outputs
            .iter()
            .next()
            .map(|(_, v)| v)
            .ok_or("No output found")?;
        let data = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| e.to_string())?;
        let probabilities: Vec<f64> = data.1.iter().map(|p| *p as f64).collect();

        if probabilities.len() != self.n_crops {
            return Err(format!(
                "classifier emitted {} probabilities for {} crop labels",
                probabilities.len(),
                self.n_crops
            ));
        }
        Ok(probabilities)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Smartcore random forest. Hard labels only; its vote is synthesized
/// into a probability vector over the label space.
pub struct ForestCropClassifier {
    model: RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>,
    scaler: FeatureScaler,
    n_crops: usize,
}

impl ForestCropClassifier {
    pub fn load(model_path: &Path, scaler: FeatureScaler, n_crops: usize) -> anyhow::Result<Self> {
        let file = File::open(model_path)?;
        let model = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("deserializing forest model {model_path:?}"))?;
        info!("Loaded ensemble forest from {:?}", model_path);
        Ok(Self {
            model,
            scaler,
            n_crops,
        })
    }

    pub fn synthesize_vote(&self, label: usize) -> Result<Vec<f64>, String> {
        if label >= self.n_crops {
            return Err(format!(
                "predicted label {} outside crop label space of {}",
                label, self.n_crops
            ));
        }
        if self.n_crops == 1 {
            return Ok(vec![1.0]);
        }
        let residual = (1.0 - HARD_LABEL_CONFIDENCE) / (self.n_crops - 1) as f64;
        let mut vote = vec![residual; self.n_crops];
        vote[label] = HARD_LABEL_CONFIDENCE;
        Ok(vote)
    }
}

impl CropClassifier for ForestCropClassifier {
    fn probabilities(&self, features: &[f64]) -> Result<Vec<f64>, String> {
        let scaled = self.scaler.transform(features)?;
        let matrix = DenseMatrix::from_2d_vec(&vec![scaled])
            .map_err(|e| format!("Matrix creation failed: {e}"))?;
        let predictions = self
            .model
            .predict(&matrix)
            .map_err(|e| format!("Prediction failed: {e}"))?;
        let label = *predictions.first().ok_or("No prediction returned")? as usize;
        self.synthesize_vote(label)
    }

    fn name(&self) -> &str {
        "ensemble-forest"
    }
}
