//! ONNX sequence forecaster: one trained LSTM-family model plus its
//! resolved price transform, loaded as a unit and immutable afterwards.

use super::Generation;
use super::transform::{PriceTransform, load_transform};
use anyhow::Context;
use ort::session::Session;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct OnnxForecaster {
    // Session::run takes &mut self; the session itself is never replaced.
    session: Mutex<Session>,
    transform: PriceTransform,
    generation: Generation,
    seq_length: usize,
}

impl OnnxForecaster {
    pub fn load(
        model_path: &Path,
        transform_path: &Path,
        generation: Generation,
        seq_length: usize,
    ) -> anyhow::Result<Self> {
        let session = Session::builder()?
            .commit_from_file(model_path)
            .with_context(|| format!("loading ONNX model {model_path:?}"))?;
        let transform = load_transform(transform_path)
            .with_context(|| format!("loading transform {transform_path:?}"))?;
        info!(
            "Loaded {} forecast model from {:?}",
            generation.label(),
            model_path
        );
        Ok(Self {
            session: Mutex::new(session),
            transform,
            generation,
            seq_length,
        })
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Runs one inference over a normalized sequence of exactly
    /// `seq_length` prices and returns the prediction in price units.
    pub fn predict_next(&self, sequence: &[f64]) -> Result<f64, String> {
        if sequence.len() != self.seq_length {
            return Err(format!(
                "sequence length {} does not match model input {}",
                sequence.len(),
                self.seq_length
            ));
        }

        let scaled: Vec<f32> = sequence
            .iter()
            .map(|price| self.transform.price.transform(*price) as f32)
            .collect();

        let shape = vec![1, self.seq_length, 1];
        let input_value = ort::value::Value::from_array((shape.as_slice(), scaled))
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
        let scaled_pred = *data.1.iter().next().ok_or("Empty output")? as f64;

        Ok(self.transform.price.inverse(scaled_pred))
    }
}

impl std::fmt::Debug for OnnxForecaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxForecaster")
            .field("generation", &self.generation)
            .field("seq_length", &self.seq_length)
            .finish()
    }
}
