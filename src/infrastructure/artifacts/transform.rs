//! Companion transform files for trained artifacts.
//!
//! Two on-disk layouts exist: older training runs wrote the price scaler
//! parameters at the top level, newer runs wrap them in a named bundle
//! (optionally carrying a feature scaler the serving path does not use).
//! Both are resolved into one in-memory shape at load time.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Scaler parameters fitted at training time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerParams {
    MinMax { data_min: f64, data_max: f64 },
    Standard { mean: f64, scale: f64 },
}

impl ScalerParams {
    pub fn transform(&self, value: f64) -> f64 {
        match self {
            Self::MinMax { data_min, data_max } => {
                let range = data_max - data_min;
                if range == 0.0 {
                    0.0
                } else {
                    (value - data_min) / range
                }
            }
            Self::Standard { mean, scale } => {
                if *scale == 0.0 {
                    0.0
                } else {
                    (value - mean) / scale
                }
            }
        }
    }

    pub fn inverse(&self, value: f64) -> f64 {
        match self {
            Self::MinMax { data_min, data_max } => value * (data_max - data_min) + data_min,
            Self::Standard { mean, scale } => value * scale + mean,
        }
    }
}

/// On-disk transform file, either layout.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TransformFile {
    Bundle {
        price_scaler: ScalerParams,
        #[serde(default)]
        feature_scaler: Option<serde_json::Value>,
    },
    Legacy(ScalerParams),
}

/// Normalized in-memory transform. Only the price scaler participates in
/// serving; feature scalers belong to the training-side pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PriceTransform {
    pub price: ScalerParams,
}

impl From<TransformFile> for PriceTransform {
    fn from(file: TransformFile) -> Self {
        match file {
            TransformFile::Bundle { price_scaler, .. } => Self {
                price: price_scaler,
            },
            TransformFile::Legacy(params) => Self { price: params },
        }
    }
}

pub fn load_transform(path: &Path) -> anyhow::Result<PriceTransform> {
    let file = File::open(path)?;
    let parsed: TransformFile = serde_json::from_reader(BufReader::new(file))?;
    Ok(parsed.into())
}

/// Per-feature standardization for classifier inputs (the ensemble
/// member's companion artifact).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

impl FeatureScaler {
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, String> {
        if row.len() != self.means.len() || row.len() != self.scales.len() {
            return Err(format!(
                "feature row width {} does not match scaler width {}",
                row.len(),
                self.means.len()
            ));
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(self.scales.iter()))
            .map(|(v, (mean, scale))| {
                if *scale == 0.0 {
                    0.0
                } else {
                    (v - mean) / scale
                }
            })
            .collect())
    }
}

pub fn load_feature_scaler(path: &Path) -> anyhow::Result<FeatureScaler> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max_round_trip() {
        let scaler = ScalerParams::MinMax {
            data_min: 1000.0,
            data_max: 3000.0,
        };
        assert_eq!(scaler.transform(2000.0), 0.5);
        assert_eq!(scaler.inverse(0.5), 2000.0);
    }

    #[test]
    fn test_degenerate_range_guard() {
        let scaler = ScalerParams::MinMax {
            data_min: 5.0,
            data_max: 5.0,
        };
        assert_eq!(scaler.transform(123.0), 0.0);

        let scaler = ScalerParams::Standard {
            mean: 1.0,
            scale: 0.0,
        };
        assert_eq!(scaler.transform(123.0), 0.0);
    }

    #[test]
    fn test_legacy_layout_parses() {
        let raw = r#"{"kind":"min_max","data_min":100.0,"data_max":500.0}"#;
        let parsed: TransformFile = serde_json::from_str(raw).unwrap();
        let transform = PriceTransform::from(parsed);
        assert_eq!(transform.price.transform(300.0), 0.5);
    }

    #[test]
    fn test_bundle_layout_parses() {
        let raw = r#"{
            "price_scaler": {"kind":"min_max","data_min":0.0,"data_max":10.0},
            "feature_scaler": {"anything":"ignored"}
        }"#;
        let parsed: TransformFile = serde_json::from_str(raw).unwrap();
        let transform = PriceTransform::from(parsed);
        assert_eq!(transform.price.transform(5.0), 0.5);
    }

    #[test]
    fn test_feature_scaler_width_mismatch() {
        let scaler = FeatureScaler {
            means: vec![0.0, 0.0],
            scales: vec![1.0, 1.0],
        };
        assert!(scaler.transform(&[1.0]).is_err());
        assert_eq!(scaler.transform(&[2.0, 4.0]).unwrap(), vec![2.0, 4.0]);
    }
}
