//! Fixed-length price sequence preparation.
//!
//! Sequence models consume exactly `seq_length` observations. Histories
//! longer than that are windowed to the most recent values; shorter ones
//! are padded at the oldest side so the final element is always the most
//! recent real observation.

use crate::domain::errors::ServingError;
use std::str::FromStr;

/// How a short history is padded up to the target length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingPolicy {
    /// Repeat the earliest known value.
    #[default]
    RepeatEdge,
    /// Extend the local trend backwards, slope taken from the first and
    /// last known values. Falls back to `RepeatEdge` for a single point.
    TrendInterpolation,
}

impl FromStr for PaddingPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "repeat-last" | "repeat" => Ok(PaddingPolicy::RepeatEdge),
            "trend" | "interpolate" => Ok(PaddingPolicy::TrendInterpolation),
            _ => anyhow::bail!(
                "Invalid PADDING_POLICY: {}. Must be 'repeat-last' or 'trend'",
                s
            ),
        }
    }
}

/// Normalizes `history` into exactly `target_len` values.
///
/// An empty history is treated as a single zero observation before
/// padding. Negative or non-finite values are rejected rather than
/// coerced.
pub fn normalize_history(
    history: &[f64],
    target_len: usize,
    policy: PaddingPolicy,
) -> Result<Vec<f64>, ServingError> {
    for (i, value) in history.iter().enumerate() {
        if !value.is_finite() {
            return Err(ServingError::input(format!(
                "history[{i}] is not a finite number"
            )));
        }
        if *value < 0.0 {
            return Err(ServingError::input(format!(
                "history[{i}] is negative ({value})"
            )));
        }
    }

    if history.len() >= target_len {
        return Ok(history[history.len() - target_len..].to_vec());
    }

    let known: Vec<f64> = if history.is_empty() {
        vec![0.0]
    } else {
        history.to_vec()
    };

    let deficit = target_len - known.len();
    let mut sequence = Vec::with_capacity(target_len);

    match policy {
        PaddingPolicy::TrendInterpolation if known.len() >= 2 => {
            let first = known[0];
            let last = known[known.len() - 1];
            let step = (last - first) / (known.len() - 1) as f64;
            // Backward extrapolation; floor at zero to keep prices valid.
            for k in (1..=deficit).rev() {
                sequence.push((first - step * k as f64).max(0.0));
            }
        }
        _ => {
            sequence.extend(std::iter::repeat_n(known[0], deficit));
        }
    }

    sequence.extend_from_slice(&known);
    debug_assert_eq!(sequence.len(), target_len);
    Ok(sequence)
}
