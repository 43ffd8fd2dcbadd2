//! Anchor-based calibration of raw model predictions.
//!
//! Per-crop training sets are small and the raw model output is not
//! trusted on its own. The anchor (a real quoted price) acts as a prior:
//! the prediction is pulled toward it in proportion to confidence, then
//! clamped to a band around it so a single bad inference cannot produce an
//! implausible forecast.

use tracing::debug;

/// Anchor-relative clamp interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampBand {
    pub lo: f64,
    pub hi: f64,
}

/// Confidence in the model scales with how much real history backs the
/// sequence: `min(1, observed / target_len)`.
pub fn confidence_for_history(observed: usize, target_len: usize) -> f64 {
    if target_len == 0 {
        return 0.0;
    }
    (observed as f64 / target_len as f64).min(1.0)
}

/// Bounds the forecast to `anchor * (1 ± clamp_pct * confidence)`.
pub fn clamp_band(anchor: f64, clamp_pct: f64, confidence: f64) -> ClampBand {
    ClampBand {
        lo: anchor * (1.0 - clamp_pct * confidence),
        hi: anchor * (1.0 + clamp_pct * confidence),
    }
}

/// Blends the raw model prediction with the anchor and clamps the result.
///
/// The incremental form `anchor + w * (pred - anchor)` is algebraically
/// the weighted sum `w*pred + (1-w)*anchor` but returns the anchor exactly
/// when the prediction equals it.
pub fn blend_with_anchor(
    model_pred: f64,
    anchor: f64,
    alpha: f64,
    clamp_pct: f64,
    confidence: f64,
) -> f64 {
    let weight = alpha * confidence;
    let raw = anchor + weight * (model_pred - anchor);
    let band = clamp_band(anchor, clamp_pct, confidence);
    raw.clamp(band.lo, band.hi)
}

/// Derives the anchor price. Total: every failure mode falls back to the
/// last observed price (or 0.0 for an empty sequence), never an error.
///
/// An explicit caller-supplied anchor wins verbatim when it is a positive
/// finite number. A derived anchor may be nudged by the sign of the recent
/// trend (mean first difference over the last five points), scaled by
/// `trend_nudge_pct`; a zero magnitude disables the nudge.
pub fn derive_anchor(explicit: Option<f64>, sequence: &[f64], trend_nudge_pct: f64) -> f64 {
    if let Some(anchor) = explicit {
        if anchor.is_finite() && anchor > 0.0 {
            return anchor;
        }
        debug!(
            "Ignoring unusable explicit anchor {anchor}; falling back to last observed price"
        );
    }

    let last = sequence.last().copied().unwrap_or(0.0);
    if trend_nudge_pct <= 0.0 || sequence.len() < 2 {
        return last;
    }

    let window = &sequence[sequence.len().saturating_sub(5)..];
    let mean_diff = window
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .sum::<f64>()
        / (window.len() - 1) as f64;
    if mean_diff == 0.0 {
        return last;
    }
    last * (1.0 + trend_nudge_pct * mean_diff.signum())
}
