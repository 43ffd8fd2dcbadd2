//! Fusion and ranking of classifier probability vectors.

use crate::domain::types::CropScore;
use crate::infrastructure::artifacts::classifier::LabelCatalog;
use std::cmp::Ordering;

/// Fuses per-model probability vectors into one ranked crop list.
///
/// Scores are the weighted sum of per-crop probabilities; a vector shorter
/// than the label space contributes nothing for its missing entries, so a
/// crop scored by only one model still accumulates a partial score. Exact
/// score ties break by original label order, keeping the ranking
/// deterministic.
pub fn fuse_and_rank(votes: &[(Vec<f64>, f64)], catalog: &LabelCatalog) -> Vec<CropScore> {
    let n_crops = catalog.n_crops();
    let mut fused = vec![0.0_f64; n_crops];
    for (probabilities, weight) in votes {
        for (i, p) in probabilities.iter().take(n_crops).enumerate() {
            fused[i] += weight * p;
        }
    }

    let mut order: Vec<usize> = (0..n_crops).collect();
    order.sort_by(|&a, &b| {
        fused[b]
            .partial_cmp(&fused[a])
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });

    order
        .into_iter()
        .filter_map(|i| {
            catalog.decode_crop(i).map(|crop| CropScore {
                crop: crop.to_string(),
                score: fused[i].max(0.0),
            })
        })
        .collect()
}

/// Strict allow-list filter: crops outside the list are dropped entirely.
/// `None` (no list configured for the market) passes everything through.
pub fn filter_allowed(scores: Vec<CropScore>, allowed: Option<&[&str]>) -> Vec<CropScore> {
    match allowed {
        Some(list) => scores
            .into_iter()
            .filter(|entry| list.contains(&entry.crop.as_str()))
            .collect(),
        None => scores,
    }
}
