//! Integration tests for the recommendation serving path, driven by a
//! real (tiny) forest member trained and serialized into a fixture model
//! directory.

use agrocast::application::serving::ServingContext;
use agrocast::config::Config;
use agrocast::domain::features::recommendation_features;
use agrocast::domain::types::{ServingOutcome, ServingRequest};
use chrono::{Datelike, Utc};
use smartcore::ensemble::random_forest_classifier::RandomForestClassifier;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fs::File;
use std::path::{Path, PathBuf};

const MARKETS: [&str; 4] = ["davangere", "gangavathi", "hospet", "HBhalli"];
const CROPS: [&str; 5] = ["Cotton", "Maize", "Ragi", "Rice", "Tomato"];

fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("agrocast-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_catalog(dir: &Path) {
    let catalog = serde_json::json!({
        "markets": MARKETS,
        "crops": CROPS,
    });
    serde_json::to_writer(File::create(dir.join("crop_label_catalog.json")).unwrap(), &catalog)
        .unwrap();
}

fn write_identity_scaler(dir: &Path) {
    let width = recommendation_features(0, 1, 2025).len();
    let scaler = serde_json::json!({
        "means": vec![0.0; width],
        "scales": vec![1.0; width],
    });
    serde_json::to_writer(File::create(dir.join("ensemble_scaler.json")).unwrap(), &scaler)
        .unwrap();
}

/// Fits a small forest on the exact feature rows the service will build,
/// labeled deterministically, and serializes it as the ensemble member.
fn write_forest(dir: &Path) {
    let year = Utc::now().year();
    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut labels: Vec<u32> = Vec::new();
    for market_enc in 0..MARKETS.len() {
        for month in 1..=12u32 {
            rows.push(recommendation_features(market_enc, month, year));
            labels.push((market_enc as u32 + month) % CROPS.len() as u32);
        }
    }
    let x = DenseMatrix::from_2d_vec(&rows).unwrap();
    let forest: RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>> =
        RandomForestClassifier::fit(&x, &labels, Default::default()).unwrap();
    serde_json::to_writer(
        File::create(dir.join("ensemble_crop_recommendation.json")).unwrap(),
        &forest,
    )
    .unwrap();
}

fn context(dir: PathBuf) -> ServingContext {
    let config = Config {
        model_dir: dir,
        ..Config::default()
    };
    ServingContext::build(config)
}

fn recommend(
    ctx: &ServingContext,
    market: &str,
    month: Option<u32>,
    date: Option<&str>,
    top_k: Option<usize>,
) -> Result<(Vec<String>, Vec<f64>, u32), agrocast::domain::errors::ServingError> {
    let request = ServingRequest::CropRecommendation {
        market: market.to_string(),
        month,
        date: date.map(str::to_string),
        top_k,
    };
    match ctx.handle(request)? {
        ServingOutcome::Recommendation(result) => Ok((
            result.recommended_crops,
            result.confidence_scores,
            result.month,
        )),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn hospet_recommendations_stay_within_allow_list() {
    let dir = fixture_dir("rec-hospet");
    write_catalog(&dir);
    write_identity_scaler(&dir);
    write_forest(&dir);

    let ctx = context(dir);
    let (crops, scores, month) = recommend(&ctx, "hospet", Some(3), None, None).unwrap();

    assert_eq!(month, 3);
    assert!(!crops.is_empty());
    assert_eq!(crops.len(), scores.len());
    let allowed = ["Maize", "Ragi", "Rice", "Tomato"];
    for crop in &crops {
        assert!(
            allowed.contains(&crop.as_str()),
            "{crop} is not grown in hospet"
        );
    }
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn top_k_truncates_the_ranking() {
    let dir = fixture_dir("rec-topk");
    write_catalog(&dir);
    write_identity_scaler(&dir);
    write_forest(&dir);

    let ctx = context(dir);
    let (crops, _, _) = recommend(&ctx, "davangere", Some(6), None, Some(2)).unwrap();
    assert_eq!(crops.len(), 2);
}

#[test]
fn identical_requests_rank_identically() {
    let dir = fixture_dir("rec-determinism");
    write_catalog(&dir);
    write_identity_scaler(&dir);
    write_forest(&dir);

    let ctx = context(dir);
    let a = recommend(&ctx, "gangavathi", Some(9), None, Some(5)).unwrap();
    let b = recommend(&ctx, "gangavathi", Some(9), None, Some(5)).unwrap();
    assert_eq!(a.0, b.0);
    assert_eq!(a.1, b.1);
}

#[test]
fn month_is_derived_from_iso_date() {
    let dir = fixture_dir("rec-date");
    write_catalog(&dir);
    write_identity_scaler(&dir);
    write_forest(&dir);

    let ctx = context(dir);
    let (_, _, month) = recommend(&ctx, "hospet", None, Some("2026-07-15"), None).unwrap();
    assert_eq!(month, 7);

    let err = recommend(&ctx, "hospet", None, Some("not-a-date"), None).unwrap_err();
    assert_eq!(err.kind(), "input_error");
}

#[test]
fn unknown_market_is_input_error() {
    let dir = fixture_dir("rec-unknown-market");
    write_catalog(&dir);
    write_identity_scaler(&dir);
    write_forest(&dir);

    let ctx = context(dir);
    let err = recommend(&ctx, "mysore", Some(3), None, None).unwrap_err();
    assert_eq!(err.kind(), "input_error");
    assert!(err.to_string().contains("mysore"));
}

#[test]
fn missing_catalog_is_unavailable() {
    let dir = fixture_dir("rec-no-catalog");
    write_identity_scaler(&dir);
    write_forest(&dir);

    let ctx = context(dir);
    let err = recommend(&ctx, "hospet", Some(3), None, None).unwrap_err();
    assert_eq!(err.kind(), "unavailable");
}

#[test]
fn partial_ensemble_member_leaves_no_usable_classifier() {
    // Forest present, companion scaler missing: the member is skipped and
    // with no primary classifier on disk the whole set is unavailable.
    let dir = fixture_dir("rec-partial-member");
    write_catalog(&dir);
    write_forest(&dir);

    let ctx = context(dir);
    let err = recommend(&ctx, "hospet", Some(3), None, None).unwrap_err();
    assert_eq!(err.kind(), "unavailable");
}
