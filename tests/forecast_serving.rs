//! Integration tests for the forecast serving path: request dispatch,
//! artifact resolution fallback, and input validation.

use agrocast::application::serving::ServingContext;
use agrocast::config::Config;
use agrocast::domain::types::ServingRequest;
use std::path::PathBuf;

fn empty_model_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("agrocast-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn context(name: &str) -> ServingContext {
    let config = Config {
        model_dir: empty_model_dir(name),
        ..Config::default()
    };
    ServingContext::build(config)
}

#[test]
fn forecast_with_no_artifact_at_any_tier_is_not_found() {
    let ctx = context("forecast-notfound");
    let request = ServingRequest::PriceForecast {
        market: "davangere".to_string(),
        crop: "Cotton".to_string(),
        history: vec![2000.0, 2100.0, 2200.0],
        anchor_price: None,
    };
    let err = ctx.handle(request).unwrap_err();
    assert_eq!(err.kind(), "not_found");
    assert!(err.to_string().contains("davangere-Cotton"));
}

#[test]
fn forecast_with_blank_market_is_input_error() {
    let ctx = context("forecast-blank");
    let request = ServingRequest::PriceForecast {
        market: "   ".to_string(),
        crop: "Rice".to_string(),
        history: vec![],
        anchor_price: None,
    };
    let err = ctx.handle(request).unwrap_err();
    assert_eq!(err.kind(), "input_error");
}

#[test]
fn request_json_is_task_discriminated() {
    let ctx = context("forecast-json");
    let request: ServingRequest = serde_json::from_str(
        r#"{"task":"price_forecast","market":"gangavathi","crop":"Maize","anchor_price":1800.5}"#,
    )
    .unwrap();
    // History defaults to empty; the pair is untrained in this fixture.
    let err = ctx.handle(request).unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[test]
fn failed_resolution_is_retried_on_next_request() {
    // Failed loads must not be cached: the same request keeps probing the
    // store rather than pinning the first NotFound.
    let ctx = context("forecast-retry");
    let request = || ServingRequest::PriceForecast {
        market: "hospet".to_string(),
        crop: "Ragi".to_string(),
        history: vec![1500.0; 40],
        anchor_price: None,
    };
    assert_eq!(ctx.handle(request()).unwrap_err().kind(), "not_found");
    assert_eq!(ctx.handle(request()).unwrap_err().kind(), "not_found");
}
