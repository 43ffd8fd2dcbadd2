/// Ordered list of recommendation feature names.
/// This order MUST match exactly with the order used in the training
/// pipeline. Any change here is a breaking change for deployed models.
pub const RECOMMENDATION_FEATURES: &[&str] = &[
    "market_enc",
    "year",
    "month",
    "day",
    "day_of_year",
    "week_of_year",
    "quarter",
    "is_month_start",
    "is_month_end",
    "price",
    "price_ma_7",
    "price_ma_30",
    "price_std_7",
    "price_std_30",
    "price_min_7",
    "price_max_7",
    "price_range_7",
    "price_volatility",
    "price_momentum",
    "price_change_pct",
    "market_volume",
    "price_trend",
];

/// Builds the classifier input row for a (market, month) query.
///
/// Calendar features are derived from a nominal mid-month day; the price
/// block uses the neutral defaults the models were trained to accept when
/// no live price context accompanies the query.
pub fn recommendation_features(market_enc: usize, month: u32, year: i32) -> Vec<f64> {
    let month_f = month as f64;
    vec![
        market_enc as f64,
        year as f64,
        month_f,
        15.0,
        month_f * 30.0 + 15.0,
        month_f * 4.0 + 2.0,
        ((month - 1) / 3 + 1) as f64,
        if matches!(month, 1 | 4 | 7 | 10) { 1.0 } else { 0.0 },
        if matches!(month, 3 | 6 | 9 | 12) { 1.0 } else { 0.0 },
        1000.0,
        1000.0,
        1000.0,
        50.0,
        100.0,
        950.0,
        1050.0,
        100.0,
        0.05,
        0.0,
        0.0,
        100.0,
        0.0,
    ]
}
