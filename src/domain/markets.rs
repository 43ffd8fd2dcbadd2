//! Market catalog: which crops are agronomically viable per market, and
//! month resolution for recommendation requests.

use crate::domain::errors::ServingError;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};

/// Static per-market allow-lists. Crops outside a market's list are
/// dropped from recommendations entirely, not merely demoted.
pub const MARKET_CROPS: &[(&str, &[&str])] = &[
    ("davangere", &["Cotton", "Maize", "Ragi", "Rice", "Tomato"]),
    ("gangavathi", &["Cotton", "Maize", "Ragi", "Rice"]),
    ("HBhalli", &["Cotton", "Maize", "Ragi", "Rice"]),
    ("hospet", &["Maize", "Ragi", "Rice", "Tomato"]),
];

/// Allow-list for a market, if one is configured. Markets without an
/// entry pass unfiltered.
pub fn allowed_crops(market: &str) -> Option<&'static [&'static str]> {
    MARKET_CROPS
        .iter()
        .find(|(name, _)| *name == market)
        .map(|(_, crops)| *crops)
}

/// Resolves the request month: an explicit month wins, then a month
/// derived from an ISO date, then the current UTC month.
///
/// An out-of-range month or unparseable date is an input error.
pub fn resolve_month(month: Option<u32>, date: Option<&str>) -> Result<u32, ServingError> {
    if let Some(m) = month {
        if !(1..=12).contains(&m) {
            return Err(ServingError::input(format!(
                "month must be 1-12, got {m}"
            )));
        }
        return Ok(m);
    }

    if let Some(raw) = date {
        return parse_iso_month(raw)
            .ok_or_else(|| ServingError::input(format!("unparseable date: {raw}")));
    }

    Ok(Utc::now().month())
}

fn parse_iso_month(raw: &str) -> Option<u32> {
    if let Ok(date) = raw.parse::<NaiveDate>() {
        return Some(date.month());
    }
    if let Ok(datetime) = raw.parse::<NaiveDateTime>() {
        return Some(datetime.month());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_lists() {
        assert_eq!(
            allowed_crops("hospet"),
            Some(&["Maize", "Ragi", "Rice", "Tomato"][..])
        );
        assert_eq!(
            allowed_crops("davangere").map(|c| c.len()),
            Some(5)
        );
        assert!(allowed_crops("unknown-market").is_none());
        // Catalog is exact-match, including the odd-cased HBhalli.
        assert!(allowed_crops("HBhalli").is_some());
        assert!(allowed_crops("hbhalli").is_none());
    }

    #[test]
    fn test_explicit_month_wins_over_date() {
        assert_eq!(resolve_month(Some(3), Some("2025-07-01")).unwrap(), 3);
    }

    #[test]
    fn test_month_out_of_range() {
        assert_eq!(resolve_month(Some(0), None).unwrap_err().kind(), "input_error");
        assert_eq!(resolve_month(Some(13), None).unwrap_err().kind(), "input_error");
    }

    #[test]
    fn test_month_from_iso_date() {
        assert_eq!(resolve_month(None, Some("2025-11-20")).unwrap(), 11);
        assert_eq!(
            resolve_month(None, Some("2025-02-03T10:30:00")).unwrap(),
            2
        );
    }

    #[test]
    fn test_unparseable_date_is_input_error() {
        let err = resolve_month(None, Some("next tuesday")).unwrap_err();
        assert_eq!(err.kind(), "input_error");
        assert!(err.to_string().contains("next tuesday"));
    }

    #[test]
    fn test_defaults_to_current_month() {
        let month = resolve_month(None, None).unwrap();
        assert!((1..=12).contains(&month));
    }
}
