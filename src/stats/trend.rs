use crate::core::Listing;
use crate::stats::mean;

/// Minimum comps for a trend figure
pub const MIN_SAMPLE_FOR_TREND: usize = 4;

/// Percent change of the newer half's mean over the older half's mean.
///
/// Listings are ordered by date; on odd counts the newer half takes the
/// extra listing. `None` below the minimum sample, `Some(0.0)` when the
/// older half averages 0.
pub fn trend_percent(listings: &[Listing]) -> Option<f64> {
    if listings.len() < MIN_SAMPLE_FOR_TREND {
        return None;
    }

    let mut by_date: Vec<&Listing> = listings.iter().collect();
    by_date.sort_by_key(|l| l.sold_at);

    let split = by_date.len() / 2;
    let first: Vec<f64> = by_date[..split].iter().map(|l| l.price).collect();
    let second: Vec<f64> = by_date[split..].iter().map(|l| l.price).collect();

    let first_avg = mean(&first);
    if first_avg == 0.0 {
        return Some(0.0);
    }
    Some((mean(&second) - first_avg) / first_avg * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn dated(prices: &[f64]) -> Vec<Listing> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| Listing::new("card", *p, start + Duration::days(i as i64), format!("u{}", i)))
            .collect()
    }

    #[test]
    fn test_needs_four_listings() {
        assert_eq!(trend_percent(&dated(&[1.0, 2.0, 3.0])), None);
    }

    #[test]
    fn test_rising_trend() {
        // first half [10, 10], second half [15, 15]
        let trend = trend_percent(&dated(&[10.0, 10.0, 15.0, 15.0])).unwrap();
        assert!((trend - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_odd_count_second_half_larger() {
        // first [10, 20] avg 15, second [30, 30, 30] avg 30
        let trend = trend_percent(&dated(&[10.0, 20.0, 30.0, 30.0, 30.0])).unwrap();
        assert!((trend - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_sorted_by_date_not_input_order() {
        let mut listings = dated(&[10.0, 10.0, 5.0, 5.0]);
        listings.reverse();
        let trend = trend_percent(&listings).unwrap();
        assert!((trend + 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_first_half() {
        assert_eq!(trend_percent(&dated(&[0.0, 0.0, 5.0, 5.0])), Some(0.0));
    }
}
