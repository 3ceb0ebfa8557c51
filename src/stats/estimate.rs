use crate::core::{Confidence, Listing, ValuationResult};
use crate::market::REFERENCE_CURRENCY;
use crate::stats::{mean, remove_outliers, trend_percent};

/// Cleaned sales needed for HIGH confidence
pub const HIGH_CONFIDENCE_MIN_SALES: usize = 6;

/// Confidence tier for a cleaned sample size
pub fn confidence_for(sales: usize) -> Confidence {
    match sales {
        0 | 1 => Confidence::Low,
        n if n >= HIGH_CONFIDENCE_MIN_SALES => Confidence::High,
        _ => Confidence::Medium,
    }
}

/// Outlier-clean verified listings and turn them into a valuation.
///
/// Comps in the result are newest first.
pub fn estimate(listings: Vec<Listing>, sources: Vec<String>) -> ValuationResult {
    let mut comps = remove_outliers(listings);
    if comps.is_empty() {
        return ValuationResult::empty();
    }

    comps.sort_by(|a, b| b.sold_at.cmp(&a.sold_at));
    let prices: Vec<f64> = comps.iter().map(|l| l.price).collect();
    let newest = &comps[0];

    let (low, high, average) = if comps.len() == 1 {
        (newest.price, newest.price, newest.price)
    } else {
        let low = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let high = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // mean can drift outside [min, max] by an ulp
        (low, high, mean(&prices).clamp(low, high))
    };

    ValuationResult {
        low,
        high,
        average,
        last_sold: Some(newest.price),
        last_sold_at: Some(newest.sold_at),
        currency: REFERENCE_CURRENCY.to_string(),
        confidence: confidence_for(comps.len()),
        sources,
        sales_count: comps.len(),
        trend_percent: trend_percent(&comps),
        comps,
    }
}
