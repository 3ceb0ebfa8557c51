//! Grading return-on-investment math.
//!
//! ROI for a graded tier compares its price against the raw price plus the
//! grading fee. A zero raw or graded price means there was no data, and the
//! ROI is reported as 0 with `insufficient_data` set.

use crate::core::{GradingAnalysis, Recommendation};

/// Grading service fee (submission + shipping), reference currency
pub const DEFAULT_GRADING_COST: f64 = 30.0;

/// Grading company used for the graded populations
pub const DEFAULT_GRADING_COMPANY: &str = "PSA";

/// `(graded - (raw + cost)) / (raw + cost) × 100`, or 0 without data
pub fn roi(raw_price: f64, graded_price: f64, grading_cost: f64) -> f64 {
    if raw_price == 0.0 || graded_price == 0.0 {
        return 0.0;
    }
    let basis = raw_price + grading_cost;
    (graded_price - basis) / basis * 100.0
}

/// GRADE if the 10 pays off outright or both tiers look good, HOLD while a
/// 10 is still profitable, SELL_RAW otherwise.
pub fn recommend(grade9_roi: f64, grade10_roi: f64) -> Recommendation {
    if grade10_roi > 100.0 || (grade9_roi > 20.0 && grade10_roi > 50.0) {
        Recommendation::Grade
    } else if grade10_roi > 0.0 {
        Recommendation::Hold
    } else {
        Recommendation::SellRaw
    }
}

/// Population prices for one card
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PopulationPrices {
    pub raw: f64,
    pub grade9: f64,
    pub grade10: f64,
}

impl GradingAnalysis {
    /// Derive ROI figures and the recommendation from population prices
    pub fn from_prices(
        prices: PopulationPrices,
        active_listings: u64,
        grading_cost: f64,
        grading_company: impl Into<String>,
    ) -> Self {
        let grade9_roi = roi(prices.raw, prices.grade9, grading_cost);
        let grade10_roi = roi(prices.raw, prices.grade10, grading_cost);

        Self {
            raw_price: prices.raw,
            grade9_price: prices.grade9,
            grade10_price: prices.grade10,
            grade9_roi,
            grade10_roi,
            active_listings,
            recommendation: recommend(grade9_roi, grade10_roi),
            grading_cost,
            grading_company: grading_company.into(),
            insufficient_data: prices.raw == 0.0 || prices.grade9 == 0.0 || prices.grade10 == 0.0,
        }
    }
}
