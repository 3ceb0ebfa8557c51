use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::core::Listing;

/// Coarse reliability label, driven by sample size only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Output of one estimation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValuationResult {
    pub low: f64,
    pub high: f64,
    pub average: f64,
    #[serde(default)]
    pub last_sold: Option<f64>,
    #[serde(default)]
    pub last_sold_at: Option<DateTime<Utc>>,
    pub currency: String,
    pub confidence: Confidence,
    /// Providers consulted (empty when nothing was found)
    #[serde(default)]
    pub sources: Vec<String>,
    pub sales_count: usize,
    /// Cleaned comparable sales backing the estimate
    #[serde(default)]
    pub comps: Vec<Listing>,
    /// Percent change between older and newer halves of the comps
    #[serde(default)]
    pub trend_percent: Option<f64>,
}

impl ValuationResult {
    /// "No comparable sales found"
    pub fn empty() -> Self {
        Self {
            low: 0.0,
            high: 0.0,
            average: 0.0,
            last_sold: None,
            last_sold_at: None,
            currency: crate::market::REFERENCE_CURRENCY.to_string(),
            confidence: Confidence::Low,
            sources: Vec::new(),
            sales_count: 0,
            comps: Vec::new(),
            trend_percent: None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.sales_count > 0
    }
}

/// Outcome of the grading ROI state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Grade,
    Hold,
    SellRaw,
}

/// Raw vs graded economics for one card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradingAnalysis {
    pub raw_price: f64,
    pub grade9_price: f64,
    pub grade10_price: f64,
    pub grade9_roi: f64,
    pub grade10_roi: f64,
    /// Active offers for the raw card (supply signal)
    pub active_listings: u64,
    pub recommendation: Recommendation,
    pub grading_cost: f64,
    pub grading_company: String,
    /// Raw or a graded price was 0, so the ROI figures are guarded zeros
    pub insufficient_data: bool,
}

/// Valuation plus a short investment note
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuickAnalysis {
    pub valuation: ValuationResult,
    pub summary: String,
    pub generated_at: DateTime<Utc>,
}
