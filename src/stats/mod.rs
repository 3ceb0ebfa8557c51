//! Outlier cleaning, point estimates and trend over comparable sales.

pub mod estimate;
pub mod outliers;
pub mod trend;

pub use estimate::{confidence_for, estimate, HIGH_CONFIDENCE_MIN_SALES};
pub use outliers::{iqr_bounds, remove_outliers};
pub use trend::trend_percent;

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
