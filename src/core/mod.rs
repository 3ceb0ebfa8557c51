pub mod card_query;
pub mod listing;
pub mod valuation;

pub use card_query::CardQuery;
pub use listing::Listing;
pub use valuation::{
    Confidence, GradingAnalysis, QuickAnalysis, Recommendation, ValuationResult,
};
