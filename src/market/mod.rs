//! Marketplace query building, fetching and listing hygiene.

pub mod currency;
pub mod fetcher;
pub mod junk;
pub mod relax;

pub use currency::REFERENCE_CURRENCY;
pub use fetcher::{FetchOutcome, MarketFetcher, SECONDARY_THRESHOLD};
pub use junk::{filter_junk, is_junk};
pub use relax::relaxation_plan;
