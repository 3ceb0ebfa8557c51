//! # Card Valuation Engine
//!
//! Market valuation for trading cards:
//! - Sold-listing search with progressive query relaxation
//! - AI match verification with a deterministic token fallback
//! - IQR outlier removal and confidence scoring
//! - Two-tier cache (memory + SQLite)
//! - Grading ROI analysis and short investment notes
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use card_valuation_engine::{CardQuery, CredentialsProvider, EngineConfig, ValuationEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EngineConfig::from_env()?;
//!     let engine = ValuationEngine::new(&config, Arc::new(CredentialsProvider::from_env())).await?;
//!
//!     let query = CardQuery::new("Joe Burrow")
//!         .with_year(2020)
//!         .with_brand("Panini Prizm")
//!         .with_card_number("307");
//!
//!     let value = engine.valuate(&query).await?;
//!     println!("${:.2} from {} sales ({:?})", value.average, value.sales_count, value.confidence);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod grading;
pub mod market;
pub mod narrative;
pub mod providers;
pub mod retry;
pub mod stats;
pub mod verify;

// Re-export primary types
pub use core::{CardQuery, Confidence, GradingAnalysis, Listing, QuickAnalysis, Recommendation, ValuationResult};
pub use catalog::{CardAttributes, CatalogReader};
pub use config::{CredentialsProvider, EngineConfig, SettingsStore};
pub use engine::ValuationEngine;
pub use error::{Result, ValuationError};
pub use narrative::Locale;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
