pub mod azure_openai;
pub mod ebay;
pub mod perplexity;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::Listing;
use crate::error::Result;

pub use azure_openai::AzureOpenAi;
pub use ebay::EbayProvider;
pub use perplexity::PerplexityNews;

/// Trait for sold-listings marketplaces (eBay, secondary price guides, etc.)
#[async_trait]
pub trait MarketplaceProvider: Send + Sync {
    /// Sold listings for a free-text query. Prices are in the listing's own currency.
    async fn search_sold(&self, query: &str) -> Result<Vec<Listing>>;

    /// Number of active (unsold) offers for a free-text query
    async fn count_active(&self, query: &str) -> Result<u64>;

    /// Get provider name
    fn name(&self) -> &str;
}

/// Trait for chat models that answer with a JSON object
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a system + user prompt, get the parsed JSON reply.
    /// `Unavailable` when no model is configured.
    async fn complete_json(&self, system: &str, user: &str) -> Result<Value>;

    /// Get model name for logging
    fn name(&self) -> &str;
}

/// Trait for search-augmented news/context lookups
#[async_trait]
pub trait NewsSearch: Send + Sync {
    /// Short text summary for a query; `None` when no key is configured
    async fn search(&self, query: &str) -> Result<Option<String>>;

    fn name(&self) -> &str;
}

/// Shared client construction for every provider
pub(crate) fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
