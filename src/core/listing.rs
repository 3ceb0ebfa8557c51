use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// One observed sale (or active offer) from a marketplace.
///
/// `price` is already in the reference currency; `currency` keeps the
/// currency the listing was recorded in. The URL doubles as the listing id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub title: String,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub sold_at: DateTime<Utc>,
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Provider that returned the listing
    #[serde(default)]
    pub source: String,
}

fn default_currency() -> String {
    crate::market::REFERENCE_CURRENCY.to_string()
}

impl Listing {
    /// Create a listing priced in the reference currency
    pub fn new(
        title: impl Into<String>,
        price: f64,
        sold_at: DateTime<Utc>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            price,
            currency: default_currency(),
            sold_at,
            url: url.into(),
            image_url: None,
            source: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Get display string for logging
    pub fn display(&self) -> String {
        format!("{} - ${:.2} ({})", self.title, self.price, self.sold_at.format("%Y-%m-%d"))
    }
}
