use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::CardQuery;
use crate::error::Result;

/// Descriptive attributes of a catalogued card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardAttributes {
    pub player_name: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub parallel: Option<String>,
    #[serde(default)]
    pub grading_company: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub autographed: bool,
}

impl From<CardAttributes> for CardQuery {
    fn from(attrs: CardAttributes) -> Self {
        CardQuery {
            player_name: attrs.player_name,
            year: attrs.year,
            brand: attrs.brand,
            series: attrs.series,
            card_number: attrs.card_number,
            parallel: attrs.parallel,
            grading_company: attrs.grading_company,
            grade: attrs.grade,
            autographed: attrs.autographed,
            ..Default::default()
        }
    }
}

/// Read-only access to the collection catalog
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Attributes for a card item; `None` if the id is unknown or not a card
    async fn card_attributes(&self, item_id: &str) -> Result<Option<CardAttributes>>;
}
