use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CredentialsProvider;
use crate::core::Listing;
use crate::error::{Result, ValuationError};
use crate::providers::{http_client, MarketplaceProvider};

const FINDING_API_URL: &str = "https://svcs.ebay.com/services/search/FindingService/v1";
const ENTRIES_PER_PAGE: u32 = 100;
/// Sports trading cards category
const SPORTS_CARDS_CATEGORY: &str = "261328";

/// eBay Finding API provider (sold listings + active counts)
pub struct EbayProvider {
    client: Client,
    credentials: Arc<CredentialsProvider>,
    base_url: String,
}

// Finding API wraps every value in a single-element array.

#[derive(Debug, Deserialize)]
struct FindingResponse {
    #[serde(rename = "findCompletedItemsResponse", default)]
    completed: Vec<FindingBody>,
    #[serde(rename = "findItemsAdvancedResponse", default)]
    advanced: Vec<FindingBody>,
    #[serde(rename = "errorMessage", default)]
    error_message: Vec<ErrorMessage>,
}

#[derive(Debug, Deserialize, Default)]
struct FindingBody {
    #[serde(default)]
    ack: Vec<String>,
    #[serde(rename = "searchResult", default)]
    search_result: Vec<SearchResult>,
    #[serde(rename = "paginationOutput", default)]
    pagination_output: Vec<PaginationOutput>,
    #[serde(rename = "errorMessage", default)]
    error_message: Vec<ErrorMessage>,
}

#[derive(Debug, Deserialize, Default)]
struct SearchResult {
    #[serde(default)]
    item: Vec<FindingItem>,
}

#[derive(Debug, Deserialize, Default)]
struct PaginationOutput {
    #[serde(rename = "totalEntries", default)]
    total_entries: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ErrorMessage {
    #[serde(default)]
    error: Vec<FindingError>,
}

#[derive(Debug, Deserialize, Default)]
struct FindingError {
    #[serde(rename = "errorId", default)]
    error_id: Vec<String>,
    #[serde(default)]
    domain: Vec<String>,
    #[serde(default)]
    message: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FindingItem {
    #[serde(default)]
    title: Vec<String>,
    #[serde(rename = "viewItemURL", default)]
    view_item_url: Vec<String>,
    #[serde(rename = "galleryURL", default)]
    gallery_url: Vec<String>,
    #[serde(rename = "sellingStatus", default)]
    selling_status: Vec<SellingStatus>,
    #[serde(rename = "listingInfo", default)]
    listing_info: Vec<ListingInfo>,
}

#[derive(Debug, Deserialize, Default)]
struct SellingStatus {
    #[serde(rename = "currentPrice", default)]
    current_price: Vec<Amount>,
}

#[derive(Debug, Deserialize, Default)]
struct Amount {
    #[serde(rename = "@currencyId", default)]
    currency_id: String,
    #[serde(rename = "__value__", default)]
    value: String,
}

#[derive(Debug, Deserialize, Default)]
struct ListingInfo {
    #[serde(rename = "endTime", default)]
    end_time: Vec<String>,
}

fn first(values: &[String]) -> Option<&str> {
    values.first().map(String::as_str).filter(|s| !s.is_empty())
}

impl EbayProvider {
    /// Create new eBay provider
    pub fn new(credentials: Arc<CredentialsProvider>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            credentials,
            base_url: FINDING_API_URL.to_string(),
        })
    }

    /// Point at a different Finding endpoint (sandbox)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn operation_url(&self, operation: &str, app_id: &str, query: &str, per_page: u32) -> String {
        format!(
            "{}?OPERATION-NAME={}&SERVICE-VERSION=1.13.0&SECURITY-APPNAME={}\
             &RESPONSE-DATA-FORMAT=JSON&REST-PAYLOAD&keywords={}&categoryId={}\
             &paginationInput.entriesPerPage={}",
            self.base_url,
            operation,
            urlencoding::encode(app_id),
            urlencoding::encode(query),
            SPORTS_CARDS_CATEGORY,
            per_page,
        )
    }

    async fn call(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ValuationError::provider("ebay", format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ValuationError::Config(format!(
                "eBay rejected the app id (HTTP {})",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ValuationError::provider("ebay", format!("Read failed: {}", e)))?;

        // Finding API reports most errors (rate limits included) with HTTP 500 + JSON body
        if !status.is_success() && !body.trim_start().starts_with('{') {
            return Err(ValuationError::provider("ebay", format!("HTTP {}", status)));
        }

        Ok(body)
    }
}

/// Map a Finding API error block to our error kinds
fn classify_errors(errors: &[ErrorMessage]) -> Option<ValuationError> {
    let error = errors.iter().flat_map(|m| m.error.iter()).next()?;
    let id = first(&error.error_id).unwrap_or("?");
    let domain = first(&error.domain).unwrap_or("");
    let message = first(&error.message).unwrap_or("unknown error");

    // 11002: invalid application id; Security domain: auth failures
    if id == "11002" || domain.eq_ignore_ascii_case("Security") {
        return Some(ValuationError::Config(format!("eBay credentials invalid: {}", message)));
    }
    Some(ValuationError::provider("ebay", format!("error {}: {}", id, message)))
}

fn parse_body(body: &str) -> Result<FindingBody> {
    let response: FindingResponse = serde_json::from_str(body)
        .map_err(|e| ValuationError::provider("ebay", format!("Invalid JSON: {}", e)))?;

    if let Some(err) = classify_errors(&response.error_message) {
        return Err(err);
    }

    let body = response
        .completed
        .into_iter()
        .chain(response.advanced)
        .next()
        .ok_or_else(|| ValuationError::provider("ebay", "Empty response"))?;

    let ack = first(&body.ack).unwrap_or("Failure");
    if !(ack == "Success" || ack == "Warning") {
        return Err(classify_errors(&body.error_message)
            .unwrap_or_else(|| ValuationError::provider("ebay", format!("ack {}", ack))));
    }

    Ok(body)
}

/// Parse a findCompletedItems JSON payload into listings
pub(crate) fn parse_completed_items(body: &str) -> Result<Vec<Listing>> {
    let body = parse_body(body)?;

    let listings = body
        .search_result
        .iter()
        .flat_map(|r| r.item.iter())
        .filter_map(item_to_listing)
        .collect();

    Ok(listings)
}

/// Parse a findItemsAdvanced JSON payload into its total entry count
pub(crate) fn parse_total_entries(body: &str) -> Result<u64> {
    let body = parse_body(body)?;

    Ok(body
        .pagination_output
        .first()
        .and_then(|p| first(&p.total_entries))
        .and_then(|t| t.parse::<u64>().ok())
        .unwrap_or(0))
}

/// Items missing a title, URL, price or end time are skipped
fn item_to_listing(item: &FindingItem) -> Option<Listing> {
    let title = first(&item.title)?;
    let url = first(&item.view_item_url)?;
    let amount = item.selling_status.first()?.current_price.first()?;
    let price = amount.value.trim().parse::<f64>().ok()?;
    let sold_at = item
        .listing_info
        .first()
        .and_then(|info| first(&info.end_time))
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|dt| dt.with_timezone(&Utc))?;

    let mut listing = Listing::new(title, price, sold_at, url).with_source("ebay");
    if !amount.currency_id.is_empty() {
        listing.currency = amount.currency_id.clone();
    }
    listing.image_url = first(&item.gallery_url).map(str::to_string);
    Some(listing)
}

#[async_trait]
impl MarketplaceProvider for EbayProvider {
    async fn search_sold(&self, query: &str) -> Result<Vec<Listing>> {
        let creds = self.credentials.marketplace().await?;
        let url = format!(
            "{}&itemFilter(0).name=SoldItemsOnly&itemFilter(0).value=true&sortOrder=EndTimeSoonest",
            self.operation_url("findCompletedItems", &creds.app_id, query, ENTRIES_PER_PAGE)
        );

        let body = self.call(&url).await?;
        let listings = parse_completed_items(&body)?;
        tracing::debug!("eBay returned {} sold listings for {:?}", listings.len(), query);
        Ok(listings)
    }

    async fn count_active(&self, query: &str) -> Result<u64> {
        let creds = self.credentials.marketplace().await?;
        let url = self.operation_url("findItemsAdvanced", &creds.app_id, query, 1);

        let body = self.call(&url).await?;
        parse_total_entries(&body)
    }

    fn name(&self) -> &str {
        "ebay"
    }
}
