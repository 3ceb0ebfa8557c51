use std::collections::HashSet;
use std::sync::Arc;

use crate::core::{CardQuery, Listing};
use crate::error::Result;
use crate::market::{currency, junk, relax};
use crate::providers::MarketplaceProvider;

/// Below this many primary listings the secondary provider is consulted
pub const SECONDARY_THRESHOLD: usize = 3;

/// Listings for one query plus how they were obtained
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub listings: Vec<Listing>,
    /// Providers that contributed at least one listing
    pub sources: Vec<String>,
    /// The query whose search produced `listings` (may be relaxed)
    pub effective_query: CardQuery,
    pub relaxed: bool,
    /// A primary attempt failed transiently and was counted as empty
    pub degraded: bool,
}

/// Runs searches with progressive relaxation and a secondary fallback
pub struct MarketFetcher {
    primary: Arc<dyn MarketplaceProvider>,
    secondary: Option<Arc<dyn MarketplaceProvider>>,
}

impl MarketFetcher {
    pub fn new(primary: Arc<dyn MarketplaceProvider>) -> Self {
        Self { primary, secondary: None }
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn MarketplaceProvider>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Fetch sold listings for `query`.
    ///
    /// Only configuration errors escape; transient provider failures count as
    /// an empty attempt.
    pub async fn fetch(&self, query: &CardQuery) -> Result<FetchOutcome> {
        let plan = relax::relaxation_plan(query);
        let mut listings = Vec::new();
        let mut effective_query = query.clone();
        let mut degraded = false;

        for (step, attempt) in plan.iter().enumerate() {
            let terms = attempt.search_terms();
            listings = match self.search_primary(&terms).await? {
                Some(found) => found,
                None => {
                    degraded = true;
                    Vec::new()
                }
            };
            effective_query = attempt.clone();

            if !listings.is_empty() {
                if step > 0 {
                    tracing::info!("Relaxed search {:?} found {} listings", terms, listings.len());
                }
                break;
            }
            tracing::debug!("No listings for {:?} (attempt {}/{})", terms, step + 1, plan.len());
        }

        let mut sources = Vec::new();
        if !listings.is_empty() {
            sources.push(self.primary.name().to_string());
        }

        if listings.len() < SECONDARY_THRESHOLD {
            if let Some(secondary) = &self.secondary {
                let extra = self.search_secondary(secondary.as_ref(), &effective_query).await;
                let added = merge_by_url(&mut listings, extra);
                if added > 0 {
                    tracing::info!("Secondary provider {} added {} listings", secondary.name(), added);
                    sources.push(secondary.name().to_string());
                }
            }
        }

        let relaxed = effective_query != *query;
        Ok(FetchOutcome {
            listings,
            sources,
            effective_query,
            relaxed,
            degraded,
        })
    }

    /// Active offers for the ungraded card; transient failures count as 0
    pub async fn count_active(&self, query: &CardQuery) -> Result<u64> {
        let terms = query.ungraded().search_terms();
        match self.primary.count_active(&terms).await {
            Ok(count) => Ok(count),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!("Active count for {:?} failed: {}", terms, e);
                Ok(0)
            }
        }
    }

    /// `None` when the search failed transiently
    async fn search_primary(&self, terms: &str) -> Result<Option<Vec<Listing>>> {
        match self.primary.search_sold(terms).await {
            Ok(raw) => Ok(Some(clean_listings(raw))),
            Err(e) if e.is_fatal() => {
                tracing::error!("Provider {} misconfigured: {}", self.primary.name(), e);
                Err(e)
            }
            Err(e) => {
                tracing::warn!("Provider {} failed for {:?}: {}", self.primary.name(), terms, e);
                Ok(None)
            }
        }
    }

    /// Secondary failures of any kind are an empty result
    async fn search_secondary(&self, provider: &dyn MarketplaceProvider, query: &CardQuery) -> Vec<Listing> {
        let terms = query.search_terms();
        match provider.search_sold(&terms).await {
            Ok(raw) => clean_listings(raw),
            Err(e) => {
                tracing::warn!("Secondary provider {} failed for {:?}: {}", provider.name(), terms, e);
                Vec::new()
            }
        }
    }
}

/// Currency normalization, junk removal and sanity checks on raw provider output
fn clean_listings(raw: Vec<Listing>) -> Vec<Listing> {
    let normalized: Vec<Listing> = raw
        .into_iter()
        .map(currency::normalize)
        .filter(|l| l.price.is_finite() && l.price > 0.0)
        .collect();

    let mut listings = junk::filter_junk(normalized);
    let mut seen = HashSet::new();
    listings.retain(|l| seen.insert(l.url.clone()));
    listings
}

fn merge_by_url(into: &mut Vec<Listing>, extra: Vec<Listing>) -> usize {
    let mut seen: HashSet<String> = into.iter().map(|l| l.url.clone()).collect();
    let before = into.len();
    into.extend(extra.into_iter().filter(|l| seen.insert(l.url.clone())));
    into.len() - before
}
