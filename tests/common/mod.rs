#![allow(dead_code)]

use async_trait::async_trait;
use card_valuation_engine::cache::TieredCache;
use card_valuation_engine::market::MarketFetcher;
use card_valuation_engine::narrative::Summarizer;
use card_valuation_engine::providers::{LanguageModel, MarketplaceProvider};
use card_valuation_engine::verify::ResultVerifier;
use card_valuation_engine::{Listing, Result, ValuationEngine, ValuationError};
use chrono::{Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Transient,
    Config,
}

/// Marketplace answering from a fixed map of search string → listings
pub struct FakeMarketplace {
    name: String,
    sold: Mutex<HashMap<String, Vec<Listing>>>,
    failure: Mutex<Option<Failure>>,
    failing_searches: Mutex<HashMap<String, Failure>>,
    active: u64,
    searches: Mutex<Vec<String>>,
}

impl FakeMarketplace {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sold: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            failing_searches: Mutex::new(HashMap::new()),
            active: 0,
            searches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_sold(self, terms: &str, listings: Vec<Listing>) -> Self {
        self.set_sold(terms, listings);
        self
    }

    pub fn with_active(mut self, active: u64) -> Self {
        self.active = active;
        self
    }

    pub fn failing(self, failure: Failure) -> Self {
        *self.failure.lock().unwrap() = Some(failure);
        self
    }

    /// Fail only searches for exactly `terms`
    pub fn failing_for(self, terms: &str, failure: Failure) -> Self {
        self.failing_searches.lock().unwrap().insert(terms.to_string(), failure);
        self
    }

    /// Clear every scripted failure
    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
        self.failing_searches.lock().unwrap().clear();
    }

    pub fn set_sold(&self, terms: &str, listings: Vec<Listing>) {
        self.sold.lock().unwrap().insert(terms.to_string(), listings);
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    fn check_failure(&self, terms: &str) -> Result<()> {
        let failure = self
            .failing_searches
            .lock()
            .unwrap()
            .get(terms)
            .copied()
            .or(*self.failure.lock().unwrap());
        match failure {
            Some(Failure::Transient) => Err(ValuationError::provider(&self.name, "HTTP 503")),
            Some(Failure::Config) => Err(ValuationError::Config("marketplace rejected credentials".into())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MarketplaceProvider for FakeMarketplace {
    async fn search_sold(&self, query: &str) -> Result<Vec<Listing>> {
        self.searches.lock().unwrap().push(query.to_string());
        self.check_failure(query)?;
        Ok(self.sold.lock().unwrap().get(query).cloned().unwrap_or_default())
    }

    async fn count_active(&self, query: &str) -> Result<u64> {
        self.check_failure(query)?;
        Ok(self.active)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Language model replaying one canned reply (or error kind) for every call
pub struct FakeModel {
    reply: std::result::Result<Value, Failure>,
    calls: Mutex<usize>,
}

impl FakeModel {
    pub fn replying(reply: Value) -> Self {
        Self { reply: Ok(reply), calls: Mutex::new(0) }
    }

    pub fn failing(failure: Failure) -> Self {
        Self { reply: Err(failure), calls: Mutex::new(0) }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn complete_json(&self, _system: &str, _user: &str) -> Result<Value> {
        *self.calls.lock().unwrap() += 1;
        match &self.reply {
            Ok(value) => Ok(value.clone()),
            Err(Failure::Transient) => Err(ValuationError::Classifier("HTTP 429".into())),
            Err(Failure::Config) => Err(ValuationError::Config("AI key rejected".into())),
        }
    }

    fn name(&self) -> &str {
        "fake-model"
    }
}

/// A sale `days_ago` days back with a URL derived from `id`
pub fn sale(title: &str, price: f64, days_ago: i64, id: usize) -> Listing {
    Listing::new(
        title,
        price,
        Utc::now() - Duration::days(days_ago),
        format!("https://www.ebay.com/itm/{}", id),
    )
    .with_source("fake-ebay")
}

/// One sale per price, same title, newest first
pub fn sales(title: &str, prices: &[f64], first_id: usize) -> Vec<Listing> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| sale(title, price, i as i64 + 1, first_id + i))
        .collect()
}

/// Engine over a fake marketplace, token verification and the given cache
pub fn engine_with_cache(market: Arc<FakeMarketplace>, cache: Arc<TieredCache>) -> ValuationEngine {
    ValuationEngine::with_components(
        cache.clone(),
        MarketFetcher::new(market),
        ResultVerifier::deterministic(),
        Summarizer::new(cache),
    )
}

pub fn engine(market: Arc<FakeMarketplace>) -> ValuationEngine {
    engine_with_cache(market, Arc::new(TieredCache::in_memory()))
}
