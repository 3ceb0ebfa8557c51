use std::sync::Arc;
use std::time::Instant;
use chrono::Utc;

use crate::cache::{CacheStats, SqliteCache, TieredCache, VALUATION_TTL};
use crate::catalog::CatalogReader;
use crate::config::{CredentialsProvider, EngineConfig};
use crate::core::{CardQuery, GradingAnalysis, Listing, QuickAnalysis, ValuationResult};
use crate::error::{Result, ValuationError};
use crate::grading::{PopulationPrices, DEFAULT_GRADING_COMPANY};
use crate::market::MarketFetcher;
use crate::narrative::{Locale, Summarizer};
use crate::providers::{AzureOpenAi, EbayProvider, LanguageModel, PerplexityNews};
use crate::stats;
use crate::verify::{AiClassifier, ResultVerifier};

/// Card valuation orchestrator: cache → fetch → verify → clean → cache
pub struct ValuationEngine {
    cache: Arc<TieredCache>,
    fetcher: MarketFetcher,
    verifier: ResultVerifier,
    summarizer: Summarizer,
    grading_cost: f64,
    grading_company: String,
}

impl ValuationEngine {
    /// Production wiring: SQLite durable cache, eBay, Azure OpenAI, Perplexity
    pub async fn new(config: &EngineConfig, credentials: Arc<CredentialsProvider>) -> Result<Self> {
        let durable = Arc::new(SqliteCache::new(&config.db_path).await?);
        let cache = Arc::new(TieredCache::new(durable));

        let ebay = Arc::new(EbayProvider::new(credentials.clone(), config.http_timeout)?);
        let model: Arc<dyn LanguageModel> =
            Arc::new(AzureOpenAi::new(credentials.clone(), config.http_timeout)?);
        let news = Arc::new(PerplexityNews::new(credentials, config.http_timeout)?);

        let verifier = ResultVerifier::with_classifier(
            Arc::new(AiClassifier::new(model.clone())),
            config.retry,
        );
        let summarizer = Summarizer::new(cache.clone())
            .with_model(model)
            .with_news(news);

        tracing::info!("Valuation engine ready (cache: {})", config.db_path);

        Ok(Self::with_components(cache, MarketFetcher::new(ebay), verifier, summarizer)
            .with_grading_cost(config.grading_cost))
    }

    /// Assemble an engine from explicit parts
    pub fn with_components(
        cache: Arc<TieredCache>,
        fetcher: MarketFetcher,
        verifier: ResultVerifier,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            cache,
            fetcher,
            verifier,
            summarizer,
            grading_cost: crate::grading::DEFAULT_GRADING_COST,
            grading_company: DEFAULT_GRADING_COMPANY.to_string(),
        }
    }

    pub fn with_grading_cost(mut self, grading_cost: f64) -> Self {
        self.grading_cost = grading_cost;
        self
    }

    pub fn with_grading_company(mut self, company: impl Into<String>) -> Self {
        self.grading_company = company.into();
        self
    }

    /// Value a card.
    ///
    /// Transient upstream failures yield a LOW-confidence, zero-sale result
    /// that is not cached; configuration errors are returned.
    pub async fn valuate(&self, query: &CardQuery) -> Result<ValuationResult> {
        Ok(self.valuation(query).await?.0)
    }

    /// The valuation plus whether it may be cached
    async fn valuation(&self, query: &CardQuery) -> Result<(ValuationResult, bool)> {
        let start = Instant::now();
        let key = query.cache_key();

        if !query.force_refresh {
            if let Some(cached) = self.cache.get::<ValuationResult>(&key).await {
                tracing::debug!("Cache hit for {}", query.display_name());
                return Ok((cached, true));
            }
        }

        let fetched = self.fetcher.fetch(query).await?;
        let candidates: Vec<Listing> = fetched
            .listings
            .into_iter()
            .filter(|l| !query.excluded_urls.contains(&l.url))
            .collect();

        // Relaxed searches are verified against the relaxed query
        let verified = self.verifier.verify(&fetched.effective_query, &candidates).await?;
        let result = stats::estimate(verified, fetched.sources);

        // An empty result caused by upstream failures is not an estimate
        let cacheable = !(fetched.degraded && result.sales_count == 0);
        if cacheable {
            self.cache.set(&key, &result, VALUATION_TTL).await;
        } else {
            tracing::warn!("Not caching degraded empty result for {}", query.display_name());
        }

        tracing::info!(
            "Valued {}: avg ${:.2} from {} sales ({:?}) in {:.0}ms",
            query.display_name(),
            result.average,
            result.sales_count,
            result.confidence,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok((result, cacheable))
    }

    /// Value a catalogued card by item id
    pub async fn valuate_item(&self, catalog: &dyn CatalogReader, item_id: &str) -> Result<ValuationResult> {
        let attrs = catalog
            .card_attributes(item_id)
            .await?
            .ok_or_else(|| ValuationError::Other(format!("item not found: {}", item_id)))?;
        self.valuate(&CardQuery::from(attrs)).await
    }

    /// Valuation plus a short investment note, cached as a unit
    pub async fn quick_analysis(&self, query: &CardQuery, locale: Locale) -> Result<QuickAnalysis> {
        let key = format!("quick:{}:{}", locale, query.cache_key());

        if !query.force_refresh {
            if let Some(cached) = self.cache.get::<QuickAnalysis>(&key).await {
                return Ok(cached);
            }
        }

        let (valuation, cacheable) = self.valuation(query).await?;
        let summary = self.summarizer.summarize(query, &valuation, locale).await;

        let analysis = QuickAnalysis {
            valuation,
            summary,
            generated_at: Utc::now(),
        };
        if cacheable {
            self.cache.set(&key, &analysis, VALUATION_TTL).await;
        }
        Ok(analysis)
    }

    /// Raw / grade 9 / grade 10 populations and active supply, fetched concurrently.
    ///
    /// A failed slice counts as no data; only configuration errors are returned,
    /// and only once every slice has settled.
    pub async fn grading_analysis(&self, base: &CardQuery) -> Result<GradingAnalysis> {
        let raw = base.ungraded();
        let grade9 = graded_tier(&raw, &self.grading_company, "9");
        let grade10 = graded_tier(&raw, &self.grading_company, "10");

        let (raw_price, grade9_price, grade10_price, active) = tokio::join!(
            self.population_price(&raw),
            self.population_price(&grade9),
            self.population_price(&grade10),
            self.fetcher.count_active(&raw),
        );

        let prices = PopulationPrices {
            raw: raw_price?,
            grade9: grade9_price?,
            grade10: grade10_price?,
        };

        let analysis = GradingAnalysis::from_prices(
            prices,
            active?,
            self.grading_cost,
            self.grading_company.clone(),
        );

        tracing::info!(
            "Grading {}: raw ${:.2}, 9 ROI {:.1}%, 10 ROI {:.1}% → {:?}",
            raw.display_name(),
            analysis.raw_price,
            analysis.grade9_roi,
            analysis.grade10_roi,
            analysis.recommendation
        );
        Ok(analysis)
    }

    async fn population_price(&self, query: &CardQuery) -> Result<f64> {
        match self.valuate(query).await {
            Ok(result) => Ok(result.average),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!("Population {} unavailable: {}", query.display_name(), e);
                Ok(0.0)
            }
        }
    }

    /// Get durable cache statistics
    pub async fn cache_stats(&self) -> Result<CacheStats> {
        self.cache.stats().await
    }

    /// Delete expired cache entries
    pub async fn purge_expired(&self) -> Result<u64> {
        self.cache.purge_expired().await
    }
}

/// Graded population query; a custom search gets the grade appended
fn graded_tier(raw: &CardQuery, company: &str, grade: &str) -> CardQuery {
    let mut tier = raw.clone().with_grading(company, grade);
    if let Some(custom) = raw.custom_query.as_deref().filter(|c| !c.trim().is_empty()) {
        tier.custom_query = Some(format!("{} {} {}", custom.trim(), company, grade));
    }
    tier
}
