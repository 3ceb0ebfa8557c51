//! Best-effort investment note for a valuation.
//!
//! Every failure (no model, no news key, network, malformed reply) ends in
//! the fixed fallback sentence for the caller's locale.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cache::{TieredCache, PLAYER_CONTEXT_TTL};
use crate::core::{CardQuery, ValuationResult};
use crate::error::{Result, ValuationError};
use crate::providers::{LanguageModel, NewsSearch};

/// Output language of summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl Locale {
    /// Canned sentence used whenever a summary cannot be produced
    pub fn fallback_summary(&self) -> &'static str {
        match self {
            Locale::En => "Market commentary is unavailable right now; rely on the recent comparable sales shown above.",
            Locale::Fr => "L'analyse de marché est indisponible pour le moment ; fiez-vous aux ventes comparables récentes ci-dessus.",
        }
    }

    fn language(&self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Fr => "French",
        }
    }
}

impl FromStr for Locale {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            "fr" | "fr-fr" | "fr-ca" => Ok(Locale::Fr),
            other => Err(ValuationError::Config(format!("unsupported locale: {}", other))),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Fr => write!(f, "fr"),
        }
    }
}

const SYSTEM_PROMPT: &str = "You are a sports card market analyst. Write a 2-3 sentence \
investment note for a collector. Reference the price trend. Do not invent prices. \
Reply with JSON only: {\"summary\": \"...\"}";

/// Produces the investment note
pub struct Summarizer {
    model: Option<Arc<dyn LanguageModel>>,
    news: Option<Arc<dyn NewsSearch>>,
    cache: Arc<TieredCache>,
}

impl Summarizer {
    pub fn new(cache: Arc<TieredCache>) -> Self {
        Self {
            model: None,
            news: None,
            cache,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_news(mut self, news: Arc<dyn NewsSearch>) -> Self {
        self.news = Some(news);
        self
    }

    /// Never fails; degrades to `locale.fallback_summary()`
    pub async fn summarize(&self, query: &CardQuery, valuation: &ValuationResult, locale: Locale) -> String {
        match self.try_summarize(query, valuation, locale).await {
            Ok(summary) => summary,
            Err(ValuationError::Unavailable(_)) => locale.fallback_summary().to_string(),
            Err(e) => {
                tracing::warn!("Summary for {} failed: {}", query.display_name(), e);
                locale.fallback_summary().to_string()
            }
        }
    }

    async fn try_summarize(&self, query: &CardQuery, valuation: &ValuationResult, locale: Locale) -> Result<String> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ValuationError::Unavailable("no language model".to_string()))?;

        let context = self.player_context(&query.player_name).await;
        let prompt = build_prompt(query, valuation, context.as_deref(), locale);
        let reply = model.complete_json(SYSTEM_PROMPT, &prompt).await?;
        parse_summary(&reply)
    }

    /// Recent news for a player, cached for an hour. `None` when disabled or failing.
    pub async fn player_context(&self, player_name: &str) -> Option<String> {
        let news = self.news.as_ref()?;
        let key = format!("player-context:{}", player_name.trim().to_lowercase());

        if let Some(cached) = self.cache.get::<String>(&key).await {
            return Some(cached);
        }

        let query = format!("{} latest news performance injuries", player_name.trim());
        match news.search(&query).await {
            Ok(Some(text)) => {
                self.cache.set(&key, &text, PLAYER_CONTEXT_TTL).await;
                Some(text)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("News lookup via {} failed: {}", news.name(), e);
                None
            }
        }
    }
}

fn build_prompt(query: &CardQuery, valuation: &ValuationResult, context: Option<&str>, locale: Locale) -> String {
    let trend = match valuation.trend_percent {
        Some(t) => format!("{:+.1}%", t),
        None => "not enough sales".to_string(),
    };

    let mut prompt = format!(
        "Card: {}\nComparable sales: {}\nAverage: ${:.2} (range ${:.2} - ${:.2})\n\
         Last sold: {}\nTrend (older vs newer sales): {}\nConfidence: {:?}\n",
        query.display_name(),
        valuation.sales_count,
        valuation.average,
        valuation.low,
        valuation.high,
        valuation
            .last_sold
            .map(|p| format!("${:.2}", p))
            .unwrap_or_else(|| "n/a".to_string()),
        trend,
        valuation.confidence,
    );

    if let Some(context) = context {
        prompt.push_str(&format!("Recent news: {}\n", context));
    }
    prompt.push_str(&format!("Write the note in {}.", locale.language()));
    prompt
}

fn parse_summary(reply: &Value) -> Result<String> {
    reply
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ValuationError::Classifier("reply has no \"summary\" text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CannedModel {
        reply: Result<Value>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn complete_json(&self, _system: &str, user: &str) -> Result<Value> {
            self.prompts.lock().unwrap().push(user.to_string());
            match &self.reply {
                Ok(v) => Ok(v.clone()),
                Err(e) => Err(ValuationError::Classifier(e.to_string())),
            }
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    struct CountingNews(AtomicUsize);

    #[async_trait]
    impl NewsSearch for CountingNews {
        async fn search(&self, _query: &str) -> Result<Option<String>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Some("Player of the week.".to_string()))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn model(reply: Result<Value>) -> Arc<CannedModel> {
        Arc::new(CannedModel { reply, prompts: Mutex::new(Vec::new()) })
    }

    fn valuation() -> ValuationResult {
        let mut v = ValuationResult::empty();
        v.sales_count = 5;
        v.average = 11.0;
        v.low = 9.0;
        v.high = 13.0;
        v.trend_percent = Some(12.5);
        v
    }

    #[tokio::test]
    async fn test_summary_from_model() {
        let m = model(Ok(json!({"summary": "Prices are up 12.5%."})));
        let summarizer = Summarizer::new(Arc::new(TieredCache::in_memory())).with_model(m.clone());
        let summary = summarizer.summarize(&CardQuery::new("X"), &valuation(), Locale::En).await;
        assert_eq!(summary, "Prices are up 12.5%.");
        assert!(m.prompts.lock().unwrap()[0].contains("+12.5%"));
    }

    #[tokio::test]
    async fn test_no_model_falls_back() {
        let summarizer = Summarizer::new(Arc::new(TieredCache::in_memory()));
        let summary = summarizer.summarize(&CardQuery::new("X"), &valuation(), Locale::Fr).await;
        assert_eq!(summary, Locale::Fr.fallback_summary());
    }

    #[tokio::test]
    async fn test_malformed_reply_falls_back() {
        let summarizer = Summarizer::new(Arc::new(TieredCache::in_memory()))
            .with_model(model(Ok(json!({"text": 3}))));
        let summary = summarizer.summarize(&CardQuery::new("X"), &valuation(), Locale::En).await;
        assert_eq!(summary, Locale::En.fallback_summary());
    }

    #[tokio::test]
    async fn test_model_error_falls_back() {
        let summarizer = Summarizer::new(Arc::new(TieredCache::in_memory()))
            .with_model(model(Err(ValuationError::Classifier("503".into()))));
        let summary = summarizer.summarize(&CardQuery::new("X"), &valuation(), Locale::En).await;
        assert_eq!(summary, Locale::En.fallback_summary());
    }

    #[tokio::test]
    async fn test_player_context_cached() {
        let news = Arc::new(CountingNews(AtomicUsize::new(0)));
        let m = model(Ok(json!({"summary": "ok"})));
        let summarizer = Summarizer::new(Arc::new(TieredCache::in_memory()))
            .with_model(m.clone())
            .with_news(news.clone());

        summarizer.summarize(&CardQuery::new("Joe Burrow"), &valuation(), Locale::En).await;
        summarizer.summarize(&CardQuery::new("joe burrow "), &valuation(), Locale::En).await;

        assert_eq!(news.0.load(Ordering::SeqCst), 1);
        assert!(m.prompts.lock().unwrap()[1].contains("Player of the week."));
    }

    #[test]
    fn test_locale_parsing() {
        assert_eq!("FR".parse::<Locale>().unwrap(), Locale::Fr);
        assert_eq!("en-US".parse::<Locale>().unwrap(), Locale::En);
        assert!("de".parse::<Locale>().unwrap_err().is_fatal());
        assert_eq!(Locale::Fr.to_string(), "fr");
    }
}
