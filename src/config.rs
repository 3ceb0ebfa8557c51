//! Engine settings and credential resolution.
//!
//! Credentials come from the application's settings store first and fall back
//! to environment variables. Resolved credentials are kept for a short TTL so
//! a settings change is picked up without re-querying the store on every call.

use async_trait::async_trait;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::{Result, ValuationError};
use crate::narrative::Locale;
use crate::retry::RetryPolicy;

/// How long resolved credentials are trusted before re-querying the store
pub const CREDENTIALS_TTL: Duration = Duration::from_secs(60);

pub const KEY_EBAY_APP_ID: &str = "ebay_app_id";
pub const KEY_AI_API_KEY: &str = "azure_openai_api_key";
pub const KEY_AI_ENDPOINT: &str = "azure_openai_endpoint";
pub const KEY_AI_DEPLOYMENT: &str = "azure_openai_deployment";
pub const KEY_AI_API_VERSION: &str = "azure_openai_api_version";
pub const KEY_NEWS_API_KEY: &str = "perplexity_api_key";

const DEFAULT_AI_API_VERSION: &str = "2024-02-15-preview";

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub db_path: String,
    pub http_timeout: Duration,
    pub grading_cost: f64,
    pub retry: RetryPolicy,
    pub locale: Locale,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: "valuations.db".to_string(),
            http_timeout: Duration::from_secs(15),
            grading_cost: crate::grading::DEFAULT_GRADING_COST,
            retry: RetryPolicy::default(),
            locale: Locale::En,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create config from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let db_path = lookup("VALUATION_DB_PATH").unwrap_or(defaults.db_path);

        let http_timeout = match lookup("VALUATION_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_var("VALUATION_HTTP_TIMEOUT_SECS", &raw)?),
            None => defaults.http_timeout,
        };

        let grading_cost = match lookup("VALUATION_GRADING_COST") {
            Some(raw) => parse_var::<f64>("VALUATION_GRADING_COST", &raw)?,
            None => defaults.grading_cost,
        };

        let base_delay = match lookup("VALUATION_RETRY_BASE_MS") {
            Some(raw) => Duration::from_millis(parse_var("VALUATION_RETRY_BASE_MS", &raw)?),
            None => defaults.retry.base_delay,
        };

        let max_retries = match lookup("VALUATION_RETRY_MAX") {
            Some(raw) => parse_var("VALUATION_RETRY_MAX", &raw)?,
            None => defaults.retry.max_retries,
        };

        let locale = match lookup("VALUATION_LOCALE") {
            Some(raw) => raw.parse::<Locale>()?,
            None => defaults.locale,
        };

        // Validate configuration
        if http_timeout.is_zero() {
            return Err(ValuationError::Config(
                "VALUATION_HTTP_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if !grading_cost.is_finite() || grading_cost < 0.0 {
            return Err(ValuationError::Config(
                "VALUATION_GRADING_COST must be a non-negative number".to_string(),
            ));
        }

        Ok(Self {
            db_path,
            http_timeout,
            grading_cost,
            retry: RetryPolicy::new(max_retries, base_delay),
            locale,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ValuationError::Config(format!("{} has an invalid value: {:?}", name, raw)))
}

/// Source of stored settings (the application's settings table)
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Look up a setting; `None` when the store has no value for it
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// Settings backed by process environment variables (`key` upper-cased)
pub struct EnvSettings;

#[async_trait]
impl SettingsStore for EnvSettings {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(env::var(key.to_uppercase()).ok())
    }
}

/// Fixed in-memory settings
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    values: HashMap<String, String>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl SettingsStore for StaticSettings {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceCredentials {
    pub app_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiCredentials {
    pub api_key: String,
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
}

/// Raw resolved credential values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub ebay_app_id: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_endpoint: Option<String>,
    pub ai_deployment: Option<String>,
    pub ai_api_version: Option<String>,
    pub news_api_key: Option<String>,
}

impl Credentials {
    /// Marketplace credentials; missing app id is fatal
    pub fn marketplace(&self) -> Result<MarketplaceCredentials> {
        match &self.ebay_app_id {
            Some(app_id) => Ok(MarketplaceCredentials { app_id: app_id.clone() }),
            None => Err(ValuationError::Config(
                "marketplace credentials missing: set ebay_app_id in settings or EBAY_APP_ID".to_string(),
            )),
        }
    }

    /// AI credentials. `None` when nothing is configured; a partial set is fatal.
    pub fn ai(&self) -> Result<Option<AiCredentials>> {
        let (key, endpoint, deployment) = (&self.ai_api_key, &self.ai_endpoint, &self.ai_deployment);
        if key.is_none() && endpoint.is_none() && deployment.is_none() {
            return Ok(None);
        }

        let missing: Vec<&str> = [
            (KEY_AI_API_KEY, key.is_none()),
            (KEY_AI_ENDPOINT, endpoint.is_none()),
            (KEY_AI_DEPLOYMENT, deployment.is_none()),
        ]
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(ValuationError::Config(format!(
                "AI credentials incomplete, missing: {}",
                missing.join(", ")
            )));
        }

        let endpoint = endpoint.clone().unwrap_or_default();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ValuationError::Config(format!(
                "AI endpoint is not a URL: {}",
                endpoint
            )));
        }

        Ok(Some(AiCredentials {
            api_key: key.clone().unwrap_or_default(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            deployment: deployment.clone().unwrap_or_default(),
            api_version: self
                .ai_api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_AI_API_VERSION.to_string()),
        }))
    }
}

/// Cached credentials resolver: settings store first, fallback store second
pub struct CredentialsProvider {
    store: Arc<dyn SettingsStore>,
    fallback: Arc<dyn SettingsStore>,
    ttl: Duration,
    cached: RwLock<Option<(Instant, Credentials)>>,
}

impl CredentialsProvider {
    /// Settings store with environment fallback
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self::with_fallback(store, Arc::new(EnvSettings))
    }

    /// Environment only
    pub fn from_env() -> Self {
        Self::new(Arc::new(StaticSettings::new()))
    }

    pub fn with_fallback(store: Arc<dyn SettingsStore>, fallback: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            fallback,
            ttl: CREDENTIALS_TTL,
            cached: RwLock::new(None),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Current credentials, re-queried once the TTL has elapsed
    pub async fn current(&self) -> Result<Credentials> {
        {
            let guard = self.cached.read().await;
            if let Some((loaded_at, creds)) = guard.as_ref() {
                if loaded_at.elapsed() < self.ttl {
                    return Ok(creds.clone());
                }
            }
        }
        self.refresh().await
    }

    /// Force a re-query of both stores
    pub async fn refresh(&self) -> Result<Credentials> {
        let creds = Credentials {
            ebay_app_id: self.lookup(KEY_EBAY_APP_ID).await,
            ai_api_key: self.lookup(KEY_AI_API_KEY).await,
            ai_endpoint: self.lookup(KEY_AI_ENDPOINT).await,
            ai_deployment: self.lookup(KEY_AI_DEPLOYMENT).await,
            ai_api_version: self.lookup(KEY_AI_API_VERSION).await,
            news_api_key: self.lookup(KEY_NEWS_API_KEY).await,
        };

        *self.cached.write().await = Some((Instant::now(), creds.clone()));
        tracing::debug!("Credentials refreshed");
        Ok(creds)
    }

    pub async fn marketplace(&self) -> Result<MarketplaceCredentials> {
        self.current().await?.marketplace()
    }

    pub async fn ai(&self) -> Result<Option<AiCredentials>> {
        self.current().await?.ai()
    }

    pub async fn news_api_key(&self) -> Result<Option<String>> {
        Ok(self.current().await?.news_api_key)
    }

    async fn lookup(&self, key: &str) -> Option<String> {
        let stored = match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Settings store lookup for {} failed: {}", key, e);
                None
            }
        };

        let value = match stored.filter(|v| !v.trim().is_empty()) {
            Some(v) => Some(v),
            None => self.fallback.get(key).await.ok().flatten(),
        };

        value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }
}
