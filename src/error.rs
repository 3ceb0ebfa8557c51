use thiserror::Error;

/// Main error type for the valuation engine
#[derive(Error, Debug)]
pub enum ValuationError {
    /// Missing or invalid credentials/settings. Fatal, never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Optional collaborator not configured (AI model, news search)
    #[error("Not configured: {0}")]
    Unavailable(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider errors (rate limits, bad payloads, upstream failures)
    #[error("Provider '{provider}' error: {message}")]
    Provider { provider: String, message: String },

    /// AI classifier / summary errors
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// Cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl ValuationError {
    /// Fatal errors must reach the caller; everything else degrades to empty data.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ValuationError::Config(_))
    }

    /// Worth another attempt: neither fatal nor "not configured"
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ValuationError::Config(_) | ValuationError::Unavailable(_))
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ValuationError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

impl From<String> for ValuationError {
    fn from(s: String) -> Self {
        ValuationError::Other(s)
    }
}

impl From<&str> for ValuationError {
    fn from(s: &str) -> Self {
        ValuationError::Other(s.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ValuationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_is_fatal() {
        assert!(ValuationError::Config("missing EBAY_APP_ID".into()).is_fatal());
        assert!(!ValuationError::Unavailable("ai".into()).is_fatal());
        assert!(!ValuationError::provider("ebay", "rate limited").is_fatal());
        assert!(!ValuationError::Classifier("bad json".into()).is_fatal());
    }

    #[test]
    fn test_retryable() {
        assert!(ValuationError::Classifier("timeout".into()).is_retryable());
        assert!(!ValuationError::Unavailable("ai".into()).is_retryable());
        assert!(!ValuationError::Config("bad".into()).is_retryable());
    }

    #[test]
    fn test_provider_display() {
        let err = ValuationError::provider("ebay", "HTTP 500");
        assert_eq!(err.to_string(), "Provider 'ebay' error: HTTP 500");
    }
}
