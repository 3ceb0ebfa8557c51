pub mod ai;
pub mod fallback;

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{CardQuery, Listing};
use crate::error::{Result, ValuationError};
use crate::retry::RetryPolicy;

pub use ai::AiClassifier;
pub use fallback::TokenMatcher;

/// Listings per classifier request
pub const VERIFY_BATCH_SIZE: usize = 50;

/// Trait for listing classifiers
#[async_trait]
pub trait MatchClassifier: Send + Sync {
    /// Indices (into `listings`) of the listings that are the target card
    async fn classify(&self, query: &CardQuery, listings: &[Listing]) -> Result<Vec<usize>>;

    /// Get classifier name for logging
    fn name(&self) -> &str;
}

/// Confirms fetched listings really are the target card.
///
/// Uses the AI classifier when one is configured, retrying transient
/// failures, and drops to the token matcher otherwise.
pub struct ResultVerifier {
    classifier: Option<Arc<dyn MatchClassifier>>,
    fallback: TokenMatcher,
    retry: RetryPolicy,
}

impl ResultVerifier {
    /// Token matching only
    pub fn deterministic() -> Self {
        Self {
            classifier: None,
            fallback: TokenMatcher::new(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_classifier(classifier: Arc<dyn MatchClassifier>, retry: RetryPolicy) -> Self {
        Self {
            classifier: Some(classifier),
            fallback: TokenMatcher::new(),
            retry,
        }
    }

    pub async fn verify(&self, query: &CardQuery, listings: &[Listing]) -> Result<Vec<Listing>> {
        let mut verified = Vec::with_capacity(listings.len());
        for batch in listings.chunks(VERIFY_BATCH_SIZE) {
            verified.extend(self.verify_batch(query, batch).await?);
        }

        tracing::debug!(
            "Verified {}/{} listings for {}",
            verified.len(),
            listings.len(),
            query.display_name()
        );
        Ok(verified)
    }

    async fn verify_batch(&self, query: &CardQuery, batch: &[Listing]) -> Result<Vec<Listing>> {
        let Some(classifier) = &self.classifier else {
            return Ok(self.fallback.filter(query, batch));
        };

        let outcome = self
            .retry
            .run("listing verification", move || classifier.classify(query, batch))
            .await;

        match outcome {
            Ok(indices) => Ok(indices.into_iter().filter_map(|i| batch.get(i).cloned()).collect()),
            Err(e) if e.is_fatal() => Err(e),
            Err(ValuationError::Unavailable(_)) => Ok(self.fallback.filter(query, batch)),
            Err(e) => {
                tracing::warn!(
                    "Classifier {} failed, using {}: {}",
                    classifier.name(),
                    self.fallback.name(),
                    e
                );
                Ok(self.fallback.filter(query, batch))
            }
        }
    }
}
