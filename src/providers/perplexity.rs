use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CredentialsProvider;
use crate::error::{Result, ValuationError};
use crate::providers::{http_client, NewsSearch};

const PERPLEXITY_URL: &str = "https://api.perplexity.ai/chat/completions";
const PERPLEXITY_MODEL: &str = "sonar";

/// Search-augmented news lookup. Silently disabled without an API key.
pub struct PerplexityNews {
    client: Client,
    credentials: Arc<CredentialsProvider>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

impl PerplexityNews {
    pub fn new(credentials: Arc<CredentialsProvider>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            credentials,
        })
    }
}

#[async_trait]
impl NewsSearch for PerplexityNews {
    async fn search(&self, query: &str) -> Result<Option<String>> {
        let Some(api_key) = self.credentials.news_api_key().await? else {
            return Ok(None);
        };

        let request = SearchRequest {
            model: PERPLEXITY_MODEL,
            messages: vec![
                Message {
                    role: "system",
                    content: "Summarize recent news in at most three short sentences.",
                },
                Message { role: "user", content: query },
            ],
        };

        let response = self
            .client
            .post(PERPLEXITY_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ValuationError::provider("perplexity", format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ValuationError::provider(
                "perplexity",
                format!("HTTP {}", response.status()),
            ));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ValuationError::provider("perplexity", format!("Invalid JSON: {}", e)))?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    fn name(&self) -> &str {
        "perplexity"
    }
}
