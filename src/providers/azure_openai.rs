use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CredentialsProvider;
use crate::error::{Result, ValuationError};
use crate::providers::{http_client, LanguageModel};

/// Azure OpenAI chat-completions client (JSON mode)
pub struct AzureOpenAi {
    client: Client,
    credentials: Arc<CredentialsProvider>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
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
    content: Option<String>,
}

impl AzureOpenAi {
    pub fn new(credentials: Arc<CredentialsProvider>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            credentials,
        })
    }
}

/// Pull the JSON object out of a chat reply, tolerating ```json fences
pub(crate) fn extract_json(content: &str) -> Result<Value> {
    let trimmed = content.trim();
    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    let candidate = match (start, end) {
        (Some(s), Some(e)) if e > s => &trimmed[s..=e],
        _ => {
            return Err(ValuationError::Classifier(format!(
                "reply is not a JSON object: {:.80}",
                trimmed
            )))
        }
    };

    serde_json::from_str(candidate)
        .map_err(|e| ValuationError::Classifier(format!("Invalid JSON reply: {}", e)))
}

#[async_trait]
impl LanguageModel for AzureOpenAi {
    async fn complete_json(&self, system: &str, user: &str) -> Result<Value> {
        let creds = self
            .credentials
            .ai()
            .await?
            .ok_or_else(|| ValuationError::Unavailable("AI provider not configured".to_string()))?;

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            creds.endpoint, creds.deployment, creds.api_version
        );

        let request = ChatRequest {
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: 0.0,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(&url)
            .header("api-key", &creds.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ValuationError::Classifier(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ValuationError::Config(format!(
                "AI provider rejected the credentials (HTTP {})",
                status
            )));
        }

        if !status.is_success() {
            return Err(ValuationError::Classifier(format!(
                "HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ValuationError::Classifier(format!("Invalid JSON: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ValuationError::Classifier("Empty completion".to_string()))?;

        extract_json(&content)
    }

    fn name(&self) -> &str {
        "azure-openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticSettings;

    #[test]
    fn test_extract_plain_json() {
        let value = extract_json(r#"{"matches":[0,2]}"#).unwrap();
        assert_eq!(value["matches"][1], 2);
    }

    #[test]
    fn test_extract_fenced_json() {
        let value = extract_json("```json\n{\"summary\": \"ok\"}\n```").unwrap();
        assert_eq!(value["summary"], "ok");
    }

    #[test]
    fn test_extract_rejects_prose() {
        assert!(extract_json("I cannot help with that").is_err());
        assert!(extract_json("{not json}").is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_model_is_unavailable() {
        let creds = CredentialsProvider::with_fallback(
            Arc::new(StaticSettings::new()),
            Arc::new(StaticSettings::new()),
        );
        let model = AzureOpenAi::new(Arc::new(creds), Duration::from_secs(1)).unwrap();
        let err = model.complete_json("s", "u").await.unwrap_err();
        assert!(matches!(err, ValuationError::Unavailable(_)));
        assert!(!err.is_fatal());
    }
}
