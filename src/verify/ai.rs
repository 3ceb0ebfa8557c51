use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::core::{CardQuery, Listing};
use crate::error::{Result, ValuationError};
use crate::providers::LanguageModel;
use crate::verify::MatchClassifier;

const SYSTEM_PROMPT: &str = "You verify sports card marketplace listings against a target card. \
A listing matches only if ALL of these hold:\n\
1. Same player.\n\
2. Same year (mandatory).\n\
3. Same card number when the target specifies one (mandatory).\n\
4. Same brand AND same series/set. A listing from a more specific series than the target \
is a mismatch; a target that only names a brand matches any series of that brand.\n\
5. When the target specifies grading, the listing has the same grading company and grade.\n\
Reply with JSON only: {\"matches\": [indices of matching listings]}. \
Omit every listing you are not sure about.";

/// AI-backed listing classifier
pub struct AiClassifier {
    model: Arc<dyn LanguageModel>,
}

impl AiClassifier {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

fn describe_target(query: &CardQuery) -> String {
    let field = |label: &str, value: Option<&str>| format!("{}: {}", label, value.unwrap_or("any"));
    let year = query.year.map(|y| y.to_string());
    let grading = match (query.grading_company.as_deref(), query.grade.as_deref()) {
        (Some(c), Some(g)) => Some(format!("{} {}", c, g)),
        (Some(c), None) => Some(c.to_string()),
        _ => None,
    };

    [
        format!("Player: {}", query.player_name),
        field("Year", year.as_deref()),
        field("Brand", query.brand.as_deref()),
        field("Series", query.series.as_deref()),
        field("Card number", query.card_number.as_deref()),
        field("Parallel", query.parallel.as_deref()),
        field("Grading", grading.as_deref().or(Some("raw/any"))),
        format!("Autograph: {}", if query.autographed { "yes" } else { "any" }),
    ]
    .join("\n")
}

pub(crate) fn build_prompt(query: &CardQuery, listings: &[Listing]) -> String {
    let mut prompt = format!("Target card:\n{}\n\nListings:\n", describe_target(query));
    for (i, listing) in listings.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i, listing.title));
    }
    prompt
}

/// Read `matches` from the reply. Anything malformed is an error; stray
/// indices are ignored.
pub(crate) fn parse_matches(reply: &Value, batch_len: usize) -> Result<Vec<usize>> {
    let entries = reply
        .get("matches")
        .and_then(Value::as_array)
        .ok_or_else(|| ValuationError::Classifier("reply has no \"matches\" array".to_string()))?;

    let indices: BTreeSet<usize> = entries
        .iter()
        .filter_map(|v| match v {
            Value::Number(n) => n.as_u64().map(|n| n as usize),
            Value::String(s) => s.trim().parse::<usize>().ok(),
            _ => None,
        })
        .filter(|&i| i < batch_len)
        .collect();

    Ok(indices.into_iter().collect())
}

#[async_trait]
impl MatchClassifier for AiClassifier {
    async fn classify(&self, query: &CardQuery, listings: &[Listing]) -> Result<Vec<usize>> {
        let prompt = build_prompt(query, listings);
        let reply = self.model.complete_json(SYSTEM_PROMPT, &prompt).await?;
        parse_matches(&reply, listings.len())
    }

    fn name(&self) -> &str {
        self.model.name()
    }
}
