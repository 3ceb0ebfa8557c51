use crate::core::{CardQuery, Listing};

/// Deterministic title matcher, used when no AI classifier is configured or
/// when the classifier fails.
///
/// A title matches when it contains the query year (if any), the player's
/// last name and, if a card number is set, that number as `#N`, `No.N`,
/// `/N` or a standalone token.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenMatcher;

impl TokenMatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn matches(&self, query: &CardQuery, listing: &Listing) -> bool {
        let title = listing.title.to_lowercase();

        if let Some(year) = query.year {
            if !title.contains(&year.to_string()) {
                return false;
            }
        }

        if let Some(last_name) = query.last_name() {
            if !title.contains(&last_name) {
                return false;
            }
        }

        match query.card_number.as_deref().map(normalize_number) {
            Some(number) if !number.is_empty() => has_card_number(&title, &number),
            _ => true,
        }
    }

    pub fn filter(&self, query: &CardQuery, listings: &[Listing]) -> Vec<Listing> {
        listings
            .iter()
            .filter(|l| self.matches(query, l))
            .cloned()
            .collect()
    }

    pub fn name(&self) -> &str {
        "token-match"
    }
}

fn normalize_number(raw: &str) -> String {
    raw.trim().trim_start_matches('#').trim().to_lowercase()
}

fn has_card_number(title: &str, number: &str) -> bool {
    let prefixed = ["#", "no.", "no. ", "/"]
        .iter()
        .any(|prefix| contains_bounded(title, &format!("{}{}", prefix, number)));

    prefixed
        || title
            .split(|c: char| c.is_whitespace() || ",;:()[]".contains(c))
            .any(|token| token == number)
}

/// `needle` occurs in `hay` and is not immediately followed by an alphanumeric char
fn contains_bounded(hay: &str, needle: &str) -> bool {
    hay.match_indices(needle).any(|(idx, _)| {
        hay[idx + needle.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}
