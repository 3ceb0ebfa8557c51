use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A valuation request for a single card.
///
/// Two queries are equivalent for caching iff every field is equal; the
/// exclusion set is a `BTreeSet` so its insertion order never matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardQuery {
    pub player_name: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub card_number: Option<String>,
    /// Parallel / variant (e.g. "Silver Prizm", "/99")
    #[serde(default)]
    pub parallel: Option<String>,
    #[serde(default)]
    pub grading_company: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub autographed: bool,
    /// Free-text search that fully replaces the assembled one
    #[serde(default)]
    pub custom_query: Option<String>,
    /// Source URLs the caller rejected from a previous result
    #[serde(default)]
    pub excluded_urls: BTreeSet<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

impl CardQuery {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ..Default::default()
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_series(mut self, series: impl Into<String>) -> Self {
        self.series = Some(series.into());
        self
    }

    pub fn with_card_number(mut self, number: impl Into<String>) -> Self {
        self.card_number = Some(number.into());
        self
    }

    pub fn with_parallel(mut self, parallel: impl Into<String>) -> Self {
        self.parallel = Some(parallel.into());
        self
    }

    pub fn with_grading(mut self, company: impl Into<String>, grade: impl Into<String>) -> Self {
        self.grading_company = Some(company.into());
        self.grade = Some(grade.into());
        self
    }

    pub fn with_autograph(mut self) -> Self {
        self.autographed = true;
        self
    }

    pub fn with_custom_query(mut self, query: impl Into<String>) -> Self {
        self.custom_query = Some(query.into());
        self
    }

    pub fn excluding(mut self, url: impl Into<String>) -> Self {
        self.excluded_urls.insert(url.into());
        self
    }

    pub fn forcing_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    /// Same card with the grading fields removed (raw population).
    pub fn ungraded(&self) -> Self {
        let mut q = self.clone();
        q.grading_company = None;
        q.grade = None;
        q
    }

    /// Is a grading filter set on this query
    pub fn is_graded(&self) -> bool {
        self.grading_company.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    /// Marketplace search string.
    ///
    /// Order: year, player, brand, series, number, parallel, grading company + grade,
    /// "auto". A custom query replaces all of it.
    pub fn search_terms(&self) -> String {
        if let Some(custom) = non_empty(&self.custom_query) {
            return custom.to_string();
        }

        let mut parts: Vec<String> = Vec::new();
        if let Some(year) = self.year {
            parts.push(year.to_string());
        }
        parts.push(self.player_name.trim().to_string());
        if let Some(brand) = non_empty(&self.brand) {
            parts.push(brand.to_string());
        }
        if let Some(series) = non_empty(&self.series) {
            parts.push(series.to_string());
        }
        if let Some(number) = non_empty(&self.card_number) {
            parts.push(format!("#{}", number.trim_start_matches('#')));
        }
        if let Some(parallel) = non_empty(&self.parallel) {
            parts.push(parallel.to_string());
        }
        if let Some(company) = non_empty(&self.grading_company) {
            match non_empty(&self.grade) {
                Some(grade) => parts.push(format!("{} {}", company, grade)),
                None => parts.push(company.to_string()),
            }
        }
        if self.autographed {
            parts.push("auto".to_string());
        }

        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    /// Deterministic cache key over every field that affects the result.
    pub fn cache_key(&self) -> String {
        let excluded: Vec<&str> = self.excluded_urls.iter().map(String::as_str).collect();
        let fields = [
            self.year.map(|y| y.to_string()).unwrap_or_default(),
            normalize(Some(&self.player_name)),
            normalize(self.brand.as_ref()),
            normalize(self.series.as_ref()),
            normalize(self.card_number.as_ref()),
            normalize(self.parallel.as_ref()),
            normalize(self.grading_company.as_ref()),
            normalize(self.grade.as_ref()),
            if self.autographed { "auto".to_string() } else { String::new() },
            normalize(self.custom_query.as_ref()),
            excluded.join(","),
        ];
        format!("valuation:{}", fields.join("|"))
    }

    /// Player surname, lowercased. Generational suffixes are skipped.
    pub fn last_name(&self) -> Option<String> {
        self.player_name
            .split_whitespace()
            .map(|s| s.trim_end_matches('.').to_lowercase())
            .filter(|s| !NAME_SUFFIXES.contains(&s.as_str()))
            .last()
    }

    /// Display name (for logging)
    pub fn display_name(&self) -> String {
        self.search_terms()
    }
}

const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv"];

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn normalize(value: Option<&String>) -> String {
    value.map(|s| s.trim().to_lowercase()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_terms_order() {
        let q = CardQuery::new("Luka Doncic")
            .with_year(2018)
            .with_brand("Panini")
            .with_series("Prizm")
            .with_card_number("280")
            .with_parallel("Silver")
            .with_grading("PSA", "10")
            .with_autograph();

        assert_eq!(
            q.search_terms(),
            "2018 Luka Doncic Panini Prizm #280 Silver PSA 10 auto"
        );
    }

    #[test]
    fn test_custom_query_replaces_terms() {
        let q = CardQuery::new("Luka Doncic")
            .with_year(2018)
            .with_custom_query("luka prizm rookie psa 10");
        assert_eq!(q.search_terms(), "luka prizm rookie psa 10");
    }

    #[test]
    fn test_blank_custom_query_ignored() {
        let q = CardQuery::new("Mike Trout").with_custom_query("   ");
        assert_eq!(q.search_terms(), "Mike Trout");
    }

    #[test]
    fn test_cache_key_ignores_exclusion_order() {
        let a = CardQuery::new("X").excluding("https://b").excluding("https://a");
        let b = CardQuery::new("X").excluding("https://a").excluding("https://b");
        assert_eq!(a.cache_key(), b.cache_key());
        assert!(a.cache_key().ends_with("https://a,https://b"));
    }

    #[test]
    fn test_cache_key_distinguishes_fields() {
        let base = CardQuery::new("X").with_year(2020);
        assert_ne!(base.cache_key(), base.clone().with_card_number("10").cache_key());
        assert_ne!(base.cache_key(), base.clone().with_custom_query("x 2020").cache_key());
        assert_ne!(base.cache_key(), base.clone().with_autograph().cache_key());
        assert_ne!(base.cache_key(), base.clone().excluding("https://a").cache_key());
    }

    #[test]
    fn test_cache_key_folds_case_and_whitespace() {
        let a = CardQuery::new("Joe Burrow").with_brand("Panini").with_custom_query("Burrow Prizm 307");
        let b = CardQuery::new(" joe burrow").with_brand("PANINI ").with_custom_query("burrow prizm 307");
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_ignores_force_refresh() {
        let q = CardQuery::new("X").with_year(2020);
        assert_eq!(q.cache_key(), q.clone().forcing_refresh().cache_key());
    }

    #[test]
    fn test_ungraded_strips_grading() {
        let q = CardQuery::new("X").with_grading("PSA", "9");
        assert!(q.is_graded());
        let raw = q.ungraded();
        assert!(!raw.is_graded());
        assert_eq!(raw.grade, None);
    }

    #[test]
    fn test_last_name() {
        assert_eq!(CardQuery::new("Ken Griffey Jr").last_name().as_deref(), Some("griffey"));
        assert_eq!(CardQuery::new("Ohtani").last_name().as_deref(), Some("ohtani"));
        assert_eq!(CardQuery::new("  ").last_name(), None);
    }
}
