use crate::core::CardQuery;

/// Successively looser queries to try when a search comes back empty.
///
/// The first entry is always the query itself. Without a custom query the
/// year is dropped next, then (if one was given) the series as well.
/// Attempts that would repeat the previous search string are skipped.
pub fn relaxation_plan(query: &CardQuery) -> Vec<CardQuery> {
    let mut plan = vec![query.clone()];

    let has_custom = query
        .custom_query
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());
    if has_custom {
        return plan;
    }

    let mut without_year = query.clone();
    without_year.year = None;
    push_distinct(&mut plan, without_year.clone());

    let has_series = query.series.as_deref().is_some_and(|s| !s.trim().is_empty());
    if has_series {
        let mut without_series = without_year;
        without_series.series = None;
        push_distinct(&mut plan, without_series);
    }

    plan
}

fn push_distinct(plan: &mut Vec<CardQuery>, candidate: CardQuery) {
    let repeats = plan
        .last()
        .is_some_and(|prev| prev.search_terms() == candidate.search_terms());
    if !repeats {
        plan.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_plan() {
        let q = CardQuery::new("X").with_year(1999).with_series("Chrome");
        let plan = relaxation_plan(&q);
        let terms: Vec<String> = plan.iter().map(|q| q.search_terms()).collect();
        assert_eq!(terms, vec!["1999 X Chrome", "X Chrome", "X"]);
    }

    #[test]
    fn test_custom_query_never_relaxed() {
        let q = CardQuery::new("X").with_year(1999).with_custom_query("x 1999 chrome");
        assert_eq!(relaxation_plan(&q).len(), 1);
    }

    #[test]
    fn test_no_year_skips_year_step() {
        let q = CardQuery::new("X").with_series("Chrome");
        let terms: Vec<String> = relaxation_plan(&q).iter().map(|q| q.search_terms()).collect();
        assert_eq!(terms, vec!["X Chrome", "X"]);
    }

    #[test]
    fn test_year_only() {
        let q = CardQuery::new("X").with_year(2020);
        assert_eq!(relaxation_plan(&q).len(), 2);
    }
}
