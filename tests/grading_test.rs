mod common;

use card_valuation_engine::{CardQuery, Recommendation};
use common::{engine, sales, FakeMarketplace, Failure};
use std::sync::Arc;

const RAW: &str = "2020 Joe Burrow Panini #307";
const PSA9: &str = "2020 Joe Burrow Panini #307 PSA 9";
const PSA10: &str = "2020 Joe Burrow Panini #307 PSA 10";
const TITLE: &str = "2020 Panini Joe Burrow #307";

fn burrow() -> CardQuery {
    CardQuery::new("Joe Burrow")
        .with_year(2020)
        .with_brand("Panini")
        .with_card_number("307")
}

fn market(raw: f64, psa9: f64, psa10: f64) -> FakeMarketplace {
    FakeMarketplace::new("fake-ebay")
        .with_sold(RAW, sales(TITLE, &[raw, raw, raw], 1))
        .with_sold(PSA9, sales(TITLE, &[psa9, psa9, psa9], 10))
        .with_sold(PSA10, sales(TITLE, &[psa10, psa10, psa10], 20))
        .with_active(12)
}

#[tokio::test]
async fn test_grade_recommended_for_strong_gem_premium() {
    let market = Arc::new(market(50.0, 100.0, 300.0));
    let analysis = engine(market).grading_analysis(&burrow()).await.unwrap();

    assert_eq!(analysis.raw_price, 50.0);
    assert_eq!(analysis.grade9_price, 100.0);
    assert_eq!(analysis.grade10_price, 300.0);
    assert!((analysis.grade9_roi - 25.0).abs() < 1e-9);
    assert!((analysis.grade10_roi - 275.0).abs() < 1e-9);
    assert_eq!(analysis.active_listings, 12);
    assert_eq!(analysis.recommendation, Recommendation::Grade);
    assert_eq!(analysis.grading_company, "PSA");
    assert!(!analysis.insufficient_data);
}

#[tokio::test]
async fn test_hold_when_only_gem_is_profitable() {
    let market = Arc::new(market(50.0, 60.0, 100.0));
    let analysis = engine(market).grading_analysis(&burrow()).await.unwrap();

    assert!((analysis.grade10_roi - 25.0).abs() < 1e-9);
    assert!(analysis.grade9_roi < 0.0);
    assert_eq!(analysis.recommendation, Recommendation::Hold);
}

#[tokio::test]
async fn test_graded_input_is_valued_from_raw_population() {
    let market = Arc::new(market(50.0, 100.0, 300.0));
    let engine = engine(market.clone());

    let graded = burrow().with_grading("BGS", "9.5");
    let analysis = engine.grading_analysis(&graded).await.unwrap();

    assert_eq!(analysis.raw_price, 50.0);
    let searches = market.searches();
    assert!(searches.contains(&RAW.to_string()));
    assert!(searches.iter().all(|s| !s.contains("BGS")));
}

#[tokio::test]
async fn test_custom_grading_cost() {
    let market = Arc::new(market(50.0, 100.0, 300.0));
    let analysis = engine(market)
        .with_grading_cost(50.0)
        .grading_analysis(&burrow())
        .await
        .unwrap();

    assert_eq!(analysis.grading_cost, 50.0);
    assert!((analysis.grade9_roi - 0.0).abs() < 1e-9);
    assert!((analysis.grade10_roi - 200.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_failed_populations_count_as_no_data() {
    let market = Arc::new(FakeMarketplace::new("fake-ebay").failing(Failure::Transient));
    let analysis = engine(market).grading_analysis(&burrow()).await.unwrap();

    assert_eq!(analysis.raw_price, 0.0);
    assert_eq!(analysis.grade9_roi, 0.0);
    assert_eq!(analysis.grade10_roi, 0.0);
    assert_eq!(analysis.active_listings, 0);
    assert_eq!(analysis.recommendation, Recommendation::SellRaw);
    assert!(analysis.insufficient_data);
}

#[tokio::test]
async fn test_config_error_propagates() {
    let market = Arc::new(FakeMarketplace::new("fake-ebay").failing(Failure::Config));
    let err = engine(market).grading_analysis(&burrow()).await.unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_one_failed_population_degrades_only_that_slice() {
    let market = Arc::new(market(50.0, 100.0, 300.0).failing_for(PSA9, Failure::Transient));
    let analysis = engine(market).grading_analysis(&burrow()).await.unwrap();

    assert_eq!(analysis.raw_price, 50.0);
    assert_eq!(analysis.grade9_price, 0.0);
    assert_eq!(analysis.grade9_roi, 0.0);
    assert_eq!(analysis.grade10_price, 300.0);
    assert!((analysis.grade10_roi - 275.0).abs() < 1e-9);
    assert_eq!(analysis.active_listings, 12);
    assert!(analysis.insufficient_data);
}
