//! Integration tests for FxRateRepository.

mod common;

use chrono::Days;
use common::{connect, unique_date};
use fintrack_core::currency::FxRateService;
use fintrack_core::ledger::LedgerError;
use fintrack_db::FxRateRepository;
use fintrack_db::repositories::{RateFilter, UpsertOutcome};
use fintrack_shared::types::CurrencyCode;
use rust_decimal_macros::dec;

fn code(raw: &str) -> CurrencyCode {
    CurrencyCode::new(raw).unwrap()
}

#[tokio::test]
async fn test_upsert_reports_created_then_updated() {
    let Some(db) = connect().await else { return };
    let repo = FxRateRepository::new(db.clone());
    let date = unique_date();

    let first = FxRateService::validate_upsert(date, "eur", "usd", dec!(1.10), None).unwrap();
    let (row, outcome) = repo.upsert(first).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Created);
    assert_eq!(row.source, "manual");

    let second =
        FxRateService::validate_upsert(date, "EUR", "USD", dec!(1.12), Some("ecb")).unwrap();
    let (row, outcome) = repo.upsert(second).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated);
    assert_eq!(row.rate_value, dec!(1.12));
    assert_eq!(row.source, "ecb");

    let found = repo
        .find(date, &code("EUR"), &code("USD"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.rate, dec!(1.12));
}

#[tokio::test]
async fn test_get_rate_is_exact_date_only() {
    let Some(db) = connect().await else { return };
    let repo = FxRateRepository::new(db.clone());
    let date = unique_date();

    let upsert = FxRateService::validate_upsert(date, "GBP", "JPY", dec!(190.5), None).unwrap();
    repo.upsert(upsert).await.unwrap();

    let hit = repo.get_rate(date, &code("GBP"), &code("JPY")).await.unwrap();
    assert!(!hit.identity);
    assert_eq!(hit.rate.rate, dec!(190.5));

    let next_day = date.checked_add_days(Days::new(1)).unwrap();
    let miss = repo
        .get_rate(next_day, &code("GBP"), &code("JPY"))
        .await
        .unwrap_err();
    assert!(matches!(miss.as_ledger(), Some(LedgerError::RateNotFound { .. })));

    // Inverse pair is not derived
    let inverse = repo
        .get_rate(date, &code("JPY"), &code("GBP"))
        .await
        .unwrap_err();
    assert!(matches!(inverse.as_ledger(), Some(LedgerError::RateNotFound { .. })));
}

#[tokio::test]
async fn test_get_rate_identity_needs_no_row() {
    let Some(db) = connect().await else { return };
    let lookup = FxRateRepository::new(db.clone())
        .get_rate(unique_date(), &code("CHF"), &code("CHF"))
        .await
        .unwrap();
    assert!(lookup.identity);
    assert_eq!(lookup.rate.rate, dec!(1));
}

#[tokio::test]
async fn test_list_orders_and_validates_range() {
    let Some(db) = connect().await else { return };
    let repo = FxRateRepository::new(db.clone());
    let date = unique_date();
    let later = date.checked_add_days(Days::new(1)).unwrap();

    for (d, base, rate) in [(later, "AUD", dec!(0.61)), (date, "NZD", dec!(0.57)), (date, "CAD", dec!(0.73))] {
        let upsert = FxRateService::validate_upsert(d, base, "SGD", rate, Some("test")).unwrap();
        repo.upsert(upsert).await.unwrap();
    }

    let rows = repo
        .list(&RateFilter {
            base: None,
            quote: Some(code("SGD")),
            from: Some(date),
            to: Some(later),
        })
        .await
        .unwrap();
    let keys: Vec<_> = rows
        .iter()
        .filter(|r| r.source == "test")
        .map(|r| (r.date, r.base.clone()))
        .collect();
    assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    assert!(keys.contains(&(date, "CAD".to_string())));
    assert!(keys.contains(&(later, "AUD".to_string())));

    let err = repo
        .list(&RateFilter {
            from: Some(later),
            to: Some(date),
            ..RateFilter::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::InvalidPeriod(_))));
}

#[tokio::test]
async fn test_rate_table_preloads_quote_currency() {
    let Some(db) = connect().await else { return };
    let repo = FxRateRepository::new(db.clone());
    let date = unique_date();

    let upsert = FxRateService::validate_upsert(date, "SEK", "NOK", dec!(1.02), None).unwrap();
    repo.upsert(upsert).await.unwrap();

    let table = repo.rate_table(&code("NOK"), date, date).await.unwrap();
    assert!(table.find(date, &code("SEK"), &code("NOK")).is_some());
    assert!(table.find(date, &code("NOK"), &code("SEK")).is_none());
}
