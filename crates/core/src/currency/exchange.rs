//! Exchange rate types and lookup rules.
//!
//! Rates are daily snapshots keyed by `(date, base, quote)`. A lookup either
//! hits that exact key or fails. Rates are never inverted or borrowed from a
//! nearby date.

use std::collections::HashMap;

use chrono::NaiveDate;
use fintrack_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Source tag recorded when base and quote are the same currency.
pub const IDENTITY_SOURCE: &str = "identity";

/// Source tag used when an upsert does not name one.
pub const DEFAULT_RATE_SOURCE: &str = "manual";

/// Maximum length of a rate source tag.
pub const MAX_SOURCE_LEN: usize = 32;

/// Fractional digits kept by stored rates, NUMERIC(18,10).
pub const RATE_SCALE: u32 = 10;

/// Integer digits allowed by stored rates, NUMERIC(18,10).
pub const RATE_INTEGER_DIGITS: u32 = 8;

/// Exchange rate between two currencies on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Base currency code.
    pub base: CurrencyCode,
    /// Quote currency code.
    pub quote: CurrencyCode,
    /// Exchange rate (1 base = rate quote).
    pub rate: Decimal,
    /// Day this rate applies to.
    pub date: NaiveDate,
    /// Where the rate came from.
    pub source: String,
}

impl ExchangeRate {
    /// Creates a new exchange rate.
    #[must_use]
    pub fn new(
        base: CurrencyCode,
        quote: CurrencyCode,
        rate: Decimal,
        date: NaiveDate,
        source: impl Into<String>,
    ) -> Self {
        Self {
            base,
            quote,
            rate,
            date,
            source: source.into(),
        }
    }

    /// The rate of a currency against itself.
    #[must_use]
    pub fn identity(currency: &CurrencyCode, date: NaiveDate) -> Self {
        Self::new(
            currency.clone(),
            currency.clone(),
            Decimal::ONE,
            date,
            IDENTITY_SOURCE,
        )
    }

    /// Returns true if this is the identity shortcut rather than a stored rate.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.base == self.quote
    }
}

/// A validated request to insert or overwrite one stored rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateUpsert {
    /// Rate day.
    pub date: NaiveDate,
    /// Base currency.
    pub base: CurrencyCode,
    /// Quote currency.
    pub quote: CurrencyCode,
    /// Rate value.
    pub rate: Decimal,
    /// Source tag.
    pub source: String,
}

/// FX rate rules: lookup with identity shortcut, and upsert validation.
pub struct FxRateService;

impl FxRateService {
    /// Resolves the rate for `(date, base, quote)`.
    ///
    /// Returns exactly 1 when base equals quote without consulting `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::RateNotFound` if `lookup` has no row for the key.
    pub fn get_rate<F>(
        date: NaiveDate,
        base: &CurrencyCode,
        quote: &CurrencyCode,
        lookup: F,
    ) -> Result<ExchangeRate, LedgerError>
    where
        F: FnOnce(NaiveDate, &CurrencyCode, &CurrencyCode) -> Option<ExchangeRate>,
    {
        if base == quote {
            return Ok(ExchangeRate::identity(base, date));
        }

        lookup(date, base, quote).ok_or_else(|| LedgerError::RateNotFound {
            base: base.clone(),
            quote: quote.clone(),
            date,
        })
    }

    /// Validates and normalizes an upsert request.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the currencies are invalid or equal, the
    /// rate is not positive, the rate does not fit NUMERIC(18,10), or the
    /// source tag is too long.
    pub fn validate_upsert(
        date: NaiveDate,
        base: &str,
        quote: &str,
        rate: Decimal,
        source: Option<&str>,
    ) -> Result<RateUpsert, LedgerError> {
        let base = parse_currency(base)?;
        let quote = parse_currency(quote)?;
        if base == quote {
            return Err(LedgerError::SameCurrency(base));
        }

        Self::validate_rate_value(rate)?;

        let source = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_RATE_SOURCE);
        if source.chars().count() > MAX_SOURCE_LEN {
            return Err(LedgerError::InvalidName(format!(
                "rate source must be at most {MAX_SOURCE_LEN} characters"
            )));
        }

        Ok(RateUpsert {
            date,
            base,
            quote,
            rate: rate.normalize(),
            source: source.to_string(),
        })
    }

    /// Checks that a rate is positive and fits NUMERIC(18,10).
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveRate` or `RateOutOfRange`.
    pub fn validate_rate_value(rate: Decimal) -> Result<(), LedgerError> {
        if rate <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveRate);
        }
        let integer_limit = Decimal::from(10_i64.pow(RATE_INTEGER_DIGITS));
        if rate.normalize().scale() > RATE_SCALE || rate.trunc() >= integer_limit {
            return Err(LedgerError::RateOutOfRange(rate));
        }
        Ok(())
    }
}

/// Parses a user-supplied currency code into the domain error space.
///
/// # Errors
///
/// Returns `LedgerError::InvalidCurrency` for anything but three ASCII letters.
pub fn parse_currency(code: &str) -> Result<CurrencyCode, LedgerError> {
    CurrencyCode::new(code).map_err(|e| LedgerError::InvalidCurrency(e.0))
}

/// In-memory set of rates, keyed like the stored table.
///
/// Reports preload the rates they may need into a table and resolve lines
/// against it, so a whole report reads rates in one query.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<(NaiveDate, CurrencyCode, CurrencyCode), ExchangeRate>,
}

impl RateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a rate.
    pub fn insert(&mut self, rate: ExchangeRate) {
        let key = (rate.date, rate.base.clone(), rate.quote.clone());
        self.rates.insert(key, rate);
    }

    /// Exact-key lookup.
    #[must_use]
    pub fn find(
        &self,
        date: NaiveDate,
        base: &CurrencyCode,
        quote: &CurrencyCode,
    ) -> Option<ExchangeRate> {
        self.rates
            .get(&(date, base.clone(), quote.clone()))
            .cloned()
    }

    /// Number of stored rates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true if the table holds no rates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FromIterator<ExchangeRate> for RateTable {
    fn from_iter<I: IntoIterator<Item = ExchangeRate>>(iter: I) -> Self {
        let mut table = Self::new();
        for rate in iter {
            table.insert(rate);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cur(code: &str) -> CurrencyCode {
        CurrencyCode::new(code).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn table() -> RateTable {
        [ExchangeRate::new(cur("EUR"), cur("BRL"), dec!(5.5), day(10), "ecb")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_identity_shortcut_is_case_insensitive() {
        let rate = FxRateService::get_rate(day(1), &cur("eur"), &cur("EUR"), |_, _, _| {
            panic!("lookup must not run for identity")
        })
        .unwrap();
        assert_eq!(rate.rate, Decimal::ONE);
        assert_eq!(rate.source, IDENTITY_SOURCE);
        assert!(rate.is_identity());
    }

    #[test]
    fn test_exact_lookup() {
        let table = table();
        let rate =
            FxRateService::get_rate(day(10), &cur("EUR"), &cur("BRL"), |d, b, q| table.find(d, b, q))
                .unwrap();
        assert_eq!(rate.rate, dec!(5.5));
        assert_eq!(rate.source, "ecb");
    }

    #[test]
    fn test_no_nearest_date_fallback() {
        let table = table();
        let result =
            FxRateService::get_rate(day(11), &cur("EUR"), &cur("BRL"), |d, b, q| table.find(d, b, q));
        assert!(matches!(result, Err(LedgerError::RateNotFound { .. })));
    }

    #[test]
    fn test_no_implicit_inversion() {
        let table = table();
        let result =
            FxRateService::get_rate(day(10), &cur("BRL"), &cur("EUR"), |d, b, q| table.find(d, b, q));
        assert!(matches!(result, Err(LedgerError::RateNotFound { .. })));
    }

    #[test]
    fn test_validate_upsert_normalizes() {
        let upsert =
            FxRateService::validate_upsert(day(1), "eur", "usd", dec!(1.0850), None).unwrap();
        assert_eq!(upsert.base, cur("EUR"));
        assert_eq!(upsert.quote, cur("USD"));
        assert_eq!(upsert.rate.to_string(), "1.085");
        assert_eq!(upsert.source, DEFAULT_RATE_SOURCE);
    }

    #[test]
    fn test_validate_upsert_rejections() {
        assert!(matches!(
            FxRateService::validate_upsert(day(1), "EUR", "eur", dec!(1), None),
            Err(LedgerError::SameCurrency(_))
        ));
        assert!(matches!(
            FxRateService::validate_upsert(day(1), "EUR", "USD", dec!(0), None),
            Err(LedgerError::NonPositiveRate)
        ));
        assert!(matches!(
            FxRateService::validate_upsert(day(1), "EUR", "USD", dec!(-1.2), None),
            Err(LedgerError::NonPositiveRate)
        ));
        assert!(matches!(
            FxRateService::validate_upsert(day(1), "EUR", "USD", dec!(1.12345678901), None),
            Err(LedgerError::RateOutOfRange(_))
        ));
        assert!(matches!(
            FxRateService::validate_upsert(day(1), "EUR", "USD", dec!(100000000), None),
            Err(LedgerError::RateOutOfRange(_))
        ));
        assert!(matches!(
            FxRateService::validate_upsert(day(1), "EURO", "USD", dec!(1), None),
            Err(LedgerError::InvalidCurrency(_))
        ));
        let long_source = "x".repeat(MAX_SOURCE_LEN + 1);
        assert!(
            FxRateService::validate_upsert(day(1), "EUR", "USD", dec!(1), Some(&long_source))
                .is_err()
        );
    }

    #[test]
    fn test_ten_decimal_places_accepted() {
        assert!(FxRateService::validate_rate_value(dec!(0.0000000001)).is_ok());
        assert!(FxRateService::validate_rate_value(dec!(99999999.9999999999)).is_ok());
    }
}
