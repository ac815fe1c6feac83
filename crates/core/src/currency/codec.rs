//! Conversion between decimal amounts and integer minor units.
//!
//! CRITICAL: Rounding strategy for all currency quantization:
//! - Amounts are stored as signed integer minor units (cents for EUR)
//! - User input must already fit the currency's exponent, it is never rounded silently
//! - Everything that does get rounded (converted totals, derived amounts) uses round half up

use fintrack_shared::types::CurrencyCode;
use rust_decimal::prelude::*;

use crate::ledger::LedgerError;

/// Fallback exponent for currencies missing from the table.
pub const DEFAULT_EXPONENT: u32 = 2;

/// Money codec for minor-unit conversions.
///
/// All methods are associated functions; the exponent table is static.
pub struct MoneyCodec;

impl MoneyCodec {
    /// Returns the number of fractional digits used by a currency.
    ///
    /// Unknown codes default to 2.
    #[must_use]
    pub fn exponent(currency: &CurrencyCode) -> u32 {
        match currency.as_str() {
            "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF"
            | "UGX" | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
            "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
            _ => DEFAULT_EXPONENT,
        }
    }

    /// Checks that `amount` has no more fractional digits than the currency allows.
    ///
    /// Trailing zeros are fine: `1.230` is a valid EUR amount.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidPrecision` if truncating the amount at the
    /// currency exponent changes its value.
    pub fn validate_precision(
        amount: Decimal,
        currency: &CurrencyCode,
    ) -> Result<Decimal, LedgerError> {
        let exponent = Self::exponent(currency);
        let truncated = amount.round_dp_with_strategy(exponent, RoundingStrategy::ToZero);
        if truncated == amount {
            Ok(amount)
        } else {
            Err(LedgerError::InvalidPrecision {
                amount,
                currency: currency.clone(),
                exponent,
            })
        }
    }

    /// Converts a decimal amount to integer minor units.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidPrecision` if the amount has excess digits,
    /// or `LedgerError::AmountOutOfRange` if it does not fit in an `i64`.
    pub fn to_minor_units(amount: Decimal, currency: &CurrencyCode) -> Result<i64, LedgerError> {
        Self::validate_precision(amount, currency)?;
        let scaled = amount
            .checked_mul(Self::scale_factor(currency))
            .ok_or(LedgerError::AmountOutOfRange(amount))?;
        scaled
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(LedgerError::AmountOutOfRange(amount))
    }

    /// Converts integer minor units back to a decimal with exactly `exponent` digits.
    #[must_use]
    pub fn from_minor_units(units: i64, currency: &CurrencyCode) -> Decimal {
        Decimal::new(units, Self::exponent(currency))
    }

    /// Converts an accumulated minor-unit total back to a decimal.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Internal` if the total exceeds the decimal range.
    pub fn from_minor_total(total: i128, currency: &CurrencyCode) -> Result<Decimal, LedgerError> {
        Decimal::try_from_i128_with_scale(total, Self::exponent(currency))
            .map_err(|e| LedgerError::Internal(format!("minor-unit total out of range: {e}")))
    }

    /// Rounds a computed amount to the currency exponent (half up) and pads
    /// it so it always prints with exactly `exponent` fractional digits.
    #[must_use]
    pub fn quantize(amount: Decimal, currency: &CurrencyCode) -> Decimal {
        Self::round_half_up(amount, Self::exponent(currency))
    }

    /// Rounds half away from zero to `decimal_places`, keeping trailing zeros.
    ///
    /// `round_half_up(dec!(2.5), 0) == 3`, `round_half_up(dec!(-2.5), 0) == -3`.
    #[must_use]
    pub fn round_half_up(value: Decimal, decimal_places: u32) -> Decimal {
        let mut rounded =
            value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(decimal_places);
        rounded
    }

    fn scale_factor(currency: &CurrencyCode) -> Decimal {
        Decimal::from(10_i64.pow(Self::exponent(currency)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn cur(code: &str) -> CurrencyCode {
        CurrencyCode::new(code).unwrap()
    }

    #[rstest]
    #[case("EUR", 2)]
    #[case("usd", 2)]
    #[case("GBP", 2)]
    #[case("BRL", 2)]
    #[case("JPY", 0)]
    #[case("CLP", 0)]
    #[case("KWD", 3)]
    #[case("BHD", 3)]
    #[case("ZZZ", 2)]
    fn test_exponent_table(#[case] code: &str, #[case] expected: u32) {
        assert_eq!(MoneyCodec::exponent(&cur(code)), expected);
    }

    #[test]
    fn test_precision_rejection() {
        assert!(matches!(
            MoneyCodec::to_minor_units(dec!(1.001), &cur("EUR")),
            Err(LedgerError::InvalidPrecision { exponent: 2, .. })
        ));
        assert_eq!(MoneyCodec::to_minor_units(dec!(1.234), &cur("KWD")).unwrap(), 1234);
        assert!(MoneyCodec::to_minor_units(dec!(10.5), &cur("JPY")).is_err());
    }

    #[test]
    fn test_trailing_zeros_are_not_excess_precision() {
        assert_eq!(MoneyCodec::to_minor_units(dec!(1.230), &cur("EUR")).unwrap(), 123);
        assert_eq!(MoneyCodec::to_minor_units(dec!(10.000), &cur("JPY")).unwrap(), 10);
    }

    #[test]
    fn test_negative_amounts_round_trip() {
        assert_eq!(MoneyCodec::to_minor_units(dec!(-12.34), &cur("EUR")).unwrap(), -1234);
        assert_eq!(MoneyCodec::from_minor_units(-1234, &cur("EUR")), dec!(-12.34));
    }

    #[test]
    fn test_out_of_range_amount() {
        let huge = Decimal::MAX;
        assert!(matches!(
            MoneyCodec::to_minor_units(huge, &cur("EUR")),
            Err(LedgerError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn test_from_minor_units_keeps_exponent_digits() {
        assert_eq!(MoneyCodec::from_minor_units(50000, &cur("BRL")).to_string(), "500.00");
        assert_eq!(MoneyCodec::from_minor_units(0, &cur("EUR")).to_string(), "0.00");
        assert_eq!(MoneyCodec::from_minor_units(1500, &cur("JPY")).to_string(), "1500");
        assert_eq!(MoneyCodec::from_minor_units(1, &cur("KWD")).to_string(), "0.001");
    }

    #[test]
    fn test_from_minor_total() {
        let total = i128::from(i64::MAX) + 1;
        let value = MoneyCodec::from_minor_total(total, &cur("EUR")).unwrap();
        assert_eq!(value, Decimal::from_i128_with_scale(total, 2));
    }

    #[test]
    fn test_quantize_half_up() {
        assert_eq!(MoneyCodec::quantize(dec!(2.345), &cur("EUR")), dec!(2.35));
        assert_eq!(MoneyCodec::quantize(dec!(2.344), &cur("EUR")), dec!(2.34));
        assert_eq!(MoneyCodec::quantize(dec!(-2.345), &cur("EUR")), dec!(-2.35));
        assert_eq!(MoneyCodec::quantize(dec!(2.5), &cur("JPY")), dec!(3));
        assert_eq!(MoneyCodec::quantize(dec!(5), &cur("EUR")).to_string(), "5.00");
    }

    #[test]
    fn test_round_half_up_is_not_bankers_rounding() {
        assert_eq!(MoneyCodec::round_half_up(dec!(2.5), 0), dec!(3));
        assert_eq!(MoneyCodec::round_half_up(dec!(3.5), 0), dec!(4));
        assert_eq!(MoneyCodec::round_half_up(dec!(2.25), 1), dec!(2.3));
        assert_eq!(MoneyCodec::round_half_up(dec!(2.35), 1), dec!(2.4));
    }
}
