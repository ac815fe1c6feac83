//! Property-based tests for the money codec.
//!
//! - Round-trip: decoding an encoded amount gives the amount back
//! - Rejection: any amount with excess fractional digits is refused
//! - Quantize: result always carries exactly the currency exponent

use fintrack_shared::types::CurrencyCode;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::codec::MoneyCodec;
use crate::ledger::LedgerError;

/// Strategy over currencies with exponents 0, 2 and 3.
fn currency_strategy() -> impl Strategy<Value = CurrencyCode> {
    prop::sample::select(vec!["EUR", "USD", "BRL", "GBP", "JPY", "CLP", "KWD", "BHD", "XYZ"])
        .prop_map(|code| CurrencyCode::new(code).unwrap())
}

/// Strategy for signed minor-unit counts.
fn minor_units_strategy() -> impl Strategy<Value = i64> {
    -1_000_000_000_000i64..1_000_000_000_000i64
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any amount already at the currency exponent survives encode then decode.
    #[test]
    fn prop_round_trip(
        currency in currency_strategy(),
        units in minor_units_strategy(),
    ) {
        let amount = Decimal::new(units, MoneyCodec::exponent(&currency));
        let encoded = MoneyCodec::to_minor_units(amount, &currency).unwrap();
        prop_assert_eq!(encoded, units);
        prop_assert_eq!(MoneyCodec::from_minor_units(encoded, &currency), amount);
    }

    /// One extra non-zero digit past the exponent is always rejected.
    #[test]
    fn prop_excess_precision_rejected(
        currency in currency_strategy(),
        units in minor_units_strategy(),
        extra_digit in 1i64..10,
    ) {
        let exponent = MoneyCodec::exponent(&currency);
        let amount = Decimal::new(units * 10 + extra_digit, exponent + 1);
        let is_invalid_precision = matches!(
            MoneyCodec::to_minor_units(amount, &currency),
            Err(LedgerError::InvalidPrecision { .. })
        );
        prop_assert!(is_invalid_precision);
    }

    /// Quantized values have exactly `exponent` digits and move by at most half a minor unit.
    #[test]
    fn prop_quantize_bounds(
        currency in currency_strategy(),
        raw in -10_000_000_000i64..10_000_000_000i64,
        scale in 0u32..8,
    ) {
        let value = Decimal::new(raw, scale);
        let quantized = MoneyCodec::quantize(value, &currency);
        let exponent = MoneyCodec::exponent(&currency);

        prop_assert_eq!(quantized.scale(), exponent);
        let half_unit = Decimal::new(5, exponent + 1);
        prop_assert!((quantized - value).abs() <= half_unit);
    }
}
