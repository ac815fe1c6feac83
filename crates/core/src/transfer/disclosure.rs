//! Fee disclosure derived from a transfer's effective and reference rates.
//!
//! Read-time only. Nothing here is persisted.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::currency::MoneyCodec;

const DISCLOSURE_DP: u32 = 2;

/// Two-decimal view of a transfer's rates and the implied fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeDisclosure {
    /// Effective rate, 2 dp.
    pub fx_rate_2dp: Decimal,
    /// Effective rate (VET), 2 dp.
    pub vet_2dp: Decimal,
    /// Reference rate, 2 dp, if snapshotted.
    pub ref_rate_2dp: Option<Decimal>,
    /// `vet - base_fx`, 2 dp.
    pub fees_per_unit_2dp: Option<Decimal>,
    /// `vet / base_fx - 1`, 2 dp.
    pub fees_pct: Option<Decimal>,
}

impl FeeDisclosure {
    /// Computes the disclosure block.
    ///
    /// `base_fx` is the 2 dp reference rate when present and non-zero, else
    /// the 2 dp effective rate. Fees are left empty when `base_fx` is zero.
    #[must_use]
    pub fn compute(effective_rate: Decimal, reference_rate: Option<Decimal>) -> Self {
        let fx_rate_2dp = round2(effective_rate);
        let vet_2dp = fx_rate_2dp;
        let ref_rate_2dp = reference_rate.map(round2);

        let base_fx = ref_rate_2dp
            .filter(|r| !r.is_zero())
            .unwrap_or(fx_rate_2dp);

        let (fees_per_unit_2dp, fees_pct) = if base_fx.is_zero() {
            (None, None)
        } else {
            let per_unit = round2(vet_2dp - base_fx);
            let pct = vet_2dp
                .checked_div(base_fx)
                .map(|ratio| round2(ratio - Decimal::ONE));
            (Some(per_unit), pct)
        };

        Self {
            fx_rate_2dp,
            vet_2dp,
            ref_rate_2dp,
            fees_per_unit_2dp,
            fees_pct,
        }
    }
}

fn round2(value: Decimal) -> Decimal {
    MoneyCodec::round_half_up(value, DISCLOSURE_DP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_disclosure_prefers_reference_rate() {
        let d = FeeDisclosure::compute(dec!(5.40), Some(dec!(5.5012)));
        assert_eq!(d.fx_rate_2dp, dec!(5.40));
        assert_eq!(d.vet_2dp, dec!(5.40));
        assert_eq!(d.ref_rate_2dp, Some(dec!(5.50)));
        assert_eq!(d.fees_per_unit_2dp, Some(dec!(-0.10)));
        // 5.40 / 5.50 - 1 = -0.01818..
        assert_eq!(d.fees_pct, Some(dec!(-0.02)));
    }

    #[test]
    fn test_disclosure_without_reference_is_zero_fee() {
        let d = FeeDisclosure::compute(dec!(5.00), None);
        assert_eq!(d.ref_rate_2dp, None);
        assert_eq!(d.fees_per_unit_2dp, Some(dec!(0.00)));
        assert_eq!(d.fees_pct, Some(dec!(0.00)));
    }

    #[test]
    fn test_disclosure_rounds_half_up() {
        let d = FeeDisclosure::compute(dec!(1.005), Some(dec!(1.004)));
        assert_eq!(d.vet_2dp, dec!(1.01));
        assert_eq!(d.ref_rate_2dp, Some(dec!(1.00)));
        assert_eq!(d.fees_per_unit_2dp, Some(dec!(0.01)));
        assert_eq!(d.fees_pct, Some(dec!(0.01)));
    }

    #[test]
    fn test_disclosure_zero_base_has_no_fees() {
        let d = FeeDisclosure::compute(dec!(0.001), Some(dec!(0.002)));
        assert_eq!(d.vet_2dp, dec!(0.00));
        assert_eq!(d.ref_rate_2dp, Some(dec!(0.00)));
        assert_eq!(d.fees_per_unit_2dp, None);
        assert_eq!(d.fees_pct, None);
    }

    #[test]
    fn test_disclosure_serializes_fee_fields() {
        let json = serde_json::to_value(FeeDisclosure::compute(dec!(5), None)).unwrap();
        assert!(json.get("fees_pct").is_some());
        assert!(json.get("ref_rate_2dp").unwrap().is_null());
    }
}
