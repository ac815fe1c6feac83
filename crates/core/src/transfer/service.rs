//! Transfer planning: account checks, rate resolution and the reference snapshot.

use chrono::NaiveDate;
use fintrack_shared::types::CurrencyCode;
use rust_decimal::Decimal;

use super::types::{RateSnapshot, TransferIntent, TransferPlan, TransferRequest};
use crate::currency::{ExchangeRate, FxRateService, MoneyCodec};
use crate::ledger::validation::ensure_account_open;
use crate::ledger::{LedgerError, LedgerService};

/// Transfer engine.
///
/// This service contains pure business logic with no database dependencies.
/// The repository supplies the accounts and a reference-rate lookup, then
/// writes the resulting [`TransferPlan`] and its two postings atomically.
pub struct TransferService;

impl TransferService {
    /// Resolves a transfer request into a plan.
    ///
    /// Mode selection follows [`TransferIntent`]:
    /// - `ByDestinationAmount`: rate is `dst / src` at full precision
    /// - `ByExplicitRate`: `dst = round_half_up(src * rate)` at the destination exponent
    /// - `ByReferenceRate`: the stored rate is both the effective rate and the snapshot
    ///
    /// In the first two modes the reference lookup is best-effort: a miss
    /// leaves the snapshot empty and never fails the transfer. Same-currency
    /// transfers always snapshot the identity rate.
    ///
    /// # Errors
    ///
    /// Returns a validation error for same-account transfers, closed accounts,
    /// non-positive amounts or rates, excess precision, or a missing reference
    /// rate in `ByReferenceRate` mode.
    pub fn plan<F>(request: &TransferRequest, reference_lookup: F) -> Result<TransferPlan, LedgerError>
    where
        F: FnOnce(NaiveDate, &CurrencyCode, &CurrencyCode) -> Option<ExchangeRate>,
    {
        let src = &request.src_account;
        let dst = &request.dst_account;

        if src.id == dst.id {
            return Err(LedgerError::SameAccountTransfer);
        }
        ensure_account_open(src)?;
        ensure_account_open(dst)?;

        let src_amount_minor = LedgerService::encode_amount(request.src_amount, &src.currency)?;

        let date = request.occurred_at.date_naive();
        let reference = FxRateService::get_rate(date, &src.currency, &dst.currency, reference_lookup);

        let (dst_amount, rate_value, reference) = match request.intent {
            TransferIntent::ByDestinationAmount(dst_amount) => {
                LedgerService::encode_amount(dst_amount, &dst.currency)?;
                let rate = dst_amount
                    .checked_div(request.src_amount)
                    .ok_or_else(|| LedgerError::RateOutOfRange(dst_amount))?;
                (dst_amount, rate, reference.ok())
            }
            TransferIntent::ByExplicitRate(rate) => {
                if rate <= Decimal::ZERO {
                    return Err(LedgerError::NonPositiveRate);
                }
                let dst_amount = Self::derive_destination(request.src_amount, rate, &dst.currency)?;
                (dst_amount, rate, reference.ok())
            }
            TransferIntent::ByReferenceRate => {
                let rate = reference.map_err(|_| LedgerError::ReferenceRateMissing {
                    base: src.currency.clone(),
                    quote: dst.currency.clone(),
                    date,
                })?;
                let dst_amount =
                    Self::derive_destination(request.src_amount, rate.rate, &dst.currency)?;
                (dst_amount, rate.rate, Some(rate))
            }
        };

        let dst_amount_minor = LedgerService::encode_amount(dst_amount, &dst.currency)?;

        Ok(TransferPlan {
            src_account_id: src.id,
            dst_account_id: dst.id,
            src_amount: request.src_amount,
            dst_amount,
            src_amount_minor,
            dst_amount_minor,
            rate_base: src.currency.clone(),
            rate_quote: dst.currency.clone(),
            rate_value,
            occurred_at: request.occurred_at,
            reference: reference.map(RateSnapshot::from),
        })
    }

    /// `round_half_up(src * rate)` at the destination currency exponent.
    fn derive_destination(
        src_amount: Decimal,
        rate: Decimal,
        dst_currency: &CurrencyCode,
    ) -> Result<Decimal, LedgerError> {
        let raw = src_amount
            .checked_mul(rate)
            .ok_or(LedgerError::AmountOutOfRange(src_amount))?;
        Ok(MoneyCodec::quantize(raw, dst_currency))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
