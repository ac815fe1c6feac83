//! Transfer domain types.

use chrono::{DateTime, NaiveDate, Utc};
use fintrack_shared::types::{AccountId, CurrencyCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::ExchangeRate;
use crate::ledger::{AccountInfo, LedgerError};

/// How the destination amount and the effective rate are determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferIntent {
    /// Caller states how much arrives; the rate is `dst / src`.
    ByDestinationAmount(Decimal),
    /// Caller states the rate; the destination amount is derived from it.
    ByExplicitRate(Decimal),
    /// Neither is given; the stored reference rate for the day is used.
    ByReferenceRate,
}

impl TransferIntent {
    /// Builds the intent from the two optional request fields.
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousTransferIntent` if both fields are present.
    pub fn from_fields(
        dst_amount: Option<Decimal>,
        fx_rate: Option<Decimal>,
    ) -> Result<Self, LedgerError> {
        match (dst_amount, fx_rate) {
            (Some(_), Some(_)) => Err(LedgerError::AmbiguousTransferIntent),
            (Some(amount), None) => Ok(Self::ByDestinationAmount(amount)),
            (None, Some(rate)) => Ok(Self::ByExplicitRate(rate)),
            (None, None) => Ok(Self::ByReferenceRate),
        }
    }
}

/// Input for planning a transfer between two accounts already loaded for the caller.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Account the money leaves.
    pub src_account: AccountInfo,
    /// Account the money arrives at.
    pub dst_account: AccountInfo,
    /// Amount debited, in the source currency.
    pub src_amount: Decimal,
    /// Occurrence time in UTC.
    pub occurred_at: DateTime<Utc>,
    /// Rate/amount resolution mode.
    pub intent: TransferIntent,
}

/// Reference rate recorded on a transfer for fee disclosure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// Rate value.
    pub value: Decimal,
    /// Day of the rate.
    pub date: NaiveDate,
    /// Source tag of the stored rate.
    pub source: String,
}

impl From<ExchangeRate> for RateSnapshot {
    fn from(rate: ExchangeRate) -> Self {
        Self {
            value: rate.rate,
            date: rate.date,
            source: rate.source,
        }
    }
}

/// A fully resolved transfer, ready to be written atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    /// Source account.
    pub src_account_id: AccountId,
    /// Destination account.
    pub dst_account_id: AccountId,
    /// Source amount as entered.
    pub src_amount: Decimal,
    /// Destination amount, given or derived.
    pub dst_amount: Decimal,
    /// Source amount in minor units of `rate_base`.
    pub src_amount_minor: i64,
    /// Destination amount in minor units of `rate_quote`.
    pub dst_amount_minor: i64,
    /// Source account currency.
    pub rate_base: CurrencyCode,
    /// Destination account currency.
    pub rate_quote: CurrencyCode,
    /// Effective rate (VET) applied to this transfer.
    pub rate_value: Decimal,
    /// Occurrence time in UTC.
    pub occurred_at: DateTime<Utc>,
    /// Reference rate snapshot, if one was available.
    pub reference: Option<RateSnapshot>,
}
