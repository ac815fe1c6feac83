//! Ledger service for direct transaction validation.
//!
//! This module turns raw transaction input into the row the repository
//! stores. Amounts are checked against the account currency and encoded as
//! minor units before anything touches the database.

use chrono::{DateTime, NaiveDateTime, Utc};
use fintrack_shared::types::{AccountId, CategoryId, CurrencyCode};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{AccountInfo, CategoryInfo};
use super::validation::{ensure_account_open, ensure_not_system, validate_description};
use crate::currency::MoneyCodec;

/// A validated transaction ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Account the amount is posted to.
    pub account_id: AccountId,
    /// Optional category; its type decides the sign at read time.
    pub category_id: Option<CategoryId>,
    /// Unsigned magnitude in minor units of the account currency.
    pub amount_minor: i64,
    /// Occurrence time in UTC.
    pub occurred_at: DateTime<Utc>,
    /// Optional free text.
    pub description: Option<String>,
}

/// Ledger service for transaction validation.
///
/// This service contains pure business logic with no database dependencies.
pub struct LedgerService;

impl LedgerService {
    /// Validates a new direct transaction.
    ///
    /// Steps, in order:
    /// 1. Account must not be closed
    /// 2. Category must not be one of the transfer categories
    /// 3. Amount must be positive and fit the account currency
    /// 4. Description must fit its length limit
    ///
    /// Ownership of the account and category is checked by the caller when
    /// loading them.
    ///
    /// # Errors
    ///
    /// Returns the first `LedgerError` encountered.
    pub fn prepare_transaction(
        account: &AccountInfo,
        category: Option<&CategoryInfo>,
        amount: Decimal,
        occurred_at: DateTime<Utc>,
        description: Option<&str>,
    ) -> Result<NewTransaction, LedgerError> {
        ensure_account_open(account)?;
        if let Some(category) = category {
            ensure_not_system(category)?;
        }
        let amount_minor = Self::encode_amount(amount, &account.currency)?;
        let description = validate_description(description)?;

        Ok(NewTransaction {
            account_id: account.id,
            category_id: category.map(|c| c.id),
            amount_minor,
            occurred_at,
            description,
        })
    }

    /// Encodes a positive amount as minor units of `currency`.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount`, `InvalidPrecision` or `AmountOutOfRange`.
    pub fn encode_amount(amount: Decimal, currency: &CurrencyCode) -> Result<i64, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount);
        }
        MoneyCodec::to_minor_units(amount, currency)
    }

    /// Parses an ISO-8601 timestamp that must carry a UTC offset.
    ///
    /// `2025-03-01T10:00:00-03:00` becomes `2025-03-01T13:00:00Z`.
    ///
    /// # Errors
    ///
    /// Returns `MissingTimezone` for a valid local timestamp without offset and
    /// `InvalidTimestamp` for anything unparseable.
    pub fn parse_occurred_at(raw: &str) -> Result<DateTime<Utc>, LedgerError> {
        let raw = raw.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        if raw.parse::<NaiveDateTime>().is_ok() {
            return Err(LedgerError::MissingTimezone);
        }
        Err(LedgerError::InvalidTimestamp(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AccountStatus, CategoryType};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn account(currency: &str, status: AccountStatus) -> AccountInfo {
        AccountInfo {
            id: AccountId::new(),
            name: "Main".to_string(),
            currency: CurrencyCode::new(currency).unwrap(),
            status,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_prepare_transaction_encodes_minor_units() {
        let acc = account("EUR", AccountStatus::Active);
        let cat = CategoryInfo {
            id: CategoryId::new(),
            name: "Salary".to_string(),
            category_type: CategoryType::Income,
            active: true,
        };

        let tx = LedgerService::prepare_transaction(&acc, Some(&cat), dec!(150.00), noon(), Some("March"))
            .unwrap();

        assert_eq!(tx.account_id, acc.id);
        assert_eq!(tx.category_id, Some(cat.id));
        assert_eq!(tx.amount_minor, 15_000);
        assert_eq!(tx.description.as_deref(), Some("March"));
    }

    #[test]
    fn test_prepare_transaction_rejects_closed_account() {
        let acc = account("EUR", AccountStatus::Closed);
        let err = LedgerService::prepare_transaction(&acc, None, dec!(1), noon(), None).unwrap_err();
        assert!(matches!(err, LedgerError::AccountClosed(_)));
        assert_eq!(err.http_status_code(), 422);
    }

    #[test]
    fn test_prepare_transaction_rejects_transfer_categories() {
        let acc = account("EUR", AccountStatus::Active);
        let transfer_in = CategoryInfo {
            id: CategoryId::new(),
            name: "Transfer In".to_string(),
            category_type: CategoryType::Income,
            active: true,
        };

        let err = LedgerService::prepare_transaction(&acc, Some(&transfer_in), dec!(1), noon(), None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::SystemCategory(_)));
    }

    #[test]
    fn test_prepare_transaction_rejects_bad_amounts() {
        let jpy = account("JPY", AccountStatus::Active);
        assert!(matches!(
            LedgerService::prepare_transaction(&jpy, None, dec!(10.5), noon(), None),
            Err(LedgerError::InvalidPrecision { exponent: 0, .. })
        ));
        assert!(matches!(
            LedgerService::prepare_transaction(&jpy, None, dec!(0), noon(), None),
            Err(LedgerError::NonPositiveAmount)
        ));
        assert!(matches!(
            LedgerService::prepare_transaction(&jpy, None, dec!(-5), noon(), None),
            Err(LedgerError::NonPositiveAmount)
        ));
    }

    #[test]
    fn test_parse_occurred_at_normalizes_to_utc() {
        let ts = LedgerService::parse_occurred_at("2025-03-01T10:00:00-03:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 3, 1, 13, 0, 0).unwrap());

        let ts = LedgerService::parse_occurred_at("2025-03-01T10:00:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_occurred_at_requires_offset() {
        assert!(matches!(
            LedgerService::parse_occurred_at("2025-03-01T10:00:00"),
            Err(LedgerError::MissingTimezone)
        ));
        assert!(matches!(
            LedgerService::parse_occurred_at("yesterday"),
            Err(LedgerError::InvalidTimestamp(_))
        ));
    }
}
