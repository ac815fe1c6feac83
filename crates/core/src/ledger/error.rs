//! Ledger error types for validation, conflict and lookup failures.
//!
//! Every variant belongs to exactly one [`ErrorKind`], which decides how the
//! HTTP layer reports it. Callers match on `kind()` to tell "fix your input"
//! (validation) apart from "this object is protected" (conflict).

use chrono::NaiveDate;
use fintrack_shared::AppError;
use fintrack_shared::types::{AccountId, CategoryId, CurrencyCode, TransactionId, TransferId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Failure classes of the ledger core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Referenced object does not exist or is not owned by the caller.
    NotFound,
    /// Malformed or out-of-range input.
    Validation,
    /// Valid input that would violate an invariant of a stored object.
    Conflict,
    /// A required FX rate is not stored.
    RateNotFound,
    /// The operation is never allowed, whatever the state.
    PermanentlyDisabled,
    /// Storage or programming failure.
    Internal,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Not Found ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Category not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Transfer not found.
    #[error("Transfer not found: {0}")]
    TransferNotFound(TransferId),

    // ========== Validation Errors ==========
    /// Amount has more fractional digits than the currency allows.
    #[error("Amount {amount} has more than {exponent} decimal places for {currency}")]
    InvalidPrecision {
        /// The rejected amount.
        amount: Decimal,
        /// Currency the amount was validated against.
        currency: CurrencyCode,
        /// Allowed fractional digits.
        exponent: u32,
    },

    /// Amount must be strictly positive.
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// Amount does not fit the minor-unit range.
    #[error("Amount {0} is out of range")]
    AmountOutOfRange(Decimal),

    /// Source and destination account are the same.
    #[error("Invalid transfer: source and destination accounts must differ")]
    SameAccountTransfer,

    /// No reference rate stored for a transfer that relies on it.
    #[error("Invalid transfer: rate missing for {base}->{quote} on {date}")]
    ReferenceRateMissing {
        /// Source currency.
        base: CurrencyCode,
        /// Destination currency.
        quote: CurrencyCode,
        /// Transfer date.
        date: NaiveDate,
    },

    /// Both a destination amount and an explicit rate were supplied.
    #[error("Provide either dst_amount or fx_rate, not both")]
    AmbiguousTransferIntent,

    /// Rate must be strictly positive.
    #[error("Exchange rate must be greater than zero")]
    NonPositiveRate,

    /// Rate does not fit NUMERIC(18,10).
    #[error("Exchange rate {0} exceeds 8 integer or 10 fractional digits")]
    RateOutOfRange(Decimal),

    /// Base and quote currency are the same.
    #[error("Base and quote currency must differ, got {0} for both")]
    SameCurrency(CurrencyCode),

    /// Category type is not INCOME or EXPENSE.
    #[error("Category type must be INCOME or EXPENSE, got '{0}'")]
    InvalidCategoryType(String),

    /// Account status string is unknown.
    #[error("Unknown account status '{0}'")]
    InvalidAccountStatus(String),

    /// Currency code is not three letters.
    #[error("Invalid currency code '{0}'")]
    InvalidCurrency(String),

    /// Timestamp carries no UTC offset.
    #[error("occurred_at must be timezone-aware")]
    MissingTimezone,

    /// Timestamp could not be parsed.
    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    /// Report period or date range is invalid.
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    /// Account is closed and accepts no new postings.
    #[error("Account {0} is closed")]
    AccountClosed(AccountId),

    /// Name or free text is empty or too long.
    #[error("Invalid value: {0}")]
    InvalidName(String),

    // ========== Conflicts ==========
    /// Transaction belongs to a transfer and can only change through it.
    #[error("Transaction {0} is part of a transfer; manage it via /fin/transfers")]
    TransferLinked(TransactionId),

    /// Account is referenced by transactions.
    #[error("Account {0} is in use")]
    AccountInUse(AccountId),

    /// Category is referenced by transactions.
    #[error("Category {0} is in use")]
    CategoryInUse(CategoryId),

    /// Category is one of the reserved transfer categories.
    #[error("'{0}' is a system category and cannot be changed")]
    SystemCategory(String),

    /// Name already used by another object of the same owner.
    #[error("'{0}' already exists")]
    DuplicateName(String),

    /// Account currency cannot change once transactions exist.
    #[error("Cannot change currency of account {0}: it has transactions")]
    CurrencyChangeNotAllowed(AccountId),

    // ========== Rates ==========
    /// No FX rate stored for a conversion.
    #[error("missing fx rate for conversion: {base}->{quote} on {date}")]
    RateNotFound {
        /// Base currency.
        base: CurrencyCode,
        /// Quote currency.
        quote: CurrencyCode,
        /// Rate date.
        date: NaiveDate,
    },

    // ========== Disabled ==========
    /// Transfers are voided, never deleted.
    #[error("Deletion disabled. Use POST /fin/transfers/{{id}}/void instead")]
    TransferDeletionDisabled,

    // ========== Internal ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound(_)
            | Self::CategoryNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::TransferNotFound(_) => ErrorKind::NotFound,

            Self::InvalidPrecision { .. }
            | Self::NonPositiveAmount
            | Self::AmountOutOfRange(_)
            | Self::SameAccountTransfer
            | Self::ReferenceRateMissing { .. }
            | Self::AmbiguousTransferIntent
            | Self::NonPositiveRate
            | Self::RateOutOfRange(_)
            | Self::SameCurrency(_)
            | Self::InvalidCategoryType(_)
            | Self::InvalidAccountStatus(_)
            | Self::InvalidCurrency(_)
            | Self::MissingTimezone
            | Self::InvalidTimestamp(_)
            | Self::InvalidPeriod(_)
            | Self::AccountClosed(_)
            | Self::InvalidName(_) => ErrorKind::Validation,

            Self::TransferLinked(_)
            | Self::AccountInUse(_)
            | Self::CategoryInUse(_)
            | Self::SystemCategory(_)
            | Self::DuplicateName(_)
            | Self::CurrencyChangeNotAllowed(_) => ErrorKind::Conflict,

            Self::RateNotFound { .. } => ErrorKind::RateNotFound,

            Self::TransferDeletionDisabled => ErrorKind::PermanentlyDisabled,

            Self::Database(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::TransferNotFound(_) => "TRANSFER_NOT_FOUND",
            Self::InvalidPrecision { .. } => "INVALID_PRECISION",
            Self::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            Self::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
            Self::SameAccountTransfer | Self::ReferenceRateMissing { .. } => "INVALID_TRANSFER",
            Self::AmbiguousTransferIntent => "AMBIGUOUS_TRANSFER_INTENT",
            Self::NonPositiveRate => "NON_POSITIVE_RATE",
            Self::RateOutOfRange(_) => "RATE_OUT_OF_RANGE",
            Self::SameCurrency(_) => "SAME_CURRENCY",
            Self::InvalidCategoryType(_) => "INVALID_CATEGORY_TYPE",
            Self::InvalidAccountStatus(_) => "INVALID_ACCOUNT_STATUS",
            Self::InvalidCurrency(_) => "INVALID_CURRENCY",
            Self::MissingTimezone => "MISSING_TIMEZONE",
            Self::InvalidTimestamp(_) => "INVALID_TIMESTAMP",
            Self::InvalidPeriod(_) => "INVALID_PERIOD",
            Self::AccountClosed(_) => "ACCOUNT_CLOSED",
            Self::InvalidName(_) => "INVALID_VALUE",
            Self::TransferLinked(_) => "TRANSFER_LINKED",
            Self::AccountInUse(_) => "ACCOUNT_IN_USE",
            Self::CategoryInUse(_) => "CATEGORY_IN_USE",
            Self::SystemCategory(_) => "SYSTEM_CATEGORY",
            Self::DuplicateName(_) => "DUPLICATE_NAME",
            Self::CurrencyChangeNotAllowed(_) => "CURRENCY_CHANGE_NOT_ALLOWED",
            Self::RateNotFound { .. } => "RATE_NOT_FOUND",
            Self::TransferDeletionDisabled => "TRANSFER_DELETION_DISABLED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Validation | ErrorKind::RateNotFound => 422,
            ErrorKind::Conflict => 409,
            ErrorKind::PermanentlyDisabled => 405,
            ErrorKind::Internal => 500,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::RateNotFound => Self::RateNotFound(message),
            ErrorKind::PermanentlyDisabled => Self::MethodNotAllowed(message),
            ErrorKind::Internal => match err {
                LedgerError::Database(_) => Self::Database(message),
                _ => Self::Internal(message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn eur() -> CurrencyCode {
        CurrencyCode::new("EUR").unwrap()
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::SameAccountTransfer.error_code(), "INVALID_TRANSFER");
        assert_eq!(
            LedgerError::ReferenceRateMissing {
                base: eur(),
                quote: eur(),
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            }
            .error_code(),
            "INVALID_TRANSFER"
        );
        assert_eq!(
            LedgerError::TransferLinked(TransactionId::new()).error_code(),
            "TRANSFER_LINKED"
        );
        assert_eq!(LedgerError::TransferDeletionDisabled.error_code(), "TRANSFER_DELETION_DISABLED");
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::AccountNotFound(AccountId::new()).http_status_code(), 404);
        assert_eq!(
            LedgerError::InvalidPrecision {
                amount: dec!(1.001),
                currency: eur(),
                exponent: 2,
            }
            .http_status_code(),
            422
        );
        assert_eq!(LedgerError::AccountClosed(AccountId::new()).http_status_code(), 422);
        assert_eq!(LedgerError::CategoryInUse(CategoryId::new()).http_status_code(), 409);
        assert_eq!(
            LedgerError::SystemCategory("Transfer In".into()).http_status_code(),
            409
        );
        assert_eq!(LedgerError::TransferDeletionDisabled.http_status_code(), 405);
        assert_eq!(LedgerError::Database("x".into()).http_status_code(), 500);
    }

    #[test]
    fn test_closed_account_is_validation_not_conflict() {
        assert_eq!(LedgerError::AccountClosed(AccountId::new()).kind(), ErrorKind::Validation);
        assert_eq!(
            LedgerError::TransferLinked(TransactionId::new()).kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn test_into_app_error_keeps_class() {
        let app: AppError = LedgerError::TransferLinked(TransactionId::new()).into();
        assert!(matches!(app, AppError::Conflict(_)));
        assert_eq!(app.status_code(), 409);

        let app: AppError = LedgerError::RateNotFound {
            base: eur(),
            quote: CurrencyCode::new("BRL").unwrap(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
        .into();
        assert_eq!(app.error_code(), "RATE_NOT_FOUND");
        assert_eq!(
            app.to_string(),
            "Rate not found: missing fx rate for conversion: EUR->BRL on 2025-01-01"
        );

        let app: AppError = LedgerError::TransferDeletionDisabled.into();
        assert_eq!(app.status_code(), 405);

        let app: AppError = LedgerError::Database("boom".into()).into();
        assert!(matches!(app, AppError::Database(_)));
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::InvalidPrecision {
            amount: dec!(1.001),
            currency: eur(),
            exponent: 2,
        };
        assert_eq!(
            err.to_string(),
            "Amount 1.001 has more than 2 decimal places for EUR"
        );
        assert_eq!(
            LedgerError::TransferDeletionDisabled.to_string(),
            "Deletion disabled. Use POST /fin/transfers/{id}/void instead"
        );
    }
}
