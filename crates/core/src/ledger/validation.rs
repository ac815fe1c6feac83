//! Lifecycle guards for accounts, categories and transfer-linked transactions.
//!
//! Each guard is a pure check over already-loaded state. Repositories call
//! them inside the same database transaction that performs the mutation.

use fintrack_shared::types::{CurrencyCode, TransactionId, TransferId};

use super::error::LedgerError;
use super::types::{AccountInfo, CategoryInfo, CategoryType, SystemCategory};

/// Maximum length of account and category names.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of a transaction description.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// What a category merge has to do after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// Source and destination are the same category; nothing moves.
    Noop,
    /// Reassign every transaction from source to destination.
    Reassign,
}

/// New transactions cannot be posted against a closed account.
///
/// # Errors
///
/// Returns `LedgerError::AccountClosed` (a validation failure).
pub fn ensure_account_open(account: &AccountInfo) -> Result<(), LedgerError> {
    if account.status.is_closed() {
        return Err(LedgerError::AccountClosed(account.id));
    }
    Ok(())
}

/// Transactions owned by a transfer only change through the transfer.
///
/// # Errors
///
/// Returns `LedgerError::TransferLinked` (a conflict) if `transfer_id` is set.
pub fn ensure_not_transfer_linked(
    transaction_id: TransactionId,
    transfer_id: Option<TransferId>,
) -> Result<(), LedgerError> {
    if transfer_id.is_some() {
        return Err(LedgerError::TransferLinked(transaction_id));
    }
    Ok(())
}

/// System categories cannot be deactivated, deleted, updated or merged.
///
/// # Errors
///
/// Returns `LedgerError::SystemCategory`.
pub fn ensure_not_system(category: &CategoryInfo) -> Result<(), LedgerError> {
    if category.is_system() {
        return Err(LedgerError::SystemCategory(category.name.clone()));
    }
    Ok(())
}

/// The reserved `(name, type)` pairs cannot be created or renamed into by hand.
///
/// # Errors
///
/// Returns `LedgerError::SystemCategory`.
pub fn ensure_not_reserved(name: &str, category_type: CategoryType) -> Result<(), LedgerError> {
    match SystemCategory::from_parts(name, category_type) {
        Some(sc) => Err(LedgerError::SystemCategory(sc.name().to_string())),
        None => Ok(()),
    }
}

/// Checks a merge of `source` into `destination`.
///
/// System categories are rejected on either side before the self-merge
/// shortcut, so merging a system category into itself still fails.
///
/// # Errors
///
/// Returns `LedgerError::SystemCategory` if either side is reserved.
pub fn check_merge(
    source: &CategoryInfo,
    destination: &CategoryInfo,
) -> Result<MergeAction, LedgerError> {
    ensure_not_system(source)?;
    ensure_not_system(destination)?;
    if source.id == destination.id {
        return Ok(MergeAction::Noop);
    }
    Ok(MergeAction::Reassign)
}

/// Accounts referenced by any transaction cannot be deleted.
///
/// # Errors
///
/// Returns `LedgerError::AccountInUse`.
pub fn ensure_account_deletable(account: &AccountInfo, references: u64) -> Result<(), LedgerError> {
    if references > 0 {
        return Err(LedgerError::AccountInUse(account.id));
    }
    Ok(())
}

/// Categories referenced by any transaction cannot be deleted, nor can system ones.
///
/// # Errors
///
/// Returns `LedgerError::SystemCategory` or `LedgerError::CategoryInUse`.
pub fn ensure_category_deletable(
    category: &CategoryInfo,
    references: u64,
) -> Result<(), LedgerError> {
    ensure_not_system(category)?;
    if references > 0 {
        return Err(LedgerError::CategoryInUse(category.id));
    }
    Ok(())
}

/// An account's currency is fixed once it has transactions.
///
/// # Errors
///
/// Returns `LedgerError::CurrencyChangeNotAllowed`.
pub fn ensure_currency_change_allowed(
    account: &AccountInfo,
    new_currency: &CurrencyCode,
    references: u64,
) -> Result<(), LedgerError> {
    if &account.currency != new_currency && references > 0 {
        return Err(LedgerError::CurrencyChangeNotAllowed(account.id));
    }
    Ok(())
}

/// Trims a display name and checks it is non-empty and at most [`MAX_NAME_LEN`] chars.
///
/// # Errors
///
/// Returns `LedgerError::InvalidName`.
pub fn validate_name(name: &str) -> Result<String, LedgerError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidName("name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(LedgerError::InvalidName(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Checks a transaction description fits [`MAX_DESCRIPTION_LEN`] chars.
///
/// # Errors
///
/// Returns `LedgerError::InvalidName`.
pub fn validate_description(description: Option<&str>) -> Result<Option<String>, LedgerError> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LEN => Err(LedgerError::InvalidName(
            format!("description must be at most {MAX_DESCRIPTION_LEN} characters"),
        )),
        Some(text) => Ok(Some(text.to_string())),
        None => Ok(None),
    }
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
