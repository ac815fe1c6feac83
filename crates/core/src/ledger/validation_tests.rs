use super::*;
use crate::ledger::{AccountStatus, ErrorKind};
use fintrack_shared::types::{AccountId, CategoryId, CurrencyCode};
use rstest::rstest;

fn account(status: AccountStatus) -> AccountInfo {
    AccountInfo {
        id: AccountId::new(),
        name: "Checking".to_string(),
        currency: CurrencyCode::new("EUR").unwrap(),
        status,
    }
}

fn category(name: &str, category_type: CategoryType) -> CategoryInfo {
    CategoryInfo {
        id: CategoryId::new(),
        name: name.to_string(),
        category_type,
        active: true,
    }
}

#[rstest]
#[case(AccountStatus::Active, true)]
#[case(AccountStatus::Inactive, true)]
#[case(AccountStatus::Closed, false)]
fn test_account_open_guard(#[case] status: AccountStatus, #[case] allowed: bool) {
    let result = ensure_account_open(&account(status));
    assert_eq!(result.is_ok(), allowed);
    if let Err(err) = result {
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.error_code(), "ACCOUNT_CLOSED");
    }
}

#[test]
fn test_transfer_linked_is_conflict() {
    let id = TransactionId::new();
    assert!(ensure_not_transfer_linked(id, None).is_ok());

    let err = ensure_not_transfer_linked(id, Some(TransferId::new())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(matches!(err, LedgerError::TransferLinked(t) if t == id));
}

#[rstest]
#[case("Transfer In", CategoryType::Income)]
#[case("Transfer Out", CategoryType::Expense)]
fn test_system_categories_are_protected(#[case] name: &str, #[case] category_type: CategoryType) {
    let system = category(name, category_type);
    let other = category("Groceries", CategoryType::Expense);

    assert!(matches!(ensure_not_system(&system), Err(LedgerError::SystemCategory(_))));
    assert!(matches!(
        ensure_category_deletable(&system, 0),
        Err(LedgerError::SystemCategory(_))
    ));
    assert!(matches!(check_merge(&system, &other), Err(LedgerError::SystemCategory(_))));
    assert!(matches!(check_merge(&other, &system), Err(LedgerError::SystemCategory(_))));
    assert!(matches!(check_merge(&system, &system), Err(LedgerError::SystemCategory(_))));
    assert!(ensure_not_reserved(name, category_type).is_err());
}

#[test]
fn test_reserved_name_with_other_type_is_ordinary() {
    let lookalike = category("Transfer In", CategoryType::Expense);
    assert!(ensure_not_system(&lookalike).is_ok());
    assert!(ensure_not_reserved("Transfer In", CategoryType::Expense).is_ok());
}

#[test]
fn test_merge_into_itself_is_noop() {
    let groceries = category("Groceries", CategoryType::Expense);
    assert_eq!(check_merge(&groceries, &groceries).unwrap(), MergeAction::Noop);

    let food = category("Food", CategoryType::Expense);
    assert_eq!(check_merge(&groceries, &food).unwrap(), MergeAction::Reassign);
}

#[test]
fn test_in_use_guards() {
    let acc = account(AccountStatus::Active);
    assert!(ensure_account_deletable(&acc, 0).is_ok());
    let err = ensure_account_deletable(&acc, 3).unwrap_err();
    assert_eq!(err.error_code(), "ACCOUNT_IN_USE");
    assert_eq!(err.http_status_code(), 409);

    let cat = category("Rent", CategoryType::Expense);
    assert!(ensure_category_deletable(&cat, 0).is_ok());
    let err = ensure_category_deletable(&cat, 1).unwrap_err();
    assert_eq!(err.error_code(), "CATEGORY_IN_USE");
}

#[test]
fn test_currency_change_guard() {
    let acc = account(AccountStatus::Active);
    let usd = CurrencyCode::new("USD").unwrap();

    assert!(ensure_currency_change_allowed(&acc, &usd, 0).is_ok());
    assert!(ensure_currency_change_allowed(&acc, &acc.currency, 5).is_ok());
    let err = ensure_currency_change_allowed(&acc, &usd, 5).unwrap_err();
    assert_eq!(err.error_code(), "CURRENCY_CHANGE_NOT_ALLOWED");
}

#[rstest]
#[case("  Wallet  ", Some("Wallet"))]
#[case("", None)]
#[case("   ", None)]
fn test_validate_name(#[case] input: &str, #[case] expected: Option<&str>) {
    assert_eq!(validate_name(input).ok().as_deref(), expected);
}

#[test]
fn test_name_length_limit() {
    assert!(validate_name(&"a".repeat(MAX_NAME_LEN)).is_ok());
    assert!(validate_name(&"a".repeat(MAX_NAME_LEN + 1)).is_err());
}

#[test]
fn test_description_length_limit() {
    assert_eq!(validate_description(None).unwrap(), None);
    assert!(validate_description(Some(&"x".repeat(MAX_DESCRIPTION_LEN))).is_ok());
    assert!(validate_description(Some(&"x".repeat(MAX_DESCRIPTION_LEN + 1))).is_err());
}
