//! `SeaORM` active enums backed by Postgres enum types.

use fintrack_core::ledger;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `account_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_status")]
pub enum AccountStatus {
    /// Account accepts postings.
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Account is dormant.
    #[sea_orm(string_value = "INACTIVE")]
    Inactive,
    /// Account is closed.
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

/// `category_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "category_type")]
pub enum CategoryType {
    /// Income category.
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// Expense category.
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}

impl From<AccountStatus> for ledger::AccountStatus {
    fn from(status: AccountStatus) -> Self {
        match status {
            AccountStatus::Active => Self::Active,
            AccountStatus::Inactive => Self::Inactive,
            AccountStatus::Closed => Self::Closed,
        }
    }
}

impl From<ledger::AccountStatus> for AccountStatus {
    fn from(status: ledger::AccountStatus) -> Self {
        match status {
            ledger::AccountStatus::Active => Self::Active,
            ledger::AccountStatus::Inactive => Self::Inactive,
            ledger::AccountStatus::Closed => Self::Closed,
        }
    }
}

impl From<CategoryType> for ledger::CategoryType {
    fn from(category_type: CategoryType) -> Self {
        match category_type {
            CategoryType::Income => Self::Income,
            CategoryType::Expense => Self::Expense,
        }
    }
}

impl From<ledger::CategoryType> for CategoryType {
    fn from(category_type: ledger::CategoryType) -> Self {
        match category_type {
            ledger::CategoryType::Income => Self::Income,
            ledger::CategoryType::Expense => Self::Expense,
        }
    }
}
