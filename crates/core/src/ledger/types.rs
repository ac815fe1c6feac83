//! Ledger domain types: account status, category type and the system categories.

use std::fmt;
use std::str::FromStr;

use fintrack_shared::types::{AccountId, CategoryId, CurrencyCode};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Name of the system income category used for incoming transfer legs.
pub const TRANSFER_IN_NAME: &str = "Transfer In";

/// Name of the system expense category used for outgoing transfer legs.
pub const TRANSFER_OUT_NAME: &str = "Transfer Out";

/// Account lifecycle status.
///
/// The only transition the ledger performs is to `Closed`, and it is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    /// Account accepts postings.
    Active,
    /// Account is dormant but still accepts postings.
    Inactive,
    /// Account is closed and accepts no new postings.
    Closed,
}

impl AccountStatus {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Closed => "CLOSED",
        }
    }

    /// Returns true if the account is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(LedgerError::InvalidAccountStatus(s.to_string())),
        }
    }
}

/// Category type. The sign of a transaction is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoryType {
    /// Money going out. Ordered first in category reports.
    Expense,
    /// Money coming in.
    Income,
}

impl CategoryType {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }

    /// Sign applied to amounts posted under this type: +1 for income, -1 for expense.
    #[must_use]
    pub const fn sign(&self) -> i8 {
        match self {
            Self::Income => 1,
            Self::Expense => -1,
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = LedgerError;

    /// Case-insensitive: `income`, `Income` and `INCOME` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            _ => Err(LedgerError::InvalidCategoryType(s.to_string())),
        }
    }
}

/// The two categories the transfer engine posts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemCategory {
    /// "Transfer In" / INCOME, on the destination account.
    TransferIn,
    /// "Transfer Out" / EXPENSE, on the source account.
    TransferOut,
}

impl SystemCategory {
    /// Reserved category name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TransferIn => TRANSFER_IN_NAME,
            Self::TransferOut => TRANSFER_OUT_NAME,
        }
    }

    /// Reserved category type.
    #[must_use]
    pub const fn category_type(&self) -> CategoryType {
        match self {
            Self::TransferIn => CategoryType::Income,
            Self::TransferOut => CategoryType::Expense,
        }
    }

    /// Matches only the exact reserved `(name, type)` pairs.
    ///
    /// A user category named "Transfer In" with type EXPENSE is an ordinary category.
    #[must_use]
    pub fn from_parts(name: &str, category_type: CategoryType) -> Option<Self> {
        [Self::TransferIn, Self::TransferOut]
            .into_iter()
            .find(|sc| sc.name() == name && sc.category_type() == category_type)
    }
}

/// Account fields the core needs to validate postings and build reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// The account's currency.
    pub currency: CurrencyCode,
    /// Lifecycle status.
    pub status: AccountStatus,
}

/// Category fields the core needs to validate postings and build reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInfo {
    /// The category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Income or expense.
    pub category_type: CategoryType,
    /// Whether the category is active.
    pub active: bool,
}

impl CategoryInfo {
    /// Returns the system category this is, if any.
    #[must_use]
    pub fn system(&self) -> Option<SystemCategory> {
        SystemCategory::from_parts(&self.name, self.category_type)
    }

    /// Returns true for the reserved transfer categories.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.system().is_some()
    }
}
