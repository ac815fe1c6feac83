//! Report data types.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use fintrack_shared::types::{AccountId, CategoryId, CurrencyCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{CategoryInfo, CategoryType, LedgerError};

/// A calendar month, evaluated in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    year: i32,
    month: u32,
}

impl ReportPeriod {
    /// Creates a period.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidPeriod` if `month` is not in 1..=12 or the
    /// year is outside the calendar range.
    pub fn new(year: i32, month: u32) -> Result<Self, LedgerError> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidPeriod(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(LedgerError::InvalidPeriod(format!("year {year} is out of range")));
        }
        Ok(Self { year, month })
    }

    /// The month containing `now`.
    #[must_use]
    pub fn containing(now: DateTime<Utc>) -> Self {
        Self {
            year: now.year(),
            month: now.month(),
        }
    }

    /// Year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month, 1-based.
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Returns true if `ts` falls in this month in UTC.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts.year() == self.year && ts.month() == self.month
    }

    /// First day of the month.
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month.
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Report filters shared by both report shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Include CLOSED accounts and their lines.
    pub include_closed: bool,
    /// Include lines of inactive categories (category report only).
    pub include_inactive: bool,
    /// Convert every line to this currency before aggregating.
    pub report_currency: Option<CurrencyCode>,
}

/// One non-voided transaction as seen by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerLine {
    /// Account the line is posted to.
    pub account_id: AccountId,
    /// Category, if any.
    pub category: Option<CategoryInfo>,
    /// Unsigned magnitude in minor units of the account currency.
    pub amount_minor: i64,
    /// Occurrence time in UTC.
    pub occurred_at: DateTime<Utc>,
}

impl LedgerLine {
    /// Signed amount: negative for EXPENSE, positive for INCOME or uncategorized.
    #[must_use]
    pub fn signed_minor(&self) -> i64 {
        match &self.category {
            Some(c) if c.category_type == CategoryType::Expense => -self.amount_minor,
            _ => self.amount_minor,
        }
    }
}

/// Net balance of one account for the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalanceRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account name.
    pub account_name: String,
    /// Currency of `balance`: the account's own or the report currency.
    pub currency: CurrencyCode,
    /// Net balance.
    pub balance: Decimal,
}

/// Net total of one category for the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotalRow {
    /// Category ID.
    pub category_id: CategoryId,
    /// Category name.
    pub category_name: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    /// Currency label of `total`.
    pub currency: CurrencyCode,
    /// Net total.
    pub total: Decimal,
}
