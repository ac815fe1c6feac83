//! Ledger aggregation: balance by account and monthly totals by category.
//!
//! Native aggregation sums signed minor units in `i128` and decodes once at
//! the end. Converted aggregation decodes each line, multiplies by the rate
//! for the line's UTC date, sums in decimal and quantizes each total once to
//! the report currency. A single missing rate fails the whole report.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use fintrack_shared::types::{AccountId, CategoryId, CurrencyCode};
use rust_decimal::Decimal;

use super::types::{
    AccountBalanceRow, CategoryTotalRow, LedgerLine, ReportOptions, ReportPeriod,
};
use crate::currency::{parse_currency, ExchangeRate, FxRateService, MoneyCodec};
use crate::ledger::{AccountInfo, CategoryType, LedgerError};

/// Label used for native category totals, which are not separated by currency.
pub const NATIVE_CATEGORY_FALLBACK_CURRENCY: &str = "EUR";

/// Running total of one report row.
#[derive(Debug, Clone, Copy, Default)]
enum Total {
    #[default]
    Empty,
    Native(i128),
    Converted(Decimal),
}

/// Service for generating ledger reports.
pub struct ReportService;

impl ReportService {
    /// Net balance per account for `period`.
    ///
    /// Every included account appears, with zero if it had no lines. Category
    /// active state is ignored here. Rows are ordered by account name.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::RateNotFound` if any line needs a missing rate.
    pub fn balance_by_account<F>(
        period: ReportPeriod,
        options: &ReportOptions,
        accounts: &[AccountInfo],
        lines: &[LedgerLine],
        rates: F,
    ) -> Result<Vec<AccountBalanceRow>, LedgerError>
    where
        F: Fn(NaiveDate, &CurrencyCode, &CurrencyCode) -> Option<ExchangeRate>,
    {
        let by_id: HashMap<AccountId, &AccountInfo> = accounts.iter().map(|a| (a.id, a)).collect();
        let mut totals: HashMap<AccountId, Total> = HashMap::new();

        for line in lines.iter().filter(|l| period.contains(l.occurred_at)) {
            let Some(account) = Self::included_account(&by_id, line, options)? else {
                continue;
            };
            let total = totals.entry(account.id).or_default();
            Self::accumulate(total, line, account, options.report_currency.as_ref(), &rates)?;
        }

        let mut rows = accounts
            .iter()
            .filter(|a| options.include_closed || !a.status.is_closed())
            .map(|account| {
                let total = totals.get(&account.id).copied().unwrap_or_default();
                let currency = options
                    .report_currency
                    .clone()
                    .unwrap_or_else(|| account.currency.clone());
                Ok(AccountBalanceRow {
                    account_id: account.id,
                    account_name: account.name.clone(),
                    balance: Self::finish(total, &currency)?,
                    currency,
                })
            })
            .collect::<Result<Vec<_>, LedgerError>>()?;

        rows.sort_by(|a, b| {
            a.account_name
                .cmp(&b.account_name)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });
        Ok(rows)
    }

    /// Net total per category for `period`.
    ///
    /// Uncategorized lines never appear. Lines of inactive categories are
    /// skipped unless `include_inactive`. Without a report currency the
    /// minor units of all accounts are summed as-is and labelled with
    /// [`NATIVE_CATEGORY_FALLBACK_CURRENCY`]. Rows are ordered by type
    /// (EXPENSE first), then name, then id.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::RateNotFound` if any line needs a missing rate.
    pub fn monthly_by_category<F>(
        period: ReportPeriod,
        options: &ReportOptions,
        accounts: &[AccountInfo],
        lines: &[LedgerLine],
        rates: F,
    ) -> Result<Vec<CategoryTotalRow>, LedgerError>
    where
        F: Fn(NaiveDate, &CurrencyCode, &CurrencyCode) -> Option<ExchangeRate>,
    {
        let by_id: HashMap<AccountId, &AccountInfo> = accounts.iter().map(|a| (a.id, a)).collect();

        let mut totals: BTreeMap<(CategoryType, String, CategoryId), Total> = BTreeMap::new();

        for line in lines.iter().filter(|l| period.contains(l.occurred_at)) {
            let Some(category) = &line.category else {
                continue;
            };
            if !options.include_inactive && !category.active {
                continue;
            }
            let Some(account) = Self::included_account(&by_id, line, options)? else {
                continue;
            };

            let key = (category.category_type, category.name.clone(), category.id);
            let total = totals.entry(key).or_default();
            Self::accumulate(total, line, account, options.report_currency.as_ref(), &rates)?;
        }

        let currency = match &options.report_currency {
            Some(target) => target.clone(),
            None => parse_currency(NATIVE_CATEGORY_FALLBACK_CURRENCY)?,
        };

        totals
            .into_iter()
            .map(|((category_type, category_name, category_id), total)| {
                Ok(CategoryTotalRow {
                    category_id,
                    category_name,
                    category_type,
                    currency: currency.clone(),
                    total: Self::finish(total, &currency)?,
                })
            })
            .collect()
    }

    /// Returns the line's account, or `None` if it is closed and excluded.
    fn included_account<'a>(
        by_id: &HashMap<AccountId, &'a AccountInfo>,
        line: &LedgerLine,
        options: &ReportOptions,
    ) -> Result<Option<&'a AccountInfo>, LedgerError> {
        let account = by_id.get(&line.account_id).copied().ok_or_else(|| {
            LedgerError::Internal(format!("line references unknown account {}", line.account_id))
        })?;
        if !options.include_closed && account.status.is_closed() {
            return Ok(None);
        }
        Ok(Some(account))
    }

    /// Adds one line to a running total, converting it first if a target is set.
    fn accumulate<F>(
        total: &mut Total,
        line: &LedgerLine,
        account: &AccountInfo,
        target: Option<&CurrencyCode>,
        rates: &F,
    ) -> Result<(), LedgerError>
    where
        F: Fn(NaiveDate, &CurrencyCode, &CurrencyCode) -> Option<ExchangeRate>,
    {
        let signed = line.signed_minor();
        match target {
            None => {
                let sum = match *total {
                    Total::Native(sum) => sum,
                    _ => 0,
                };
                *total = Total::Native(sum + i128::from(signed));
            }
            Some(target) => {
                let native = MoneyCodec::from_minor_units(signed, &account.currency);
                let converted = if &account.currency == target {
                    native
                } else {
                    let rate = FxRateService::get_rate(
                        line.occurred_at.date_naive(),
                        &account.currency,
                        target,
                        |d, b, q| rates(d, b, q),
                    )?;
                    native
                        .checked_mul(rate.rate)
                        .ok_or(LedgerError::AmountOutOfRange(native))?
                };
                let sum = match *total {
                    Total::Converted(sum) => sum,
                    _ => Decimal::ZERO,
                };
                *total = Total::Converted(
                    sum.checked_add(converted)
                        .ok_or(LedgerError::AmountOutOfRange(converted))?,
                );
            }
        }
        Ok(())
    }

    /// Decodes or quantizes a finished total in `currency`.
    fn finish(total: Total, currency: &CurrencyCode) -> Result<Decimal, LedgerError> {
        match total {
            Total::Empty => MoneyCodec::from_minor_total(0, currency),
            Total::Native(sum) => MoneyCodec::from_minor_total(sum, currency),
            Total::Converted(sum) => Ok(MoneyCodec::quantize(sum, currency)),
        }
    }
}
