//! Report repository: loads one month of ledger lines and hands them to the
//! pure report service.

use chrono::{Duration, NaiveTime};
use fintrack_core::currency::RateTable;
use fintrack_core::ledger::{AccountInfo, LedgerError};
use fintrack_core::reports::{
    AccountBalanceRow, CategoryTotalRow, LedgerLine, ReportOptions, ReportPeriod, ReportService,
};
use fintrack_shared::types::{AccountId, UserId};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use super::error::RepoResult;
use super::fx_rate::FxRateRepository;
use crate::entities::{accounts, categories, transactions};

/// Everything a report needs for one period.
struct ReportInput {
    accounts: Vec<AccountInfo>,
    lines: Vec<LedgerLine>,
    rates: RateTable,
}

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Net balance per account for `period`.
    ///
    /// # Errors
    ///
    /// Returns `RateNotFound` if a conversion rate is missing.
    pub async fn balance_by_account(
        &self,
        user_id: UserId,
        period: ReportPeriod,
        options: &ReportOptions,
    ) -> RepoResult<Vec<AccountBalanceRow>> {
        let input = self.load(user_id, period, options).await?;
        Ok(ReportService::balance_by_account(
            period,
            options,
            &input.accounts,
            &input.lines,
            |date, base, quote| input.rates.find(date, base, quote),
        )?)
    }

    /// Net total per category for `period`.
    ///
    /// # Errors
    ///
    /// Returns `RateNotFound` if a conversion rate is missing.
    pub async fn monthly_by_category(
        &self,
        user_id: UserId,
        period: ReportPeriod,
        options: &ReportOptions,
    ) -> RepoResult<Vec<CategoryTotalRow>> {
        let input = self.load(user_id, period, options).await?;
        Ok(ReportService::monthly_by_category(
            period,
            options,
            &input.accounts,
            &input.lines,
            |date, base, quote| input.rates.find(date, base, quote),
        )?)
    }

    async fn load(
        &self,
        user_id: UserId,
        period: ReportPeriod,
        options: &ReportOptions,
    ) -> RepoResult<ReportInput> {
        let accounts = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.into_inner()))
            .all(&self.db)
            .await?
            .iter()
            .map(accounts::Model::to_info)
            .collect::<Result<Vec<_>, LedgerError>>()?;

        let start = period.first_day().and_time(NaiveTime::MIN).and_utc();
        let end = period.last_day().and_time(NaiveTime::MIN).and_utc() + Duration::days(1);

        let lines = transactions::Entity::find()
            .find_also_related(categories::Entity)
            .filter(transactions::Column::UserId.eq(user_id.into_inner()))
            .filter(transactions::Column::Voided.eq(false))
            .filter(transactions::Column::OccurredAt.gte(start))
            .filter(transactions::Column::OccurredAt.lt(end))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(transaction, category)| LedgerLine {
                account_id: AccountId::from_uuid(transaction.account_id),
                category: category.as_ref().map(categories::Model::to_info),
                amount_minor: transaction.amount_minor,
                occurred_at: transaction.occurred_at.to_utc(),
            })
            .collect();

        let rates = match &options.report_currency {
            Some(target) => {
                FxRateRepository::new(self.db.clone())
                    .rate_table(target, period.first_day(), period.last_day())
                    .await?
            }
            None => RateTable::new(),
        };

        Ok(ReportInput {
            accounts,
            lines,
            rates,
        })
    }
}
