//! FX rate repository.
//!
//! Rates are global reference data keyed by `(date, base, quote)`. Only the
//! exact key is ever looked up; there is no nearest-date fallback.

use chrono::{NaiveDate, Utc};
use fintrack_core::currency::{ExchangeRate, FxRateService, RateTable, RateUpsert};
use fintrack_core::ledger::LedgerError;
use fintrack_shared::types::{CurrencyCode, FxRateId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Select, Set, SqlErr, TransactionTrait,
};

use super::error::{RepoResult, RepositoryError};
use crate::entities::fx_rates;

/// Whether an upsert inserted a new row or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was inserted.
    Created,
    /// An existing row was overwritten.
    Updated,
}

/// Filter options for listing rates.
#[derive(Debug, Clone, Default)]
pub struct RateFilter {
    /// Only this base currency.
    pub base: Option<CurrencyCode>,
    /// Only this quote currency.
    pub quote: Option<CurrencyCode>,
    /// Inclusive start date.
    pub from: Option<NaiveDate>,
    /// Inclusive end date.
    pub to: Option<NaiveDate>,
}

/// Result of a rate lookup.
#[derive(Debug, Clone)]
pub struct RateLookup {
    /// The resolved rate.
    pub rate: ExchangeRate,
    /// True when base equals quote and no row was read.
    pub identity: bool,
}

fn by_key(date: NaiveDate, base: &CurrencyCode, quote: &CurrencyCode) -> Select<fx_rates::Entity> {
    fx_rates::Entity::find()
        .filter(fx_rates::Column::Date.eq(date))
        .filter(fx_rates::Column::Base.eq(base.as_str()))
        .filter(fx_rates::Column::Quote.eq(quote.as_str()))
}

/// Exact-key rate read usable inside an open transaction.
pub(crate) async fn find_rate<C: ConnectionTrait>(
    conn: &C,
    date: NaiveDate,
    base: &CurrencyCode,
    quote: &CurrencyCode,
) -> RepoResult<Option<ExchangeRate>> {
    match by_key(date, base, quote).one(conn).await? {
        Some(model) => Ok(Some(model.to_rate()?)),
        None => Ok(None),
    }
}

/// FX rate repository.
#[derive(Debug, Clone)]
pub struct FxRateRepository {
    db: DatabaseConnection,
}

impl FxRateRepository {
    /// Creates a new FX rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts or replaces the rate for `(date, base, quote)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn upsert(&self, upsert: RateUpsert) -> RepoResult<(fx_rates::Model, UpsertOutcome)> {
        let txn = self.db.begin().await?;

        let existing = by_key(upsert.date, &upsert.base, &upsert.quote).one(&txn).await?;
        let result = match existing {
            Some(model) => (Self::overwrite(&txn, model, &upsert).await?, UpsertOutcome::Updated),
            None => {
                let now = Utc::now().into();
                let row = fx_rates::ActiveModel {
                    id: Set(FxRateId::new().into_inner()),
                    date: Set(upsert.date),
                    base: Set(upsert.base.as_str().to_string()),
                    quote: Set(upsert.quote.as_str().to_string()),
                    rate_value: Set(upsert.rate),
                    source: Set(upsert.source.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                match row.insert(&txn).await {
                    Ok(model) => (model, UpsertOutcome::Created),
                    // Lost a race with a concurrent insert of the same key.
                    Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                        txn.rollback().await?;
                        let model = by_key(upsert.date, &upsert.base, &upsert.quote)
                            .one(&self.db)
                            .await?
                            .ok_or(RepositoryError::Database(err))?;
                        let updated = Self::overwrite(&self.db, model, &upsert).await?;
                        return Ok((updated, UpsertOutcome::Updated));
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        };

        txn.commit().await?;
        Ok(result)
    }

    async fn overwrite<C: ConnectionTrait>(
        conn: &C,
        model: fx_rates::Model,
        upsert: &RateUpsert,
    ) -> RepoResult<fx_rates::Model> {
        let mut active: fx_rates::ActiveModel = model.into();
        active.rate_value = Set(upsert.rate);
        active.source = Set(upsert.source.clone());
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(conn).await?)
    }

    /// Exact-key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        date: NaiveDate,
        base: &CurrencyCode,
        quote: &CurrencyCode,
    ) -> RepoResult<Option<ExchangeRate>> {
        find_rate(&self.db, date, base, quote).await
    }

    /// Resolves a rate, answering 1 for identical currencies.
    ///
    /// # Errors
    ///
    /// Returns `RateNotFound` if no row exists for the key.
    pub async fn get_rate(
        &self,
        date: NaiveDate,
        base: &CurrencyCode,
        quote: &CurrencyCode,
    ) -> RepoResult<RateLookup> {
        let identity = base == quote;
        let stored = if identity {
            None
        } else {
            find_rate(&self.db, date, base, quote).await?
        };
        let rate = FxRateService::get_rate(date, base, quote, |_, _, _| stored)?;
        Ok(RateLookup { rate, identity })
    }

    /// Lists rates ordered by date, base, quote.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` if `from` is after `to`.
    pub async fn list(&self, filter: &RateFilter) -> RepoResult<Vec<fx_rates::Model>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(LedgerError::InvalidPeriod(format!(
                    "from {from} is after to {to}"
                ))
                .into());
            }
        }

        let mut query = fx_rates::Entity::find();
        if let Some(base) = &filter.base {
            query = query.filter(fx_rates::Column::Base.eq(base.as_str()));
        }
        if let Some(quote) = &filter.quote {
            query = query.filter(fx_rates::Column::Quote.eq(quote.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(fx_rates::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(fx_rates::Column::Date.lte(to));
        }

        Ok(query
            .order_by_asc(fx_rates::Column::Date)
            .order_by_asc(fx_rates::Column::Base)
            .order_by_asc(fx_rates::Column::Quote)
            .all(&self.db)
            .await?)
    }

    /// Loads every rate into `quote` dated within `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row is malformed.
    pub async fn rate_table(
        &self,
        quote: &CurrencyCode,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<RateTable> {
        let rows = fx_rates::Entity::find()
            .filter(fx_rates::Column::Quote.eq(quote.as_str()))
            .filter(fx_rates::Column::Date.between(from, to))
            .all(&self.db)
            .await?;

        let mut table = RateTable::new();
        for row in rows {
            table.insert(row.to_rate()?);
        }
        Ok(table)
    }
}
