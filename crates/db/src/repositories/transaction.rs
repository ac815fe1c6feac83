//! Transaction repository for direct ledger entries.
//!
//! Transfer legs are readable here but every mutation on them is refused;
//! they change only through the transfer that owns them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fintrack_core::currency::{parse_currency, MoneyCodec};
use fintrack_core::ledger::validation::{
    ensure_not_system, ensure_not_transfer_linked, validate_description,
};
use fintrack_core::ledger::{CategoryType, LedgerError, LedgerService};
use fintrack_shared::types::{
    AccountId, CategoryId, CurrencyCode, TransactionId, TransferId, UserId,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use super::account::load_account;
use super::category::load_category;
use super::error::RepoResult;
use crate::entities::{accounts, categories, sea_orm_active_enums, transactions};

// ============================================================================
// Input / Output Types
// ============================================================================

/// Input for creating a direct transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Account to post to.
    pub account_id: AccountId,
    /// Optional category.
    pub category_id: Option<CategoryId>,
    /// Positive amount in the account currency.
    pub amount: Decimal,
    /// Occurrence time.
    pub occurred_at: DateTime<Utc>,
    /// Optional description.
    pub description: Option<String>,
}

/// Input for updating the non-amount fields of a transaction.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// New category.
    pub category_id: Option<CategoryId>,
    /// New occurrence time.
    pub occurred_at: Option<DateTime<Utc>>,
    /// New description.
    pub description: Option<String>,
}

/// Filter options for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Inclusive lower bound on `occurred_at`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `occurred_at`.
    pub to: Option<DateTime<Utc>>,
    /// Only this account.
    pub account_id: Option<AccountId>,
    /// Only this category.
    pub category_id: Option<CategoryId>,
    /// Only categories of this type.
    pub category_type: Option<CategoryType>,
    /// Include voided rows.
    pub include_voided: bool,
}

/// A stored transaction with what is needed to present it.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    /// The row.
    pub transaction: transactions::Model,
    /// Its category, if any.
    pub category: Option<categories::Model>,
    /// Currency of its account.
    pub currency: CurrencyCode,
}

impl TransactionRecord {
    /// Amount decoded in the account currency.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        MoneyCodec::from_minor_units(self.transaction.amount_minor, &self.currency)
    }

    /// True if this row is a leg of a transfer.
    #[must_use]
    pub const fn from_transfer(&self) -> bool {
        self.transaction.transfer_id.is_some()
    }
}

// ============================================================================
// Helpers
// ============================================================================

async fn load_transaction<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
    transaction_id: TransactionId,
) -> RepoResult<transactions::Model> {
    transactions::Entity::find_by_id(transaction_id.into_inner())
        .filter(transactions::Column::UserId.eq(user_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id).into())
}

fn ensure_direct(model: &transactions::Model) -> Result<(), LedgerError> {
    ensure_not_transfer_linked(
        TransactionId::from_uuid(model.id),
        model.transfer_id.map(TransferId::from_uuid),
    )
}

async fn record<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
    transaction: transactions::Model,
) -> RepoResult<TransactionRecord> {
    let account = load_account(conn, user_id, AccountId::from_uuid(transaction.account_id)).await?;
    let category = match transaction.category_id {
        Some(id) => categories::Entity::find_by_id(id).one(conn).await?,
        None => None,
    };
    Ok(TransactionRecord {
        currency: parse_currency(&account.currency)?,
        category,
        transaction,
    })
}

// ============================================================================
// Repository
// ============================================================================

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a direct transaction.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`/`CategoryNotFound` for rows the user does
    /// not own, `AccountClosed` for a closed account, `SystemCategory` for a
    /// transfer category, or an amount error.
    pub async fn create(
        &self,
        user_id: UserId,
        input: CreateTransactionInput,
    ) -> RepoResult<TransactionRecord> {
        let txn = self.db.begin().await?;

        let account = load_account(&txn, user_id, input.account_id).await?;
        let account_info = account.to_info()?;
        let category = match input.category_id {
            Some(id) => Some(load_category(&txn, user_id, id).await?),
            None => None,
        };
        let category_info = category.as_ref().map(categories::Model::to_info);

        let prepared = LedgerService::prepare_transaction(
            &account_info,
            category_info.as_ref(),
            input.amount,
            input.occurred_at,
            input.description.as_deref(),
        )?;

        let now = Utc::now().into();
        let model = transactions::ActiveModel {
            id: Set(TransactionId::new().into_inner()),
            user_id: Set(user_id.into_inner()),
            account_id: Set(prepared.account_id.into_inner()),
            category_id: Set(prepared.category_id.map(CategoryId::into_inner)),
            amount_minor: Set(prepared.amount_minor),
            occurred_at: Set(prepared.occurred_at.into()),
            description: Set(prepared.description),
            transfer_id: Set(None),
            voided: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        debug!(transaction_id = %model.id, account_id = %model.account_id, "Transaction created");

        Ok(TransactionRecord {
            transaction: model,
            category,
            currency: account_info.currency,
        })
    }

    /// Lists transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
    ) -> RepoResult<Vec<TransactionRecord>> {
        let currencies: HashMap<Uuid, CurrencyCode> = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.into_inner()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|a| parse_currency(&a.currency).map(|currency| (a.id, currency)))
            .collect::<Result<_, LedgerError>>()?;

        let mut query = transactions::Entity::find()
            .find_also_related(categories::Entity)
            .filter(transactions::Column::UserId.eq(user_id.into_inner()));

        if !filter.include_voided {
            query = query.filter(transactions::Column::Voided.eq(false));
        }
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::OccurredAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::OccurredAt.lte(to));
        }
        if let Some(account_id) = filter.account_id {
            query = query.filter(transactions::Column::AccountId.eq(account_id.into_inner()));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id.into_inner()));
        }
        if let Some(category_type) = filter.category_type {
            let db_type = sea_orm_active_enums::CategoryType::from(category_type);
            query = query.filter(categories::Column::CategoryType.eq(db_type));
        }

        let rows = query
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|(transaction, category)| -> RepoResult<TransactionRecord> {
                let currency = currencies
                    .get(&transaction.account_id)
                    .cloned()
                    .ok_or_else(|| {
                        LedgerError::Internal(format!(
                            "transaction {} references unknown account {}",
                            transaction.id, transaction.account_id
                        ))
                    })?;
                Ok(TransactionRecord {
                    transaction,
                    category,
                    currency,
                })
            })
            .collect()
    }

    /// Gets one transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if it does not exist for this user.
    pub async fn get(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
    ) -> RepoResult<TransactionRecord> {
        let model = load_transaction(&self.db, user_id, transaction_id).await?;
        record(&self.db, user_id, model).await
    }

    /// Updates category, occurrence time and/or description.
    ///
    /// # Errors
    ///
    /// Returns `TransferLinked` for transfer legs and `SystemCategory` when
    /// moving into a transfer category.
    pub async fn update(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
        input: UpdateTransactionInput,
    ) -> RepoResult<TransactionRecord> {
        let txn = self.db.begin().await?;
        let existing = load_transaction(&txn, user_id, transaction_id).await?;
        ensure_direct(&existing)?;

        let mut active: transactions::ActiveModel = existing.into();
        if let Some(category_id) = input.category_id {
            let category = load_category(&txn, user_id, category_id).await?;
            ensure_not_system(&category.to_info())?;
            active.category_id = Set(Some(category.id));
        }
        if let Some(occurred_at) = input.occurred_at {
            active.occurred_at = Set(occurred_at.into());
        }
        if input.description.is_some() {
            active.description = Set(validate_description(input.description.as_deref())?);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await?;
        let result = record(&txn, user_id, updated).await?;
        txn.commit().await?;
        Ok(result)
    }

    /// Replaces the amount of a direct transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransferLinked` for transfer legs or an amount error.
    pub async fn update_amount(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
        amount: Decimal,
    ) -> RepoResult<TransactionRecord> {
        let txn = self.db.begin().await?;
        let existing = load_transaction(&txn, user_id, transaction_id).await?;
        ensure_direct(&existing)?;

        let account =
            load_account(&txn, user_id, AccountId::from_uuid(existing.account_id)).await?;
        let currency = parse_currency(&account.currency)?;
        let amount_minor = LedgerService::encode_amount(amount, &currency)?;

        let mut active: transactions::ActiveModel = existing.into();
        active.amount_minor = Set(amount_minor);
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await?;
        let result = record(&txn, user_id, updated).await?;
        txn.commit().await?;
        Ok(result)
    }

    /// Voids a direct transaction. Voiding twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `TransferLinked` for transfer legs.
    pub async fn void(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
    ) -> RepoResult<TransactionRecord> {
        let txn = self.db.begin().await?;
        let existing = load_transaction(&txn, user_id, transaction_id).await?;
        ensure_direct(&existing)?;

        let model = if existing.voided {
            existing
        } else {
            let mut active: transactions::ActiveModel = existing.into();
            active.voided = Set(true);
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?
        };

        let result = record(&txn, user_id, model).await?;
        txn.commit().await?;
        Ok(result)
    }

    /// Deletes a direct transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransferLinked` for transfer legs.
    pub async fn delete(&self, user_id: UserId, transaction_id: TransactionId) -> RepoResult<()> {
        let txn = self.db.begin().await?;
        let existing = load_transaction(&txn, user_id, transaction_id).await?;
        ensure_direct(&existing)?;

        transactions::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}
