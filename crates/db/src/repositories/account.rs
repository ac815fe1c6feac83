//! Account repository.
//!
//! Every query is scoped by `user_id`; an account owned by someone else is
//! reported as not found.

use chrono::Utc;
use fintrack_core::currency::parse_currency;
use fintrack_core::ledger::validation::{
    ensure_account_deletable, ensure_currency_change_allowed, validate_name,
};
use fintrack_core::ledger::LedgerError;
use fintrack_shared::types::{AccountId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::error::{RepoResult, RepositoryError};
use crate::entities::{accounts, sea_orm_active_enums::AccountStatus, transactions};

/// Input for updating an account.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// New name.
    pub name: Option<String>,
    /// New currency; refused once transactions exist.
    pub currency: Option<String>,
}

/// Filter options for listing accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Include CLOSED accounts.
    pub include_closed: bool,
    /// Exact name match.
    pub name: Option<String>,
}

/// Loads an account owned by `user_id`.
pub(crate) async fn load_account<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
    account_id: AccountId,
) -> RepoResult<accounts::Model> {
    accounts::Entity::find_by_id(account_id.into_inner())
        .filter(accounts::Column::UserId.eq(user_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::AccountNotFound(account_id).into())
}

/// Counts transactions referencing an account, voided ones included.
async fn count_references<C: ConnectionTrait>(conn: &C, account_id: Uuid) -> RepoResult<u64> {
    Ok(transactions::Entity::find()
        .filter(transactions::Column::AccountId.eq(account_id))
        .count(conn)
        .await?)
}

/// Account repository for CRUD and lifecycle operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an ACTIVE account.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad name or currency, or
    /// `DuplicateName` if the user already has an account with that name.
    pub async fn create(
        &self,
        user_id: UserId,
        name: &str,
        currency: &str,
    ) -> RepoResult<accounts::Model> {
        let name = validate_name(name)?;
        let currency = parse_currency(currency)?;
        let now = Utc::now().into();

        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            user_id: Set(user_id.into_inner()),
            name: Set(name.clone()),
            currency: Set(currency.as_str().to_string()),
            status: Set(AccountStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        account
            .insert(&self.db)
            .await
            .map_err(|e| RepositoryError::unique_or_db(e, &name))
    }

    /// Lists the user's accounts ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        filter: &AccountFilter,
    ) -> RepoResult<Vec<accounts::Model>> {
        let mut query =
            accounts::Entity::find().filter(accounts::Column::UserId.eq(user_id.into_inner()));

        if !filter.include_closed {
            query = query.filter(accounts::Column::Status.ne(AccountStatus::Closed));
        }
        if let Some(name) = &filter.name {
            query = query.filter(accounts::Column::Name.eq(name.as_str()));
        }

        Ok(query
            .order_by_asc(accounts::Column::Name)
            .order_by_asc(accounts::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Gets one account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist for this user.
    pub async fn get(&self, user_id: UserId, account_id: AccountId) -> RepoResult<accounts::Model> {
        load_account(&self.db, user_id, account_id).await
    }

    /// Renames an account and/or changes its currency.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyChangeNotAllowed` if the currency changes while
    /// transactions reference the account.
    pub async fn update(
        &self,
        user_id: UserId,
        account_id: AccountId,
        input: UpdateAccountInput,
    ) -> RepoResult<accounts::Model> {
        let txn = self.db.begin().await?;
        let existing = load_account(&txn, user_id, account_id).await?;
        let info = existing.to_info()?;

        let mut active: accounts::ActiveModel = existing.into();
        let mut label = info.name.clone();

        if let Some(name) = input.name {
            let name = validate_name(&name)?;
            label.clone_from(&name);
            active.name = Set(name);
        }
        if let Some(currency) = input.currency {
            let currency = parse_currency(&currency)?;
            let references = count_references(&txn, account_id.into_inner()).await?;
            ensure_currency_change_allowed(&info, &currency, references)?;
            active.currency = Set(currency.as_str().to_string());
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| RepositoryError::unique_or_db(e, &label))?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Closes an account. Closing a closed account returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist for this user.
    pub async fn close(&self, user_id: UserId, account_id: AccountId) -> RepoResult<accounts::Model> {
        let txn = self.db.begin().await?;
        let existing = load_account(&txn, user_id, account_id).await?;
        if existing.status == AccountStatus::Closed {
            return Ok(existing);
        }

        let mut active: accounts::ActiveModel = existing.into();
        active.status = Set(AccountStatus::Closed);
        active.updated_at = Set(Utc::now().into());
        let closed = active.update(&txn).await?;
        txn.commit().await?;
        Ok(closed)
    }

    /// Deletes an account with no transactions.
    ///
    /// # Errors
    ///
    /// Returns `AccountInUse` if any transaction references the account.
    pub async fn delete(&self, user_id: UserId, account_id: AccountId) -> RepoResult<()> {
        let txn = self.db.begin().await?;
        let existing = load_account(&txn, user_id, account_id).await?;
        let references = count_references(&txn, existing.id).await?;
        ensure_account_deletable(&existing.to_info()?, references)?;

        accounts::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}
