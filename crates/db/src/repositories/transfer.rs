//! Transfer repository.
//!
//! A transfer row and its two legs are written in one database transaction.
//! Voiding cascades to both legs in the same way. Transfers are never deleted.

use chrono::{DateTime, NaiveDate, Utc};
use fintrack_core::currency::ExchangeRate;
use fintrack_core::ledger::{CategoryInfo, LedgerError, SystemCategory};
use fintrack_core::transfer::{TransferIntent, TransferPlan, TransferRequest, TransferService};
use fintrack_shared::types::{AccountId, CurrencyCode, TransactionId, TransferId, UserId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::account::load_account;
use super::category::get_or_create_system;
use super::error::RepoResult;
use super::fx_rate::find_rate;
use crate::entities::{transactions, transfers};

/// Input for creating a transfer.
#[derive(Debug, Clone)]
pub struct CreateTransferInput {
    /// Account the money leaves.
    pub src_account_id: AccountId,
    /// Account the money arrives in.
    pub dst_account_id: AccountId,
    /// Amount leaving, in the source currency.
    pub src_amount: Decimal,
    /// Occurrence time.
    pub occurred_at: DateTime<Utc>,
    /// How the destination side is determined.
    pub intent: TransferIntent,
}

/// A newly written transfer with its two legs.
#[derive(Debug, Clone)]
pub struct CreatedTransfer {
    /// The transfer row.
    pub transfer: transfers::Model,
    /// Outgoing leg on the source account.
    pub src_transaction: transactions::Model,
    /// Incoming leg on the destination account.
    pub dst_transaction: transactions::Model,
}

async fn load_transfer<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
    transfer_id: TransferId,
) -> RepoResult<transfers::Model> {
    transfers::Entity::find_by_id(transfer_id.into_inner())
        .filter(transfers::Column::UserId.eq(user_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::TransferNotFound(transfer_id).into())
}

fn leg(
    user_id: UserId,
    transfer_id: Uuid,
    account_id: AccountId,
    category: &CategoryInfo,
    amount_minor: i64,
    plan: &TransferPlan,
) -> transactions::ActiveModel {
    let now = Utc::now().into();
    transactions::ActiveModel {
        id: Set(TransactionId::new().into_inner()),
        user_id: Set(user_id.into_inner()),
        account_id: Set(account_id.into_inner()),
        category_id: Set(Some(category.id.into_inner())),
        amount_minor: Set(amount_minor),
        occurred_at: Set(plan.occurred_at.into()),
        description: Set(Some(category.name.clone())),
        transfer_id: Set(Some(transfer_id)),
        voided: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

/// Transfer repository.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    db: DatabaseConnection,
}

impl TransferRepository {
    /// Creates a new transfer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a transfer and both of its legs atomically.
    ///
    /// The system categories are created or reactivated on demand.
    ///
    /// # Errors
    ///
    /// Returns `SameAccountTransfer`, `AccountNotFound`, `AccountClosed`,
    /// amount/rate validation errors, or `ReferenceRateMissing` when the
    /// reference mode has no stored rate.
    pub async fn create(
        &self,
        user_id: UserId,
        input: CreateTransferInput,
    ) -> RepoResult<CreatedTransfer> {
        if input.src_account_id == input.dst_account_id {
            return Err(LedgerError::SameAccountTransfer.into());
        }

        let txn = self.db.begin().await?;

        let src = load_account(&txn, user_id, input.src_account_id).await?.to_info()?;
        let dst = load_account(&txn, user_id, input.dst_account_id).await?.to_info()?;

        let date = input.occurred_at.date_naive();
        let reference =
            Self::prefetch_reference(&txn, date, &src.currency, &dst.currency, input.intent)
                .await?;

        let request = TransferRequest {
            src_account: src,
            dst_account: dst,
            src_amount: input.src_amount,
            occurred_at: input.occurred_at,
            intent: input.intent,
        };
        let plan = TransferService::plan(&request, move |_, _, _| reference)?;

        let now = Utc::now().into();
        let snapshot = plan.reference.as_ref();
        let transfer = transfers::ActiveModel {
            id: Set(TransferId::new().into_inner()),
            user_id: Set(user_id.into_inner()),
            src_account_id: Set(plan.src_account_id.into_inner()),
            dst_account_id: Set(plan.dst_account_id.into_inner()),
            src_amount_minor: Set(plan.src_amount_minor),
            dst_amount_minor: Set(plan.dst_amount_minor),
            rate_base: Set(plan.rate_base.as_str().to_string()),
            rate_quote: Set(plan.rate_quote.as_str().to_string()),
            rate_value: Set(plan.rate_value),
            occurred_at: Set(plan.occurred_at.into()),
            voided: Set(false),
            ref_rate_value: Set(snapshot.map(|s| s.value)),
            ref_rate_date: Set(snapshot.map(|s| s.date)),
            ref_rate_source: Set(snapshot.map(|s| s.source.clone())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let transfer_out = get_or_create_system(&txn, user_id, SystemCategory::TransferOut)
            .await?
            .to_info();
        let transfer_in = get_or_create_system(&txn, user_id, SystemCategory::TransferIn)
            .await?
            .to_info();

        let src_transaction = leg(
            user_id,
            transfer.id,
            plan.src_account_id,
            &transfer_out,
            plan.src_amount_minor,
            &plan,
        )
        .insert(&txn)
        .await?;
        let dst_transaction = leg(
            user_id,
            transfer.id,
            plan.dst_account_id,
            &transfer_in,
            plan.dst_amount_minor,
            &plan,
        )
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            transfer_id = %transfer.id,
            src_account_id = %transfer.src_account_id,
            dst_account_id = %transfer.dst_account_id,
            rate = %transfer.rate_value,
            "Transfer created"
        );

        Ok(CreatedTransfer {
            transfer,
            src_transaction,
            dst_transaction,
        })
    }

    /// Reads the stored reference rate ahead of planning.
    ///
    /// Same-currency pairs never touch the table. A storage failure is only
    /// fatal when the transfer is priced by the reference rate. The lookup
    /// runs in a savepoint so a failed read leaves the outer transaction usable.
    async fn prefetch_reference<C: ConnectionTrait + TransactionTrait>(
        conn: &C,
        date: NaiveDate,
        base: &CurrencyCode,
        quote: &CurrencyCode,
        intent: TransferIntent,
    ) -> RepoResult<Option<ExchangeRate>> {
        if base == quote {
            return Ok(None);
        }

        let savepoint = conn.begin().await?;
        match find_rate(&savepoint, date, base, quote).await {
            Ok(rate) => {
                savepoint.commit().await?;
                Ok(rate)
            }
            Err(err) if intent != TransferIntent::ByReferenceRate => {
                warn!(error = %err, %base, %quote, %date, "Reference rate lookup failed");
                savepoint.rollback().await?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Gets one transfer.
    ///
    /// # Errors
    ///
    /// Returns `TransferNotFound` if it does not exist for this user.
    pub async fn get(&self, user_id: UserId, transfer_id: TransferId) -> RepoResult<transfers::Model> {
        load_transfer(&self.db, user_id, transfer_id).await
    }

    /// Both legs of a transfer, outgoing first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_legs(
        &self,
        user_id: UserId,
        transfer_id: TransferId,
    ) -> RepoResult<Vec<transactions::Model>> {
        let transfer = load_transfer(&self.db, user_id, transfer_id).await?;
        let mut legs = transactions::Entity::find()
            .filter(transactions::Column::TransferId.eq(transfer.id))
            .order_by_asc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await?;
        legs.sort_by_key(|t| t.account_id != transfer.src_account_id);
        Ok(legs)
    }

    /// Voids a transfer and both legs. Voiding twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `TransferNotFound` if it does not exist for this user.
    pub async fn void(&self, user_id: UserId, transfer_id: TransferId) -> RepoResult<transfers::Model> {
        let txn = self.db.begin().await?;
        let existing = load_transfer(&txn, user_id, transfer_id).await?;
        if existing.voided {
            return Ok(existing);
        }

        let mut active: transfers::ActiveModel = existing.into();
        active.voided = Set(true);
        active.updated_at = Set(Utc::now().into());
        let voided = active.update(&txn).await?;

        transactions::Entity::update_many()
            .col_expr(transactions::Column::Voided, Expr::value(true))
            .col_expr(transactions::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(transactions::Column::TransferId.eq(voided.id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(transfer_id = %voided.id, "Transfer voided");
        Ok(voided)
    }
}
