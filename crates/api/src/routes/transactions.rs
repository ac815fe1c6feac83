//! Direct transaction routes.
//!
//! Transfer legs are listed here like any other row, but every mutation on
//! them answers 409 `TRANSFER_LINKED`.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{DateTime, FixedOffset, Utc};
use fintrack_core::ledger::{CategoryType, LedgerError, LedgerService};
use fintrack_db::repositories::{
    CreateTransactionInput, TransactionFilter, TransactionRecord, TransactionRepository,
    UpdateTransactionInput,
};
use fintrack_shared::types::{AccountId, CategoryId, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::parse_optional_timestamp;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the transaction routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/transactions/{transaction_id}",
            get(get_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
        .route("/transactions/{transaction_id}/amount", put(update_amount))
        .route("/transactions/{transaction_id}/void", post(void_transaction))
}

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Inclusive lower bound (ISO-8601 with offset).
    pub from: Option<String>,
    /// Inclusive upper bound (ISO-8601 with offset).
    pub to: Option<String>,
    /// Filter by account.
    pub account_id: Option<Uuid>,
    /// Filter by category.
    pub category_id: Option<Uuid>,
    /// Filter by category type.
    #[serde(rename = "type")]
    pub category_type: Option<String>,
    /// Include voided rows (default: false).
    #[serde(default)]
    pub include_voided: bool,
}

/// Request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Account to post to.
    pub account_id: Uuid,
    /// Optional category.
    pub category_id: Option<Uuid>,
    /// Positive amount in the account currency.
    pub amount: Decimal,
    /// ISO-8601 timestamp with offset.
    pub occurred_at: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Request body for updating a transaction.
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    /// New category.
    pub category_id: Option<Uuid>,
    /// New timestamp.
    pub occurred_at: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Request body for replacing the amount.
#[derive(Debug, Deserialize)]
pub struct UpdateAmountRequest {
    /// New positive amount.
    pub amount: Decimal,
}

/// Response for a transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Account ID.
    pub account_id: Uuid,
    /// Category ID.
    pub category_id: Option<Uuid>,
    /// Category name.
    pub category_name: Option<String>,
    /// Category type.
    pub category_type: Option<CategoryType>,
    /// Unsigned amount in the account currency.
    pub amount: Decimal,
    /// Account currency.
    pub currency: String,
    /// Occurrence time in UTC.
    pub occurred_at: DateTime<Utc>,
    /// Description.
    pub description: Option<String>,
    /// Owning transfer, if this is a leg.
    pub transfer_id: Option<Uuid>,
    /// True if this is a transfer leg.
    pub from_transfer: bool,
    /// Whether the transaction is voided.
    pub voided: bool,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last update time.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(record: TransactionRecord) -> Self {
        let amount = record.amount();
        let from_transfer = record.from_transfer();
        let category = record.category.map(|c| c.to_info());
        let tx = record.transaction;
        Self {
            id: tx.id,
            account_id: tx.account_id,
            category_id: tx.category_id,
            category_name: category.as_ref().map(|c| c.name.clone()),
            category_type: category.map(|c| c.category_type),
            amount,
            currency: record.currency.as_str().to_string(),
            occurred_at: tx.occurred_at.to_utc(),
            description: tx.description,
            transfer_id: tx.transfer_id,
            from_transfer,
            voided: tx.voided,
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        }
    }
}

fn build_filter(query: ListTransactionsQuery) -> Result<TransactionFilter, LedgerError> {
    Ok(TransactionFilter {
        from: parse_optional_timestamp(query.from.as_deref())?,
        to: parse_optional_timestamp(query.to.as_deref())?,
        account_id: query.account_id.map(AccountId::from_uuid),
        category_id: query.category_id.map(CategoryId::from_uuid),
        category_type: query
            .category_type
            .as_deref()
            .map(str::parse::<CategoryType>)
            .transpose()?,
        include_voided: query.include_voided,
    })
}

/// GET `/fin/transactions` - List transactions, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> impl IntoResponse {
    let filter = match build_filter(query) {
        Ok(f) => f,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let repo = TransactionRepository::new((*state.db).clone());

    match repo.list(auth.user_id(), &filter).await {
        Ok(records) => {
            let data: Vec<TransactionResponse> = records.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST `/fin/transactions` - Create a direct transaction.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> impl IntoResponse {
    let occurred_at = match LedgerService::parse_occurred_at(&payload.occurred_at) {
        Ok(ts) => ts,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let repo = TransactionRepository::new((*state.db).clone());
    let input = CreateTransactionInput {
        account_id: AccountId::from_uuid(payload.account_id),
        category_id: payload.category_id.map(CategoryId::from_uuid),
        amount: payload.amount,
        occurred_at,
        description: payload.description,
    };

    match repo.create(auth.user_id(), input).await {
        Ok(record) => {
            info!(
                user_id = %auth.user_id(),
                transaction_id = %record.transaction.id,
                amount = %record.amount(),
                currency = %record.currency,
                "Transaction created"
            );
            (StatusCode::CREATED, Json(json!(TransactionResponse::from(record)))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// GET `/fin/transactions/{transaction_id}` - Get one transaction.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone());

    match repo
        .get(auth.user_id(), TransactionId::from_uuid(transaction_id))
        .await
    {
        Ok(record) => {
            (StatusCode::OK, Json(json!(TransactionResponse::from(record)))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// PATCH `/fin/transactions/{transaction_id}` - Update category, time or description.
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> impl IntoResponse {
    let occurred_at = match parse_optional_timestamp(payload.occurred_at.as_deref()) {
        Ok(ts) => ts,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let repo = TransactionRepository::new((*state.db).clone());
    let input = UpdateTransactionInput {
        category_id: payload.category_id.map(CategoryId::from_uuid),
        occurred_at,
        description: payload.description,
    };

    match repo
        .update(auth.user_id(), TransactionId::from_uuid(transaction_id), input)
        .await
    {
        Ok(record) => {
            info!(transaction_id = %transaction_id, "Transaction updated");
            (StatusCode::OK, Json(json!(TransactionResponse::from(record)))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// PUT `/fin/transactions/{transaction_id}/amount` - Replace the amount.
async fn update_amount(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<UpdateAmountRequest>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone());

    match repo
        .update_amount(
            auth.user_id(),
            TransactionId::from_uuid(transaction_id),
            payload.amount,
        )
        .await
    {
        Ok(record) => {
            info!(
                transaction_id = %transaction_id,
                amount = %record.amount(),
                "Transaction amount updated"
            );
            (StatusCode::OK, Json(json!(TransactionResponse::from(record)))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST `/fin/transactions/{transaction_id}/void` - Void a direct transaction.
async fn void_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone());

    match repo
        .void(auth.user_id(), TransactionId::from_uuid(transaction_id))
        .await
    {
        Ok(record) => {
            info!(transaction_id = %transaction_id, "Transaction voided");
            (StatusCode::OK, Json(json!(TransactionResponse::from(record)))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// DELETE `/fin/transactions/{transaction_id}` - Delete a direct transaction.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone());

    match repo
        .delete(auth.user_id(), TransactionId::from_uuid(transaction_id))
        .await
    {
        Ok(()) => {
            info!(transaction_id = %transaction_id, "Transaction deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
