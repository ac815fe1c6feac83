//! Account management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use fintrack_core::ledger::AccountStatus;
use fintrack_db::entities::accounts;
use fintrack_db::repositories::{AccountFilter, AccountRepository, UpdateAccountInput};
use fintrack_shared::types::AccountId;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the account routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/{account_id}",
            get(get_account).patch(update_account).delete(delete_account),
        )
        .route("/accounts/{account_id}/close", post(close_account))
}

/// Query parameters for listing accounts.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    /// Include closed accounts (default: false).
    #[serde(default)]
    pub include_closed: bool,
    /// Exact name filter.
    pub name: Option<String>,
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Account name (unique per user).
    pub name: String,
    /// ISO 4217 currency code.
    pub currency: String,
}

/// Request body for updating an account.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    /// New name.
    pub name: Option<String>,
    /// New currency (only while the account has no transactions).
    pub currency: Option<String>,
}

/// Response for an account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: Uuid,
    /// Account name.
    pub name: String,
    /// Currency code.
    pub currency: String,
    /// ACTIVE, INACTIVE or CLOSED.
    pub status: &'static str,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last update time.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<accounts::Model> for AccountResponse {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            status: AccountStatus::from(model.status).as_str(),
            name: model.name,
            currency: model.currency,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// GET `/fin/accounts` - List accounts ordered by name.
async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListAccountsQuery>,
) -> impl IntoResponse {
    let repo = AccountRepository::new((*state.db).clone());
    let filter = AccountFilter {
        include_closed: query.include_closed,
        name: query.name,
    };

    match repo.list(auth.user_id(), &filter).await {
        Ok(accounts) => {
            let data: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST `/fin/accounts` - Create an account.
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let repo = AccountRepository::new((*state.db).clone());

    match repo
        .create(auth.user_id(), &payload.name, &payload.currency)
        .await
    {
        Ok(account) => {
            info!(
                user_id = %auth.user_id(),
                account_id = %account.id,
                currency = %account.currency,
                "Account created"
            );
            (StatusCode::CREATED, Json(json!(AccountResponse::from(account)))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// GET `/fin/accounts/{account_id}` - Get one account.
async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = AccountRepository::new((*state.db).clone());

    match repo
        .get(auth.user_id(), AccountId::from_uuid(account_id))
        .await
    {
        Ok(account) => (StatusCode::OK, Json(json!(AccountResponse::from(account)))).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// PATCH `/fin/accounts/{account_id}` - Rename and/or change currency.
async fn update_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<UpdateAccountRequest>,
) -> impl IntoResponse {
    let repo = AccountRepository::new((*state.db).clone());
    let input = UpdateAccountInput {
        name: payload.name,
        currency: payload.currency,
    };

    match repo
        .update(auth.user_id(), AccountId::from_uuid(account_id), input)
        .await
    {
        Ok(account) => {
            info!(account_id = %account.id, "Account updated");
            (StatusCode::OK, Json(json!(AccountResponse::from(account)))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST `/fin/accounts/{account_id}/close` - Close an account.
async fn close_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = AccountRepository::new((*state.db).clone());

    match repo
        .close(auth.user_id(), AccountId::from_uuid(account_id))
        .await
    {
        Ok(account) => {
            info!(account_id = %account.id, "Account closed");
            (StatusCode::OK, Json(json!(AccountResponse::from(account)))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// DELETE `/fin/accounts/{account_id}` - Delete an unused account.
async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = AccountRepository::new((*state.db).clone());

    match repo
        .delete(auth.user_id(), AccountId::from_uuid(account_id))
        .await
    {
        Ok(()) => {
            info!(account_id = %account_id, "Account deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
