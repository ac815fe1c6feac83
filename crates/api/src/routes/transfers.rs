//! Transfer routes.
//!
//! Transfers are created and voided, never deleted. Every transfer response
//! carries the fee disclosure block computed from the stored rates.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use fintrack_core::currency::{MoneyCodec, parse_currency};
use fintrack_core::ledger::{LedgerError, LedgerService};
use fintrack_core::transfer::{FeeDisclosure, TransferIntent};
use fintrack_db::entities::transfers;
use fintrack_db::repositories::{CreateTransferInput, TransferRepository};
use fintrack_shared::types::{AccountId, TransferId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the transfer routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transfers", post(create_transfer))
        .route(
            "/transfers/{transfer_id}",
            get(get_transfer).delete(delete_transfer),
        )
        .route("/transfers/{transfer_id}/void", post(void_transfer))
}

/// Request body for creating a transfer.
///
/// Give `dst_amount` or `fx_rate`, or neither to use the stored reference
/// rate for the day. Giving both is rejected.
#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    /// Account the money leaves.
    pub src_account_id: Uuid,
    /// Account the money arrives in.
    pub dst_account_id: Uuid,
    /// Amount leaving, in the source currency.
    pub src_amount: Decimal,
    /// Amount arriving, in the destination currency.
    pub dst_amount: Option<Decimal>,
    /// Rate applied to `src_amount`.
    pub fx_rate: Option<Decimal>,
    /// ISO-8601 timestamp with offset.
    pub occurred_at: String,
}

/// Reference rate captured when the transfer was written.
#[derive(Debug, Serialize)]
pub struct ReferenceRateResponse {
    /// Rate value.
    pub value: Decimal,
    /// Rate date.
    pub date: NaiveDate,
    /// Rate source tag.
    pub source: Option<String>,
}

/// Response for a transfer.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    /// Transfer ID.
    pub id: Uuid,
    /// Source account.
    pub src_account_id: Uuid,
    /// Destination account.
    pub dst_account_id: Uuid,
    /// Amount that left the source account.
    pub src_amount: Decimal,
    /// Source currency.
    pub src_currency: String,
    /// Amount that arrived.
    pub dst_amount: Decimal,
    /// Destination currency.
    pub dst_currency: String,
    /// Effective rate, full precision.
    pub fx_rate: Decimal,
    /// Occurrence time in UTC.
    pub occurred_at: DateTime<Utc>,
    /// Whether the transfer is voided.
    pub voided: bool,
    /// Reference rate snapshot.
    pub reference_rate: Option<ReferenceRateResponse>,
    /// Two-decimal rates and implied fee.
    #[serde(flatten)]
    pub disclosure: FeeDisclosure,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
}

impl TryFrom<transfers::Model> for TransferResponse {
    type Error = LedgerError;

    fn try_from(model: transfers::Model) -> Result<Self, Self::Error> {
        let src_currency = parse_currency(&model.rate_base)?;
        let dst_currency = parse_currency(&model.rate_quote)?;
        let reference_rate = match (model.ref_rate_value, model.ref_rate_date) {
            (Some(value), Some(date)) => Some(ReferenceRateResponse {
                value,
                date,
                source: model.ref_rate_source,
            }),
            _ => None,
        };

        Ok(Self {
            id: model.id,
            src_account_id: model.src_account_id,
            dst_account_id: model.dst_account_id,
            src_amount: MoneyCodec::from_minor_units(model.src_amount_minor, &src_currency),
            src_currency: src_currency.as_str().to_string(),
            dst_amount: MoneyCodec::from_minor_units(model.dst_amount_minor, &dst_currency),
            dst_currency: dst_currency.as_str().to_string(),
            fx_rate: model.rate_value,
            occurred_at: model.occurred_at.to_utc(),
            voided: model.voided,
            disclosure: FeeDisclosure::compute(model.rate_value, model.ref_rate_value),
            reference_rate,
            created_at: model.created_at,
        })
    }
}

fn build_input(payload: &CreateTransferRequest) -> Result<CreateTransferInput, LedgerError> {
    Ok(CreateTransferInput {
        src_account_id: AccountId::from_uuid(payload.src_account_id),
        dst_account_id: AccountId::from_uuid(payload.dst_account_id),
        src_amount: payload.src_amount,
        occurred_at: LedgerService::parse_occurred_at(&payload.occurred_at)?,
        intent: TransferIntent::from_fields(payload.dst_amount, payload.fx_rate)?,
    })
}

/// POST `/fin/transfers` - Create a transfer and its two legs.
async fn create_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransferRequest>,
) -> impl IntoResponse {
    let input = match build_input(&payload) {
        Ok(input) => input,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let repo = TransferRepository::new((*state.db).clone());

    let created = match repo.create(auth.user_id(), input).await {
        Ok(created) => created,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let src_transaction_id = created.src_transaction.id;
    let dst_transaction_id = created.dst_transaction.id;

    match TransferResponse::try_from(created.transfer) {
        Ok(transfer) => {
            info!(
                user_id = %auth.user_id(),
                transfer_id = %transfer.id,
                src_amount = %transfer.src_amount,
                dst_amount = %transfer.dst_amount,
                "Transfer created"
            );
            (
                StatusCode::CREATED,
                Json(json!({
                    "transfer": transfer,
                    "src_transaction_id": src_transaction_id,
                    "dst_transaction_id": dst_transaction_id
                })),
            )
                .into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// GET `/fin/transfers/{transfer_id}` - Get one transfer.
async fn get_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transfer_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TransferRepository::new((*state.db).clone());

    let result = repo
        .get(auth.user_id(), TransferId::from_uuid(transfer_id))
        .await
        .map_err(ApiError::from)
        .and_then(|model| TransferResponse::try_from(model).map_err(ApiError::from));

    match result {
        Ok(transfer) => (StatusCode::OK, Json(json!(transfer))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST `/fin/transfers/{transfer_id}/void` - Void a transfer and both legs.
async fn void_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transfer_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TransferRepository::new((*state.db).clone());

    let result = repo
        .void(auth.user_id(), TransferId::from_uuid(transfer_id))
        .await
        .map_err(ApiError::from)
        .and_then(|model| TransferResponse::try_from(model).map_err(ApiError::from));

    match result {
        Ok(transfer) => {
            info!(transfer_id = %transfer_id, "Transfer voided");
            (StatusCode::OK, Json(json!(transfer))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// DELETE `/fin/transfers/{transfer_id}` - Always refused.
async fn delete_transfer(_auth: AuthUser, Path(transfer_id): Path<Uuid>) -> impl IntoResponse {
    info!(transfer_id = %transfer_id, "Transfer deletion refused");
    ApiError::from(LedgerError::TransferDeletionDisabled).into_response()
}
