//! FX rate routes.
//!
//! Rates are shared reference data: any authenticated user can read and
//! write them.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use fintrack_core::currency::{FxRateService, parse_currency};
use fintrack_core::ledger::LedgerError;
use fintrack_db::FxRateRepository;
use fintrack_db::entities::fx_rates;
use fintrack_db::repositories::{RateFilter, UpsertOutcome};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the FX rate routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fx-rates", get(list_rates).post(upsert_rate))
        .route("/fx-rates/lookup", get(lookup_rate))
}

/// Query parameters for listing rates.
#[derive(Debug, Deserialize)]
pub struct ListRatesQuery {
    /// Base currency filter.
    pub base: Option<String>,
    /// Quote currency filter.
    pub quote: Option<String>,
    /// Inclusive start date (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
}

/// Query parameters for a single lookup.
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    /// Rate date (YYYY-MM-DD).
    pub date: NaiveDate,
    /// Base currency.
    pub base: String,
    /// Quote currency.
    pub quote: String,
}

/// Request body for creating or replacing a rate.
#[derive(Debug, Deserialize)]
pub struct UpsertRateRequest {
    /// Rate date.
    pub date: NaiveDate,
    /// Base currency.
    pub base: String,
    /// Quote currency.
    pub quote: String,
    /// Units of quote per unit of base.
    pub rate: Decimal,
    /// Source tag (default: `manual`).
    pub source: Option<String>,
}

/// Response for a stored rate.
#[derive(Debug, Serialize)]
pub struct RateResponse {
    /// Rate ID.
    pub id: Uuid,
    /// Rate date.
    pub date: NaiveDate,
    /// Base currency.
    pub base: String,
    /// Quote currency.
    pub quote: String,
    /// Rate value.
    pub rate: Decimal,
    /// Source tag.
    pub source: String,
    /// Last update time.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<fx_rates::Model> for RateResponse {
    fn from(model: fx_rates::Model) -> Self {
        Self {
            id: model.id,
            date: model.date,
            base: model.base,
            quote: model.quote,
            rate: model.rate_value.normalize(),
            source: model.source,
            updated_at: model.updated_at,
        }
    }
}

fn build_filter(query: &ListRatesQuery) -> Result<RateFilter, LedgerError> {
    Ok(RateFilter {
        base: query.base.as_deref().map(parse_currency).transpose()?,
        quote: query.quote.as_deref().map(parse_currency).transpose()?,
        from: query.from,
        to: query.to,
    })
}

/// GET `/fin/fx-rates` - List rates ordered by date, base, quote.
async fn list_rates(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListRatesQuery>,
) -> impl IntoResponse {
    let filter = match build_filter(&query) {
        Ok(f) => f,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let repo = FxRateRepository::new((*state.db).clone());

    match repo.list(&filter).await {
        Ok(rates) => {
            let data: Vec<RateResponse> = rates.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST `/fin/fx-rates` - Create or replace the rate for `(date, base, quote)`.
///
/// Answers 201 for a new row, 200 when an existing row was replaced.
async fn upsert_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpsertRateRequest>,
) -> impl IntoResponse {
    let upsert = match FxRateService::validate_upsert(
        payload.date,
        &payload.base,
        &payload.quote,
        payload.rate,
        payload.source.as_deref(),
    ) {
        Ok(upsert) => upsert,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let repo = FxRateRepository::new((*state.db).clone());

    match repo.upsert(upsert).await {
        Ok((rate, outcome)) => {
            info!(
                user_id = %auth.user_id(),
                date = %rate.date,
                base = %rate.base,
                quote = %rate.quote,
                rate = %rate.rate_value,
                outcome = ?outcome,
                "FX rate stored"
            );
            let status = match outcome {
                UpsertOutcome::Created => StatusCode::CREATED,
                UpsertOutcome::Updated => StatusCode::OK,
            };
            (status, Json(json!(RateResponse::from(rate)))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// GET `/fin/fx-rates/lookup` - Exact-date rate lookup.
async fn lookup_rate(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<LookupQuery>,
) -> impl IntoResponse {
    let pair = parse_currency(&query.base)
        .and_then(|base| parse_currency(&query.quote).map(|quote| (base, quote)));
    let (base, quote) = match pair {
        Ok(pair) => pair,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let repo = FxRateRepository::new((*state.db).clone());

    match repo.get_rate(query.date, &base, &quote).await {
        Ok(lookup) => (
            StatusCode::OK,
            Json(json!({
                "date": lookup.rate.date,
                "base": lookup.rate.base,
                "quote": lookup.rate.quote,
                "rate": lookup.rate.rate.normalize(),
                "source": lookup.rate.source,
                "identity": lookup.identity
            })),
        )
            .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
