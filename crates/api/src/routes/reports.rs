//! Report routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use fintrack_core::currency::parse_currency;
use fintrack_core::ledger::LedgerError;
use fintrack_core::reports::{ReportOptions, ReportPeriod};
use fintrack_db::ReportRepository;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the report routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/balance-by-account", get(balance_by_account))
        .route("/reports/monthly-by-category", get(monthly_by_category))
}

/// Query parameters shared by both reports.
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// Calendar year.
    pub year: Option<i32>,
    /// Month, 1-12.
    pub month: Option<u32>,
    /// Include closed accounts (default: false).
    #[serde(default)]
    pub include_closed: bool,
    /// Include inactive categories (default: false).
    #[serde(default)]
    pub include_inactive: bool,
    /// Convert every line into this currency.
    pub report_currency: Option<String>,
}

impl ReportQuery {
    fn options(&self) -> Result<ReportOptions, LedgerError> {
        Ok(ReportOptions {
            include_closed: self.include_closed,
            include_inactive: self.include_inactive,
            report_currency: self
                .report_currency
                .as_deref()
                .map(parse_currency)
                .transpose()?,
        })
    }

    /// Period from the query, or the current UTC month when both are absent.
    fn period_or_current(&self) -> Result<ReportPeriod, LedgerError> {
        match (self.year, self.month) {
            (None, None) => Ok(ReportPeriod::containing(Utc::now())),
            _ => self.period(),
        }
    }

    fn period(&self) -> Result<ReportPeriod, LedgerError> {
        match (self.year, self.month) {
            (Some(year), Some(month)) => ReportPeriod::new(year, month),
            _ => Err(LedgerError::InvalidPeriod(
                "year and month are required".to_string(),
            )),
        }
    }
}

/// GET `/fin/reports/balance-by-account` - Net balance per account for a month.
async fn balance_by_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ReportQuery>,
) -> impl IntoResponse {
    let parsed = query
        .period_or_current()
        .and_then(|period| query.options().map(|options| (period, options)));
    let (period, options) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let repo = ReportRepository::new((*state.db).clone());

    match repo
        .balance_by_account(auth.user_id(), period, &options)
        .await
    {
        Ok(rows) => {
            info!(
                user_id = %auth.user_id(),
                year = period.year(),
                month = period.month(),
                rows = rows.len(),
                "Balance report generated"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "period": period,
                    "report_currency": options.report_currency,
                    "data": rows
                })),
            )
                .into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// GET `/fin/reports/monthly-by-category` - Net total per category for a month.
async fn monthly_by_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ReportQuery>,
) -> impl IntoResponse {
    let parsed = query
        .period()
        .and_then(|period| query.options().map(|options| (period, options)));
    let (period, options) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let repo = ReportRepository::new((*state.db).clone());

    match repo
        .monthly_by_category(auth.user_id(), period, &options)
        .await
    {
        Ok(rows) => {
            info!(
                user_id = %auth.user_id(),
                year = period.year(),
                month = period.month(),
                rows = rows.len(),
                "Category report generated"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "period": period,
                    "report_currency": options.report_currency,
                    "data": rows
                })),
            )
                .into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
