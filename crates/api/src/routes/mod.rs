//! API route definitions.

use axum::{Router, middleware};
use chrono::{DateTime, Utc};
use fintrack_core::ledger::{LedgerError, LedgerService};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod accounts;
pub mod categories;
pub mod fx_rates;
pub mod health;
pub mod reports;
pub mod transactions;
pub mod transfers;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(accounts::routes())
        .merge(categories::routes())
        .merge(transactions::routes())
        .merge(transfers::routes())
        .merge(reports::routes())
        .merge(fx_rates::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::routes())
        .nest("/fin", protected_routes)
}

/// Parses an optional timestamp field that must carry an offset.
pub(crate) fn parse_optional_timestamp(
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, LedgerError> {
    raw.map(LedgerService::parse_occurred_at).transpose()
}
