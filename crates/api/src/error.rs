//! Error responses.
//!
//! Every failure leaves the API as `{"error": CODE, "message": text}`. The
//! status comes from the failure class; the code keeps the domain's own
//! name (`ACCOUNT_CLOSED`, `TRANSFER_LINKED`, ...) so clients can branch on it.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fintrack_core::ledger::LedgerError;
use fintrack_db::RepositoryError;
use fintrack_shared::AppError;
use serde_json::json;
use tracing::{error, warn};

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Returns the HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// A 401 with a specific code, used by the auth layer.
    #[must_use]
    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code,
            message: message.into(),
        }
    }

    fn status_from(code: u16) -> StatusCode {
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self {
            status: Self::status_from(err.status_code()),
            code: err.error_code(),
            message: err.to_string(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self {
            status: Self::status_from(err.http_status_code()),
            code: err.error_code(),
            message: err.to_string(),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Ledger(e) => e.into(),
            RepositoryError::Database(e) => AppError::Database(e.to_string()).into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() {
            error!(code = self.code, error = %self.message, "Request failed");
            "An error occurred".to_string()
        } else {
            warn!(code = self.code, message = %self.message, "Request rejected");
            self.message
        };

        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": message
            })),
        )
            .into_response()
    }
}
