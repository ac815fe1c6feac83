//! Router tests that never reach the database.
//!
//! The state holds a disconnected database handle, so these exercise routing,
//! authentication and request validation only.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use fintrack_api::{AppState, create_router};
use fintrack_shared::types::UserId;
use fintrack_shared::{JwtConfig, JwtService};
use http_body_util::BodyExt;
use rstest::rstest;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> (Router, String) {
    let jwt_service = JwtService::new(JwtConfig::default());
    let token = jwt_service
        .generate_access_token(UserId::new())
        .expect("Failed to generate token");
    let state = AppState {
        db: Arc::new(DatabaseConnection::Disconnected),
        jwt_service: Arc::new(jwt_service),
    };
    (create_router(state), token)
}

async fn send(
    router: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_is_public_and_reports_database() {
    let (router, _) = app();
    let (status, body) = send(router, Method::GET, "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], false);
}

#[rstest]
#[case("/api/v1/fin/accounts")]
#[case("/api/v1/fin/categories")]
#[case("/api/v1/fin/transactions")]
#[case("/api/v1/fin/fx-rates")]
#[case("/api/v1/fin/reports/balance-by-account")]
#[tokio::test]
async fn test_protected_routes_require_token(#[case] uri: &str) {
    let (router, _) = app();
    let (status, body) = send(router, Method::GET, uri, None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "MISSING_TOKEN");
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let (router, _) = app();
    let (status, body) = send(
        router,
        Method::GET,
        "/api/v1/fin/accounts",
        Some("not-a-jwt"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_transfer_delete_is_disabled() {
    let (router, token) = app();
    let uri = format!("/api/v1/fin/transfers/{}", uuid::Uuid::new_v4());
    let (status, body) = send(router, Method::DELETE, &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "TRANSFER_DELETION_DISABLED");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("/fin/transfers/{id}/void")
    );
}

#[tokio::test]
async fn test_transfer_with_both_intents_is_rejected() {
    let (router, token) = app();
    let payload = json!({
        "src_account_id": uuid::Uuid::new_v4(),
        "dst_account_id": uuid::Uuid::new_v4(),
        "src_amount": "10.00",
        "dst_amount": "50.00",
        "fx_rate": "5",
        "occurred_at": "2025-03-01T10:00:00Z"
    });
    let (status, body) = send(
        router,
        Method::POST,
        "/api/v1/fin/transfers",
        Some(&token),
        Some(payload),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "AMBIGUOUS_TRANSFER_INTENT");
}

#[tokio::test]
async fn test_transaction_without_offset_is_rejected() {
    let (router, token) = app();
    let payload = json!({
        "account_id": uuid::Uuid::new_v4(),
        "amount": "1.00",
        "occurred_at": "2025-03-01T10:00:00"
    });
    let (status, body) = send(
        router,
        Method::POST,
        "/api/v1/fin/transactions",
        Some(&token),
        Some(payload),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "MISSING_TIMEZONE");
}

#[rstest]
#[case("/api/v1/fin/categories?type=savings", "INVALID_CATEGORY_TYPE")]
#[case("/api/v1/fin/reports/monthly-by-category?year=2025", "INVALID_PERIOD")]
#[case("/api/v1/fin/reports/balance-by-account?year=2025&month=13", "INVALID_PERIOD")]
#[case("/api/v1/fin/reports/balance-by-account?report_currency=EURO", "INVALID_CURRENCY")]
#[case("/api/v1/fin/fx-rates?base=x", "INVALID_CURRENCY")]
#[tokio::test]
async fn test_query_validation(#[case] uri: &str, #[case] code: &str) {
    let (router, token) = app();
    let (status, body) = send(router, Method::GET, uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], code);
}

#[tokio::test]
async fn test_fx_rate_same_currency_is_rejected() {
    let (router, token) = app();
    let payload = json!({
        "date": "2025-03-01",
        "base": "USD",
        "quote": "usd",
        "rate": "1"
    });
    let (status, body) = send(
        router,
        Method::POST,
        "/api/v1/fin/fx-rates",
        Some(&token),
        Some(payload),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "SAME_CURRENCY");
}
