/// Router tests that never reach the database
///
/// Authentication, request validation and period checks are answered before
/// any query runs, so these use a pool that is never connected.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{request, TestContext};
use domus_shared::auth::jwt::TokenType;
use serde_json::json;
use tower::Service as _;
use uuid::Uuid;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let ctx = TestContext::lazy();

    let (status, body) = ctx.get("/v1/me", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_non_bearer_scheme_is_bad_request() {
    let ctx = TestContext::lazy();

    let req = Request::builder()
        .uri("/v1/families")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let (status, body) = ctx.send(req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Expected Bearer token");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let ctx = TestContext::lazy();

    let (status, _) = ctx.get("/v1/families", Some("not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_unauthorized() {
    let ctx = TestContext::lazy();
    let claims = domus_shared::auth::jwt::Claims::new(Uuid::new_v4(), TokenType::Access);
    let token = domus_shared::auth::jwt::create_token(&claims, "a-completely-different-secret-of-32b").unwrap();

    let (status, _) = ctx.get("/v1/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_cannot_access_api() {
    let ctx = TestContext::lazy();
    let refresh = ctx.token_for(Uuid::new_v4(), TokenType::Refresh);

    let (status, body) = ctx.get("/v1/me", Some(&refresh)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access token required");
}

#[tokio::test]
async fn test_refresh_endpoint() {
    let ctx = TestContext::lazy();
    let user_id = Uuid::new_v4();

    let (status, body) = ctx
        .post(
            "/v1/auth/refresh",
            None,
            json!({ "refresh_token": ctx.token_for(user_id, TokenType::Refresh) }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access_token"].as_str().unwrap().to_string();

    // The new access token passes authentication and reaches validation
    let (status, _) = ctx.get("/v1/movements/mine?month=13&year=2024", Some(&access)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx
        .post(
            "/v1/auth/refresh",
            None,
            json!({ "refresh_token": ctx.token_for(user_id, TokenType::Access) }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = TestContext::lazy();

    let (status, body) = ctx
        .post(
            "/v1/auth/register",
            None,
            json!({
                "first_name": "",
                "last_name": "Rossi",
                "email": "not-an-email",
                "birth_date": "1990-01-01",
                "password": "short"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"first_name"));
    assert!(fields.contains(&"password"));
}

#[tokio::test]
async fn test_register_rejects_single_letter_last_name() {
    let ctx = TestContext::lazy();

    let (status, body) = ctx
        .post(
            "/v1/auth/register",
            None,
            json!({
                "first_name": "Anna",
                "last_name": "R",
                "email": "anna.r@example.com",
                "birth_date": "1990-01-01",
                "password": "Password123"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "last_name");
}

#[tokio::test]
async fn test_invalid_month_rejected() {
    let ctx = TestContext::lazy();
    let token = ctx.any_access_token();

    let (status, body) = ctx.get("/v1/movements/mine?month=13&year=2024", Some(&token)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "month");
}

#[tokio::test]
async fn test_short_surname_rejected() {
    let ctx = TestContext::lazy();
    let token = ctx.any_access_token();

    let (status, body) = ctx.post("/v1/families", Some(&token), json!({ "surname": "R" })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "surname");
}

#[tokio::test]
async fn test_unknown_category_filter_rejected() {
    let ctx = TestContext::lazy();
    let token = ctx.any_access_token();
    let uri = format!("/v1/families/{}/movements?categories=groceries,yachts", Uuid::new_v4());

    let (status, body) = ctx.get(&uri, Some(&token)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "categories");
}

#[tokio::test]
async fn test_expense_with_zero_amount_rejected() {
    let ctx = TestContext::lazy();
    let token = ctx.any_access_token();
    let uri = format!("/v1/families/{}/expenses", Uuid::new_v4());

    let (status, body) = ctx
        .post(
            &uri,
            Some(&token),
            json!({
                "description": "Spesa",
                "amount": "0",
                "date": "2024-03-01",
                "category": "groceries",
                "responsibility": "family"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "amount");
}

#[tokio::test]
async fn test_dwelling_postal_code_rejected() {
    let ctx = TestContext::lazy();
    let token = ctx.any_access_token();
    let uri = format!("/v1/families/{}/dwellings", Uuid::new_v4());

    let (status, body) = ctx
        .post(
            &uri,
            Some(&token),
            json!({
                "name": "Casa",
                "address": "Via Roma 1",
                "city": "Milano",
                "postal_code": "201",
                "province": "MI"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "postal_code");
}

#[tokio::test]
async fn test_security_headers_on_error_responses() {
    let ctx = TestContext::lazy();

    let response = ctx
        .app
        .clone()
        .call(request("GET", "/v1/me", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    assert!(response.headers().get("strict-transport-security").is_none());
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let ctx = TestContext::lazy();

    let (status, body) = ctx.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["migrations"].is_null());
}
