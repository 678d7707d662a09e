/// End-to-end tests over HTTP against a real database
///
/// Run with: cargo test -p domus-api --test integration_test -- --ignored --test-threads=1

mod common;

use axum::http::StatusCode;
use chrono::{Datelike, Utc};
use common::{request, TestContext};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use uuid::Uuid;

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().unwrap()).unwrap()
}

/// Registers a user and returns `(user_id, access_token)`
async fn register(ctx: &TestContext, first_name: &str) -> (String, String) {
    let (status, body) = ctx
        .post(
            "/v1/auth/register",
            None,
            json!({
                "first_name": first_name,
                "last_name": "Esposito",
                "email": format!("{}.{}@example.com", first_name.to_lowercase(), Uuid::new_v4()),
                "birth_date": "1985-09-30",
                "password": "Password123"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(body["user"].get("password_hash").is_none());

    (
        body["user"]["id"].as_str().unwrap().to_string(),
        body["access_token"].as_str().unwrap().to_string(),
    )
}

async fn send(ctx: &TestContext, method: &str, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
    ctx.send(request(method, uri, Some(token), body)).await
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a running PostgreSQL"]
async fn test_health_reports_schema_version() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["migrations"]["latest_version"], 20250601000000i64);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a running PostgreSQL"]
async fn test_login_after_register() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("login.{}@example.com", Uuid::new_v4());

    let (status, _) = ctx
        .post(
            "/v1/auth/register",
            None,
            json!({
                "first_name": "Chiara",
                "last_name": "Ferrari",
                "email": email,
                "birth_date": "1992-02-29",
                "password": "Password123"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = ctx
        .post("/v1/auth/login", None, json!({ "email": email, "password": "Password123" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["refresh_token"].is_string());

    let (status, body) = ctx
        .post("/v1/auth/login", None, json!({ "email": email, "password": "Wrong4567" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, _) = ctx
        .post(
            "/v1/auth/register",
            None,
            json!({
                "first_name": "Chiara",
                "last_name": "Ferrari",
                "email": email.to_uppercase(),
                "birth_date": "1992-02-29",
                "password": "Password123"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a running PostgreSQL"]
async fn test_family_flow() {
    let ctx = TestContext::new().await.unwrap();
    let (_, head) = register(&ctx, "Roberto").await;
    let (member_id, member) = register(&ctx, "Lucia").await;

    let (status, family) = send(&ctx, "POST", "/v1/families", &head, Some(json!({ "surname": "Esposito" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let family_id = family["id"].as_str().unwrap().to_string();
    let code = family["invite_code"].as_str().unwrap().to_string();

    let (status, _) = send(&ctx, "POST", "/v1/families/join", &member, Some(json!({ "invite_code": "ZZZZZZZZ" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&ctx, "POST", "/v1/families/join", &member, Some(json!({ "invite_code": code.to_lowercase() }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, profile) = send(&ctx, "GET", "/v1/me", &member, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["role"], "member");
    assert!(profile["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p != "create_income"));

    let (status, _) = send(&ctx, "POST", &format!("/v1/families/{}/invite-code", family_id), &member, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &ctx,
        "PATCH",
        &format!("/v1/families/{}/members/{}", family_id, member_id),
        &head,
        Some(json!({ "role": "head" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);

    let (status, body) = send(
        &ctx,
        "PATCH",
        &format!("/v1/families/{}/members/{}", family_id, member_id),
        &head,
        Some(json!({ "role": "worker" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "worker");

    let (status, _) = send(&ctx, "DELETE", &format!("/v1/families/{}", family_id), &head, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &ctx,
        "DELETE",
        &format!("/v1/families/{}/members/{}", family_id, member_id),
        &member,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "member_removed");

    let (status, _) = send(&ctx, "DELETE", &format!("/v1/families/{}", family_id), &head, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL and a running PostgreSQL"]
async fn test_movements_reports_and_housing() {
    let ctx = TestContext::new().await.unwrap();
    let (_, head) = register(&ctx, "Franco").await;
    let (_, member) = register(&ctx, "Irene").await;

    let (_, family) = send(&ctx, "POST", "/v1/families", &head, Some(json!({ "surname": "Romano" }))).await;
    let family_id = family["id"].as_str().unwrap().to_string();
    let code = family["invite_code"].as_str().unwrap().to_string();
    send(&ctx, "POST", "/v1/families/join", &member, Some(json!({ "invite_code": code }))).await;

    let today = Utc::now().date_naive();
    let expense = |amount: &str, category: &str| {
        json!({
            "description": format!("{} test", category),
            "amount": amount,
            "date": today.to_string(),
            "category": category,
            "responsibility": "family"
        })
    };

    let expenses_uri = format!("/v1/families/{}/expenses", family_id);
    let (status, _) = send(&ctx, "POST", &expenses_uri, &member, Some(expense("30.00", "groceries"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&ctx, "POST", &expenses_uri, &head, Some(expense("10.00", "pets"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&ctx, "POST", &expenses_uri, &head, Some(expense("5.00", "salary"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, body) = send(&ctx, "POST", &expenses_uri, &head, Some(expense("100000000000", "pets"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "amount");

    let income = json!({
        "description": "Stipendio",
        "amount": "1500.00",
        "date": today.to_string(),
        "category": "salary"
    });
    let incomes_uri = format!("/v1/families/{}/incomes", family_id);
    let (status, _) = send(&ctx, "POST", &incomes_uri, &member, Some(income.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&ctx, "POST", &incomes_uri, &head, Some(income)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, rows) = send(
        &ctx,
        "GET",
        &format!("/v1/families/{}/movements?kinds=expense&amount_min=20", family_id),
        &member,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["author_first_name"], "Irene");
    assert!(rows[0]["category_color"].as_str().unwrap().starts_with('#'));

    let (status, report) = send(
        &ctx,
        "GET",
        &format!(
            "/v1/families/{}/reports/categories?kind=expense&month={}&year={}",
            family_id,
            today.month(),
            today.year()
        ),
        &member,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["categories"][0]["category"], "groceries");
    assert_eq!(decimal(&report["categories"][0]["percentage"]), Decimal::new(75, 0));

    let (_, balance) = send(&ctx, "GET", &format!("/v1/families/{}/reports/balance", family_id), &head, None).await;
    assert_eq!(balance["months"].as_array().unwrap().len(), 12);

    let (_, total) = send(&ctx, "GET", &format!("/v1/families/{}/reports/total", family_id), &head, None).await;
    assert_eq!(decimal(&total["balance"]), Decimal::new(1460, 0));

    let (status, dwelling) = send(
        &ctx,
        "POST",
        &format!("/v1/families/{}/dwellings", family_id),
        &head,
        Some(json!({
            "name": "Appartamento",
            "address": "Corso Vittorio Emanuele 45",
            "city": "Napoli",
            "postal_code": "80121",
            "province": "na"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dwelling["province"], "NA");
    let dwelling_id = dwelling["id"].as_str().unwrap().to_string();

    let (status, contract) = send(
        &ctx,
        "POST",
        &format!("/v1/dwellings/{}/contracts", dwelling_id),
        &head,
        Some(json!({
            "utility_kind": "electricity",
            "supplier": "Enel Energia",
            "tariff_plan": "Monoraria",
            "start_date": today.to_string(),
            "duration_days": 20,
            "periodic_cost": "50.00",
            "periodicity": "bimonthly"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&contract["annual_cost"]), Decimal::new(300, 0));
    let contract_id = contract["id"].as_str().unwrap().to_string();

    let (_, expiring) = send(
        &ctx,
        "GET",
        &format!("/v1/families/{}/contracts/expiring", family_id),
        &member,
        None,
    )
    .await;
    assert_eq!(expiring.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &ctx,
        "PUT",
        &format!("/v1/contracts/{}/document", contract_id),
        &member,
        Some(json!({ "document_url": "https://files.example.com/enel.pdf" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&ctx, "DELETE", &format!("/v1/dwellings/{}", dwelling_id), &head, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&ctx, "GET", &format!("/v1/contracts/{}", contract_id), &head, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
