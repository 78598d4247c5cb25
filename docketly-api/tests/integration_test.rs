/// Integration tests for the Docketly API
///
/// The first group runs against a router whose database is unreachable:
/// authentication, role checks and request validation all answer before a
/// query is made.
///
/// The `#[ignore]` test walks a full week (docket, invoice, submit, pay)
/// against a real database:
/// cargo test -p docketly-api --test integration_test -- --ignored

mod common;

use axum::http::{header, StatusCode};
use common::{lazy_app, refresh_token_for, request, send, send_json, token_for, TestContext};
use docketly_shared::models::user::Role;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = lazy_app();

    for uri in ["/v1/builders", "/v1/dockets", "/v1/auth/me", "/v1/worker/profile"] {
        let (status, body) = send_json(&app, request("GET", uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_invalid_tokens_are_unauthorized() {
    let app = lazy_app();

    let (status, _) = send_json(&app, request("GET", "/v1/builders", Some("not.a.jwt"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let refresh = refresh_token_for(Role::Admin);
    let (status, _) = send_json(&app, request("GET", "/v1/builders", Some(&refresh), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_checks() {
    let app = lazy_app();
    let worker = token_for(Role::Worker);
    let supervisor = token_for(Role::Supervisor);
    let admin = token_for(Role::Admin);
    let id = Uuid::new_v4();

    let forbidden = [
        (&worker, "GET", "/v1/builders".to_string(), None),
        (&worker, "GET", "/v1/contractors".to_string(), None),
        (&worker, "GET", "/v1/weekly".to_string(), None),
        (&supervisor, "GET", "/v1/users".to_string(), None),
        (&supervisor, "GET", "/v1/dashboard".to_string(), None),
        (&supervisor, "GET", "/v1/invoices".to_string(), None),
        (&supervisor, "GET", "/v1/contractors/export.csv".to_string(), None),
        (&supervisor, "GET", "/v1/dockets/export.csv".to_string(), None),
        (&supervisor, "GET", format!("/v1/history/contractors/{}", id), None),
        (&supervisor, "POST", format!("/v1/invoices/{}/paid", id), None),
        (&supervisor, "DELETE", format!("/v1/builders/{}", id), None),
        (
            &supervisor,
            "POST",
            "/v1/builders".to_string(),
            Some(json!({ "name": "Acme Homes", "company_code": "ACME" })),
        ),
        (&admin, "GET", "/v1/worker/profile".to_string(), None),
        (&admin, "GET", "/v1/worker/dashboard".to_string(), None),
        (&supervisor, "GET", "/v1/worker/invoices".to_string(), None),
    ];

    for (token, method, uri, body) in forbidden {
        let (status, json) = send_json(&app, request(method, &uri, Some(token), body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, uri);
        assert_eq!(json["error"], "forbidden");
    }
}

#[tokio::test]
async fn test_body_validation_returns_field_details() {
    let app = lazy_app();
    let admin = token_for(Role::Admin);

    let (status, body) = send_json(
        &app,
        request(
            "POST",
            "/v1/builders",
            Some(&admin),
            Some(json!({ "name": "", "company_code": "ACME", "contact_email": "nope" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["contact_email", "name"]);
}

#[tokio::test]
async fn test_docket_without_entries_is_rejected() {
    let app = lazy_app();
    let supervisor = token_for(Role::Supervisor);

    let (status, body) = send_json(
        &app,
        request(
            "POST",
            "/v1/dockets",
            Some(&supervisor),
            Some(json!({
                "builder_id": Uuid::new_v4(),
                "location_id": Uuid::new_v4(),
                "work_date": "2026-10-12",
                "entries": []
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "entries");
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let app = lazy_app();

    let (status, body) = send_json(
        &app,
        request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({
                "business_name": "Formwork Co",
                "name": "Sam Site",
                "email": "sam@example.com",
                "password": "password"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_bad_query_parameters() {
    let app = lazy_app();
    let admin = token_for(Role::Admin);

    let cases = [
        "/v1/weekly?week=next-week",
        "/v1/dashboard?from=2026-03-01&to=2026-02-01",
        "/v1/invoices?status=LOST",
        "/v1/invoices?week=soon",
    ];

    for uri in cases {
        let (status, _) = send_json(&app, request("GET", uri, Some(&admin), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn test_unparseable_requests_return_json_errors() {
    let app = lazy_app();
    let admin = token_for(Role::Admin);

    for uri in ["/v1/builders?page=abc", "/v1/builders/not-a-uuid"] {
        let (status, body) = send_json(&app, request("GET", uri, Some(&admin), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], "bad_request", "{}", uri);
        assert!(body["message"].is_string(), "{}", uri);
    }

    let malformed = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/builders")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = send_json(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = send_json(
        &app,
        request("POST", "/v1/builders", Some(&admin), Some(json!({ "name": 42 }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "body");
}

#[tokio::test]
async fn test_security_headers_on_error_responses() {
    let app = lazy_app();

    let response = send(&app, request("GET", "/v1/builders", None, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let app = lazy_app();

    let (status, body) = send_json(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = lazy_app();

    let response = send(&app, request("GET", "/v1/timesheets", None, None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

fn bearer(body: &Value) -> String {
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_week_from_docket_to_paid_invoice() {
    let ctx = TestContext::new().await.unwrap();
    let app = &ctx.app;
    let suffix = Uuid::new_v4().simple().to_string();

    // Register the business
    let (status, session) = send_json(
        app,
        request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({
                "business_name": "Formwork Co",
                "name": "Sam Site",
                "email": format!("admin-{}@example.com", suffix),
                "password": "Formwork7"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", session);
    let admin = bearer(&session);
    let tenant_id: Uuid = session["tenant"]["id"].as_str().unwrap().parse().unwrap();

    // Worker login with a generated password
    let worker_email = format!("baz-{}@example.com", suffix);
    let (status, worker_user) = send_json(
        app,
        request(
            "POST",
            "/v1/users",
            Some(&admin),
            Some(json!({ "email": worker_email, "name": "Baz", "role": "WORKER" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", worker_user);
    let temporary_password = worker_user["temporary_password"].as_str().unwrap().to_string();

    // Builder and site
    let (status, builder) = send_json(
        app,
        request(
            "POST",
            "/v1/builders",
            Some(&admin),
            Some(json!({ "name": "Acme Homes", "company_code": "acme" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", builder);
    assert_eq!(builder["company_code"], "ACME");
    let builder_id = builder["id"].as_str().unwrap().to_string();

    let (status, location) = send_json(
        app,
        request(
            "POST",
            &format!("/v1/builders/{}/locations", builder_id),
            Some(&admin),
            Some(json!({ "name": "Lot 12" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", location);

    // Contractor linked to the worker login
    let (status, contractor) = send_json(
        app,
        request(
            "POST",
            "/v1/contractors",
            Some(&admin),
            Some(json!({
                "user_id": worker_user["id"],
                "full_name": "Barry Zhang",
                "nickname": "Baz",
                "gst_registered": true,
                "tonnage_rate_cents": 5000,
                "day_labour_rate_cents": 4000,
                "bank_account_name": "B Zhang",
                "bank_bsb": "062000",
                "bank_account_number": "12345678"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", contractor);
    let contractor_id = contractor["id"].as_str().unwrap().to_string();

    // Monday of 2026-W42
    let docket_body = |tonnage: f64| {
        json!({
            "builder_id": builder_id,
            "location_id": location["id"],
            "work_date": "2026-10-12",
            "entries": [
                { "contractor_id": contractor_id, "tonnage_hours": tonnage, "day_labour_hours": 2.0 }
            ]
        })
    };

    let (status, docket) = send_json(
        app,
        request("POST", "/v1/dockets", Some(&admin), Some(docket_body(8.0))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", docket);
    let docket_uri = format!("/v1/dockets/{}", docket["id"].as_str().unwrap());

    // Worker prepares and submits
    let (status, login) = send_json(
        app,
        request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "email": worker_email, "password": temporary_password })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", login);
    let worker = bearer(&login);

    let (status, draft) = send_json(
        app,
        request(
            "POST",
            "/v1/worker/invoices",
            Some(&worker),
            Some(json!({ "week": "2026-W42" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", draft);
    assert_eq!(draft["status"], "DRAFT");
    assert_eq!(draft["invoice_number"], "BAZ-2026W42");
    assert_eq!(draft["subtotal_cents"], 48000);
    assert_eq!(draft["gst_cents"], 4800);
    assert_eq!(draft["total_cents"], 52800);
    let invoice_id = draft["id"].as_str().unwrap().to_string();

    let (status, submitted) = send_json(
        app,
        request(
            "POST",
            &format!("/v1/worker/invoices/{}/submit", invoice_id),
            Some(&worker),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", submitted);
    assert_eq!(submitted["status"], "SUBMITTED");

    // The week is now locked
    let (status, _) = send_json(
        app,
        request("PUT", &docket_uri, Some(&admin), Some(docket_body(9.0))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Admin pays once
    let paid_uri = format!("/v1/invoices/{}/paid", invoice_id);
    let (status, paid) = send_json(app, request("POST", &paid_uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK, "{}", paid);
    assert_eq!(paid["status"], "PAID");

    let (status, _) = send_json(app, request("POST", &paid_uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The worker can download their own invoice
    let response = send(
        app,
        request("GET", &format!("/v1/invoices/{}/pdf", invoice_id), Some(&worker), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "application/pdf");

    ctx.cleanup(tenant_id).await.unwrap();
}
