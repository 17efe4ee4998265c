use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use edunext_auth::{
    app::build_app,
    clock::{Clock, ManualClock, SystemClock},
    config::{AppConfig, JwtConfig, PasswordConfig},
    state::AppState,
};
use serde_json::{json, Value};
use time::{macros::datetime, Duration};
use tower::ServiceExt;

fn test_config() -> AppConfig {
    AppConfig {
        environment: "test".into(),
        host: "127.0.0.1".into(),
        port: 0,
        max_body_bytes: 1_000_000,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "edunext".into(),
            audience: "edunext-users".into(),
            ttl_minutes: 60 * 24,
        },
        password: PasswordConfig {
            iterations: 1,
            memory_kib: 64,
            parallelism: 1,
        },
    }
}

fn app_with_clock(clock: Arc<dyn Clock>) -> Router {
    let state = AppState::from_parts(test_config(), clock).expect("state");
    build_app(state)
}

fn app() -> Router {
    app_with_clock(Arc::new(SystemClock))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.expect("response");
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn signup_body(email: &str) -> Value {
    json!({
        "full_name": "A",
        "email": email,
        "role": "student",
        "institution_name": "I",
        "password": "secret1",
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = send(&app(), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["message"], "Server is running");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn smoke_test_endpoint() {
    let (status, body) = send(&app(), get("/api/test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "API is working!");
}

#[tokio::test]
async fn signup_login_and_list() {
    let app = app();

    let (status, body) = send(&app, post_json("/api/signup", signup_body("a@x.com"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Registration successful! Please login.");
    assert_eq!(body["user"]["id"], 1);
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["institution_name"], "I");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());

    let (status, body) = send(
        &app,
        post_json("/api/login", json!({ "email": "a@x.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Login successful");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], "a@x.com");
    assert!(body["user"].get("password_hash").is_none());

    let (status, body) = send(&app, get("/api/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let users = body["users"].as_array().expect("users array");
    assert_eq!(users.len(), 1);
    assert_eq!(
        users[0],
        json!({
            "id": 1,
            "full_name": "A",
            "email": "a@x.com",
            "role": "student",
            "institution_name": "I",
        })
    );
}

#[tokio::test]
async fn signup_missing_field_is_bad_request() {
    let mut body = signup_body("a@x.com");
    body.as_object_mut().unwrap().remove("role");
    let (status, body) = send(&app(), post_json("/api/signup", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "All fields are required");
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let app = app();
    send(&app, post_json("/api/signup", signup_body("a@x.com"))).await;
    let (status, body) = send(&app, post_json("/api/signup", signup_body("a@x.com"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn login_failures() {
    let app = app();
    send(&app, post_json("/api/signup", signup_body("a@x.com"))).await;

    let (status, body) = send(&app, post_json("/api/login", json!({ "email": "a@x.com" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email and password are required");

    let (status, body) = send(
        &app,
        post_json("/api/login", json!({ "email": "nobody@x.com", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User not found");

    let (status, body) = send(
        &app,
        post_json("/api/login", json!({ "email": "a@x.com", "password": "wrongpass" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Incorrect password");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut body = signup_body("a@x.com");
    body["full_name"] = Value::String("x".repeat(1_100_000));
    let (status, body) = send(&app(), post_json("/api/signup", body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "Request body too large");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, body) = send(&app(), get("/api/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn wrong_method_is_not_allowed() {
    let (status, body) = send(&app(), get("/api/signup")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn preflight_succeeds_with_credentials() {
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/signup")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let res = app().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn bare_options_returns_ok() {
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/login")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

async fn signup_and_login(app: &Router, email: &str) -> String {
    send(app, post_json("/api/signup", signup_body(email))).await;
    let (_, body) = send(
        app,
        post_json("/api/login", json!({ "email": email, "password": "secret1" })),
    )
    .await;
    body["token"].as_str().expect("token").to_string()
}

fn with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn me_returns_account_for_valid_token() {
    let app = app();
    let token = signup_and_login(&app, "a@x.com").await;
    let (status, body) = send(&app, with_bearer("/api/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], 1);
    assert_eq!(body["user"]["email"], "a@x.com");
}

#[tokio::test]
async fn me_requires_token() {
    let (status, body) = send(&app(), get("/api/me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app(), with_bearer("/api/me", "garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_rejects_expired_token() {
    let clock = Arc::new(ManualClock::new(datetime!(2024-09-01 09:00 UTC)));
    let app = app_with_clock(clock.clone());
    let token = signup_and_login(&app, "a@x.com").await;

    clock.advance(Duration::hours(24) + Duration::seconds(1));
    let (status, body) = send(&app, with_bearer("/api/me", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn token_from_another_registry_is_unauthorized() {
    let first = app();
    let token = signup_and_login(&first, "a@x.com").await;

    // same secret, empty registry
    let second = app();
    let (status, body) = send(&second, with_bearer("/api/me", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "User not found");
}
