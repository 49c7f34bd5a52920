//! Integration tests for the HTTP surface
//!
//! Drives the full router: registration, login, profile, the OAuth linking
//! endpoints, and the public donation flow against mocked Blackbaud APIs.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use giveflow::config::{BlackbaudConfig, Config, StorageConfig};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn test_app(mock_server: &MockServer) -> Router {
    let config = Config {
        bind_addr: "127.0.0.1:0".to_string(),
        public_base_url: "http://localhost:8000".to_string(),
        storage: StorageConfig {
            dsn: ":memory:".to_string(),
        },
        blackbaud: BlackbaudConfig {
            oauth_base_url: mock_server.uri(),
            api_base_url: mock_server.uri(),
            sandbox_api_base_url: format!("{}/sandbox", mock_server.uri()),
            callback_url: "http://localhost:8000/auth/blackbaud/callback".to_string(),
            oauth_scope: "openid offline_access".to_string(),
            payment_subscription_key: "pay-key".to_string(),
            standard_subscription_key: "std-key".to_string(),
        },
        jwt_secret: "test-secret-at-least-32-characters-long".to_string(),
        encryption_passphrase: "test-encryption-passphrase".to_string(),
    };

    giveflow::build_app(&config).await.expect("Failed to build app")
}

async fn send_json(
    app: &Router,
    method_str: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method_str).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json_body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// Register an organization and return (org_id, bearer_token)
async fn register_org(app: &Router, email: &str) -> (String, String) {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/organizations/register",
        None,
        Some(json!({
            "name": "Helping Hands",
            "admin_email": email,
            "admin_password": "giving-is-good"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "register failed: {}", body);
    (
        body["organization"]["id"].as_str().unwrap().to_string(),
        body["access_token"].as_str().unwrap().to_string(),
    )
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_register_login_and_profile() {
    let server = MockServer::start().await;
    let app = test_app(&server).await;

    let (org_id, token) = register_org(&app, "admin@helpinghands.org").await;

    // Duplicate email rejected
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/organizations/register",
        None,
        Some(json!({
            "name": "Another",
            "admin_email": "admin@helpinghands.org",
            "admin_password": "giving-is-good"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    // Wrong password
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/organizations/login",
        None,
        Some(json!({"email": "admin@helpinghands.org", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Correct login
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/organizations/login",
        None,
        Some(json!({"email": "admin@helpinghands.org", "password": "giving-is-good"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["organization"]["id"], json!(org_id));

    // Profile requires auth
    let (status, _) = send_json(&app, "GET", "/api/organizations/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_json(&app, "GET", "/api/organizations/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("Helping Hands"));
    assert_eq!(body["has_payments_configured"], json!(false));
    assert_eq!(body["test_mode"], json!(true));
    // Secret-bearing fields never appear in the profile
    assert!(body.get("access_token").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_weak_password_rejected() {
    let server = MockServer::start().await;
    let app = test_app(&server).await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/organizations/register",
        None,
        Some(json!({
            "name": "Org",
            "admin_email": "weak@example.org",
            "admin_password": "short"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least 8"));
}

#[tokio::test]
async fn test_form_settings_and_test_mode_updates() {
    let server = MockServer::start().await;
    let app = test_app(&server).await;
    let (_, token) = register_org(&app, "settings@example.org").await;

    let (status, _) = send_json(
        &app,
        "PUT",
        "/api/organizations/form-settings",
        Some(&token),
        Some(json!({
            "preset_amounts": [10, 25],
            "custom_amount_enabled": false,
            "required_fields": ["email"],
            "organization_description": "Feed the city",
            "thank_you_message": "Thank you!"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &app,
        "PUT",
        "/api/organizations/test-mode",
        Some(&token),
        Some(json!({"test_mode": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send_json(&app, "GET", "/api/organizations/me", Some(&token), None).await;
    assert_eq!(body["test_mode"], json!(false));
    assert_eq!(body["form_settings"]["preset_amounts"], json!([10, 25]));
    assert_eq!(body["form_settings"]["organization_description"], json!("Feed the city"));
}

// ============================================================================
// OAuth linking over HTTP
// ============================================================================

#[tokio::test]
async fn test_full_link_flow_over_http() {
    let server = MockServer::start().await;
    let app = test_app(&server).await;
    let (org_id, token) = register_org(&app, "link@example.org").await;

    // Start requires auth
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/organizations/bbms-oauth/start",
        None,
        Some(json!({"merchant_id": "m1", "app_id": "a1", "app_secret": "s1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/organizations/bbms-oauth/start",
        Some(&token),
        Some(json!({"merchant_id": "m1", "app_id": "a1", "app_secret": "s1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "start failed: {}", body);
    let oauth_url = body["oauth_url"].as_str().unwrap();
    let state = body["state"].as_str().unwrap().to_string();
    assert!(oauth_url.contains("client_id=a1"));
    assert!(state.starts_with(&format!("{}:", org_id)));

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok123",
            "refresh_token": "ref456"
        })))
        .mount(&server)
        .await;

    // Callback is unauthenticated; the state is the credential
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/organizations/bbms-oauth/callback",
        None,
        Some(json!({"code": "c1", "state": state, "merchant_id": "m1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "callback failed: {}", body);
    assert_eq!(body["organization_id"], json!(org_id));

    let (_, body) = send_json(&app, "GET", "/api/organizations/me", Some(&token), None).await;
    assert_eq!(body["has_payments_configured"], json!(true));

    // Replay fails with the specific reason
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/organizations/bbms-oauth/callback",
        None,
        Some(json!({"code": "c1", "state": state, "merchant_id": "m1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid or expired state"));
}

#[tokio::test]
async fn test_callback_error_statuses() {
    let server = MockServer::start().await;
    let app = test_app(&server).await;
    let (_, token) = register_org(&app, "errors@example.org").await;

    // Malformed state -> 400 InvalidStateFormat
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/organizations/bbms-oauth/callback",
        None,
        Some(json!({"code": "c1", "state": "garbage", "merchant_id": "m1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid state parameter"));

    // Unknown org -> 400 OrganizationNotFound
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/organizations/bbms-oauth/callback",
        None,
        Some(json!({"code": "c1", "state": "nonexistent-org:abcdef", "merchant_id": "m1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Organization not found"));

    // Upstream invalid_grant -> 400 with restart guidance
    let (_, body) = send_json(
        &app,
        "POST",
        "/api/organizations/bbms-oauth/start",
        Some(&token),
        Some(json!({"merchant_id": "m1", "app_id": "a1", "app_secret": "s1"})),
    )
    .await;
    let state = body["state"].as_str().unwrap().to_string();

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
        )
        .mount(&server)
        .await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/organizations/bbms-oauth/callback",
        None,
        Some(json!({"code": "stale", "state": state, "merchant_id": "m1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("restart"));
}

// ============================================================================
// Donations
// ============================================================================

/// Link an organization end-to-end so it can accept donations.
async fn link_org(app: &Router, server: &MockServer, token: &str) {
    let (_, body) = send_json(
        app,
        "POST",
        "/api/organizations/bbms-oauth/start",
        Some(token),
        Some(json!({"merchant_id": "m1", "app_id": "a1", "app_secret": "s1"})),
    )
    .await;
    let state = body["state"].as_str().unwrap().to_string();

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok123"})))
        .mount(server)
        .await;

    let (status, _) = send_json(
        app,
        "POST",
        "/api/organizations/bbms-oauth/callback",
        None,
        Some(json!({"code": "c1", "state": state, "merchant_id": "m1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_checkout_requires_configured_payments() {
    let server = MockServer::start().await;
    let app = test_app(&server).await;
    let (org_id, _) = register_org(&app, "unconfigured@example.org").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/donations/checkout",
        None,
        Some(json!({
            "amount": 25.0,
            "donor_name": "Jordan Donor",
            "donor_email": "jordan@example.com",
            "org_id": org_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not configured payment"));
}

#[tokio::test]
async fn test_donation_checkout_and_status() {
    let server = MockServer::start().await;
    let app = test_app(&server).await;
    let (org_id, token) = register_org(&app, "donate@example.org").await;
    link_org(&app, &server, &token).await;

    // Organizations start in test mode, so checkout hits the sandbox base
    Mock::given(method("POST"))
        .and(path("/sandbox/payments/v1/checkouts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "checkout-1",
            "checkout_url": "https://payments.blackbaud.com/checkout/checkout-1"
        })))
        .mount(&server)
        .await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/donations/checkout",
        None,
        Some(json!({
            "amount": 25.0,
            "donor_name": "Jordan Donor",
            "donor_email": "jordan@example.com",
            "org_id": org_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "checkout failed: {}", body);
    assert_eq!(body["session_id"], json!("checkout-1"));
    assert!(body["checkout_url"].as_str().unwrap().contains("checkout-1"));

    // Public status lookup
    let (status, body) =
        send_json(&app, "GET", "/api/donations/status/checkout-1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("pending"));
    assert_eq!(body["amount"], json!(25.0));

    // Invalid amounts rejected before any upstream call
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/donations/checkout",
        None,
        Some(json!({
            "amount": -5.0,
            "donor_name": "Jordan",
            "donor_email": "jordan@example.com",
            "org_id": org_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transaction_listing_is_tenant_isolated() {
    let server = MockServer::start().await;
    let app = test_app(&server).await;
    let (org_id, token) = register_org(&app, "owner@example.org").await;
    let (_, other_token) = register_org(&app, "other@example.org").await;

    // Own listing is empty but allowed
    let (status, body) = send_json(
        &app,
        "GET",
        &format!("/api/organizations/{}/transactions", org_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    // A different organization's token gets 403
    let (status, _) = send_json(
        &app,
        "GET",
        &format!("/api/organizations/{}/transactions", org_id),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Unauthenticated gets 401
    let (status, _) = send_json(
        &app,
        "GET",
        &format!("/api/organizations/{}/transactions", org_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_form_config_and_embed_page() {
    let server = MockServer::start().await;
    let app = test_app(&server).await;
    let (org_id, _) = register_org(&app, "embed@example.org").await;

    let (status, body) = send_json(
        &app,
        "GET",
        &format!("/api/organizations/{}/donation-form", org_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["organization_name"], json!("Helping Hands"));
    assert_eq!(body["preset_amounts"], json!([25, 50, 100, 250, 500]));
    assert_eq!(body["custom_amount_enabled"], json!(true));

    // Embed page serves HTML wired to this org
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/embed/donate/{}", org_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let html = String::from_utf8(html.to_vec()).unwrap();
    assert!(html.contains(&org_id));
    assert!(html.contains("donation-root"));

    // Callback relay page renders for a browser redirect
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/blackbaud/callback?code=c1&state=org:abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
