//! End-to-end HTTP tests against the assembled router.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use handoff_auth::SessionService;
use handoff_auth::handlers::AuthHttpState;
use handoff_auth::mocks::{MockIdentityProvider, MockProfileCache};
use handoff_auth::stores::FileProfileCache;
use handoff_server::build_app;
use handoff_web::CORRELATION_ID_HEADER;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const WEB_ORIGIN: &str = "http://localhost:4173";

fn app_with(provider: MockIdentityProvider, cache: MockProfileCache) -> Router {
    let state = Arc::new(AuthHttpState::new(SessionService::new(provider, cache), WEB_ORIGIN));
    build_app(state).unwrap()
}

fn app() -> (Router, MockIdentityProvider, MockProfileCache) {
    let provider = MockIdentityProvider::new();
    let cache = MockProfileCache::new();
    (app_with(provider.clone(), cache.clone()), provider, cache)
}

async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    app.clone().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
}

async fn post(app: &Router, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    app.clone().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
}

async fn json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn login_redirects_to_provider_with_state() {
    let (app, _, _) = app();

    let response = get(&app, "/login?redirect_uri=app%3A%2F%2Fcb", None).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let target = location(&response);
    assert!(target.starts_with("https://github.example/login/oauth/authorize?"));
    assert!(target.ends_with("state=app%3A%2F%2Fcb"));
}

#[tokio::test]
async fn desktop_login_round_trip() {
    let (app, _, _) = app();

    let response = get(&app, "/callback?code=abc&state=app%3A%2F%2Fcb", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "app://cb?token=tok1");

    let response = get(&app, "/session", Some("tok1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["identity"], "42");
    assert_eq!(body["displayName"], "alice");
    assert_eq!(body["email"], "a@x.com");
}

#[tokio::test]
async fn web_login_without_state_uses_web_origin() {
    let (app, _, _) = app();

    let response = get(&app, "/callback?code=abc", None).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "http://localhost:4173/?token=tok1");
}

#[tokio::test]
async fn missing_code_is_400_without_side_effects() {
    let (app, provider, cache) = app();

    for uri in ["/callback", "/callback?code=", "/callback?state=app%3A%2F%2Fcb"] {
        let response = get(&app, uri, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(text(response).await, "Missing code");
    }

    assert_eq!(provider.exchange_calls(), 0);
    assert!(cache.snapshot().unwrap().identities.is_empty());
}

#[tokio::test]
async fn provider_failure_renders_generic_error_page() {
    let app = app_with(MockIdentityProvider::failing(), MockProfileCache::new());

    let response = get(&app, "/callback?code=stale", None).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(text(response).await.contains("OAuth callback error"));
}

#[tokio::test]
async fn storage_failure_on_callback_is_500() {
    let (app, _, cache) = app();
    cache.set_fail_writes(true);

    let response = get(&app, "/callback?code=abc", None).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn logout_then_verify_is_invalid() {
    let (app, _, _) = app();
    get(&app, "/callback?code=abc", None).await;

    let response = get(&app, "/verify", Some("tok1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["displayName"], "alice");

    let response = post(&app, "/logout", Some("tok1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["message"], "Logged out successfully");
    assert!(body.get("syncLogout").is_none());

    let response = get(&app, "/verify", Some("tok1")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json(response).await;
    assert_eq!(body["valid"], false);
    assert!(body["error"].is_string());

    // Logging out again is still a success
    let response = post(&app, "/logout", Some("tok1")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn desktop_logout_returns_sync_url() {
    let (app, _, _) = app();
    get(&app, "/callback?code=abc&state=app%3A%2F%2Foauth-callback", None).await;

    let response = post(&app, "/logout?from=desktop", Some("tok1")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    let sync = body["syncLogout"].as_str().unwrap();
    assert!(sync.starts_with("http://localhost:4173/?sync-logout=true&t="));
}

#[tokio::test]
async fn session_and_logout_require_bearer() {
    let (app, _, _) = app();

    let response = get(&app, "/session", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(response).await["code"], "UNAUTHORIZED");

    let response = get(&app, "/session", Some("unknown")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(response).await["error"], "Invalid or expired token");

    let response = post(&app, "/logout", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(&app, "/verify", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(response).await["valid"], false);
}

#[tokio::test]
async fn health_and_correlation_header() {
    let (app, _, _) = app();

    let response = get(&app, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(CORRELATION_ID_HEADER));
    assert_eq!(text(response).await, "ok");
}

#[tokio::test]
async fn file_store_backs_http_flow() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profiles.json");

    {
        let cache = FileProfileCache::open(&path).await.unwrap();
        let state = Arc::new(AuthHttpState::new(
            SessionService::new(MockIdentityProvider::new(), cache),
            WEB_ORIGIN,
        ));
        let app = build_app(state).unwrap();
        let response = get(&app, "/callback?code=abc&state=app%3A%2F%2Fcb", None).await;
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    let cache = FileProfileCache::open(&path).await.unwrap();
    let state = Arc::new(AuthHttpState::new(
        SessionService::new(MockIdentityProvider::new(), cache),
        WEB_ORIGIN,
    ));
    let app = build_app(state).unwrap();
    let response = get(&app, "/session", Some("tok1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["identity"], "42");
}
