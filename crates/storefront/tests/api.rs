//! Integration tests for the HTTP surface that needs no provider access:
//! health, shopper session bootstrap, the cart endpoints that work from
//! snapshots alone, empty-cart checkout, and the OAuth initiate redirect.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::{Router, middleware, routing::get};
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;

use clementine_storefront::config::{StoreConfig, SupabaseConfig};
use clementine_storefront::middleware::store_session_middleware;
use clementine_storefront::routes;
use clementine_storefront::state::AppState;

fn build_test_app() -> Router {
    let snapshot_dir =
        std::env::temp_dir().join(format!("clementine-api-test-{}", uuid::Uuid::new_v4()));
    let config = StoreConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        cookie_secret: SecretString::from("t".repeat(64)),
        snapshot_dir,
        verifier_ttl_secs: 600,
        supabase: SupabaseConfig {
            // Nothing in these tests talks to the provider.
            url: "http://127.0.0.1:9".to_string(),
            anon_key: "anon".to_string(),
            service_role_key: SecretString::from("service"),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.1,
    };
    let state = AppState::new(config).expect("state");

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(routes::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            store_session_middleware,
        ))
        .with_state(state)
}

async fn get_path(app: Router, path: &str) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("request"),
    )
    .await
    .expect("response")
}

async fn post_path(app: Router, path: &str) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(path)
            .body(Body::empty())
            .expect("request"),
    )
    .await
    .expect("response")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_check_returns_ok() {
    let response = get_path(build_test_app(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn first_request_sets_the_shopper_session_cookie() {
    let response = get_path(build_test_app(), "/cart").await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie: Vec<_> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| v.starts_with("clm_sid="))
        .collect();
    assert_eq!(set_cookie.len(), 1);
    assert!(set_cookie[0].contains("HttpOnly"));
    assert!(set_cookie[0].contains("SameSite=Lax"));
}

#[tokio::test]
async fn fresh_cart_is_empty_with_zero_totals() {
    let json = body_json(get_path(build_test_app(), "/cart").await).await;
    assert_eq!(json["items"], serde_json::json!([]));
    assert_eq!(json["item_count"], 0);
    assert_eq!(json["total"], "0");
}

#[tokio::test]
async fn cart_count_starts_at_zero() {
    let json = body_json(get_path(build_test_app(), "/cart/count").await).await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn fresh_wishlist_is_empty() {
    let json = body_json(get_path(build_test_app(), "/wishlist").await).await;
    assert_eq!(json["count"], 0);
    assert_eq!(json["items"], serde_json::json!([]));
}

#[tokio::test]
async fn checkout_rejects_an_empty_cart() {
    let response = post_path(build_test_app(), "/checkout").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Bad request: cart is empty");
}

#[tokio::test]
async fn oauth_begin_redirects_to_the_provider_with_a_verifier_cookie() {
    let response = get_path(build_test_app(), "/auth/oauth/google").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert!(location.contains("/auth/v1/authorize?provider=google"));
    assert!(location.contains("code_challenge_method=S256"));
    assert!(location.contains("redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));

    let verifier_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("clm_pkce_verifier="))
        .expect("verifier cookie");
    assert!(verifier_cookie.contains("HttpOnly"));
    assert!(verifier_cookie.contains("Max-Age=600"));
}

#[tokio::test]
async fn oauth_begin_derives_the_callback_from_the_request_origin() {
    let request = Request::builder()
        .uri("/auth/oauth/google")
        .header(header::HOST, "preview.example.com")
        .header("x-forwarded-proto", "https")
        .body(Body::empty())
        .expect("request");
    let response = build_test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    // The configured base URL must not leak into the provider redirect.
    assert!(location.contains("redirect_to=https%3A%2F%2Fpreview.example.com%2Fauth%2Fcallback"));
    assert!(!location.contains("localhost"));
}

#[tokio::test]
async fn oauth_begin_with_unknown_provider_redirects_to_login_error() {
    let response = get_path(build_test_app(), "/auth/oauth/facebook").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert_eq!(location, "/login?error=unknown_provider");
}

#[tokio::test]
async fn oauth_callback_without_verifier_fails_without_touching_the_provider() {
    // The code is present but no verifier cookie accompanies it; the flow
    // must fail as an invalid flow before any exchange is attempted.
    let response = get_path(build_test_app(), "/auth/callback?code=abc").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert_eq!(location, "/login?error=invalid_flow");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let response = get_path(build_test_app(), "/this-route-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
