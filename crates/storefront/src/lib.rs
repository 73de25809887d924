//! Curio Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the storefront router with its middleware stack.
///
/// Sentry layers are added by the binary so tests can drive this router
/// directly.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.sessions(), state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ))
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the backend is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backend().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Backend not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response, header};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::tests::test_config;

    fn row(id: i64, title: &str, price: &str, category: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "description": "Limited run",
            "price": price,
            "image_url": format!("https://cdn.test/{id}.png"),
            "images": [format!("https://cdn.test/{id}.png")],
            "category": category,
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn session_cookie(response: &Response<Body>) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn app_with_sessions(server: &MockServer, database_url: &str) -> Router {
        let sessions = middleware::open_session_store(database_url).await.unwrap();
        app(AppState::new(test_config(&server.uri()), sessions).unwrap())
    }

    async fn test_app(server: &MockServer) -> Router {
        app_with_sessions(server, "sqlite::memory:").await
    }

    #[tokio::test]
    async fn test_health_is_ok_and_carries_security_headers() {
        let server = MockServer::start().await;
        let response = test_app(&server)
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert!(
            response.headers()["content-security-policy"]
                .to_str()
                .unwrap()
                .contains(&server.uri())
        );
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_readiness_reports_unreachable_backend() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/health"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let response = test_app(&server)
            .await
            .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_shop_search_filters_titles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                row(1, "Chum Keychain", "80.00", "figure"),
                row(2, "Urge Print", "300.00", "art"),
            ])))
            .mount(&server)
            .await;

        let response = test_app(&server)
            .await
            .oneshot(Request::get("/shop?q=chum").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Chum Keychain"));
        assert!(!html.contains("Urge Print"));
    }

    #[tokio::test]
    async fn test_shop_survives_backend_outage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let response = test_app(&server)
            .await
            .oneshot(Request::get("/shop").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_add_to_cart_persists_in_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("id", "eq.7"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([row(7, "Companion", "120.00", "figure")])),
            )
            .mount(&server)
            .await;

        let app = test_app(&server).await;

        let response = app
            .clone()
            .oneshot(
                Request::post("/cart/add")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("product_id=7&redirect_to=%2Fshop"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/shop");
        let cookie = session_cookie(&response);

        let response = app
            .clone()
            .oneshot(
                Request::post("/cart/add")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .header(header::COOKIE, &cookie)
                    .header("hx-request", "true")
                    .body(Body::from("product_id=7"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["hx-trigger"], "cart-updated");
        assert!(body_text(response).await.contains(">2</span>"));

        let response = app
            .oneshot(
                Request::get("/cart")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("Companion"));
        assert!(html.contains("240.00 MAD"));
    }

    #[tokio::test]
    async fn test_cart_survives_a_restart() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("id", "eq.7"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([row(7, "Companion", "120.00", "figure")])),
            )
            .mount(&server)
            .await;

        let db = std::env::temp_dir().join(format!("curio-sessions-{}.db", uuid::Uuid::new_v4()));
        let database_url = format!("sqlite://{}", db.display());

        let before = app_with_sessions(&server, &database_url).await;
        let response = before
            .oneshot(
                Request::post("/cart/add")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("product_id=7"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = session_cookie(&response);

        let after = app_with_sessions(&server, &database_url).await;
        let response = after
            .oneshot(
                Request::get("/cart")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("Companion"));
        assert!(html.contains("120.00 MAD"));

        let _ = std::fs::remove_file(db);
    }

    #[tokio::test]
    async fn test_whatsapp_with_empty_cart_returns_to_cart() {
        let server = MockServer::start().await;
        let response = test_app(&server)
            .await
            .oneshot(Request::get("/checkout/whatsapp").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/cart");
    }

    #[tokio::test]
    async fn test_legacy_cart_path_redirects_permanently() {
        let server = MockServer::start().await;
        let response = test_app(&server)
            .await
            .oneshot(Request::get("/cartPage").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/cart");
    }
}
