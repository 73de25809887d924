//! Integration tests for Curio.
//!
//! Both binaries are served in-process on ephemeral ports and driven over
//! real HTTP with a cookie-keeping `reqwest` client. The hosted backend is a
//! `wiremock` server whose products table keeps state between requests, so
//! a row created through the admin shows up on the next read.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p curio-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::{Arc, Mutex, PoisonError};

use curio_admin::config::AdminConfig;
use curio_backend::{BackendConfig, DEFAULT_BUCKET};
use curio_core::MAX_PRODUCT_IMAGES;
use curio_storefront::config::StorefrontConfig;
use curio_storefront::services::EmailJsConfig;
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Admin account accepted by the fake auth service.
pub const ADMIN_EMAIL: &str = "owner@curio.test";
/// Password for [`ADMIN_EMAIL`].
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

/// In-memory stand-in for the products table.
#[derive(Clone, Default)]
pub struct FakeTable {
    rows: Arc<Mutex<Vec<Value>>>,
}

impl FakeTable {
    /// Insert a row as-is.
    pub fn insert(&self, row: Value) {
        self.lock().push(row);
    }

    /// Copy of every row, in insertion order.
    #[must_use]
    pub fn rows(&self) -> Vec<Value> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Value>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(rows: &[Value]) -> i64 {
        rows.iter().filter_map(|row| row["id"].as_i64()).max().unwrap_or(0) + 1
    }

    /// Value of an `eq.` filter on `column`, if the request has one.
    fn eq_filter(request: &Request, column: &str) -> Option<String> {
        request
            .url
            .query_pairs()
            .find(|(key, _)| key == column)
            .and_then(|(_, value)| value.strip_prefix("eq.").map(str::to_string))
    }

    fn matches(row: &Value, request: &Request) -> bool {
        let id_ok = Self::eq_filter(request, "id")
            .is_none_or(|id| row["id"].as_i64().map(|v| v.to_string()) == Some(id));
        let category_ok = Self::eq_filter(request, "category")
            .is_none_or(|category| row["category"].as_str() == Some(category.as_str()));
        id_ok && category_ok
    }
}

impl Respond for FakeTable {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut rows = self.lock();
        match request.method.as_str() {
            "GET" => {
                let mut found: Vec<Value> = rows
                    .iter()
                    .filter(|row| Self::matches(row, request))
                    .cloned()
                    .collect();
                found.sort_by_key(|row| std::cmp::Reverse(row["id"].as_i64()));
                ResponseTemplate::new(200).set_body_json(found)
            }
            "POST" => {
                let Ok(mut row) = serde_json::from_slice::<Value>(&request.body) else {
                    return ResponseTemplate::new(400);
                };
                row["id"] = json!(Self::next_id(&rows));
                row["created_at"] = json!("2025-06-01T12:00:00Z");
                rows.push(row.clone());
                ResponseTemplate::new(201).set_body_json(json!([row]))
            }
            "PATCH" => {
                let Ok(Value::Object(changes)) = serde_json::from_slice::<Value>(&request.body)
                else {
                    return ResponseTemplate::new(400);
                };
                let mut updated = Vec::new();
                for row in rows.iter_mut().filter(|row| Self::matches(row, request)) {
                    for (key, value) in &changes {
                        row[key] = value.clone();
                    }
                    updated.push(row.clone());
                }
                ResponseTemplate::new(200).set_body_json(updated)
            }
            "DELETE" => {
                let (removed, kept): (Vec<Value>, Vec<Value>) = rows
                    .drain(..)
                    .partition(|row| Self::matches(row, request));
                *rows = kept;
                ResponseTemplate::new(200).set_body_json(removed)
            }
            _ => ResponseTemplate::new(405),
        }
    }
}

/// A fake backend: products table, storage bucket, and auth service.
pub struct FakeBackend {
    pub server: MockServer,
    pub table: FakeTable,
}

impl FakeBackend {
    /// Start a fake backend with an empty table.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let table = FakeTable::default();

        Mock::given(path("/rest/v1/products"))
            .respond_with(table.clone())
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/[a-z_]+/[^/]+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "stored"})))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(PasswordGrant)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "auth"})))
            .mount(&server)
            .await;

        Self { server, table }
    }

    #[must_use]
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    fn backend_config(&self) -> BackendConfig {
        BackendConfig::new(&self.uri(), SecretString::from("anon-integration-key"))
            .expect("mock server URI is a valid URL")
    }

    /// Admin config pointing at this backend.
    #[must_use]
    pub fn admin_config(&self) -> AdminConfig {
        AdminConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            backend: self.backend_config(),
            storage_bucket: DEFAULT_BUCKET.to_string(),
            max_images: MAX_PRODUCT_IMAGES,
            price_unit: "MAD".to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Storefront config pointing at this backend, with `EmailJS` optional.
    #[must_use]
    pub fn storefront_config(&self, emailjs_url: Option<&str>) -> StorefrontConfig {
        StorefrontConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            backend: self.backend_config(),
            emailjs: emailjs_url.map(|api_url| EmailJsConfig {
                api_url: api_url.to_string(),
                service_id: "service_curio".to_string(),
                template_id: "template_order".to_string(),
                public_key: "public-key".to_string(),
                private_key: None,
            }),
            whatsapp_number: "+2120774054190".to_string(),
            price_unit: "MAD".to_string(),
            session_database_url: "sqlite::memory:".to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

/// Password grant that only accepts [`ADMIN_EMAIL`] / [`ADMIN_PASSWORD`].
struct PasswordGrant;

impl Respond for PasswordGrant {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let refresh = request
            .url
            .query_pairs()
            .any(|(key, value)| key == "grant_type" && value == "refresh_token");
        let accepted = refresh
            || (body["email"] == ADMIN_EMAIL && body["password"] == ADMIN_PASSWORD);

        if accepted {
            ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "integration-access",
                "refresh_token": "integration-refresh",
                "expires_in": 3600,
                "user": {"id": "admin-1", "email": ADMIN_EMAIL}
            }))
        } else {
            ResponseTemplate::new(400).set_body_json(json!({
                "error_code": "invalid_credentials",
                "msg": "Invalid login credentials"
            }))
        }
    }
}

/// A product row as the table API returns it.
#[must_use]
pub fn product_row(id: i64, title: &str, price: &str, category: &str) -> Value {
    let image = format!("https://cdn.curio.test/{id}.png");
    json!({
        "id": id,
        "title": title,
        "description": format!("{title}, limited edition"),
        "price": price,
        "image_url": image,
        "images": [image],
        "category": category,
        "created_at": format!("2025-01-{:02}T00:00:00Z", id.clamp(1, 28))
    })
}

/// Serve `router` on an ephemeral port and return its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}

/// Start the admin panel against `backend`.
pub async fn spawn_admin(backend: &FakeBackend) -> String {
    let state = curio_admin::state::AppState::new(backend.admin_config()).expect("admin state");
    serve(curio_admin::app(state)).await
}

/// Start the storefront against `backend`.
pub async fn spawn_storefront(backend: &FakeBackend, emailjs_url: Option<&str>) -> String {
    let config = backend.storefront_config(emailjs_url);
    let sessions = curio_storefront::middleware::open_session_store(&config.session_database_url)
        .await
        .expect("session store");
    let state = curio_storefront::state::AppState::new(config, sessions).expect("storefront state");
    serve(curio_storefront::app(state)).await
}

/// Browser-like client: keeps cookies and follows redirects.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Cookie-keeping client that stops at the first redirect.
#[must_use]
pub fn browser_without_redirects() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}
