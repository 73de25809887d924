//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Redirect to the dashboard
//!
//! # Auth (email + password against the backend auth service)
//! GET  /admin/login                 - Login page
//! POST /admin/login                 - Sign in
//! POST /admin/logout                - Sign out
//!
//! # Catalog
//! GET  /admin/dashboard             - Product table (?q=&page=)
//! GET  /admin/products/new          - New product form
//! POST /admin/products              - Create product (multipart)
//! GET  /admin/products/{id}/edit    - Edit product form
//! POST /admin/products/{id}         - Update product (multipart)
//! POST /admin/products/{id}/delete  - Delete product
//!
//! # API (401 instead of redirect)
//! GET  /admin/api/products          - Product list as JSON
//! ```

pub mod api;
pub mod auth;
pub mod dashboard;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(products::create))
        .route("/new", get(products::new_form))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit_form))
        .route("/{id}/delete", post(products::delete))
        .layer(DefaultBodyLimit::max(products::MAX_FORM_BYTES))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/admin/dashboard") }))
        .route("/admin", get(|| async { Redirect::to("/admin/dashboard") }))
        .route("/admin/login", get(auth::login_page).post(auth::login))
        .route("/admin/logout", post(auth::logout))
        .route("/admin/dashboard", get(dashboard::index))
        .nest("/admin/products", product_routes())
        .route("/admin/api/products", get(api::products))
}
