//! JSON endpoints for admin tooling.
//!
//! Everything under `/admin/api/` answers 401 instead of redirecting when
//! the session is missing.

use axum::{Json, extract::State};
use curio_core::{CategoryFilter, Product};
use serde::Serialize;
use tracing::instrument;

use crate::{error::Result, middleware::RequireAdminAuth, state::AppState};

/// Product listing payload.
#[derive(Debug, Serialize)]
pub struct ProductList {
    pub total: usize,
    pub products: Vec<Product>,
}

/// All products, newest first.
///
/// GET /admin/api/products
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn products(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<ProductList>> {
    let products = state.backend().list_products(CategoryFilter::All).await?;
    Ok(Json(ProductList {
        total: products.len(),
        products,
    }))
}
