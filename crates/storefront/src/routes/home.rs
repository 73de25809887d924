//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use curio_core::{Category, CategoryFilter};
use tracing::instrument;

use crate::filters;
use crate::middleware::PageContext;
use crate::routes::shop::ProductCardView;
use crate::state::AppState;

/// Figures featured under the hero.
const FEATURED_COUNT: usize = 4;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub featured: Vec<ProductCardView>,
}

/// Display the home page: hero plus the newest figures.
///
/// The hero renders even when the catalog cannot be loaded.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    let featured = match state.backend().list_products(CategoryFilter::All).await {
        Ok(products) => products
            .iter()
            .filter(|product| product.category == Category::Figure)
            .take(FEATURED_COUNT)
            .map(|product| ProductCardView::new(product, state.price_unit()))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch featured products");
            Vec::new()
        }
    };

    HomeTemplate { page, featured }
}
