//! Dashboard route handler: the searchable, paginated product list.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use curio_core::{CatalogQuery, CategoryFilter, Flash, Page, Product, ProductId, paginate};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    filters,
    middleware::{Flashes, RequireAdminAuth},
    models::{AdminRole, CurrentAdmin},
    state::AppState,
};

/// Products per dashboard page.
pub const PER_PAGE: usize = 5;

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub email: String,
    pub role: AdminRole,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            email: admin.email.to_string(),
            role: admin.role,
        }
    }
}

/// Product row for the dashboard table.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub thumbnail: String,
    pub image_count: usize,
}

impl ProductRowView {
    #[must_use]
    pub fn new(product: &Product, price_unit: &str) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price.label(price_unit),
            category: product.category.to_string(),
            thumbnail: product.thumbnail().to_string(),
            image_count: product.gallery().len(),
        }
    }
}

/// Numbered page link.
#[derive(Debug, Clone)]
pub struct PageLinkView {
    pub number: usize,
    pub href: String,
    pub is_current: bool,
}

/// Dashboard query parameters.
///
/// `page` is kept as text so a mangled value falls back to page 1 instead
/// of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub q: Option<String>,
    pub page: Option<String>,
}

impl DashboardQuery {
    fn search(&self) -> &str {
        self.q.as_deref().map_or("", str::trim)
    }

    fn page(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }
}

/// Link to dashboard page `page` keeping the search term.
fn dashboard_href(search: &str, page: usize) -> String {
    if search.is_empty() {
        format!("/admin/dashboard?page={page}")
    } else {
        format!(
            "/admin/dashboard?q={}&page={page}",
            urlencoding::encode(search)
        )
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: Option<AdminUserView>,
    pub current_path: String,
    pub flashes: Vec<Flash>,
    pub search: String,
    pub products: Vec<ProductRowView>,
    /// Products matching the search, across all pages.
    pub total: usize,
    pub page_links: Vec<PageLinkView>,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub load_failed: bool,
}

impl DashboardTemplate {
    fn new(
        admin: &CurrentAdmin,
        flashes: Vec<Flash>,
        search: &str,
        page: &Page<'_, &Product>,
        price_unit: &str,
    ) -> Self {
        Self {
            admin_user: Some(AdminUserView::from(admin)),
            current_path: "/admin/dashboard".to_string(),
            flashes,
            search: search.to_string(),
            products: page
                .items
                .iter()
                .map(|product| ProductRowView::new(product, price_unit))
                .collect(),
            total: page.total_items,
            page_links: if page.total_pages > 1 {
                page.numbers()
                    .into_iter()
                    .map(|number| PageLinkView {
                        number,
                        href: dashboard_href(search, number),
                        is_current: number == page.page,
                    })
                    .collect()
            } else {
                Vec::new()
            },
            prev_href: page
                .has_previous()
                .then(|| dashboard_href(search, page.page - 1)),
            next_href: page
                .has_next()
                .then(|| dashboard_href(search, page.page + 1)),
            load_failed: false,
        }
    }
}

/// Dashboard page handler.
///
/// Always re-reads the whole table so edits made elsewhere show up; the
/// search is applied here, not by the backend.
#[instrument(skip(admin, state, flashes), fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Flashes(mut flashes): Flashes,
    Query(query): Query<DashboardQuery>,
) -> DashboardTemplate {
    let (products, load_failed) = match state.backend().list_products(CategoryFilter::All).await {
        Ok(products) => (products, false),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch products");
            flashes.push(Flash::error("Error fetching products"));
            (Vec::new(), true)
        }
    };

    let search = query.search();
    let matching = CatalogQuery::search(search).apply(&products);
    let page = paginate(&matching, query.page(), PER_PAGE);
    tracing::debug!(total = page.total_items, page = page.page, "dashboard listed");

    let mut template = DashboardTemplate::new(&admin, flashes, search, &page, state.price_unit());
    template.load_failed = load_failed;
    template
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_href_keeps_search() {
        assert_eq!(dashboard_href("", 2), "/admin/dashboard?page=2");
        assert_eq!(
            dashboard_href("space molly", 3),
            "/admin/dashboard?q=space%20molly&page=3"
        );
    }

    #[test]
    fn test_query_page_defaults_to_first() {
        let query = DashboardQuery {
            q: Some("  chum ".to_string()),
            page: Some("abc".to_string()),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.search(), "chum");
        assert_eq!(DashboardQuery::default().search(), "");
    }
}
