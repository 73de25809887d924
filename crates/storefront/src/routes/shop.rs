//! Catalog route handlers.
//!
//! The whole catalog is fetched once per request and searched, filtered,
//! sorted and paginated in memory.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use curio_core::{
    Category, CategoryFilter, CatalogQuery, Page, PriceRange, Product, ProductId, SortOrder,
    paginate,
};
use serde::Deserialize;
use tracing::instrument;
use url::form_urlencoded;

use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::state::AppState;

/// Products per catalog page.
pub const PER_PAGE: usize = 12;

// =============================================================================
// Views
// =============================================================================

/// Product card data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: ProductId,
    pub title: String,
    pub price: String,
    pub thumbnail: String,
    pub category: &'static str,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, price_unit: &str) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price.label(price_unit),
            thumbnail: product.thumbnail().to_string(),
            category: product.category.label(),
        }
    }
}

/// Product detail data for templates.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: &'static str,
}

impl ProductDetailView {
    fn new(product: &Product, price_unit: &str) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price.label(price_unit),
            category: product.category.label(),
        }
    }
}

/// One thumbnail of the image carousel.
#[derive(Clone)]
pub struct SlideView {
    pub url: String,
    pub number: usize,
    pub href: String,
    pub is_current: bool,
}

/// Image carousel state.
///
/// Navigation wraps around: "previous" on the first image shows the last.
#[derive(Clone)]
pub struct GalleryView {
    pub current: String,
    pub slides: Vec<SlideView>,
    pub position: usize,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

impl GalleryView {
    /// Build the carousel for `product` showing image `requested` (0-based),
    /// with links pointing at `base_path?image=N`.
    fn new(product: &Product, requested: usize, base_path: &str) -> Self {
        let images = product.gallery();
        if images.is_empty() {
            return Self {
                current: curio_core::PLACEHOLDER_IMAGE.to_string(),
                slides: Vec::new(),
                position: 1,
                prev_href: None,
                next_href: None,
            };
        }

        let count = images.len();
        let index = requested % count;
        let href = |i: usize| format!("{base_path}?image={i}");
        let slides = images
            .iter()
            .enumerate()
            .map(|(i, url)| SlideView {
                url: curio_core::product::display_image(Some(url)).to_string(),
                number: i + 1,
                href: href(i),
                is_current: i == index,
            })
            .collect::<Vec<_>>();
        let current = curio_core::product::display_image(images.get(index).copied()).to_string();
        let (prev_href, next_href) = if count > 1 {
            (Some(href((index + count - 1) % count)), Some(href((index + 1) % count)))
        } else {
            (None, None)
        };

        Self {
            current,
            slides,
            position: index + 1,
            prev_href,
            next_href,
        }
    }
}

/// A `<select>` option.
#[derive(Clone)]
pub struct OptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// A numbered pager link.
#[derive(Clone)]
pub struct PageLinkView {
    pub number: usize,
    pub href: String,
    pub is_current: bool,
}

/// Pager state for templates.
#[derive(Clone)]
pub struct PagerView {
    pub links: Vec<PageLinkView>,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub first_index: usize,
    pub last_index: usize,
    pub total_items: usize,
}

// =============================================================================
// Query
// =============================================================================

/// Catalog query parameters.
///
/// Everything is read as text so a malformed value falls back to the default
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ShopQuery {
    pub q: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

impl ShopQuery {
    fn catalog_query(&self) -> CatalogQuery {
        CatalogQuery {
            search: self.q.clone().unwrap_or_default(),
            price_range: PriceRange::from_param(self.price.as_deref()),
            category: CategoryFilter::from_param(self.category.as_deref()),
            sort: SortOrder::from_param(self.sort.as_deref()),
        }
    }

    fn page(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }
}

/// Link to `page` of the catalog with the current filters kept.
fn shop_href(query: &CatalogQuery, page: usize) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    if !query.search.trim().is_empty() {
        params.append_pair("q", query.search.trim());
    }
    if query.price_range != PriceRange::All {
        params.append_pair("price", query.price_range.as_param());
    }
    if query.category != CategoryFilter::All {
        params.append_pair("category", query.category.as_param());
    }
    if query.sort != SortOrder::Newest {
        params.append_pair("sort", query.sort.as_param());
    }
    if page > 1 {
        params.append_pair("page", &page.to_string());
    }

    let params = params.finish();
    if params.is_empty() {
        "/shop".to_string()
    } else {
        format!("/shop?{params}")
    }
}

fn pager_view<T>(page: &Page<'_, T>, query: &CatalogQuery) -> PagerView {
    PagerView {
        links: page
            .numbers()
            .into_iter()
            .map(|number| PageLinkView {
                number,
                href: shop_href(query, number),
                is_current: number == page.page,
            })
            .collect(),
        prev_href: page
            .has_previous()
            .then(|| shop_href(query, page.page - 1)),
        next_href: page.has_next().then(|| shop_href(query, page.page + 1)),
        first_index: page.first_index(),
        last_index: page.last_index(),
        total_items: page.total_items,
    }
}

fn price_options(selected: PriceRange) -> Vec<OptionView> {
    PriceRange::ALL
        .iter()
        .map(|range| OptionView {
            value: range.as_param(),
            label: range.label(),
            selected: *range == selected,
        })
        .collect()
}

fn sort_options(selected: SortOrder) -> Vec<OptionView> {
    SortOrder::ALL
        .iter()
        .map(|sort| OptionView {
            value: sort.as_param(),
            label: sort.label(),
            selected: *sort == selected,
        })
        .collect()
}

fn category_options(selected: CategoryFilter) -> Vec<OptionView> {
    std::iter::once(OptionView {
        value: "all",
        label: "All Categories",
        selected: selected == CategoryFilter::All,
    })
    .chain(Category::ALL.iter().map(|category| OptionView {
        value: category.as_str(),
        label: category.label(),
        selected: selected == CategoryFilter::Only(*category),
    }))
    .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ShopIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCardView>,
    pub search: String,
    pub price_options: Vec<OptionView>,
    pub sort_options: Vec<OptionView>,
    pub category_options: Vec<OptionView>,
    pub pager: PagerView,
    pub is_filtered: bool,
    pub load_failed: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductDetailView,
    pub gallery: GalleryView,
}

/// Quick view fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/quick_view.html")]
pub struct QuickViewTemplate {
    pub product: ProductDetailView,
    pub gallery: GalleryView,
}

/// Carousel query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct GalleryQuery {
    pub image: Option<String>,
}

impl GalleryQuery {
    fn index(&self) -> usize {
        self.image
            .as_deref()
            .and_then(|i| i.trim().parse().ok())
            .unwrap_or(0)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the catalog grid.
///
/// A backend failure is logged and shown as an empty grid with a notice.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<ShopQuery>,
) -> impl IntoResponse {
    let (products, load_failed) = match state.backend().list_products(CategoryFilter::All).await {
        Ok(products) => (products, false),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch products");
            (Vec::new(), true)
        }
    };

    let catalog_query = query.catalog_query();
    let matching = catalog_query.apply(&products);
    let current = paginate(&matching, query.page(), PER_PAGE);
    let unit = state.price_unit();

    ShopIndexTemplate {
        page,
        products: current
            .items
            .iter()
            .map(|product| ProductCardView::new(product, unit))
            .collect(),
        search: catalog_query.search.clone(),
        price_options: price_options(catalog_query.price_range),
        sort_options: sort_options(catalog_query.sort),
        category_options: category_options(catalog_query.category),
        pager: pager_view(&current, &catalog_query),
        is_filtered: catalog_query.is_filtered(),
        load_failed,
    }
}

/// Display a product with its image carousel.
#[instrument(skip(state, page), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(id): Path<ProductId>,
    Query(gallery): Query<GalleryQuery>,
) -> Result<ProductShowTemplate> {
    let product = state.backend().get_product(id).await?;

    Ok(ProductShowTemplate {
        page,
        gallery: GalleryView::new(&product, gallery.index(), &format!("/shop/{id}")),
        product: ProductDetailView::new(&product, state.price_unit()),
    })
}

/// Quick view modal fragment (HTMX).
#[instrument(skip(state), fields(product_id = %id))]
pub async fn quick_view(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(gallery): Query<GalleryQuery>,
) -> Result<QuickViewTemplate> {
    let product = state.backend().get_product(id).await?;

    Ok(QuickViewTemplate {
        gallery: GalleryView::new(&product, gallery.index(), &format!("/shop/{id}/quick-view")),
        product: ProductDetailView::new(&product, state.price_unit()),
    })
}
