//! Cart route handlers.
//!
//! The cart lives in the visitor's session and is written back after every
//! mutation. HTMX requests get fragments plus an `HX-Trigger: cart-updated`
//! header so the navbar badge and mini-cart refresh; plain form posts are
//! redirected.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use curio_backend::BackendError;
use curio_core::{Cart, CartChange, Flash, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{HxRequest, PageContext};
use crate::models::{load_cart, push_flash, save_cart};
use crate::state::AppState;

/// Event name the cart widgets listen for.
pub const CART_UPDATED: &str = "cart-updated";

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: ProductId,
    pub title: String,
    pub thumbnail: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, price_unit: &str) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartLineView {
                    id: item.id,
                    title: item.title.clone(),
                    thumbnail: curio_core::product::display_image(item.image_url.as_deref())
                        .to_string(),
                    quantity: item.quantity,
                    unit_price: item.price.label(price_unit),
                    line_total: item.line_total().label(price_unit),
                })
                .collect(),
            total: cart.total().label(price_unit),
            item_count: cart.item_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Checkout links shown under the cart lines.
#[derive(Clone)]
pub struct HandoffView {
    /// Prefilled WhatsApp message with the cart total.
    pub whatsapp_href: String,
    /// Whether the email order form is available.
    pub email_enabled: bool,
}

impl HandoffView {
    fn new(state: &AppState, cart: &Cart) -> Self {
        Self {
            whatsapp_href: state.whatsapp().order_link(cart.total(), state.price_unit()),
            email_enabled: state.emailjs().is_some(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    /// Where to send non-HTMX visitors afterwards.
    pub redirect_to: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub quantity: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub handoff: HandoffView,
}

/// Cart lines, total and checkout buttons (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub handoff: HandoffView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Badge plus an out-of-band "added" toast (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_added.html")]
pub struct CartAddedTemplate {
    pub count: u32,
    pub title: String,
}

/// Navbar mini-cart fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/mini_cart.html")]
pub struct MiniCartTemplate {
    pub cart: CartView,
}

/// Only follow same-site relative paths.
fn safe_redirect(target: Option<&str>) -> &str {
    match target {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') =>
        {
            path
        }
        _ => "/cart",
    }
}

/// Write the cart back if `change` modified it.
async fn persist(session: &Session, cart: &Cart, change: CartChange) -> Result<()> {
    if change.is_change() {
        save_cart(session, cart).await?;
        tracing::debug!(?change, items = cart.item_count(), "cart saved");
    }
    Ok(())
}

/// Answer a line mutation: fragment for HTMX, redirect otherwise.
fn lines_response(state: &AppState, cart: &Cart, HxRequest(is_htmx): HxRequest) -> Response {
    if !is_htmx {
        return Redirect::to("/cart").into_response();
    }
    (
        AppendHeaders([("HX-Trigger", CART_UPDATED)]),
        CartItemsTemplate {
            cart: CartView::new(cart, state.price_unit()),
            handoff: HandoffView::new(state, cart),
        },
    )
        .into_response()
}

/// Display cart page.
#[instrument(skip(state, page, session))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
) -> impl IntoResponse {
    let cart = load_cart(&session).await;

    CartShowTemplate {
        page,
        cart: CartView::new(&cart, state.price_unit()),
        handoff: HandoffView::new(&state, &cart),
    }
}

/// Add one unit of a product.
///
/// The product is re-read from the backend so the cart snapshot never trusts
/// prices posted by the browser.
#[instrument(skip(state, session, hx), fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    hx: HxRequest,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = match state.backend().get_product(form.product_id).await {
        Ok(product) => product,
        Err(e) => {
            let message = if matches!(e, BackendError::NotFound(_)) {
                tracing::warn!(error = %e, "Add to cart for unknown product");
                "That product is no longer available."
            } else {
                tracing::error!(error = %e, "Failed to add item to cart");
                "Error adding to cart"
            };
            if hx.0 {
                return Ok((
                    StatusCode::BAD_GATEWAY,
                    Html(format!("<span class=\"cart-error\">{message}</span>")),
                )
                    .into_response());
            }
            push_flash(&session, Flash::error(message)).await;
            return Ok(Redirect::to(safe_redirect(form.redirect_to.as_deref())).into_response());
        }
    };

    let mut cart = load_cart(&session).await;
    let change = cart.add(&product);
    persist(&session, &cart, change).await?;

    let id = product.id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));
    tracing::info!(quantity = change.quantity(), "added to cart");

    if hx.0 {
        return Ok((
            AppendHeaders([("HX-Trigger", CART_UPDATED)]),
            CartAddedTemplate {
                count: cart.item_count(),
                title: product.title,
            },
        )
            .into_response());
    }

    push_flash(
        &session,
        Flash::success("Successfully Added!").with_detail("The product is now in your cart."),
    )
    .await;
    Ok(Redirect::to(safe_redirect(form.redirect_to.as_deref())).into_response())
}

/// Set a line's quantity; zero or less removes the line.
#[instrument(skip(state, session, hx), fields(product_id = %form.product_id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    hx: HxRequest,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let quantity = form
        .quantity
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("invalid quantity {:?}", form.quantity)))?;

    let mut cart = load_cart(&session).await;
    let change = cart.set_quantity(form.product_id, quantity);
    persist(&session, &cart, change).await?;

    Ok(lines_response(&state, &cart, hx))
}

/// Remove a line.
#[instrument(skip(state, session, hx), fields(product_id = %form.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    hx: HxRequest,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    let change = cart.remove(form.product_id);
    persist(&session, &cart, change).await?;

    Ok(lines_response(&state, &cart, hx))
}

/// Empty the cart.
#[instrument(skip(state, session, hx))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    hx: HxRequest,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    let change = cart.clear();
    persist(&session, &cart, change).await?;

    Ok(lines_response(&state, &cart, hx))
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    CartCountTemplate {
        count: load_cart(&session).await.item_count(),
    }
}

/// Get navbar mini-cart (HTMX).
#[instrument(skip(state, session))]
pub async fn mini(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let cart = load_cart(&session).await;
    MiniCartTemplate {
        cart: CartView::new(&cart, state.price_unit()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_redirect_only_allows_local_paths() {
        assert_eq!(safe_redirect(Some("/shop?q=kaws")), "/shop?q=kaws");
        assert_eq!(safe_redirect(Some("//evil.test/")), "/cart");
        assert_eq!(safe_redirect(Some("https://evil.test/")), "/cart");
        assert_eq!(safe_redirect(Some("/\\evil.test")), "/cart");
        assert_eq!(safe_redirect(None), "/cart");
    }
}
