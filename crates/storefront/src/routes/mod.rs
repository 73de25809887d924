//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /faqs                   - Frequently asked questions
//!
//! # Catalog
//! GET  /shop                   - Catalog grid (?q=&price=&category=&sort=&page=)
//! GET  /shop/{id}              - Product detail with image carousel (?image=N)
//! GET  /shop/{id}/quick-view   - Quick view fragment (HTMX)
//!
//! # Cart (HTMX fragments, redirects without HTMX)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add one unit (triggers cart-updated)
//! POST /cart/update            - Set quantity, <= 0 removes (cart_items fragment)
//! POST /cart/remove            - Remove line (cart_items fragment)
//! POST /cart/clear             - Empty the cart (cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /cart/mini              - Navbar mini-cart (fragment)
//!
//! # Checkout handoff
//! GET  /checkout/contact       - Contact form
//! POST /checkout/contact       - Send the order by email
//! GET  /checkout/whatsapp      - Redirect to a prefilled WhatsApp chat
//!
//! # Legacy
//! GET  /cartPage               - Permanent redirect to /cart
//! ```

pub mod cart;
pub mod checkout;
pub mod home;
pub mod pages;
pub mod shop;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the catalog routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shop::index))
        .route("/{id}", get(shop::show))
        .route("/{id}/quick-view", get(shop::quick_view))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
        .route("/mini", get(cart::mini))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/contact",
            get(checkout::contact_form).post(checkout::submit_contact),
        )
        .route("/whatsapp", get(checkout::whatsapp))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/faqs", get(pages::faqs))
        .nest("/shop", shop_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/cartPage", get(|| async { Redirect::permanent("/cart") }))
}
