//! Session-stored state.
//!
//! A visitor has no account: the cart and pending notifications are the only
//! things remembered between requests, both keyed by the session cookie.

use curio_core::{Cart, Flash};
use tower_sessions::Session;

/// Session keys for visitor data.
pub mod keys {
    /// Key for the serialized cart.
    pub const CART: &str = "cart";

    /// Key for queued flash notifications.
    pub const FLASHES: &str = "flashes";
}

/// Load the visitor's cart, or an empty one.
///
/// A cart that no longer deserializes is dropped rather than failing the
/// request.
pub async fn load_cart(session: &Session) -> Cart {
    match session.get::<Cart>(keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable cart");
            Cart::default()
        }
    }
}

/// Persist the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, cart).await
}

/// Queue a notification for the next rendered page.
pub async fn push_flash(session: &Session, flash: Flash) {
    let mut flashes: Vec<Flash> = session
        .get(keys::FLASHES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    flashes.push(flash);

    if let Err(e) = session.insert(keys::FLASHES, flashes).await {
        tracing::warn!(error = %e, "failed to queue flash message");
    }
}

/// Drain queued notifications.
pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(keys::FLASHES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}
