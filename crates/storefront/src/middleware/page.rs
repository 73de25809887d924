//! Per-page layout context.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use curio_core::Flash;
use tower_sessions::Session;

use crate::models::{load_cart, take_flashes};
use crate::state::AppState;

/// What every full page needs for the shared layout: the navbar cart badge,
/// pending notifications and the chat link in the footer.
///
/// Extracting it drains the flash queue, so only page-rendering handlers
/// should ask for it.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub cart_count: u32,
    pub flashes: Vec<Flash>,
    pub chat_link: String,
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (cart_count, flashes) = match parts.extensions.get::<Session>() {
            Some(session) => (
                load_cart(session).await.item_count(),
                take_flashes(session).await,
            ),
            None => (0, Vec::new()),
        };

        Ok(Self {
            cart_count,
            flashes,
            chat_link: state.whatsapp().chat_link(),
        })
    }
}
