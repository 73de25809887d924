//! Flash message extractor.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use curio_core::Flash;
use tower_sessions::Session;

use crate::models::take_flashes;

/// Notifications queued by earlier requests.
///
/// Extracting drains the queue, so only handlers that render a full page
/// should ask for it.
#[derive(Debug, Clone, Default)]
pub struct Flashes(pub Vec<Flash>);

impl<S> FromRequestParts<S> for Flashes
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(match parts.extensions.get::<Session>() {
            Some(session) => take_flashes(session).await,
            None => Vec::new(),
        }))
    }
}
