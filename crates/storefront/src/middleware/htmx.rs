//! HTMX request detection.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

/// Whether the request was issued by HTMX (`HX-Request: true`).
///
/// Cart handlers answer HTMX with fragments and plain form posts with a
/// redirect, so the shop keeps working without JavaScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HxRequest(pub bool);

impl<S> FromRequestParts<S> for HxRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_htmx = parts
            .headers
            .get("hx-request")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        Ok(Self(is_htmx))
    }
}
