//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::HeaderValue;
use curio_backend::{BackendClient, BackendError};
use thiserror::Error;

use crate::config::AdminConfig;
use crate::middleware::content_security_policy;

/// Error building application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Backend(#[from] BackendError),
    #[error("invalid Content-Security-Policy: {0}")]
    Csp(#[from] axum::http::header::InvalidHeaderValue),
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backend: BackendClient,
    csp: HeaderValue,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, StateError> {
        let backend = BackendClient::new(&config.backend)?;
        let csp = HeaderValue::from_str(&content_security_policy(&config.backend.origin()))?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                csp,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn price_unit(&self) -> &str {
        &self.inner.config.price_unit
    }

    /// Precomputed Content-Security-Policy header value.
    #[must_use]
    pub fn content_security_policy(&self) -> &HeaderValue {
        &self.inner.csp
    }
}
