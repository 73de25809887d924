//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::HeaderValue;
use curio_backend::{BackendClient, BackendError};
use curio_core::WhatsApp;
use thiserror::Error;
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::StorefrontConfig;
use crate::middleware::content_security_policy;
use crate::services::emailjs::{EmailJsClient, EmailJsError};

/// Error building application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Backend(#[from] BackendError),
    #[error("EmailJS client: {0}")]
    EmailJs(#[from] EmailJsError),
    #[error("invalid Content-Security-Policy: {0}")]
    Csp(#[from] axum::http::header::InvalidHeaderValue),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the backend client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    emailjs: Option<EmailJsClient>,
    whatsapp: WhatsApp,
    csp: HeaderValue,
    sessions: SqliteStore,
}

impl AppState {
    /// Create a new application state around an opened session store.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the HTTP clients cannot be built.
    pub fn new(config: StorefrontConfig, sessions: SqliteStore) -> Result<Self, StateError> {
        let backend = BackendClient::new(&config.backend)?;
        let emailjs = config
            .emailjs
            .clone()
            .map(EmailJsClient::new)
            .transpose()?;
        let whatsapp = WhatsApp::new(&config.whatsapp_number);
        let csp = HeaderValue::from_str(&content_security_policy(&config.backend.origin()))?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                emailjs,
                whatsapp,
                csp,
                sessions,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// The email order client, if email ordering is configured.
    #[must_use]
    pub fn emailjs(&self) -> Option<&EmailJsClient> {
        self.inner.emailjs.as_ref()
    }

    #[must_use]
    pub fn whatsapp(&self) -> &WhatsApp {
        &self.inner.whatsapp
    }

    /// Unit printed after prices.
    #[must_use]
    pub fn price_unit(&self) -> &str {
        &self.inner.config.price_unit
    }

    #[must_use]
    pub fn content_security_policy(&self) -> &HeaderValue {
        &self.inner.csp
    }

    /// Visitor session store.
    #[must_use]
    pub fn sessions(&self) -> &SqliteStore {
        &self.inner.sessions
    }
}
