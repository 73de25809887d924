//! Shared HTTP plumbing for the hosted backend.
//!
//! Every service (table API, storage, auth) lives under one base URL and
//! expects the project's public `apikey` header on each request. Calls made
//! on behalf of a signed-in admin additionally carry that admin's bearer
//! token; anonymous calls use the public key as bearer.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::BearerToken;
use crate::error::{BackendError, ErrorBody};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend connection settings.
///
/// Implements `Debug` manually to redact the key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Project base URL (e.g. `https://abcd.supabase.co`).
    pub url: Url,
    /// Public (anon) API key.
    pub anon_key: SecretString,
}

impl BackendConfig {
    /// Build a config from a base URL string.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUrl`] if `url` does not parse.
    pub fn new(url: &str, anon_key: SecretString) -> Result<Self, BackendError> {
        let normalised = format!("{}/", url.trim().trim_end_matches('/'));
        Ok(Self {
            url: Url::parse(&normalised)?,
            anon_key,
        })
    }

    /// Host of the base URL, used to allow backend images in the CSP.
    #[must_use]
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

/// Client for the hosted backend.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the key is not a
    /// valid header value.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| BackendError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("curio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                http,
                base_url: config.url.clone(),
                anon_key: config.anon_key.clone(),
            }),
        })
    }

    /// Base URL this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Check that the backend answers.
    ///
    /// # Errors
    ///
    /// Returns error if the auth service health endpoint is unreachable or
    /// reports a failure.
    pub async fn ping(&self) -> Result<(), BackendError> {
        let request = self.http().get(self.endpoint("auth/v1/health")?);
        let response = self.authorize(request, None).send().await?;
        Self::check(response, "health").await?;
        Ok(())
    }

    /// Resolve `path` (no leading slash) against the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.inner.base_url.join(path)?)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Attach the admin's token, or the public key when acting anonymously.
    pub(crate) fn authorize(
        &self,
        request: RequestBuilder,
        token: Option<&BearerToken>,
    ) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request.bearer_auth(self.inner.anon_key.expose_secret()),
        }
    }

    /// Decode a successful JSON response, or map the failure.
    pub(crate) async fn json<T: DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> Result<T, BackendError> {
        let response = Self::check(response, context).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| BackendError::Parse(format!("{context}: {e}")))
    }

    /// Map non-success statuses onto [`BackendError`].
    pub(crate) async fn check(response: Response, context: &str) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = ErrorBody::message_from(&raw);
        tracing::debug!(%status, context, %message, "backend request failed");

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized(message),
            StatusCode::NOT_FOUND => BackendError::NotFound(format!("{context}: {message}")),
            _ => BackendError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}
