//! `EmailJS` client for the email order handoff.
//!
//! The order is rendered to HTML on our side and sent as template
//! parameters; the `EmailJS` template only has to print `{{{html_content}}}`.
//! The account must allow API calls from non-browser applications.

use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use curio_core::{Contact, OrderSummary};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

const SEND_PATH: &str = "/api/v1.0/email/send";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur when sending through `EmailJS`.
#[derive(Debug, Error)]
pub enum EmailJsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The order email could not be rendered.
    #[error("Render error: {0}")]
    Render(#[from] askama::Error),
}

/// `EmailJS` account settings.
///
/// Implements `Debug` manually to redact the private key.
#[derive(Clone)]
pub struct EmailJsConfig {
    /// API origin, without the `/api/...` path.
    pub api_url: String,
    pub service_id: String,
    pub template_id: String,
    /// Account public key, sent as `user_id`.
    pub public_key: String,
    /// Access token required when the account runs in strict mode.
    pub private_key: Option<SecretString>,
}

impl std::fmt::Debug for EmailJsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailJsConfig")
            .field("api_url", &self.api_url)
            .field("service_id", &self.service_id)
            .field("template_id", &self.template_id)
            .field("public_key", &self.public_key)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Parameters substituted into the `EmailJS` template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderEmailParams {
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub user_address: String,
    pub message: String,
    pub html_content: String,
}

impl OrderEmailParams {
    /// Build the parameters for an order, rendering the HTML body.
    ///
    /// # Errors
    ///
    /// Returns [`EmailJsError::Render`] if the template fails.
    pub fn for_order(
        contact: &Contact,
        summary: &OrderSummary,
        price_unit: &str,
    ) -> Result<Self, EmailJsError> {
        let html_content = OrderEmailTemplate::new(contact, summary, price_unit).render()?;
        Ok(Self {
            user_name: contact.name.clone(),
            user_email: contact.email.to_string(),
            user_phone: contact.phone.clone(),
            user_address: contact.address.clone(),
            message: contact.message.clone(),
            html_content,
        })
    }
}

/// A rendered order line.
struct EmailLine {
    title: String,
    image_url: Option<String>,
    quantity: u32,
    line_total: String,
}

#[derive(Template)]
#[template(path = "emails/order.html")]
struct OrderEmailTemplate<'a> {
    contact: &'a Contact,
    lines: Vec<EmailLine>,
    total: String,
}

impl<'a> OrderEmailTemplate<'a> {
    fn new(contact: &'a Contact, summary: &OrderSummary, price_unit: &str) -> Self {
        let lines = summary
            .lines
            .iter()
            .map(|line| EmailLine {
                title: line.title.clone(),
                image_url: line.image_url.clone(),
                quantity: line.quantity,
                line_total: line.line_total.label(price_unit),
            })
            .collect();

        Self {
            contact,
            lines,
            total: summary.total.label(price_unit),
        }
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: &'a OrderEmailParams,
}

/// `EmailJS` REST client.
#[derive(Clone)]
pub struct EmailJsClient {
    inner: Arc<EmailJsClientInner>,
}

struct EmailJsClientInner {
    client: reqwest::Client,
    config: EmailJsConfig,
}

impl EmailJsClient {
    /// Create a new `EmailJS` client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: EmailJsConfig) -> Result<Self, EmailJsError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(EmailJsClientInner { client, config }),
        })
    }

    /// Send one order email.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or `EmailJS` refuses it.
    #[instrument(skip_all, fields(template_id = %self.inner.config.template_id))]
    pub async fn send(&self, params: &OrderEmailParams) -> Result<(), EmailJsError> {
        let config = &self.inner.config;
        let url = format!("{}{SEND_PATH}", config.api_url.trim_end_matches('/'));
        let body = SendRequest {
            service_id: &config.service_id,
            template_id: &config.template_id,
            user_id: &config.public_key,
            access_token: config.private_key.as_ref().map(ExposeSecret::expose_secret),
            template_params: params,
        };

        let response = self.inner.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailJsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!("order email sent");
        Ok(())
    }
}
