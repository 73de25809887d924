//! Backend error types.

use thiserror::Error;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request lacked a valid token, or the token's owner may not do this.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Email/password sign-in was rejected.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A file was refused before upload.
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// The configured base URL is unusable.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl BackendError {
    /// Whether the error means the caller's token is missing, expired, or
    /// not allowed to perform the request.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::InvalidCredentials)
    }
}

/// Error body shapes returned by the table, storage, and auth services.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Best human-readable message in a raw error body.
    pub(crate) fn message_from(raw: &str) -> String {
        let parsed: Self = serde_json::from_str(raw).unwrap_or_default();
        parsed
            .message
            .or(parsed.msg)
            .or(parsed.error_description)
            .or_else(|| {
                parsed.error.map(|value| match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
            })
            .unwrap_or_else(|| raw.trim().to_string())
    }
}
