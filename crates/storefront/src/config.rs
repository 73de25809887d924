//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `BACKEND_URL` - Base URL of the hosted backend
//! - `BACKEND_ANON_KEY` - Public (anon) API key of the backend
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `EMAILJS_SERVICE_ID`, `EMAILJS_TEMPLATE_ID`, `EMAILJS_PUBLIC_KEY` -
//!   Email order handoff; all three or none
//! - `EMAILJS_PRIVATE_KEY` - `EmailJS` access token for strict mode
//! - `EMAILJS_API_URL` - `EmailJS` API (default: <https://api.emailjs.com>)
//! - `WHATSAPP_NUMBER` - Shop's WhatsApp number (default: +2120774054190)
//! - `PRICE_UNIT` - Label printed after prices (default: MAD)
//! - `SESSION_DATABASE_URL` - `SQLite` database for visitor sessions
//!   (default: sqlite://curio-sessions.db)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use curio_backend::BackendConfig;
use secrecy::SecretString;
use thiserror::Error;

use crate::services::emailjs::EmailJsConfig;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Shop number used when `WHATSAPP_NUMBER` is unset.
pub const DEFAULT_WHATSAPP_NUMBER: &str = "+2120774054190";

/// Display unit used when `PRICE_UNIT` is unset.
pub const DEFAULT_PRICE_UNIT: &str = "MAD";

/// Session database used when `SESSION_DATABASE_URL` is unset.
pub const DEFAULT_SESSION_DATABASE_URL: &str = "sqlite://curio-sessions.db";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Hosted backend connection
    pub backend: BackendConfig,
    /// Email order handoff, disabled when `None`
    pub emailjs: Option<EmailJsConfig>,
    /// Shop's WhatsApp number in international format
    pub whatsapp_number: String,
    /// Unit printed after every price
    pub price_unit: String,
    /// `SQLite` database holding visitor sessions
    pub session_database_url: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Error event sample rate
    pub sentry_sample_rate: f32,
    /// Performance transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;

        Ok(Self {
            host,
            port,
            base_url,
            backend: backend_from_env()?,
            emailjs: emailjs_from_env()?,
            whatsapp_number: get_env_or_default("WHATSAPP_NUMBER", DEFAULT_WHATSAPP_NUMBER),
            price_unit: get_env_or_default("PRICE_UNIT", DEFAULT_PRICE_UNIT),
            session_database_url: get_env_or_default(
                "SESSION_DATABASE_URL",
                DEFAULT_SESSION_DATABASE_URL,
            ),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Backend URL and anon key.
///
/// The anon key is public by design of the backend, so it is only checked
/// for placeholders, not for entropy.
fn backend_from_env() -> Result<BackendConfig, ConfigError> {
    let url = get_required_env("BACKEND_URL")?;
    let anon_key = get_required_env("BACKEND_ANON_KEY")?;
    reject_placeholder(&anon_key, "BACKEND_ANON_KEY")?;

    BackendConfig::new(&url, SecretString::from(anon_key))
        .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_URL".to_string(), e.to_string()))
}

/// `EmailJS` settings, all-or-nothing.
fn emailjs_from_env() -> Result<Option<EmailJsConfig>, ConfigError> {
    let service_id = get_optional_env("EMAILJS_SERVICE_ID");
    let template_id = get_optional_env("EMAILJS_TEMPLATE_ID");
    let public_key = get_optional_env("EMAILJS_PUBLIC_KEY");

    let (service_id, template_id, public_key) = match (service_id, template_id, public_key) {
        (None, None, None) => return Ok(None),
        (Some(service_id), Some(template_id), Some(public_key)) => {
            (service_id, template_id, public_key)
        }
        (service_id, template_id, _) => {
            let missing = if service_id.is_none() {
                "EMAILJS_SERVICE_ID"
            } else if template_id.is_none() {
                "EMAILJS_TEMPLATE_ID"
            } else {
                "EMAILJS_PUBLIC_KEY"
            };
            return Err(ConfigError::MissingEnvVar(missing.to_string()));
        }
    };

    let private_key = match get_optional_env("EMAILJS_PRIVATE_KEY") {
        Some(value) => {
            validate_secret_strength(&value, "EMAILJS_PRIVATE_KEY")?;
            Some(SecretString::from(value))
        }
        None => None,
    };

    Ok(Some(EmailJsConfig {
        api_url: get_env_or_default("EMAILJS_API_URL", "https://api.emailjs.com"),
        service_id,
        template_id,
        public_key,
        private_key,
    }))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get a sample rate in `0.0..=1.0`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject values copied verbatim from a sample `.env`.
fn reject_placeholder(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(())
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    reject_placeholder(secret, var_name)?;

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// A config pointing at `backend_url`, for router tests.
    pub(crate) fn test_config(backend_url: &str) -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            backend: BackendConfig::new(backend_url, SecretString::from("anon-test-key")).unwrap(),
            emailjs: None,
            whatsapp_number: DEFAULT_WHATSAPP_NUMBER.to_string(),
            price_unit: DEFAULT_PRICE_UNIT.to_string(),
            session_database_url: "sqlite::memory:".to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-emailjs-token", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_anon_key_placeholder_rejected() {
        assert!(reject_placeholder("put-your-anon-key-here", "BACKEND_ANON_KEY").is_err());
        assert!(reject_placeholder("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9", "BACKEND_ANON_KEY").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config("http://127.0.0.1:54321");
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_https());
    }

    #[test]
    fn test_config_debug_redacts_keys() {
        let mut config = test_config("https://demo.example.co");
        config.emailjs = Some(EmailJsConfig {
            api_url: "https://api.emailjs.com".to_string(),
            service_id: "service_curio".to_string(),
            template_id: "template_order".to_string(),
            public_key: "pk_visible".to_string(),
            private_key: Some(SecretString::from("very-private-access-token")),
        });

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("service_curio"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("anon-test-key"));
        assert!(!debug_output.contains("very-private-access-token"));
    }
}
