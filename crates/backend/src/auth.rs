//! Password authentication against the hosted auth service.
//!
//! Sign-in uses the password grant and yields an [`AuthSession`] holding a
//! short-lived access token and a refresh token. The session is mirrored
//! into the admin's cookie session; the backend stays the source of truth.

use chrono::{DateTime, Duration, Utc};
use curio_core::Email;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::BackendClient;
use crate::error::BackendError;

/// Treat tokens this close to expiry as already expired.
const EXPIRY_SKEW_SECONDS: i64 = 30;

/// An access or refresh token.
///
/// Serializable so it can live in a cookie session; `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for request headers only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// The user behind a session, as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Email,
}

/// A signed-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: BearerToken,
    pub refresh_token: BearerToken,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl AuthSession {
    /// Whether the access token has expired (or is about to) at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECONDS) >= self.expires_at
    }
}

/// Raw token response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in.unwrap_or(3600)));

        AuthSession {
            access_token: BearerToken(self.access_token),
            refresh_token: BearerToken(self.refresh_token),
            expires_at,
            user: self.user,
        }
    }
}

impl BackendClient {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidCredentials`] if the pair is rejected.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });
        let session = self.token_grant("password", &body).await.map_err(|e| match e {
            BackendError::Api { status: 400, .. } | BackendError::Unauthorized(_) => {
                BackendError::InvalidCredentials
            }
            other => other,
        })?;
        tracing::info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] if the refresh token is no
    /// longer valid.
    #[instrument(skip_all)]
    pub async fn refresh_session(
        &self,
        refresh_token: &BearerToken,
    ) -> Result<AuthSession, BackendError> {
        let body = serde_json::json!({ "refresh_token": refresh_token.expose() });
        self.token_grant("refresh_token", &body)
            .await
            .map_err(|e| match e {
                BackendError::Api { status: 400, message } => BackendError::Unauthorized(message),
                other => other,
            })
    }

    /// Fetch the user owning `token`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] if the token is invalid.
    #[instrument(skip_all)]
    pub async fn get_user(&self, token: &BearerToken) -> Result<AuthUser, BackendError> {
        let request = self.http().get(self.endpoint("auth/v1/user")?);
        let response = self.authorize(request, Some(token)).send().await?;
        Self::json(response, "get user").await
    }

    /// Revoke the session owning `token`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, token: &BearerToken) -> Result<(), BackendError> {
        let request = self.http().post(self.endpoint("auth/v1/logout")?);
        let response = self.authorize(request, Some(token)).send().await?;
        Self::check(response, "sign out").await?;
        Ok(())
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: &serde_json::Value,
    ) -> Result<AuthSession, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let request = self.http().post(url).json(body);
        let response = self.authorize(request, None).send().await?;
        let token: TokenResponse = Self::json(response, "token grant").await?;
        Ok(token.into_session(Utc::now()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token_json(expires_at: Option<i64>) -> serde_json::Value {
        serde_json::json!({
            "access_token": "access",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": expires_at,
            "refresh_token": "refresh",
            "user": {"id": "0b7c", "email": "owner@curio.test", "role": "authenticated"}
        })
    }

    #[test]
    fn test_token_response_uses_expires_at_when_present() {
        let now = Utc::now();
        let token: TokenResponse = serde_json::from_value(token_json(Some(1_900_000_000))).unwrap();
        let session = token.into_session(now);
        assert_eq!(session.expires_at.timestamp(), 1_900_000_000);
        assert_eq!(session.user.email.as_str(), "owner@curio.test");
    }

    #[test]
    fn test_token_response_falls_back_to_expires_in() {
        let now = Utc::now();
        let token: TokenResponse = serde_json::from_value(token_json(None)).unwrap();
        let session = token.into_session(now);
        assert_eq!(session.expires_at, now + Duration::seconds(3600));
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::seconds(3600 - 10)));
    }

    #[test]
    fn test_bearer_token_debug_is_redacted() {
        let token = BearerToken::new("eyJhbGciOiJIUzI1NiJ9.secret");
        assert!(!format!("{token:?}").contains("secret"));
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"eyJhbGciOiJIUzI1NiJ9.secret\"");
    }
}
