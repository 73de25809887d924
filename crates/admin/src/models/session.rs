//! Session-related types for admin authentication.
//!
//! The backend's auth session is mirrored into the cookie session so the
//! guard can attach the admin's token to writes and refresh it on expiry.

use chrono::{DateTime, Utc};
use curio_backend::{AuthSession, BearerToken};
use curio_core::{Email, Flash};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::admin_user::AdminRole;

/// Session-stored admin identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// User id assigned by the auth service.
    pub id: String,
    pub email: Email,
    pub role: AdminRole,
    /// Tokens from the last sign-in or refresh.
    pub session: AuthSession,
}

impl CurrentAdmin {
    #[must_use]
    pub fn from_session(session: AuthSession) -> Self {
        Self {
            id: session.user.id.clone(),
            email: session.user.email.clone(),
            role: AdminRole::Admin,
            session,
        }
    }

    /// Token sent with catalog writes and uploads.
    #[must_use]
    pub const fn access_token(&self) -> &BearerToken {
        &self.session.access_token
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.session.is_expired(now)
    }
}

/// Session keys for admin data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for notifications waiting for the next page.
    pub const FLASHES: &str = "flashes";
}

/// Queue a notification for the next rendered page.
pub async fn push_flash(session: &Session, flash: Flash) {
    let mut flashes: Vec<Flash> = session
        .get(keys::FLASHES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    flashes.push(flash);

    if let Err(e) = session.insert(keys::FLASHES, flashes).await {
        tracing::warn!(error = %e, "Failed to queue flash message");
    }
}

/// Remove and return all queued notifications.
pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(keys::FLASHES).await {
        Ok(flashes) => flashes.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use curio_backend::AuthUser;
    use tower_sessions::MemoryStore;

    use super::*;

    fn auth_session(expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token: BearerToken::new("access"),
            refresh_token: BearerToken::new("refresh"),
            expires_at,
            user: AuthUser {
                id: "user-1".to_string(),
                email: Email::parse("owner@curio.test").unwrap(),
            },
        }
    }

    #[test]
    fn test_current_admin_mirrors_auth_user() {
        let admin = CurrentAdmin::from_session(auth_session(Utc::now()));
        assert_eq!(admin.id, "user-1");
        assert_eq!(admin.email.as_str(), "owner@curio.test");
        assert_eq!(admin.role, AdminRole::Admin);
        assert_eq!(admin.access_token().expose(), "access");
    }

    #[test]
    fn test_expiry_follows_auth_session() {
        let now = Utc::now();
        let fresh = CurrentAdmin::from_session(auth_session(now + chrono::Duration::hours(1)));
        let stale = CurrentAdmin::from_session(auth_session(now - chrono::Duration::minutes(1)));
        assert!(!fresh.is_expired(now));
        assert!(stale.is_expired(now));
    }

    #[tokio::test]
    async fn test_flashes_are_drained_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        push_flash(&session, Flash::success("Product created successfully")).await;
        push_flash(&session, Flash::error("Error uploading image")).await;

        let flashes = take_flashes(&session).await;
        assert_eq!(flashes.len(), 2);
        assert!(flashes[1].is_error());
        assert!(take_flashes(&session).await.is_empty());
    }
}
