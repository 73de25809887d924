//! Authentication guard and extractors for admin.
//!
//! Every guarded request resolves the admin's session before the handler
//! runs:
//!
//! ```text
//! Loading ──► Authenticated(admin)   session present, token valid or refreshed
//!    │
//!    └──────► Unauthenticated        no session, or the single refresh failed
//! ```
//!
//! `Loading` is the lookup itself, so guarded handlers never render anything
//! until it settles. A refresh is attempted once per request; when it fails
//! the stored admin is cleared and the request is treated as signed out.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Where unauthenticated HTML requests are sent.
pub const LOGIN_PATH: &str = "/admin/login";

/// Path prefix answered with 401 instead of a redirect.
pub const API_PREFIX: &str = "/admin/api/";

/// Settled outcome of the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Authenticated(CurrentAdmin),
    Unauthenticated,
}

/// Resolve the admin behind `session`, refreshing an expired token once.
pub async fn resolve(state: &AppState, session: &Session) -> GuardState {
    let admin = match session.get::<CurrentAdmin>(session_keys::CURRENT_ADMIN).await {
        Ok(Some(admin)) => admin,
        Ok(None) => return GuardState::Unauthenticated,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read admin session");
            return GuardState::Unauthenticated;
        }
    };

    if !admin.is_expired(Utc::now()) {
        return GuardState::Authenticated(admin);
    }

    match state
        .backend()
        .refresh_session(&admin.session.refresh_token)
        .await
    {
        Ok(refreshed) => {
            let admin = CurrentAdmin::from_session(refreshed);
            if let Err(e) = set_current_admin(session, &admin).await {
                tracing::warn!(error = %e, "Failed to store refreshed admin session");
            }
            tracing::debug!(admin_id = %admin.id, "admin session refreshed");
            GuardState::Authenticated(admin)
        }
        Err(e) => {
            tracing::info!(error = %e, admin_id = %admin.id, "admin session refresh failed");
            if let Err(e) = clear_current_admin(session).await {
                tracing::warn!(error = %e, "Failed to clear admin session");
            }
            GuardState::Unauthenticated
        }
    }
}

/// Extractor that requires admin authentication.
///
/// If the admin is not logged in, returns a redirect to the login page
/// for HTML requests, or 401 Unauthorized for API requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when admin authentication is required but the user is not logged in.
#[derive(Debug, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl AdminAuthRejection {
    fn for_path(path: &str) -> Self {
        if path.starts_with(API_PREFIX) {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        match resolve(state, &session).await {
            GuardState::Authenticated(admin) => {
                set_sentry_user(&admin.id, Some(admin.email.as_str()));
                Ok(Self(admin))
            }
            GuardState::Unauthenticated => Err(AdminAuthRejection::for_path(parts.uri.path())),
        }
    }
}

/// Extractor that optionally gets the current admin.
///
/// Unlike `RequireAdminAuth`, this does not reject the request if the admin
/// is not logged in.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl FromRequestParts<AppState> for OptionalAdminAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(Self(None));
        };

        Ok(Self(match resolve(state, &session).await {
            GuardState::Authenticated(admin) => Some(admin),
            GuardState::Unauthenticated => None,
        }))
    }
}

/// Helper to set the current admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    clear_sentry_user();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration};
    use curio_backend::{AuthSession, AuthUser, BearerToken};
    use curio_core::Email;
    use tower_sessions::MemoryStore;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::tests::test_config;

    fn admin(expires_at: DateTime<Utc>) -> CurrentAdmin {
        CurrentAdmin::from_session(AuthSession {
            access_token: BearerToken::new("old-access"),
            refresh_token: BearerToken::new("old-refresh"),
            expires_at,
            user: AuthUser {
                id: "user-1".to_string(),
                email: Email::parse("owner@curio.test").unwrap(),
            },
        })
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn state(server: &MockServer) -> AppState {
        AppState::new(test_config(&server.uri())).unwrap()
    }

    #[test]
    fn test_rejection_depends_on_path() {
        assert_eq!(
            AdminAuthRejection::for_path("/admin/dashboard"),
            AdminAuthRejection::RedirectToLogin
        );
        assert_eq!(
            AdminAuthRejection::for_path("/admin/api/products"),
            AdminAuthRejection::Unauthorized
        );
        let response = AdminAuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.headers()["location"], LOGIN_PATH);
    }

    #[tokio::test]
    async fn test_empty_session_is_unauthenticated() {
        let server = MockServer::start().await;
        assert_eq!(
            resolve(&state(&server), &session()).await,
            GuardState::Unauthenticated
        );
    }

    #[tokio::test]
    async fn test_valid_session_skips_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let session = session();
        let current = admin(Utc::now() + Duration::hours(1));
        set_current_admin(&session, &current).await.unwrap();

        assert_eq!(
            resolve(&state(&server), &session).await,
            GuardState::Authenticated(current)
        );
    }

    #[tokio::test]
    async fn test_expired_session_is_refreshed_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-access",
                "refresh_token": "new-refresh",
                "expires_in": 3600,
                "user": {"id": "user-1", "email": "owner@curio.test"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = session();
        set_current_admin(&session, &admin(Utc::now() - Duration::minutes(5)))
            .await
            .unwrap();

        let GuardState::Authenticated(refreshed) = resolve(&state(&server), &session).await else {
            panic!("refresh should authenticate");
        };
        assert_eq!(refreshed.access_token().expose(), "new-access");

        let stored: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.session.refresh_token.expose(), "new-refresh");
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error_code": "refresh_token_not_found",
                "msg": "Invalid Refresh Token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = session();
        set_current_admin(&session, &admin(Utc::now() - Duration::minutes(5)))
            .await
            .unwrap();

        assert_eq!(
            resolve(&state(&server), &session).await,
            GuardState::Unauthenticated
        );
        assert!(
            session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .unwrap()
                .is_none()
        );
    }
}
