//! Authentication route handlers for admin.
//!
//! Email and password are checked by the backend's auth service; the
//! resulting session is mirrored into the admin cookie session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use curio_backend::BackendError;
use curio_core::{Email, Flash};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::{Flashes, OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, push_flash, session_keys};
use crate::routes::dashboard::AdminUserView;
use crate::state::AppState;

const WELCOME_MESSAGE: &str = "Welcome back, admin!";
const INVALID_CREDENTIALS: &str = "Invalid credentials";
const SIGNED_OUT_MESSAGE: &str = "Signed out successfully";

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub admin_user: Option<AdminUserView>,
    pub current_path: String,
    pub flashes: Vec<Flash>,
    /// Email typed on the previous attempt.
    pub email: String,
}

impl LoginTemplate {
    fn new(flashes: Vec<Flash>, email: String) -> Self {
        Self {
            admin_user: None,
            current_path: "/admin/login".to_string(),
            flashes,
            email,
        }
    }
}

/// Render the login page.
///
/// GET /admin/login
#[instrument(skip_all)]
pub async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Flashes(flashes): Flashes,
) -> Response {
    if admin.is_some() {
        return Redirect::to("/admin/dashboard").into_response();
    }
    LoginTemplate::new(flashes, String::new()).into_response()
}

/// Sign in with email and password.
///
/// POST /admin/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let rejected = |email: String| {
        (
            StatusCode::UNAUTHORIZED,
            LoginTemplate::new(vec![Flash::error(INVALID_CREDENTIALS)], email),
        )
            .into_response()
    };

    let Ok(email) = Email::parse(&form.email) else {
        tracing::debug!("login with malformed email");
        return rejected(form.email);
    };
    let password = SecretString::from(form.password);

    let auth = match state.backend().sign_in_with_password(&email, &password).await {
        Ok(auth) => auth,
        Err(BackendError::InvalidCredentials) => {
            tracing::info!(email = %email, "admin login rejected");
            return rejected(form.email);
        }
        Err(e) => {
            tracing::error!(error = %e, "admin login failed");
            return rejected(form.email);
        }
    };

    let admin = CurrentAdmin::from_session(auth);

    // New session id on privilege change
    if let Err(e) = session.cycle_id().await {
        tracing::warn!(error = %e, "Failed to cycle session id");
    }
    if let Err(e) = set_current_admin(&session, &admin).await {
        tracing::error!(error = %e, "Failed to store admin session");
        return rejected(form.email);
    }

    tracing::info!(admin_id = %admin.id, "admin signed in");
    push_flash(&session, Flash::success(WELCOME_MESSAGE)).await;
    Redirect::to("/admin/dashboard").into_response()
}

/// Logout and clear session.
///
/// The backend session is revoked on a best-effort basis: a failure there
/// is logged and the local session is cleared anyway.
///
/// POST /admin/logout
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    let admin = session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten();

    if let Some(admin) = &admin
        && let Err(e) = state.backend().sign_out(admin.access_token()).await
    {
        tracing::warn!(error = %e, admin_id = %admin.id, "Error signing out of backend");
    }

    if let Err(e) = clear_current_admin(&session).await {
        tracing::error!(error = %e, "Failed to clear admin session");
    }
    if let Err(e) = session.cycle_id().await {
        tracing::warn!(error = %e, "Failed to cycle session id");
    }

    push_flash(&session, Flash::success(SIGNED_OUT_MESSAGE)).await;
    Redirect::to("/admin/login")
}
