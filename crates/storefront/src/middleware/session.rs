//! Session middleware configuration.
//!
//! Visitor sessions (cart and pending notifications) are stored in a
//! `SQLite` database through tower-sessions, so a cart survives reloads,
//! restarts and deploys for as long as the cookie lives. Expired rows are
//! swept by a background task.

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::task::JoinHandle;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "curio_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// How often expired sessions are deleted.
const EXPIRED_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Connect to the session database and create the sessions table if needed.
///
/// `sqlite::memory:` is served from a single connection that is never
/// recycled, so the database lives as long as the store.
///
/// # Errors
///
/// Returns an error if the URL is invalid, the database cannot be opened,
/// or the migration fails.
pub async fn open_session_store(database_url: &str) -> Result<SqliteStore, sqlx::Error> {
    let options = database_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true);

    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new().connect_with(options).await?
    };

    let store = SqliteStore::new(pool);
    store.migrate().await?;
    Ok(store)
}

/// Delete expired sessions every hour until the task is dropped.
pub fn spawn_expired_session_cleanup(store: SqliteStore) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = store
            .continuously_delete_expired(EXPIRED_SWEEP_INTERVAL)
            .await
        {
            tracing::error!(error = %e, "Expired session cleanup stopped");
        }
    })
}

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer(
    store: &SqliteStore,
    config: &StorefrontConfig,
) -> SessionManagerLayer<SqliteStore> {
    SessionManagerLayer::new(store.clone())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
