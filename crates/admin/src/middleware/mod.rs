//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions, SameSite=Strict)
//! 4. Security headers (stricter CSP for admin)
//!
//! Authentication is not a layer: guarded handlers take a
//! [`RequireAdminAuth`] argument.

pub mod auth;
pub mod flash;
pub mod security_headers;
pub mod session;

pub use auth::{
    AdminAuthRejection, GuardState, OptionalAdminAuth, RequireAdminAuth, clear_current_admin,
    set_current_admin,
};
pub use flash::Flashes;
pub use security_headers::{content_security_policy, security_headers_middleware};
pub use session::create_session_layer;
