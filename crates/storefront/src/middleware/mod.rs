//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with a `SQLite` store)
//! 4. Security headers (CSP, frame and isolation policies)

pub mod htmx;
pub mod page;
pub mod security_headers;
pub mod session;

pub use htmx::HxRequest;
pub use page::PageContext;
pub use security_headers::{content_security_policy, security_headers_middleware};
pub use session::{create_session_layer, open_session_store, spawn_expired_session_cleanup};
