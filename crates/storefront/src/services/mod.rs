//! Outbound services used by the storefront besides the backend.
//!
//! - `emailjs` - Email order handoff through the `EmailJS` REST API

pub mod emailjs;

pub use emailjs::{EmailJsClient, EmailJsConfig, EmailJsError, OrderEmailParams};
