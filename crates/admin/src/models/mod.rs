//! Domain models for admin.

pub mod admin_user;
pub mod session;

pub use admin_user::AdminRole;
pub use session::{CurrentAdmin, keys as session_keys, push_flash, take_flashes};
