//! Session-backed models for the storefront.

pub mod session;

pub use session::{keys as session_keys, load_cart, push_flash, save_cart, take_flashes};
