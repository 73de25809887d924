//! Core value types for Curio.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod id;
pub mod price;

pub use category::{Category, CategoryFilter, UnknownCategory};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
