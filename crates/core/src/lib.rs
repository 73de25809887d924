//! Curio Core - Shared domain library.
//!
//! This crate provides the types and pure logic used across all Curio
//! components:
//! - `storefront` - Public shop (catalog, cart, checkout handoff)
//! - `admin` - Catalog administration panel
//! - `cli` - Command-line catalog tools
//!
//! # Architecture
//!
//! The core crate contains only types and logic - no I/O, no HTTP clients.
//! Everything that talks to the backend lives in `curio-backend`.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, and categories
//! - [`product`] - Catalog products and editable drafts
//! - [`cart`] - The visitor's cart
//! - [`catalog`] - Filtering, ordering, and pagination
//! - [`checkout`] - Order summaries, contact validation, and chat links
//! - [`flash`] - Notifications carried to the next page

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod flash;
pub mod product;
pub mod types;

pub use cart::{Cart, CartChange, CartItem, MAX_LINE_QUANTITY};
pub use catalog::{CatalogQuery, Page, PriceRange, SortOrder, paginate, select};
pub use checkout::{Contact, ContactDetails, ContactError, OrderLine, OrderSummary, WhatsApp};
pub use flash::{Flash, FlashKind};
pub use product::{DraftError, MAX_PRODUCT_IMAGES, PLACEHOLDER_IMAGE, Product, ProductDraft};
pub use types::*;
