//! Curio Backend - client for the hosted backend-as-a-service.
//!
//! The shop owns no database. Products live in a table exposed over a
//! PostgREST-style REST API, product images in an object storage bucket
//! with public URLs, and admin accounts in a password-based auth service.
//! All three share a base URL and a public API key.
//!
//! # Modules
//!
//! - [`client`] - Connection settings and shared request plumbing
//! - [`catalog`] - Product list/get/create/update/delete
//! - [`storage`] - Image upload and public URLs
//! - [`auth`] - Sign in, refresh, current user, sign out
//! - [`error`] - [`BackendError`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod catalog;
pub mod client;
pub mod error;
pub mod storage;

pub use auth::{AuthSession, AuthUser, BearerToken};
pub use client::{BackendClient, BackendConfig};
pub use error::BackendError;
pub use storage::{DEFAULT_BUCKET, ImageUpload};
