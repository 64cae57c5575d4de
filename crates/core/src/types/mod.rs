//! Core types for Marketlink.
//!
//! This module provides type-safe wrappers for the gateway's domain concepts.

pub mod catalog;
pub mod id;
pub mod identity;
pub mod token;

pub use catalog::{AttemptOutcome, CatalogAttempt, CatalogQuery, CatalogResult};
pub use id::*;
pub use identity::{GENERIC_DISPLAY_NAME, UpstreamIdentity};
pub use token::TokenSet;
