//! Marketlink Core - Shared types library.
//!
//! This crate provides the types exchanged between the platform gateway and
//! the dashboard layer:
//! - `gateway` - OAuth callback handling and catalog retrieval
//! - `cli` - Operator tooling for probing the upstream platform
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no session
//! storage. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, token sets, upstream identities and catalog results

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
