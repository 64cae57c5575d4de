//! Marketlink gateway library.
//!
//! Connects vendor accounts on an external commerce platform to Marketlink:
//! runs the platform's OAuth authorization-code flow, keeps the resulting
//! login in the browser session, and fetches the vendor's product catalog
//! from whichever of the platform's catalog endpoints answers.
//!
//! The binary in `main.rs` wires these modules into an axum server; they are
//! exposed as a library so they can be exercised from tests and the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod platform;
pub mod routes;
pub mod services;
pub mod state;
