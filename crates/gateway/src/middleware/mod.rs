//! HTTP middleware for the gateway.

pub mod session;

pub use session::{SESSION_COOKIE_NAME, create_session_layer, with_cookie_settings};
