//! Session middleware configuration for the gateway.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. `SameSite=Lax`
//! is required: the platform callback arrives as a cross-site top-level
//! navigation and must carry the session cookie.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::GatewayConfig;

/// Session cookie name for the gateway.
pub const SESSION_COOKIE_NAME: &str = "mlk_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The `gateway.session` table is provisioned outside this service.
///
/// # Panics
///
/// Panics if the schema name or table name is invalid (should never happen
/// with hardcoded "gateway" and "session" values).
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &GatewayConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("gateway")
        .expect("valid schema name")
        .with_table_name("session")
        .expect("valid table name");

    with_cookie_settings(SessionManagerLayer::new(store), config)
}

/// Apply the gateway's cookie settings to any session layer.
///
/// Shared by the production store and in-memory test stores.
#[must_use]
pub fn with_cookie_settings<S>(
    layer: SessionManagerLayer<S>,
    config: &GatewayConfig,
) -> SessionManagerLayer<S>
where
    S: tower_sessions::SessionStore,
{
    let is_secure = config.base_url.starts_with("https://");

    layer
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
