//! Integration tests for the Marketlink gateway.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketlink-integration-tests
//! ```
//!
//! No database is needed: the gateway under test uses an in-memory session
//! store and talks to a `wiremock` stand-in for the platform.
//!
//! # Test Categories
//!
//! - `login_flow` - Browser-style login, callback, session and logout
//! - `catalog_resolution` - Endpoint cascade against the mock platform

use std::net::SocketAddr;
use std::time::Duration;

use marketlink_gateway::config::{GatewayConfig, PlatformConfig};
use marketlink_gateway::middleware::with_cookie_settings;
use marketlink_gateway::routes;
use marketlink_gateway::state::AppState;
use secrecy::SecretString;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use wiremock::MockServer;

/// OAuth client id the test gateway is configured with.
pub const TEST_CLIENT_ID: &str = "integration-client";

/// A gateway served on an ephemeral local port.
pub struct TestGateway {
    /// Base URL of the running gateway.
    pub base_url: String,
    /// Cookie-keeping client that never follows redirects.
    pub client: reqwest::Client,
}

impl TestGateway {
    /// Absolute URL for a gateway path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Gateway configuration pointing every platform URL at `platform`.
///
/// # Panics
///
/// Panics if the fixed loopback address fails to parse.
#[must_use]
pub fn test_config(platform: &MockServer) -> GatewayConfig {
    GatewayConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: "127.0.0.1".parse().expect("loopback address"),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        platform: PlatformConfig {
            accounts_url: platform.uri(),
            api_url: platform.uri(),
            client_id: Some(TEST_CLIENT_ID.to_string()),
            client_secret: Some(SecretString::from("Qz7#kL2$wP9mX4vN")),
            redirect_uri: Some("http://127.0.0.1/auth/platform/callback".to_string()),
            request_timeout: Duration::from_secs(5),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Serve the gateway router with `config` and return a client for it.
///
/// # Panics
///
/// Panics if the listener cannot be bound or a client cannot be built.
pub async fn spawn_gateway(config: GatewayConfig) -> TestGateway {
    let session_layer =
        with_cookie_settings(SessionManagerLayer::new(MemoryStore::default()), &config);
    let state = AppState::new(config).expect("application state");

    let app = routes::routes().layer(session_layer).with_state(state);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("gateway server");
    });

    TestGateway {
        base_url: format!("http://{addr}"),
        client: browser(),
    }
}

/// A client with its own empty cookie jar that never follows redirects.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("test client")
}

/// Read the `Location` header of a redirect response.
///
/// # Panics
///
/// Panics if the header is missing or not valid UTF-8.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .expect("Location header")
        .to_str()
        .expect("ASCII Location")
        .to_string()
}
