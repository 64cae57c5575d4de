//! Upstream commerce platform integration.
//!
//! # OAuth Flow
//!
//! 1. [`AuthorizationRequestBuilder`] issues a single-use state token and
//!    builds the `/accounts/sso` URL
//! 2. The platform redirects back to `/auth/platform/callback`
//! 3. [`TokenExchangeClient`] trades the authorization code for a
//!    [`TokenSet`](marketlink_core::TokenSet)
//! 4. [`IdentityFetcher`] resolves the user's profile with the new token
//!
//! # Catalog
//!
//! The platform exposes several undocumented variants of the "list my
//! products" endpoint. [`EndpointFallbackResolver`] walks an ordered list of
//! candidates and reports every attempt, successful or not.
//!
//! # Example
//!
//! ```rust,ignore
//! use marketlink_gateway::platform::{EndpointFallbackResolver, build_http_client};
//!
//! let http = build_http_client(config.platform.request_timeout)?;
//! let resolver = EndpointFallbackResolver::new(http, &config.platform.api_url);
//!
//! match resolver.resolve_catalog(&query).await {
//!     Ok(result) => println!("{} answered", result.succeeded_endpoint),
//!     Err(PlatformError::AllEndpointsFailed { diagnostics }) => { /* ... */ }
//!     Err(e) => return Err(e.into()),
//! }
//! ```

mod authorize;
mod catalog;
mod identity;
mod state_token;
mod token;

pub use authorize::{
    AuthorizationRequest, AuthorizationRequestBuilder, CATALOG_SCOPES, authorization_url,
};
pub use catalog::{CandidateEndpoint, DEFAULT_CANDIDATES, EndpointFallbackResolver};
pub use identity::{IdentityFetcher, identity_from_profile};
pub use state_token::{
    ATTEMPT_TTL, AttemptStore, AuthorizationAttempt, InMemoryAttemptStore, StateTokenIssuer,
};
pub use token::TokenExchangeClient;

use std::time::Duration;

use marketlink_core::CatalogAttempt;
use thiserror::Error;

/// User agent sent with every upstream request.
const USER_AGENT: &str = concat!("marketlink-gateway/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when talking to the upstream platform.
///
/// Upstream response bodies are kept on the variants for diagnostics but are
/// not part of the `Display` output, which may reach logs and Sentry.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// A required OAuth client setting is absent.
    #[error("platform configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    /// The callback's state is unknown, already used, or expired.
    #[error("invalid or expired authorization state")]
    InvalidState,

    /// The token endpoint rejected the authorization code.
    #[error("token exchange failed ({})", describe_status(.status.as_ref()))]
    TokenExchangeFailed {
        /// Upstream HTTP status, `None` when no response was received.
        status: Option<u16>,
        /// Raw upstream body or transport error text.
        body: String,
    },

    /// The "current user" endpoint did not return a usable profile.
    #[error("identity fetch failed ({})", describe_status(.status.as_ref()))]
    IdentityFetchFailed {
        /// Upstream HTTP status, `None` when no response was received.
        status: Option<u16>,
        /// Raw upstream body or transport error text.
        body: String,
    },

    /// Every candidate catalog endpoint was tried and none succeeded.
    #[error("all {} catalog endpoint attempts failed", .diagnostics.len())]
    AllEndpointsFailed {
        /// One record per attempted candidate, in order.
        diagnostics: Vec<CatalogAttempt>,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl PlatformError {
    /// Per-candidate diagnostics, if this is an aggregate catalog failure.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&[CatalogAttempt]> {
        match self {
            Self::AllEndpointsFailed { diagnostics } => Some(diagnostics),
            _ => None,
        }
    }
}

fn describe_status(status: Option<&u16>) -> String {
    status.map_or_else(|| "no response".to_string(), |s| format!("HTTP {s}"))
}

/// Build the HTTP client shared by every platform component.
///
/// Each request is bounded by `timeout`. Redirects are not followed: a 3xx
/// from the platform is treated as a failed response.
///
/// # Errors
///
/// Returns `PlatformError::Client` if the TLS backend cannot be initialized.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, PlatformError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Read a response body for diagnostics without failing the caller.
async fn body_text(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {e}>"))
}
