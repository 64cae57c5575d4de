//! Authorization URL check.
//!
//! Builds the same URL the gateway's login route would redirect to, so a
//! deployment's client id and redirect URI can be verified without a browser.
//!
//! # Environment Variables
//!
//! - `PLATFORM_URL` - Platform accounts base URL
//! - `PLATFORM_API_URL` - Platform API base URL
//! - `PLATFORM_CLIENT_ID` - OAuth client id
//! - `PLATFORM_REDIRECT_URI` - Registered callback URL

use marketlink_gateway::config::PlatformConfig;
use marketlink_gateway::platform::{AuthorizationRequestBuilder, StateTokenIssuer};

use super::CommandError;

/// Print the authorization URL for the configured OAuth client.
///
/// The embedded state is freshly generated and not redeemable by a running
/// gateway.
///
/// # Errors
///
/// Returns an error if the platform configuration is incomplete.
#[allow(clippy::print_stdout)]
pub fn print_url() -> Result<(), CommandError> {
    dotenvy::dotenv().ok();

    let platform = PlatformConfig::from_env()?;
    let builder = AuthorizationRequestBuilder::new(
        platform.accounts_url.clone(),
        StateTokenIssuer::in_memory(),
    );

    let request = builder.begin(
        platform.client_id.as_deref(),
        platform.redirect_uri.as_deref(),
    )?;

    if platform.client_secret.is_none() {
        tracing::warn!("PLATFORM_CLIENT_SECRET is not set; callbacks will fail with config_error");
    }

    println!("{}", request.url);
    Ok(())
}
