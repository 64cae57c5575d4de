//! Platform OAuth callback handling.
//!
//! Turns the query parameters of `/auth/platform/callback` into exactly one
//! [`CallbackOutcome`]. Every outcome maps to a redirect; nothing escapes as
//! a server error.

use serde::Deserialize;
use tracing::instrument;

use crate::config::PlatformConfig;
use crate::models::SessionPersister;
use crate::platform::{IdentityFetcher, StateTokenIssuer, TokenExchangeClient};

/// Query parameters delivered by the platform on the callback.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CallbackParams {
    /// Authorization code.
    pub code: Option<String>,
    /// State value issued by the login route.
    pub state: Option<String>,
    /// Error code when the user denied access or the platform failed.
    pub error: Option<String>,
    /// Human readable error detail.
    pub error_description: Option<String>,
}

/// Terminal state of a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The platform reported an error instead of a code.
    UpstreamError,
    /// No authorization code was supplied.
    CodeMissing,
    /// State was absent, unknown, reused, expired, or issued to another
    /// browser session.
    InvalidState,
    /// An OAuth client setting is not configured.
    ConfigMissing(&'static str),
    /// The token endpoint rejected the code.
    ExchangeFailed,
    /// The user profile could not be loaded.
    IdentityFailed,
    /// The login could not be written to the session.
    SessionFailed,
    /// Login completed.
    Success {
        /// Display name to greet the user with, if one resolved.
        display_name: Option<String>,
    },
}

impl CallbackOutcome {
    /// Stable error code carried on the login redirect, if any.
    #[must_use]
    pub const fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::UpstreamError => Some("oauth_error"),
            Self::CodeMissing => Some("no_code"),
            Self::ConfigMissing(_) => Some("config_error"),
            Self::ExchangeFailed => Some("token_exchange_failed"),
            Self::IdentityFailed => Some("user_info_failed"),
            Self::SessionFailed => Some("session_error"),
            Self::InvalidState | Self::Success { .. } => None,
        }
    }

    /// Where the browser is sent next.
    #[must_use]
    pub fn redirect_location(&self) -> String {
        match self {
            Self::Success {
                display_name: Some(name),
            } => format!(
                "/dashboard?login=success&user={}",
                urlencoding::encode(name)
            ),
            Self::Success { display_name: None } => "/dashboard?login=success".to_string(),
            Self::InvalidState => "/login".to_string(),
            other => other
                .error_code()
                .map_or_else(|| "/login".to_string(), |code| format!("/login?error={code}")),
        }
    }

    /// Whether the login completed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Drives one callback from query parameters to a terminal outcome.
pub struct CallbackOrchestrator<'a> {
    platform: &'a PlatformConfig,
    issuer: &'a StateTokenIssuer,
    tokens: &'a TokenExchangeClient,
    identities: &'a IdentityFetcher,
}

impl<'a> CallbackOrchestrator<'a> {
    /// Create an orchestrator over the gateway's platform components.
    #[must_use]
    pub const fn new(
        platform: &'a PlatformConfig,
        issuer: &'a StateTokenIssuer,
        tokens: &'a TokenExchangeClient,
        identities: &'a IdentityFetcher,
    ) -> Self {
        Self {
            platform,
            issuer,
            tokens,
            identities,
        }
    }

    /// Handle a callback, persisting the login through `sessions` on success.
    ///
    /// Checks run in a fixed order and the first failure wins. The state must
    /// match the one bound to this browser session by the login route and
    /// must still be pending in the issuer. No upstream request is made until
    /// the code, state and client configuration have all been accepted, and
    /// the login is only written after both upstream calls succeed.
    #[instrument(skip_all)]
    pub async fn handle<P: SessionPersister>(
        &self,
        params: &CallbackParams,
        sessions: &P,
    ) -> CallbackOutcome {
        if let Some(error) = non_blank(params.error.as_deref()) {
            let description = params.error_description.as_deref().unwrap_or_default();
            tracing::warn!(error, description, "Platform returned an OAuth error");
            return CallbackOutcome::UpstreamError;
        }

        let Some(code) = non_blank(params.code.as_deref()) else {
            tracing::warn!("Missing authorization code in callback");
            return CallbackOutcome::CodeMissing;
        };

        let Some(state) = non_blank(params.state.as_deref()) else {
            tracing::warn!("Missing state parameter in callback");
            return CallbackOutcome::InvalidState;
        };
        let bound = match sessions.take_login_state().await {
            Ok(bound) => bound,
            Err(e) => {
                tracing::error!("Failed to read OAuth state from session: {e}");
                return CallbackOutcome::SessionFailed;
            }
        };
        if bound.as_deref() != Some(state) {
            tracing::warn!("OAuth state was not issued to this session");
            return CallbackOutcome::InvalidState;
        }
        if self.issuer.consume(state).is_err() {
            tracing::warn!("Unknown, reused or expired OAuth state");
            return CallbackOutcome::InvalidState;
        }

        let client = match self.platform.oauth_client() {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("Platform login attempted without configuration: {e}");
                return CallbackOutcome::ConfigMissing(missing_setting(&e));
            }
        };

        let token = match self
            .tokens
            .exchange(code, client.client_id, client.client_secret, client.redirect_uri)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                tracing::error!("Failed to exchange OAuth code: {e}");
                return CallbackOutcome::ExchangeFailed;
            }
        };

        let identity = match self.identities.fetch_identity(token.bearer()).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::error!("Failed to fetch platform user: {e}");
                return CallbackOutcome::IdentityFailed;
            }
        };

        if let Err(e) = sessions.persist_session(&token, &identity).await {
            tracing::error!("Failed to persist platform session: {e}");
            return CallbackOutcome::SessionFailed;
        }

        tracing::info!(
            user_id = %identity.external_user_id,
            vendor_id = ?identity.vendor_id,
            "Platform login completed"
        );

        CallbackOutcome::Success {
            display_name: identity.display_name,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

const fn missing_setting(error: &crate::platform::PlatformError) -> &'static str {
    match error {
        crate::platform::PlatformError::ConfigurationMissing(setting) => *setting,
        _ => "unknown",
    }
}
