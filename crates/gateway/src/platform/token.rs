//! Authorization-code exchange against the platform token endpoint.

use chrono::{Duration, Utc};
use marketlink_core::TokenSet;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{PlatformError, body_text};

/// Lifetime assumed when the token response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Request body for the token endpoint.
#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    code: &'a str,
}

/// Fields read from a successful token response.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Trades authorization codes for access tokens.
#[derive(Clone)]
pub struct TokenExchangeClient {
    http: reqwest::Client,
    token_url: String,
}

impl TokenExchangeClient {
    /// Create a client for the platform API at `api_url`.
    #[must_use]
    pub fn new(http: reqwest::Client, api_url: &str) -> Self {
        Self {
            http,
            token_url: format!("{}/oauth/token", api_url.trim_end_matches('/')),
        }
    }

    /// Exchange an authorization code for a [`TokenSet`].
    ///
    /// Makes exactly one request; failures are never retried because the
    /// code is single-use upstream.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::TokenExchangeFailed` if the request cannot be
    /// sent, the platform answers with a non-2xx status, or the response has
    /// no `access_token`.
    #[instrument(skip(self, code, client_secret), fields(client_id = %client_id))]
    pub async fn exchange(
        &self,
        code: &str,
        client_id: &str,
        client_secret: &SecretString,
        redirect_uri: &str,
    ) -> Result<TokenSet, PlatformError> {
        let request = TokenRequest {
            grant_type: "authorization_code",
            client_id,
            client_secret: client_secret.expose_secret(),
            redirect_uri,
            code,
        };

        let response = self
            .http
            .post(&self.token_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Token endpoint unreachable");
                PlatformError::TokenExchangeFailed {
                    status: None,
                    body: e.to_string(),
                }
            })?;

        let status = response.status();
        let body = body_text(response).await;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Token exchange rejected");
            tracing::debug!(body = %body, "Token endpoint response body");
            return Err(PlatformError::TokenExchangeFailed {
                status: Some(status.as_u16()),
                body,
            });
        }

        let invalid = |body: String| PlatformError::TokenExchangeFailed {
            status: Some(status.as_u16()),
            body,
        };

        let Ok(raw) = serde_json::from_str::<serde_json::Value>(&body) else {
            tracing::warn!("Token response was not JSON");
            return Err(invalid(body));
        };
        let Ok(parsed) = TokenResponse::deserialize(&raw) else {
            tracing::warn!("Token response had unexpected field types");
            return Err(invalid(body));
        };

        let Some(access_token) = parsed.access_token.filter(|t| !t.is_empty()) else {
            tracing::warn!("Token response missing access_token");
            return Err(invalid(body));
        };

        let lifetime = parsed.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let token_type = parsed
            .token_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Bearer".to_string());

        tracing::info!("Platform token exchange succeeded");

        Ok(TokenSet {
            access_token: SecretString::from(access_token),
            token_type,
            expires_at: Utc::now() + Duration::seconds(lifetime),
            raw,
        })
    }
}
