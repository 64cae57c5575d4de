//! Authorization redirect construction.

use super::{PlatformError, StateTokenIssuer};

/// Scopes requested for catalog access, in the order they are sent.
pub const CATALOG_SCOPES: &[&str] = &["read_products", "write_products"];

/// A ready-to-follow authorization redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Full `/accounts/sso` URL.
    pub url: String,
    /// The state token embedded in `url`.
    pub state: String,
}

/// Build the platform's authorization URL.
///
/// Scopes are space-joined in the order given. Query parameters are always
/// emitted as `client_id`, `redirect_uri`, `scope`, `state`, so the output is
/// fully determined by the inputs.
///
/// # Errors
///
/// Returns `PlatformError::ConfigurationMissing` if `client_id` or
/// `redirect_uri` is absent or blank.
pub fn authorization_url(
    accounts_url: &str,
    client_id: Option<&str>,
    redirect_uri: Option<&str>,
    scopes: &[&str],
    state: &str,
) -> Result<String, PlatformError> {
    let client_id = non_blank(client_id).ok_or(PlatformError::ConfigurationMissing("client_id"))?;
    let redirect_uri =
        non_blank(redirect_uri).ok_or(PlatformError::ConfigurationMissing("redirect_uri"))?;
    let scope = scopes.join(" ");

    Ok(format!(
        "{}/accounts/sso?client_id={}&redirect_uri={}&scope={}&state={}",
        accounts_url.trim_end_matches('/'),
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scope),
        urlencoding::encode(state)
    ))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Starts authorization attempts: issues state and builds the redirect URL.
#[derive(Clone)]
pub struct AuthorizationRequestBuilder {
    accounts_url: String,
    issuer: StateTokenIssuer,
}

impl AuthorizationRequestBuilder {
    /// Create a builder for the platform at `accounts_url`.
    #[must_use]
    pub fn new(accounts_url: impl Into<String>, issuer: StateTokenIssuer) -> Self {
        Self {
            accounts_url: accounts_url.into(),
            issuer,
        }
    }

    /// Begin an authorization attempt requesting [`CATALOG_SCOPES`].
    ///
    /// Configuration is checked before a state token is issued, so a
    /// misconfigured deployment never leaves pending attempts behind.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::ConfigurationMissing` if `client_id` or
    /// `redirect_uri` is absent or blank.
    pub fn begin(
        &self,
        client_id: Option<&str>,
        redirect_uri: Option<&str>,
    ) -> Result<AuthorizationRequest, PlatformError> {
        if non_blank(client_id).is_none() {
            return Err(PlatformError::ConfigurationMissing("client_id"));
        }
        if non_blank(redirect_uri).is_none() {
            return Err(PlatformError::ConfigurationMissing("redirect_uri"));
        }

        let state = self.issuer.issue();
        let url = authorization_url(
            &self.accounts_url,
            client_id,
            redirect_uri,
            CATALOG_SCOPES,
            &state,
        )?;

        tracing::debug!("Issued platform authorization request");
        Ok(AuthorizationRequest { url, state })
    }
}
