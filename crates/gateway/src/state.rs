//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::platform::{
    AuthorizationRequestBuilder, EndpointFallbackResolver, IdentityFetcher, PlatformError,
    StateTokenIssuer, TokenExchangeClient, build_http_client,
};
use crate::services::CallbackOrchestrator;

/// Application state shared across all handlers.
///
/// Cheap to clone: everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GatewayConfig,
    issuer: StateTokenIssuer,
    authorize: AuthorizationRequestBuilder,
    tokens: TokenExchangeClient,
    identities: IdentityFetcher,
    catalog: EndpointFallbackResolver,
}

impl AppState {
    /// Build the state from configuration with an in-memory attempt store.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Client` if the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, PlatformError> {
        Self::with_issuer(config, StateTokenIssuer::in_memory())
    }

    /// Build the state with a caller-supplied state token issuer.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Client` if the HTTP client cannot be built.
    pub fn with_issuer(
        config: GatewayConfig,
        issuer: StateTokenIssuer,
    ) -> Result<Self, PlatformError> {
        let http = build_http_client(config.platform.request_timeout)?;
        let api_url = config.platform.api_url.as_str();

        let authorize =
            AuthorizationRequestBuilder::new(config.platform.accounts_url.clone(), issuer.clone());
        let tokens = TokenExchangeClient::new(http.clone(), api_url);
        let identities = IdentityFetcher::new(http.clone(), api_url);
        let catalog = EndpointFallbackResolver::new(http, api_url);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                issuer,
                authorize,
                tokens,
                identities,
                catalog,
            }),
        })
    }

    /// Get the gateway configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Get the authorization request builder.
    #[must_use]
    pub fn authorize(&self) -> &AuthorizationRequestBuilder {
        &self.inner.authorize
    }

    /// Get the catalog resolver.
    #[must_use]
    pub fn catalog(&self) -> &EndpointFallbackResolver {
        &self.inner.catalog
    }

    /// Borrow a callback orchestrator over this state's components.
    #[must_use]
    pub fn callback(&self) -> CallbackOrchestrator<'_> {
        CallbackOrchestrator::new(
            &self.inner.config.platform,
            &self.inner.issuer,
            &self.inner.tokens,
            &self.inner.identities,
        )
    }
}
