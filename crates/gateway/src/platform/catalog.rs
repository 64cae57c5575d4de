//! Catalog retrieval across multiple candidate endpoints.

use std::borrow::Cow;

use marketlink_core::{AttemptOutcome, CatalogAttempt, CatalogQuery, CatalogResult, VendorId};
use tracing::instrument;

use super::{PlatformError, body_text};

const VENDOR_PLACEHOLDER: &str = "{vendor_id}";

/// Prefix of `status_text` when a 2xx body was not JSON.
const INVALID_BODY_PREFIX: &str = "invalid response body";

/// A catalog endpoint path template relative to the API base URL.
///
/// Templates may contain a `{vendor_id}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEndpoint(Cow<'static, str>);

impl CandidateEndpoint {
    /// Candidate from a static template.
    #[must_use]
    pub const fn from_static(template: &'static str) -> Self {
        Self(Cow::Borrowed(template))
    }

    /// Candidate from an owned template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(Cow::Owned(template.into()))
    }

    /// The raw template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.0
    }

    /// Whether the template needs a vendor id.
    #[must_use]
    pub fn requires_vendor_id(&self) -> bool {
        self.0.contains(VENDOR_PLACEHOLDER)
    }

    /// Substitute the vendor id and join onto `api_base`.
    ///
    /// Returns `None` if the template needs a vendor id and none is given.
    #[must_use]
    pub fn resolve(&self, api_base: &str, vendor_id: Option<&VendorId>) -> Option<String> {
        let path = if self.requires_vendor_id() {
            let vendor_id = vendor_id?;
            self.0
                .replace(VENDOR_PLACEHOLDER, &urlencoding::encode(vendor_id.as_str()))
        } else {
            self.0.to_string()
        };

        Some(format!("{}{path}", api_base.trim_end_matches('/')))
    }
}

/// Candidates tried by default, most specific first.
pub const DEFAULT_CANDIDATES: &[CandidateEndpoint] = &[
    CandidateEndpoint::from_static("/api/vendors/{vendor_id}/products"),
    CandidateEndpoint::from_static("/api/products"),
    CandidateEndpoint::from_static("/api/vendor/products"),
    CandidateEndpoint::from_static("/api/products/me"),
    CandidateEndpoint::from_static("/api/vendor/{vendor_id}/products"),
];

/// Walks candidate endpoints in order until one returns a JSON 2xx.
#[derive(Clone)]
pub struct EndpointFallbackResolver {
    http: reqwest::Client,
    api_base: String,
    candidates: Vec<CandidateEndpoint>,
}

impl EndpointFallbackResolver {
    /// Resolver over [`DEFAULT_CANDIDATES`].
    #[must_use]
    pub fn new(http: reqwest::Client, api_base: &str) -> Self {
        Self::with_candidates(http, api_base, DEFAULT_CANDIDATES.to_vec())
    }

    /// Resolver over a custom candidate list.
    #[must_use]
    pub fn with_candidates(
        http: reqwest::Client,
        api_base: &str,
        candidates: Vec<CandidateEndpoint>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            candidates,
        }
    }

    /// Configured candidates, in attempt order.
    #[must_use]
    pub fn candidates(&self) -> &[CandidateEndpoint] {
        &self.candidates
    }

    /// Fetch the catalog for `query`.
    ///
    /// Candidates are tried one at a time. Vendor-scoped candidates are
    /// skipped entirely when the query has no vendor id.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::AllEndpointsFailed` with one diagnostic per
    /// attempted candidate if none of them succeeded.
    #[instrument(skip_all, fields(vendor_id = ?query.vendor_id))]
    pub async fn resolve_catalog(
        &self,
        query: &CatalogQuery,
    ) -> Result<CatalogResult, PlatformError> {
        let mut diagnostics = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            let Some(endpoint) = candidate.resolve(&self.api_base, query.vendor_id.as_ref())
            else {
                tracing::debug!(
                    template = candidate.template(),
                    "Skipping vendor-scoped candidate"
                );
                continue;
            };

            let (attempt, payload) = self.attempt(endpoint, query.bearer()).await;
            let succeeded_endpoint = attempt.endpoint.clone();
            diagnostics.push(attempt);

            if let Some(payload) = payload {
                tracing::info!(
                    endpoint = %succeeded_endpoint,
                    attempts = diagnostics.len(),
                    "Catalog resolved"
                );
                return Ok(CatalogResult {
                    succeeded_endpoint,
                    normalized_payload: payload,
                    diagnostics,
                });
            }
        }

        tracing::warn!(attempts = diagnostics.len(), "No catalog endpoint succeeded");
        Err(PlatformError::AllEndpointsFailed { diagnostics })
    }

    async fn attempt(
        &self,
        endpoint: String,
        bearer: &str,
    ) -> (CatalogAttempt, Option<serde_json::Value>) {
        let response = match self.http.get(&endpoint).bearer_auth(bearer).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(endpoint = %endpoint, error = %e, "Catalog candidate unreachable");
                let attempt = CatalogAttempt {
                    endpoint,
                    status: None,
                    status_text: e.to_string(),
                    outcome: AttemptOutcome::Unreachable,
                };
                return (attempt, None);
            }
        };

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("Unknown").to_string();

        if !status.is_success() {
            tracing::debug!(
                endpoint = %endpoint,
                status = status.as_u16(),
                "Catalog candidate failed"
            );
            let attempt = CatalogAttempt {
                endpoint,
                status: Some(status.as_u16()),
                status_text: reason,
                outcome: AttemptOutcome::HttpError,
            };
            return (attempt, None);
        }

        let body = body_text(response).await;
        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(payload) => {
                let attempt = CatalogAttempt {
                    endpoint,
                    status: Some(status.as_u16()),
                    status_text: reason,
                    outcome: AttemptOutcome::Usable,
                };
                (attempt, Some(payload))
            }
            Err(e) => {
                tracing::debug!(
                    endpoint = %endpoint,
                    error = %e,
                    "Catalog candidate returned non-JSON body"
                );
                let attempt = CatalogAttempt {
                    endpoint,
                    status: Some(status.as_u16()),
                    status_text: format!("{INVALID_BODY_PREFIX}: {e}"),
                    outcome: AttemptOutcome::InvalidBody,
                };
                (attempt, None)
            }
        }
    }
}
