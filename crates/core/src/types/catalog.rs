//! Catalog retrieval input and output types.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::id::VendorId;

/// Input to a catalog resolution.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct CatalogQuery {
    /// Vendor whose catalog is requested, when known.
    pub vendor_id: Option<VendorId>,
    /// Bearer token for the platform API.
    pub access_token: SecretString,
}

impl CatalogQuery {
    /// Create a query for the given token and optional vendor.
    #[must_use]
    pub fn new(access_token: impl Into<SecretString>, vendor_id: Option<VendorId>) -> Self {
        Self {
            vendor_id,
            access_token: access_token.into(),
        }
    }

    /// Get the access token string for an outgoing request.
    #[must_use]
    pub fn bearer(&self) -> &str {
        self.access_token.expose_secret()
    }
}

impl std::fmt::Debug for CatalogQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogQuery")
            .field("vendor_id", &self.vendor_id)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// How a single candidate attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// 2xx with a JSON body; the cascade stops here.
    Usable,
    /// The platform answered with a non-2xx status.
    HttpError,
    /// 2xx whose body was not JSON.
    InvalidBody,
    /// No response: connect failure, timeout, or other transport error.
    Unreachable,
}

/// Record of a single candidate endpoint attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogAttempt {
    /// Fully substituted URL that was requested.
    pub endpoint: String,
    /// HTTP status, or `None` when no response was received.
    pub status: Option<u16>,
    /// Status reason phrase, or the transport/decode error text.
    pub status_text: String,
    /// How the attempt ended.
    pub outcome: AttemptOutcome,
}

impl CatalogAttempt {
    /// Whether this attempt produced a usable response.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Usable)
    }
}

/// Successful catalog resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogResult {
    /// Endpoint that returned the payload.
    pub succeeded_endpoint: String,
    /// Response body exactly as returned by the platform.
    ///
    /// Shape (bare array vs. wrapped object) is not interpreted here.
    pub normalized_payload: serde_json::Value,
    /// Every attempt made, in order, including the successful one.
    pub diagnostics: Vec<CatalogAttempt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(status: Option<u16>, text: &str, outcome: AttemptOutcome) -> CatalogAttempt {
        CatalogAttempt {
            endpoint: "https://api.example.com/api/products".to_string(),
            status,
            status_text: text.to_string(),
            outcome,
        }
    }

    #[test]
    fn test_attempt_succeeded_follows_outcome() {
        assert!(attempt(Some(200), "OK", AttemptOutcome::Usable).succeeded());
        assert!(!attempt(Some(404), "Not Found", AttemptOutcome::HttpError).succeeded());
        assert!(!attempt(None, "connection refused", AttemptOutcome::Unreachable).succeeded());
        // Status and text alone never decide success.
        assert!(!attempt(Some(200), "OK", AttemptOutcome::InvalidBody).succeeded());
    }

    #[test]
    fn test_query_debug_redacts_token() {
        let query = CatalogQuery::new("tok_catalog_secret".to_string(), Some(VendorId::new("v1")));
        let debug_output = format!("{query:?}");

        assert!(debug_output.contains("v1"));
        assert!(!debug_output.contains("tok_catalog_secret"));
    }

    #[test]
    fn test_attempt_serializes() {
        let value =
            serde_json::to_value(attempt(Some(404), "Not Found", AttemptOutcome::HttpError))
                .unwrap_or_default();
        assert_eq!(value["status"], 404);
        assert_eq!(value["status_text"], "Not Found");
        assert_eq!(value["outcome"], "http_error");
    }
}
