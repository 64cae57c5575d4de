//! Catalog endpoint probing.
//!
//! Runs the gateway's endpoint cascade with a real token and logs every
//! attempt, so candidate endpoints can be added or reordered from evidence.

use marketlink_core::{CatalogAttempt, CatalogQuery, VendorId};
use marketlink_gateway::config::PlatformConfig;
use marketlink_gateway::platform::{EndpointFallbackResolver, PlatformError, build_http_client};

use super::CommandError;

/// Probe the catalog endpoints and print the payload of the first success.
///
/// # Errors
///
/// Returns an error if configuration is missing, the HTTP client cannot be
/// built, or every candidate fails.
#[allow(clippy::print_stdout)]
pub async fn probe_catalog(token: String, vendor_id: Option<String>) -> Result<(), CommandError> {
    dotenvy::dotenv().ok();

    let platform = PlatformConfig::from_env()?;
    let http = build_http_client(platform.request_timeout)?;
    let resolver = EndpointFallbackResolver::new(http, &platform.api_url);

    let query = CatalogQuery::new(token, vendor_id.map(VendorId::new));
    if query.vendor_id.is_none() {
        tracing::info!("No vendor id given; vendor-scoped endpoints will be skipped");
    }

    match resolver.resolve_catalog(&query).await {
        Ok(result) => {
            log_attempts(&result.diagnostics);
            tracing::info!("Catalog served by {}", result.succeeded_endpoint);
            println!("{}", serde_json::to_string_pretty(&result.normalized_payload)?);
            Ok(())
        }
        Err(PlatformError::AllEndpointsFailed { diagnostics }) => {
            log_attempts(&diagnostics);
            Err(PlatformError::AllEndpointsFailed { diagnostics }.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn log_attempts(diagnostics: &[CatalogAttempt]) {
    for (i, attempt) in diagnostics.iter().enumerate() {
        let status = attempt
            .status
            .map_or_else(|| "---".to_string(), |s| s.to_string());
        if attempt.succeeded() {
            tracing::info!("#{} {} {} {}", i + 1, status, attempt.endpoint, attempt.status_text);
        } else {
            tracing::warn!("#{} {} {} {}", i + 1, status, attempt.endpoint, attempt.status_text);
        }
    }
}
