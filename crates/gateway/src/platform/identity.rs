//! Current-user lookup on the platform API.

use marketlink_core::{ExternalUserId, UpstreamIdentity, VendorId};
use serde_json::Value;
use tracing::instrument;

use super::{PlatformError, body_text};

/// Fetches the profile of the user an access token belongs to.
#[derive(Clone)]
pub struct IdentityFetcher {
    http: reqwest::Client,
    user_url: String,
}

impl IdentityFetcher {
    /// Create a fetcher for the platform API at `api_url`.
    #[must_use]
    pub fn new(http: reqwest::Client, api_url: &str) -> Self {
        Self {
            http,
            user_url: format!("{}/api/user", api_url.trim_end_matches('/')),
        }
    }

    /// Fetch the identity behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::IdentityFetchFailed` if the request cannot be
    /// sent, the status is not 2xx, or the body is not a profile with a
    /// user id.
    #[instrument(skip_all)]
    pub async fn fetch_identity(
        &self,
        access_token: &str,
    ) -> Result<UpstreamIdentity, PlatformError> {
        let response = self
            .http
            .get(&self.user_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "User endpoint unreachable");
                PlatformError::IdentityFetchFailed {
                    status: None,
                    body: e.to_string(),
                }
            })?;

        let status = response.status();
        let body = body_text(response).await;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "User endpoint rejected token");
            tracing::debug!(body = %body, "User endpoint response body");
            return Err(PlatformError::IdentityFetchFailed {
                status: Some(status.as_u16()),
                body,
            });
        }

        let identity = serde_json::from_str::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(identity_from_profile);

        let Some(identity) = identity else {
            tracing::warn!("User endpoint returned an unusable profile");
            return Err(PlatformError::IdentityFetchFailed {
                status: Some(status.as_u16()),
                body,
            });
        };

        if !identity.has_display_name() {
            tracing::info!(
                user_id = %identity.external_user_id,
                "Profile has no display name, falling back to generic greeting"
            );
        }

        Ok(identity)
    }
}

/// Extract an [`UpstreamIdentity`] from a profile payload.
///
/// Accepts the profile at the top level or wrapped in `user` / `data`.
/// Returns `None` when no user id can be found.
#[must_use]
pub fn identity_from_profile(payload: &Value) -> Option<UpstreamIdentity> {
    let profile = unwrap_profile(payload);

    let user_id = ["id", "user_id"]
        .iter()
        .find_map(|key| profile.get(key).and_then(ExternalUserId::from_json))?;

    let mut identity = UpstreamIdentity::new(user_id);

    if let Some(name) = display_name(profile) {
        identity = identity.with_display_name(name);
    }

    let vendor_id = profile
        .get("vendor_id")
        .or_else(|| profile.get("vendorId"))
        .or_else(|| profile.get("vendor").and_then(|v| v.get("id")))
        .and_then(VendorId::from_json);
    if let Some(vendor_id) = vendor_id {
        identity = identity.with_vendor_id(vendor_id);
    }

    Some(identity)
}

fn unwrap_profile(payload: &Value) -> &Value {
    for key in ["user", "data"] {
        if let Some(inner) = payload.get(key).filter(|v| v.is_object()) {
            return inner;
        }
    }
    payload
}

fn display_name(profile: &Value) -> Option<String> {
    let text = |key: &str| {
        profile
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    if let Some(name) = text("display_name").or_else(|| text("name")).or_else(|| text("username")) {
        return Some(name.to_owned());
    }

    match (text("first_name"), text("last_name")) {
        (Some(first), Some(last)) => return Some(format!("{first} {last}")),
        (Some(only), None) | (None, Some(only)) => return Some(only.to_owned()),
        (None, None) => {}
    }

    text("email").map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::platform::build_http_client;

    fn fetcher(server: &MockServer) -> IdentityFetcher {
        let http = build_http_client(std::time::Duration::from_secs(5)).unwrap();
        IdentityFetcher::new(http, &server.uri())
    }

    #[test]
    fn test_profile_display_name_precedence() {
        let identity = identity_from_profile(&json!({
            "id": 7,
            "name": "Shop Owner",
            "username": "owner",
            "email": "owner@example.com",
        }))
        .unwrap();

        assert_eq!(identity.external_user_id.as_str(), "7");
        assert_eq!(identity.display_name.as_deref(), Some("Shop Owner"));
    }

    #[test]
    fn test_profile_first_and_last_name() {
        let identity = identity_from_profile(&json!({
            "user_id": "u-1",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
        }))
        .unwrap();

        assert_eq!(identity.display_name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_profile_email_fallback() {
        let identity =
            identity_from_profile(&json!({"id": "u-1", "name": "  ", "email": "a@b.test"}))
                .unwrap();
        assert_eq!(identity.display_name.as_deref(), Some("a@b.test"));
    }

    #[test]
    fn test_profile_without_name() {
        let identity = identity_from_profile(&json!({"id": "u-1"})).unwrap();
        assert!(!identity.has_display_name());
        assert!(identity.vendor_id.is_none());
    }

    #[test]
    fn test_profile_vendor_id_variants() {
        let a = identity_from_profile(&json!({"id": 1, "vendor_id": 42})).unwrap();
        let b = identity_from_profile(&json!({"id": 1, "vendorId": "v-42"})).unwrap();
        let c = identity_from_profile(&json!({"id": 1, "vendor": {"id": "v-43"}})).unwrap();

        assert_eq!(a.vendor_id.unwrap().as_str(), "42");
        assert_eq!(b.vendor_id.unwrap().as_str(), "v-42");
        assert_eq!(c.vendor_id.unwrap().as_str(), "v-43");
    }

    #[test]
    fn test_profile_wrapped() {
        let user = identity_from_profile(&json!({"user": {"id": 1, "name": "A"}})).unwrap();
        let data = identity_from_profile(&json!({"data": {"id": 2, "name": "B"}})).unwrap();

        assert_eq!(user.greeting_name(), "A");
        assert_eq!(data.external_user_id.as_str(), "2");
    }

    #[test]
    fn test_profile_without_id() {
        assert!(identity_from_profile(&json!({"name": "Nobody"})).is_none());
        assert!(identity_from_profile(&json!([1, 2, 3])).is_none());
    }

    #[tokio::test]
    async fn test_fetch_identity_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/user"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 9,
                "display_name": "Vendor Nine",
                "vendor_id": 99,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let identity = fetcher(&server).fetch_identity("tok-1").await.unwrap();

        assert_eq!(identity.external_user_id.as_str(), "9");
        assert_eq!(identity.greeting_name(), "Vendor Nine");
        assert_eq!(identity.vendor_id.unwrap().as_str(), "99");
    }

    #[tokio::test]
    async fn test_fetch_identity_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/user"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch_identity("tok-1").await.unwrap_err();

        assert!(matches!(
            err,
            PlatformError::IdentityFetchFailed {
                status: Some(401),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_fetch_identity_not_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/user"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch_identity("tok-1").await.unwrap_err();

        match err {
            PlatformError::IdentityFetchFailed { status, body } => {
                assert_eq!(status, Some(200));
                assert!(body.contains("login"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
