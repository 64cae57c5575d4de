//! Access token obtained from the platform's token endpoint.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

/// Token set returned by a successful authorization-code exchange.
///
/// Implements `Debug` manually to redact the access token and the raw
/// upstream payload (which also contains the token).
#[derive(Clone)]
pub struct TokenSet {
    /// Bearer token for platform API calls.
    pub access_token: SecretString,
    /// Token type reported by the platform (normally `Bearer`).
    pub token_type: String,
    /// When the access token stops being valid.
    pub expires_at: DateTime<Utc>,
    /// Unmodified token endpoint response.
    pub raw: serde_json::Value,
}

impl TokenSet {
    /// Get the access token string for an outgoing request.
    #[must_use]
    pub fn bearer(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Whether the token has expired at the given instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("raw", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn token(expires_at: DateTime<Utc>) -> TokenSet {
        TokenSet {
            access_token: SecretString::from("tok_super_secret_value"),
            token_type: "Bearer".to_string(),
            expires_at,
            raw: serde_json::json!({"access_token": "tok_super_secret_value"}),
        }
    }

    #[test]
    fn test_debug_redacts_token_and_raw() {
        let debug_output = format!("{:?}", token(Utc::now()));

        assert!(debug_output.contains("Bearer"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("tok_super_secret_value"));
    }

    #[test]
    fn test_is_expired_at() {
        let now = Utc::now();
        assert!(!token(now + Duration::minutes(5)).is_expired_at(now));
        assert!(token(now - Duration::seconds(1)).is_expired_at(now));
        assert!(token(now).is_expired_at(now));
    }

    #[test]
    fn test_bearer() {
        assert_eq!(token(Utc::now()).bearer(), "tok_super_secret_value");
    }
}
