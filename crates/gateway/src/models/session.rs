//! Session-stored platform login state.
//!
//! The login and callback flow write through [`SessionPersister`] and the API
//! routes read through [`SessionReader`]. Both are implemented for
//! `tower_sessions::Session`; tests substitute their own implementations.

use std::future::Future;

use chrono::{DateTime, Utc};
use marketlink_core::{TokenSet, UpstreamIdentity};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;

/// Session keys for platform login data.
pub mod keys {
    /// Key for the logged-in platform user and their token.
    pub const PLATFORM_SESSION: &str = "platform_session";

    /// Key for the state issued to this browser by the login route.
    pub const OAUTH_STATE: &str = "platform_oauth_state";
}

/// Errors from the session collaborator.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The underlying session store failed.
    #[error("session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),
}

/// Session-stored platform login.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformSession {
    /// Bearer token for platform API calls.
    pub access_token: String,
    /// Token type reported by the platform.
    pub token_type: String,
    /// When the access token stops being valid.
    pub expires_at: DateTime<Utc>,
    /// Who logged in.
    pub identity: UpstreamIdentity,
}

impl PlatformSession {
    /// Build the stored form of a completed login.
    #[must_use]
    pub fn new(token: &TokenSet, identity: &UpstreamIdentity) -> Self {
        Self {
            access_token: token.bearer().to_owned(),
            token_type: token.token_type.clone(),
            expires_at: token.expires_at,
            identity: identity.clone(),
        }
    }

    /// Whether the stored token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl std::fmt::Debug for PlatformSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformSession")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("identity", &self.identity)
            .finish()
    }
}

/// Stores the pending and completed platform login of one browser session.
pub trait SessionPersister: Send + Sync {
    /// Remember the state handed to this browser by the login route.
    fn bind_login_state(
        &self,
        state: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Remove and return the state bound by [`Self::bind_login_state`].
    fn take_login_state(
        &self,
    ) -> impl Future<Output = Result<Option<String>, SessionError>> + Send;

    /// Persist the token and identity for the current browser session.
    fn persist_session(
        &self,
        token: &TokenSet,
        identity: &UpstreamIdentity,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// Reads the platform login for the current browser session.
pub trait SessionReader: Send + Sync {
    /// The current login, or `None` if absent or expired.
    fn read_current_session(
        &self,
    ) -> impl Future<Output = Result<Option<PlatformSession>, SessionError>> + Send;
}

impl SessionPersister for Session {
    async fn bind_login_state(&self, state: &str) -> Result<(), SessionError> {
        self.insert(keys::OAUTH_STATE, state).await?;
        Ok(())
    }

    async fn take_login_state(&self) -> Result<Option<String>, SessionError> {
        Ok(self.remove::<String>(keys::OAUTH_STATE).await?)
    }

    async fn persist_session(
        &self,
        token: &TokenSet,
        identity: &UpstreamIdentity,
    ) -> Result<(), SessionError> {
        // New login, new session id.
        self.cycle_id().await?;
        self.insert(keys::PLATFORM_SESSION, PlatformSession::new(token, identity))
            .await?;
        Ok(())
    }
}

impl SessionReader for Session {
    async fn read_current_session(&self) -> Result<Option<PlatformSession>, SessionError> {
        let stored: Option<PlatformSession> = self.get(keys::PLATFORM_SESSION).await?;

        match stored {
            Some(session) if session.is_expired_at(Utc::now()) => {
                tracing::debug!(
                    user_id = %session.identity.external_user_id,
                    "Stored platform token expired"
                );
                Ok(None)
            }
            other => Ok(other),
        }
    }
}

/// Remove the platform login from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_platform_session(session: &Session) -> Result<(), SessionError> {
    session
        .remove::<PlatformSession>(keys::PLATFORM_SESSION)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use secrecy::SecretString;
    use tower_sessions::MemoryStore;

    use super::*;

    fn token(expires_at: DateTime<Utc>) -> TokenSet {
        TokenSet {
            access_token: SecretString::from("tok-secret"),
            token_type: "Bearer".to_string(),
            expires_at,
            raw: serde_json::json!({}),
        }
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[test]
    fn test_debug_redacts_token() {
        let stored = PlatformSession::new(
            &token(Utc::now()),
            &UpstreamIdentity::new("u-1").with_display_name("Ada"),
        );
        let debug_output = format!("{stored:?}");

        assert!(debug_output.contains("Ada"));
        assert!(!debug_output.contains("tok-secret"));
    }

    #[tokio::test]
    async fn test_persist_then_read() {
        let session = session();
        let identity = UpstreamIdentity::new("u-1").with_vendor_id("v-1");

        session
            .persist_session(&token(Utc::now() + Duration::hours(1)), &identity)
            .await
            .unwrap();

        let stored = session.read_current_session().await.unwrap().unwrap();
        assert_eq!(stored.identity, identity);
        assert_eq!(stored.access_token, "tok-secret");
    }

    #[tokio::test]
    async fn test_expired_session_reads_as_none() {
        let session = session();
        session
            .persist_session(
                &token(Utc::now() - Duration::seconds(1)),
                &UpstreamIdentity::new("u-1"),
            )
            .await
            .unwrap();

        assert!(session.read_current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_state_is_taken_once() {
        let session = session();
        session.bind_login_state("state-1").await.unwrap();

        assert_eq!(
            session.take_login_state().await.unwrap().as_deref(),
            Some("state-1")
        );
        assert!(session.take_login_state().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_platform_session() {
        let session = session();
        session
            .persist_session(
                &token(Utc::now() + Duration::hours(1)),
                &UpstreamIdentity::new("u-1"),
            )
            .await
            .unwrap();

        clear_platform_session(&session).await.unwrap();

        assert!(session.read_current_session().await.unwrap().is_none());
    }
}
