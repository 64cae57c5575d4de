//! Anti-forgery state tokens for the authorization-code flow.
//!
//! A state token is issued when the user starts a platform login and must be
//! presented exactly once, within [`ATTEMPT_TTL`], on the callback.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use rand::Rng;
use rand::distr::Alphanumeric;

use super::PlatformError;

/// How long an authorization attempt stays redeemable.
pub const ATTEMPT_TTL: Duration = Duration::from_secs(10 * 60);

/// Length of generated state tokens (alphanumeric, ~190 bits of entropy).
const STATE_LENGTH: usize = 32;

/// Upper bound on concurrently pending attempts held in memory.
const MAX_PENDING_ATTEMPTS: u64 = 10_000;

/// A pending authorization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationAttempt {
    /// Opaque state value sent to the platform.
    pub state: String,
    /// When the attempt was started.
    pub created_at: DateTime<Utc>,
}

/// Storage for pending authorization attempts.
///
/// `take` must be atomic: when two callers race on the same state, at most
/// one of them receives the attempt.
pub trait AttemptStore: Send + Sync {
    /// Record a new attempt under its state value.
    fn insert(&self, attempt: AuthorizationAttempt);

    /// Remove and return the attempt for `state`, if present.
    fn take(&self, state: &str) -> Option<AuthorizationAttempt>;
}

/// Single-instance attempt store backed by a `moka` cache with TTL eviction.
///
/// For multi-instance deployments, implement [`AttemptStore`] over a shared
/// store instead.
#[derive(Clone)]
pub struct InMemoryAttemptStore {
    cache: Cache<String, AuthorizationAttempt>,
}

impl InMemoryAttemptStore {
    /// Create a store that evicts attempts after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_PENDING_ATTEMPTS)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }
}

impl Default for InMemoryAttemptStore {
    fn default() -> Self {
        Self::new(ATTEMPT_TTL)
    }
}

impl AttemptStore for InMemoryAttemptStore {
    fn insert(&self, attempt: AuthorizationAttempt) {
        self.cache.insert(attempt.state.clone(), attempt);
    }

    fn take(&self, state: &str) -> Option<AuthorizationAttempt> {
        self.cache.remove(state)
    }
}

/// Issues and redeems single-use state tokens.
#[derive(Clone)]
pub struct StateTokenIssuer {
    store: Arc<dyn AttemptStore>,
    ttl: chrono::Duration,
}

impl StateTokenIssuer {
    /// Create an issuer over `store` with the default [`ATTEMPT_TTL`].
    #[must_use]
    pub fn new(store: Arc<dyn AttemptStore>) -> Self {
        Self::with_ttl(store, ATTEMPT_TTL)
    }

    /// Create an issuer with a custom TTL.
    #[must_use]
    pub fn with_ttl(store: Arc<dyn AttemptStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Create an issuer with an in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryAttemptStore::default()))
    }

    /// Issue a fresh, unpredictable state token and record the attempt.
    #[must_use]
    pub fn issue(&self) -> String {
        let state = generate_state();
        self.store.insert(AuthorizationAttempt {
            state: state.clone(),
            created_at: Utc::now(),
        });
        state
    }

    /// Redeem a state token.
    ///
    /// The attempt is removed whether or not it is still within its TTL, so a
    /// second call with the same value always fails.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::InvalidState` if the state is unknown, was
    /// already consumed, or has expired.
    pub fn consume(&self, state: &str) -> Result<(), PlatformError> {
        let attempt = self.store.take(state).ok_or(PlatformError::InvalidState)?;

        if Utc::now() - attempt.created_at >= self.ttl {
            tracing::debug!("Authorization state expired");
            return Err(PlatformError::InvalidState);
        }

        Ok(())
    }
}

/// Generate a cryptographically secure alphanumeric state value.
fn generate_state() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    /// Store that hands back whatever was inserted, ignoring TTLs.
    #[derive(Default)]
    struct RecordingStore {
        attempts: Mutex<Vec<AuthorizationAttempt>>,
    }

    impl AttemptStore for RecordingStore {
        fn insert(&self, attempt: AuthorizationAttempt) {
            self.attempts
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(attempt);
        }

        fn take(&self, state: &str) -> Option<AuthorizationAttempt> {
            let mut attempts = self
                .attempts
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let index = attempts.iter().position(|a| a.state == state)?;
            Some(attempts.remove(index))
        }
    }

    #[test]
    fn test_issue_then_consume_once() {
        let issuer = StateTokenIssuer::in_memory();
        let state = issuer.issue();

        assert!(issuer.consume(&state).is_ok());
        assert!(matches!(
            issuer.consume(&state),
            Err(PlatformError::InvalidState)
        ));
    }

    #[test]
    fn test_unknown_state_rejected() {
        let issuer = StateTokenIssuer::in_memory();
        assert!(matches!(
            issuer.consume("never-issued"),
            Err(PlatformError::InvalidState)
        ));
    }

    #[test]
    fn test_expired_state_rejected() {
        let store = Arc::new(RecordingStore::default());
        let issuer = StateTokenIssuer::with_ttl(store.clone(), Duration::from_secs(60));

        store.insert(AuthorizationAttempt {
            state: "stale".to_string(),
            created_at: Utc::now() - chrono::Duration::minutes(2),
        });

        assert!(matches!(
            issuer.consume("stale"),
            Err(PlatformError::InvalidState)
        ));
        // Expired attempts are removed, not left behind for another try.
        assert!(store.take("stale").is_none());
    }

    #[test]
    fn test_states_are_unique_and_alphanumeric() {
        let issuer = StateTokenIssuer::in_memory();
        let states: HashSet<String> = (0..100).map(|_| issuer.issue()).collect();

        assert_eq!(states.len(), 100);
        for state in &states {
            assert_eq!(state.len(), STATE_LENGTH);
            assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_concurrent_consume_succeeds_once() {
        let issuer = StateTokenIssuer::in_memory();
        let state = issuer.issue();

        let successes = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| issuer.consume(&state).is_ok()))
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().ok())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(successes, 1);
    }
}
