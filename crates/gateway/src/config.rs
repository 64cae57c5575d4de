//! Gateway configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GATEWAY_DATABASE_URL` - `PostgreSQL` connection string for the session store
//!   (falls back to `DATABASE_URL`)
//! - `GATEWAY_BASE_URL` - Public URL of the dashboard
//! - `PLATFORM_URL` - Base URL of the platform's account site (hosts `/accounts/sso`)
//! - `PLATFORM_API_URL` - Base URL of the platform API (hosts `/oauth/token`, `/api/...`)
//!
//! ## Optional
//! - `GATEWAY_HOST` - Bind address (default: 127.0.0.1)
//! - `GATEWAY_PORT` - Listen port (default: 3001)
//! - `PLATFORM_REQUEST_TIMEOUT_SECS` - Per-request upstream timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## OAuth client (checked per request, not at startup)
//! - `PLATFORM_CLIENT_ID` - OAuth client ID
//! - `PLATFORM_CLIENT_SECRET` - OAuth client secret
//! - `PLATFORM_REDIRECT_URI` - Callback URL registered with the platform
//!
//! A missing OAuth client setting surfaces as a `config_error` login
//! redirect, never as a startup failure.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::platform::PlatformError;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Gateway application configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the dashboard
    pub base_url: String,
    /// Upstream platform configuration
    pub platform: PlatformConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Upstream commerce platform configuration.
///
/// Implements `Debug` manually to redact the OAuth client secret.
#[derive(Clone)]
pub struct PlatformConfig {
    /// Account site base URL, without trailing slash
    pub accounts_url: String,
    /// API base URL, without trailing slash
    pub api_url: String,
    /// OAuth client ID
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<SecretString>,
    /// OAuth redirect URI registered with the platform
    pub redirect_uri: Option<String>,
    /// Upper bound for every single upstream request
    pub request_timeout: Duration,
}

/// OAuth client settings, all present.
///
/// Obtained from [`PlatformConfig::oauth_client`]; holding one proves the
/// deployment is configured for the authorization-code flow.
#[derive(Clone, Copy)]
pub struct OAuthClient<'a> {
    /// OAuth client ID
    pub client_id: &'a str,
    /// OAuth client secret
    pub client_secret: &'a SecretString,
    /// OAuth redirect URI
    pub redirect_uri: &'a str,
}

impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("accounts_url", &self.accounts_url)
            .field("api_url", &self.api_url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl std::fmt::Debug for OAuthClient<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    /// Missing OAuth client settings are not an error here.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("GATEWAY_DATABASE_URL")?;
        let host = get_env_or_default("GATEWAY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("GATEWAY_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("GATEWAY_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("GATEWAY_PORT".to_string(), e.to_string()))?;
        let base_url = get_base_url("GATEWAY_BASE_URL")?;

        let platform = PlatformConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            platform,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PlatformConfig {
    /// Load the platform section from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a platform URL is missing or malformed, or the
    /// request timeout is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let request_timeout_secs = get_env_or_default(
            "PLATFORM_REQUEST_TIMEOUT_SECS",
            &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "PLATFORM_REQUEST_TIMEOUT_SECS".to_string(),
                "must be a positive number of seconds".to_string(),
            )
        })?;

        let client_secret = get_optional_env("PLATFORM_CLIENT_SECRET").map(|secret| {
            if let Err(e) = validate_secret_strength(&secret, "PLATFORM_CLIENT_SECRET") {
                tracing::warn!("PLATFORM_CLIENT_SECRET validation warning: {e}");
            }
            SecretString::from(secret)
        });

        let config = Self {
            accounts_url: get_base_url("PLATFORM_URL")?,
            api_url: get_base_url("PLATFORM_API_URL")?,
            client_id: get_optional_env("PLATFORM_CLIENT_ID"),
            client_secret,
            redirect_uri: get_optional_env("PLATFORM_REDIRECT_URI"),
            request_timeout: Duration::from_secs(request_timeout_secs),
        };

        if let Err(e) = config.oauth_client() {
            tracing::warn!("Platform login is not configured: {e}");
        }

        Ok(config)
    }

    /// Returns the OAuth client settings if every one of them is present.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::ConfigurationMissing` naming the first absent
    /// setting (`client_id`, `client_secret`, then `redirect_uri`).
    pub fn oauth_client(&self) -> Result<OAuthClient<'_>, PlatformError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or(PlatformError::ConfigurationMissing("client_id"))?;
        let client_secret = self
            .client_secret
            .as_ref()
            .ok_or(PlatformError::ConfigurationMissing("client_secret"))?;
        let redirect_uri = self
            .redirect_uri
            .as_deref()
            .ok_or(PlatformError::ConfigurationMissing("redirect_uri"))?;

        Ok(OAuthClient {
            client_id,
            client_secret,
            redirect_uri,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    get_optional_env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required absolute http(s) URL, normalized without a trailing slash.
fn get_base_url(key: &str) -> Result<String, ConfigError> {
    let value = get_required_env(key)?;
    normalize_base_url(&value)
        .map_err(|reason| ConfigError::InvalidEnvVar(key.to_string(), reason))
}

/// Parse a base URL and strip any trailing slash so paths can be appended.
fn normalize_base_url(value: &str) -> Result<String, String> {
    let url = Url::parse(value).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not contain a query or fragment".to_string());
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., GATEWAY_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL (set by Fly.io postgres attach)
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
