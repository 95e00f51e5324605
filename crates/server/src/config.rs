//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CARTSYNC_TOKEN_SECRET` - Bearer token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `CARTSYNC_HOST` - Bind address (default: 127.0.0.1)
//! - `CARTSYNC_PORT` - Listen port (default: 3000)
//! - `CARTSYNC_CATALOG_PATH` - JSON product catalog (default: built-in sample catalog)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
/// Shannon entropy floor, in bits per character.
const MIN_SECRET_ENTROPY: f64 = 3.3;

/// Substrings that mark a copied sample value rather than a generated secret.
const SAMPLE_MARKERS: &[&str] = &[
    "changeme",
    "example",
    "placeholder",
    "replace",
    "secret",
    "password",
    "your-",
    "insert",
    "xxx",
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

/// Cart service configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer token signing secret
    pub token_secret: SecretString,
    /// Catalog file replacing the built-in sample products
    pub catalog_path: Option<PathBuf>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the token secret fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("CARTSYNC_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CARTSYNC_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("CARTSYNC_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CARTSYNC_PORT".to_string(), e.to_string()))?;
        let token_secret = token_secret_from_env("CARTSYNC_TOKEN_SECRET")?;

        Ok(Self {
            host,
            port,
            token_secret,
            catalog_path: get_optional_env("CARTSYNC_CATALOG_PATH").map(PathBuf::from),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read the token signing secret and reject weak values.
fn token_secret_from_env(key: &str) -> Result<SecretString, ConfigError> {
    let value = std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))?;
    check_token_secret(&value)
        .map_err(|reason| ConfigError::InsecureSecret(key.to_string(), reason))?;
    Ok(SecretString::from(value))
}

/// Why `secret` is unfit for signing tokens, if it is.
fn check_token_secret(secret: &str) -> Result<(), String> {
    let length = secret.chars().count();
    if length < MIN_TOKEN_SECRET_LENGTH {
        return Err(format!(
            "must be at least {MIN_TOKEN_SECRET_LENGTH} characters (got {length})"
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(marker) = SAMPLE_MARKERS.iter().find(|m| lower.contains(*m)) {
        return Err(format!("looks like a sample value (contains '{marker}')"));
    }

    let entropy = bits_per_char(secret);
    if entropy < MIN_SECRET_ENTROPY {
        return Err(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_SECRET_ENTROPY:.1}); generate it randomly"
        ));
    }
    Ok(())
}

/// Shannon entropy of `s` in bits per character.
fn bits_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }
    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}
