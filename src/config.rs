// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Platform API credentials are optional: a platform without credentials
//! always resolves to a fallback profile.

use std::env;
use std::time::Duration;

const DEFAULT_PROFILE_LOOKUP_TIMEOUT_MS: u64 = 5000;

/// Which persistence backend backs the train store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Persistence backend
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Upper bound for any single outbound profile lookup
    pub profile_lookup_timeout: Duration,

    // --- Platform API credentials ---
    pub twitter_bearer_token: Option<String>,
    pub twitter_api_url: String,
    pub instagram_access_token: Option<String>,
    pub instagram_business_account_id: Option<String>,
    pub instagram_api_url: String,
    pub linkedin_api_key: Option<String>,
    pub linkedin_api_host: String,
    pub linkedin_api_url: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8080,
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            profile_lookup_timeout: Duration::from_millis(DEFAULT_PROFILE_LOOKUP_TIMEOUT_MS),
            twitter_bearer_token: None,
            twitter_api_url: "https://api.twitter.com".to_string(),
            instagram_access_token: None,
            instagram_business_account_id: None,
            instagram_api_url: "https://graph.facebook.com/v19.0".to_string(),
            linkedin_api_key: None,
            linkedin_api_host: "linkedin-data-api.p.rapidapi.com".to_string(),
            linkedin_api_url: "https://linkedin-data-api.p.rapidapi.com".to_string(),
        }
    }
}

impl Config {
    /// In-memory store, no live platform integrations.
    pub fn test_default() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => StoreBackend::Firestore,
            "memory" => StoreBackend::Memory,
            other => return Err(ConfigError::Invalid("STORE_BACKEND", other.to_string())),
        };

        let timeout_ms = match env::var("PROFILE_LOOKUP_TIMEOUT_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("PROFILE_LOOKUP_TIMEOUT_MS", raw))?,
            Err(_) => DEFAULT_PROFILE_LOOKUP_TIMEOUT_MS,
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            port,
            store_backend,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            profile_lookup_timeout: Duration::from_millis(timeout_ms),

            twitter_bearer_token: optional_secret("TWITTER_BEARER_TOKEN"),
            twitter_api_url: env::var("TWITTER_API_URL").unwrap_or(defaults.twitter_api_url),
            instagram_access_token: optional_secret("INSTAGRAM_ACCESS_TOKEN"),
            instagram_business_account_id: optional_secret("INSTAGRAM_BUSINESS_ACCOUNT_ID"),
            instagram_api_url: env::var("INSTAGRAM_API_URL").unwrap_or(defaults.instagram_api_url),
            linkedin_api_key: optional_secret("LINKEDIN_API_KEY"),
            linkedin_api_host: env::var("LINKEDIN_API_HOST").unwrap_or(defaults.linkedin_api_host),
            linkedin_api_url: env::var("LINKEDIN_API_URL").unwrap_or(defaults.linkedin_api_url),
        })
    }
}

/// Read a secret from the environment, treating blank values as unset.
fn optional_secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}
