// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile lookups against platform APIs, with a synthesized fallback.
//!
//! Handles:
//! - Live lookups for platforms with configured credentials
//!   (Twitter/X API v2, Instagram Graph business discovery, LinkedIn proxy)
//! - Bounded request time (client-wide timeout)
//! - Fallback profiles whenever a live lookup fails for any reason

use crate::config::Config;
use crate::models::{Platform, Profile};
use anyhow::Context;
use ring::rand::{SecureRandom, SystemRandom};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Fallback follower counts are drawn from `0..FALLBACK_FOLLOWERS_MAX`.
const FALLBACK_FOLLOWERS_MAX: u32 = 10_000;

/// Why a live lookup was abandoned. Never leaves this module.
#[derive(Debug, thiserror::Error)]
enum LookupError {
    #[error("no live integration configured")]
    Unsupported,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Credentials and endpoint for one platform's live lookup.
#[derive(Debug, Clone)]
enum LiveIntegration {
    Twitter {
        base_url: String,
        bearer_token: String,
    },
    Instagram {
        base_url: String,
        account_id: String,
        access_token: String,
    },
    Linkedin {
        base_url: String,
        api_host: String,
        api_key: String,
    },
}

impl LiveIntegration {
    /// Build the integration table from whatever credentials are configured.
    fn from_config(config: &Config) -> HashMap<Platform, LiveIntegration> {
        let mut integrations = HashMap::new();

        if let Some(token) = &config.twitter_bearer_token {
            integrations.insert(
                Platform::Twitter,
                LiveIntegration::Twitter {
                    base_url: trim_base(&config.twitter_api_url),
                    bearer_token: token.clone(),
                },
            );
        }

        if let (Some(token), Some(account_id)) = (
            &config.instagram_access_token,
            &config.instagram_business_account_id,
        ) {
            integrations.insert(
                Platform::Instagram,
                LiveIntegration::Instagram {
                    base_url: trim_base(&config.instagram_api_url),
                    account_id: account_id.clone(),
                    access_token: token.clone(),
                },
            );
        }

        if let Some(key) = &config.linkedin_api_key {
            integrations.insert(
                Platform::Linkedin,
                LiveIntegration::Linkedin {
                    base_url: trim_base(&config.linkedin_api_url),
                    api_host: config.linkedin_api_host.clone(),
                    api_key: key.clone(),
                },
            );
        }

        integrations
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Resolves profiles for canonical usernames. Never fails outward.
#[derive(Clone)]
pub struct ProfileResolver {
    http: reqwest::Client,
    integrations: Arc<HashMap<Platform, LiveIntegration>>,
}

impl ProfileResolver {
    /// Create a resolver whose every outbound call is bounded by
    /// `config.profile_lookup_timeout`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.profile_lookup_timeout)
            .build()
            .context("failed building profile lookup HTTP client")?;

        let integrations = LiveIntegration::from_config(config);
        tracing::info!(
            platforms = ?integrations.keys().collect::<Vec<_>>(),
            timeout_ms = config.profile_lookup_timeout.as_millis() as u64,
            "Profile resolver initialized"
        );

        Ok(Self {
            http,
            integrations: Arc::new(integrations),
        })
    }

    fn has_live_integration(&self, platform: Platform) -> bool {
        self.integrations.contains_key(&platform)
    }

    /// Resolve a profile, degrading to [`fallback_profile`] on any failure.
    pub async fn resolve(&self, username: &str, platform: Platform) -> Profile {
        if !self.has_live_integration(platform) {
            return fallback_profile(username, platform);
        }

        match self.lookup(username, platform).await {
            Ok(profile) => {
                tracing::debug!(%platform, username, "Live profile lookup succeeded");
                profile
            }
            Err(LookupError::Unsupported) => fallback_profile(username, platform),
            Err(e) => {
                tracing::warn!(
                    %platform,
                    username,
                    error = %e,
                    "Live profile lookup failed, using fallback"
                );
                fallback_profile(username, platform)
            }
        }
    }

    async fn lookup(&self, username: &str, platform: Platform) -> Result<Profile, LookupError> {
        let integration = self
            .integrations
            .get(&platform)
            .ok_or(LookupError::Unsupported)?;

        match integration {
            LiveIntegration::Twitter {
                base_url,
                bearer_token,
            } => {
                let url = format!(
                    "{}/2/users/by/username/{}",
                    base_url,
                    urlencoding::encode(username)
                );
                let request = self
                    .http
                    .get(&url)
                    .bearer_auth(bearer_token)
                    .query(&[(
                        "user.fields",
                        "description,profile_image_url,public_metrics,verified",
                    )]);
                let envelope: TwitterEnvelope = self.send_json(request).await?;
                Ok(envelope.data.into_profile(username))
            }
            LiveIntegration::Instagram {
                base_url,
                account_id,
                access_token,
            } => {
                let url = format!("{}/{}", base_url, account_id);
                let fields = format!(
                    "business_discovery.username({}){{username,name,biography,profile_picture_url,followers_count}}",
                    username
                );
                let request = self.http.get(&url).query(&[
                    ("fields", fields.as_str()),
                    ("access_token", access_token.as_str()),
                ]);
                let envelope: InstagramEnvelope = self.send_json(request).await?;
                Ok(envelope.business_discovery.into_profile(username))
            }
            LiveIntegration::Linkedin {
                base_url,
                api_host,
                api_key,
            } => {
                let request = self
                    .http
                    .get(format!("{}/", base_url))
                    .header("X-RapidAPI-Key", api_key)
                    .header("X-RapidAPI-Host", api_host)
                    .query(&[("username", username)]);
                let person: LinkedinProfile = self.send_json(request).await?;
                Ok(person.into_profile(username))
            }
        }
    }

    /// Send a request and parse a successful JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, LookupError> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| LookupError::Malformed(e.to_string()))
    }
}

/// Synthesize a profile without any network access.
///
/// The shape is deterministic; the follower count is random on every call.
pub fn fallback_profile(username: &str, platform: Platform) -> Profile {
    Profile {
        username: username.to_string(),
        display_name: capitalize_first(username),
        bio: format!("{} user", platform.display_name()),
        avatar: placeholder_avatar(username),
        followers: random_followers(),
        is_verified: false,
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn placeholder_avatar(username: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=random&size=128",
        urlencoding::encode(username)
    )
}

fn random_followers() -> u64 {
    let mut buf = [0u8; 4];
    if SystemRandom::new().fill(&mut buf).is_err() {
        return 0;
    }
    u64::from(u32::from_le_bytes(buf) % FALLBACK_FOLLOWERS_MAX)
}

// ─── Platform response shapes ────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TwitterEnvelope {
    data: TwitterUser,
}

#[derive(Debug, Deserialize)]
struct TwitterUser {
    name: String,
    #[serde(default)]
    description: String,
    profile_image_url: String,
    public_metrics: TwitterMetrics,
    #[serde(default)]
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct TwitterMetrics {
    followers_count: u64,
}

impl TwitterUser {
    fn into_profile(self, username: &str) -> Profile {
        Profile {
            username: username.to_string(),
            display_name: self.name,
            bio: self.description,
            avatar: self.profile_image_url,
            followers: self.public_metrics.followers_count,
            is_verified: self.verified,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InstagramEnvelope {
    business_discovery: InstagramUser,
}

#[derive(Debug, Deserialize)]
struct InstagramUser {
    name: Option<String>,
    #[serde(default)]
    biography: String,
    profile_picture_url: String,
    followers_count: u64,
}

impl InstagramUser {
    fn into_profile(self, username: &str) -> Profile {
        Profile {
            username: username.to_string(),
            display_name: self
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| capitalize_first(username)),
            bio: self.biography,
            avatar: self.profile_picture_url,
            followers: self.followers_count,
            is_verified: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkedinProfile {
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    headline: String,
    profile_picture: String,
    #[serde(default)]
    follower_count: u64,
}

impl LinkedinProfile {
    fn into_profile(self, username: &str) -> Profile {
        let display_name = format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string();
        Profile {
            username: username.to_string(),
            display_name,
            bio: self.headline,
            avatar: self.profile_picture,
            followers: self.follower_count,
            is_verified: false,
        }
    }
}
