// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supported social platforms and their profile-URL table.
//!
//! Everything platform-specific (URL shape, allowed handle characters,
//! deep-link template) lives in [`PLATFORMS`]; the rest of the crate only
//! looks rows up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A platform a train can be created for. Immutable once a train exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Platform {
    Instagram,
    Tiktok,
    Twitter,
    Linkedin,
    Facebook,
    Telegram,
}

/// One row of the platform table.
#[derive(Debug)]
pub struct PlatformSpec {
    pub platform: Platform,
    /// Lowercase identifier used on the wire and in routes.
    pub id: &'static str,
    /// Human-readable name ("Twitter/X").
    pub name: &'static str,
    /// Profile URL pattern; capture group 1 is the username.
    pub url_pattern: &'static str,
    /// Character class (without brackets) of characters allowed in a handle.
    pub allowed_chars: &'static str,
    /// Canonical profile link, `{u}` is replaced by the username.
    pub deep_link: &'static str,
}

pub const PLATFORMS: &[PlatformSpec] = &[
    PlatformSpec {
        platform: Platform::Instagram,
        id: "instagram",
        name: "Instagram",
        url_pattern: r"(?i)^(?:https?://)?(?:www\.)?instagram\.com/([A-Za-z0-9_.]+)",
        allowed_chars: "A-Za-z0-9_.",
        deep_link: "https://instagram.com/{u}",
    },
    PlatformSpec {
        platform: Platform::Tiktok,
        id: "tiktok",
        name: "TikTok",
        url_pattern: r"(?i)^(?:https?://)?(?:www\.)?tiktok\.com/@([A-Za-z0-9_.]+)",
        allowed_chars: "A-Za-z0-9_.",
        deep_link: "https://tiktok.com/@{u}",
    },
    PlatformSpec {
        platform: Platform::Twitter,
        id: "twitter",
        name: "Twitter/X",
        url_pattern: r"(?i)^(?:https?://)?(?:www\.)?(?:twitter|x)\.com/([A-Za-z0-9_]+)",
        allowed_chars: "A-Za-z0-9_",
        deep_link: "https://x.com/{u}",
    },
    PlatformSpec {
        platform: Platform::Linkedin,
        id: "linkedin",
        name: "LinkedIn",
        url_pattern: r"(?i)^(?:https?://)?(?:www\.)?linkedin\.com/in/([A-Za-z0-9-]+)",
        allowed_chars: "A-Za-z0-9-",
        deep_link: "https://linkedin.com/in/{u}",
    },
    PlatformSpec {
        platform: Platform::Facebook,
        id: "facebook",
        name: "Facebook",
        url_pattern: r"(?i)^(?:https?://)?(?:www\.)?facebook\.com/([A-Za-z0-9.]+)",
        allowed_chars: "A-Za-z0-9.",
        deep_link: "https://facebook.com/{u}",
    },
    PlatformSpec {
        platform: Platform::Telegram,
        id: "telegram",
        name: "Telegram",
        url_pattern: r"(?i)^(?:https?://)?(?:www\.)?t\.me/([A-Za-z0-9_]+)",
        allowed_chars: "A-Za-z0-9_",
        deep_link: "https://t.me/{u}",
    },
];

impl Platform {
    /// All platforms, in table order.
    pub fn all() -> impl Iterator<Item = Platform> {
        PLATFORMS.iter().map(|spec| spec.platform)
    }

    /// This platform's table row.
    pub fn spec(self) -> &'static PlatformSpec {
        // Every variant has exactly one row; the table test enforces it.
        PLATFORMS
            .iter()
            .find(|spec| spec.platform == self)
            .unwrap_or(&PLATFORMS[0])
    }

    pub fn id(self) -> &'static str {
        self.spec().id
    }

    pub fn display_name(self) -> &'static str {
        self.spec().name
    }

    /// Default train name, e.g. "Twitter/X Train".
    pub fn default_train_name(self) -> String {
        format!("{} Train", self.display_name())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        PLATFORMS
            .iter()
            .find(|spec| spec.id == needle)
            .map(|spec| spec.platform)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

/// Catalogue entry returned by `GET /api/platforms`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlatformInfo {
    pub id: Platform,
    pub name: String,
    pub deep_link_template: String,
}

impl From<&PlatformSpec> for PlatformInfo {
    fn from(spec: &PlatformSpec) -> Self {
        Self {
            id: spec.platform,
            name: spec.name.to_string(),
            deep_link_template: spec.deep_link.to_string(),
        }
    }
}
