// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile metadata returned by the profile resolver.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Public profile of one account. Same shape whether it came from a live
/// platform API or was synthesized as a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    pub username: String,
    pub display_name: String,
    pub bio: String,
    /// Avatar image URL
    pub avatar: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub followers: u64,
    pub is_verified: bool,
}
