// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Username extraction from profile URLs or bare handles.

use crate::models::platform::{Platform, PLATFORMS};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Compiled patterns for one platform.
struct Matchers {
    url: Regex,
    /// Matches every character *outside* the allowed class.
    disallowed: Regex,
}

static MATCHERS: OnceLock<HashMap<Platform, Matchers>> = OnceLock::new();

fn matchers(platform: Platform) -> &'static Matchers {
    let all = MATCHERS.get_or_init(|| {
        PLATFORMS
            .iter()
            .map(|spec| {
                let url = Regex::new(spec.url_pattern).unwrap_or_else(|error| {
                    panic!("{} URL pattern failed to compile: {error}", spec.id)
                });
                let disallowed = Regex::new(&format!("[^{}]", spec.allowed_chars))
                    .unwrap_or_else(|error| {
                        panic!("{} character class failed to compile: {error}", spec.id)
                    });
                (spec.platform, Matchers { url, disallowed })
            })
            .collect()
    });
    &all[&platform]
}

/// Normalize raw user input to a canonical username for `platform`.
///
/// Accepts either a profile URL (scheme and `www.` optional) or a handle
/// with an optional leading `@`. Returns `None` when nothing usable is
/// left; callers treat that as invalid input.
pub fn extract_username(raw_input: &str, platform: Platform) -> Option<String> {
    let trimmed = raw_input.trim();
    let cleaned = trimmed.strip_prefix('@').unwrap_or(trimmed);
    let m = matchers(platform);

    let username = match m.url.captures(cleaned).and_then(|caps| caps.get(1)) {
        Some(captured) => captured.as_str().to_string(),
        None => m.disallowed.replace_all(cleaned, "").into_owned(),
    };

    (!username.is_empty()).then_some(username)
}
