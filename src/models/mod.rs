// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod platform;
pub mod profile;
pub mod stats;
pub mod train;

pub use platform::{Platform, PlatformInfo, PLATFORMS};
pub use profile::Profile;
pub use stats::{PlatformCount, TrainStats};
pub use train::{Participant, Train, TrainUpdate};
