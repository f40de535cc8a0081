// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod profile;
pub mod train;
pub mod username;

pub use profile::{fallback_profile, ProfileResolver};
pub use train::TrainService;
pub use username::extract_username;
