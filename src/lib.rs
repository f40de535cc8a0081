// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Follow-Train: shareable groups of linked social profiles.
//!
//! This crate provides the backend API that stores trains, lets people
//! join them, and proxies profile lookups to social platforms.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::TrainDb;
use services::{ProfileResolver, TrainService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub profiles: ProfileResolver,
    pub trains: TrainService,
}

impl AppState {
    /// Wire services on top of an already-connected store.
    pub fn new(config: Config, db: TrainDb) -> anyhow::Result<Self> {
        let profiles = ProfileResolver::new(&config)?;
        let trains = TrainService::new(db, profiles.clone());
        Ok(Self {
            config,
            profiles,
            trains,
        })
    }
}
