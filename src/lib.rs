// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Reflexy Diary: a personal diary backend
//!
//! Authenticated users write stories, each a title plus a list of shared
//! activities grouped into categories. Every story is private to the user
//! who created it.

pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::StoryDb;
use services::StoryService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: StoryDb,
    pub story_service: StoryService,
}

impl AppState {
    /// Wire the services on top of a connected database.
    pub fn new(config: Config, db: StoryDb) -> Self {
        let story_service = StoryService::new(db.clone());
        Self {
            config,
            db,
            story_service,
        }
    }
}
