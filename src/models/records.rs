// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Flat table rows, one struct per collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row in `stories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRecord {
    /// Story ID (also used as document ID)
    pub id: u64,
    /// Owning user ID
    pub user_id: u64,
    pub title: String,
    /// Insertion time; listings are ordered by it
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Row in `activities`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Activity ID (also used as document ID)
    pub id: u64,
    pub title: String,
    /// References `activity_categories.id`
    pub category_id: u64,
}

/// Row in `activity_categories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityCategoryRecord {
    /// Category ID (also used as document ID)
    pub id: u64,
    pub title: String,
}

/// Story-activity join row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryActivity {
    pub story_id: u64,
    pub activity_id: u64,
    /// Index of the activity within the story
    pub position: u32,
}

impl StoryActivity {
    /// Document ID: story and position, so a story never links twice at one slot.
    pub fn document_id(&self) -> String {
        format!("{}_{}", self.story_id, self.position)
    }
}
