// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Story graph entities as the persistence layer hands them out.
//!
//! An `id` of `None` marks an entity that has not been stored yet. Every
//! entity read back from storage carries `Some(id)`.

/// Largest id that survives a round trip through a JSON number (2^53 - 1).
pub const MAX_ID: u64 = (1 << 53) - 1;

/// A diary entry owned by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    pub id: Option<u64>,
    /// Owning user; fixed at creation
    pub user_id: u64,
    pub title: String,
    /// Attached activities, in the order they were submitted
    pub activities: Vec<Activity>,
}

/// A reusable labeled action, shared between stories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: Option<u64>,
    pub title: String,
    pub category: ActivityCategory,
}

/// Label grouping activities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCategory {
    pub id: Option<u64>,
    pub title: String,
}
