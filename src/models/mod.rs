// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod records;
pub mod story;

pub use records::{ActivityCategoryRecord, ActivityRecord, StoryActivity, StoryRecord};
pub use story::{Activity, ActivityCategory, Story, MAX_ID};
