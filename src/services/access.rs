// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-story ownership check.

use crate::error::{AppError, Result};
use crate::models::Story;

/// Allow the operation only if `acting_user_id` owns `story`.
pub fn ensure_owner(acting_user_id: u64, story: &Story) -> Result<()> {
    if story.user_id == acting_user_id {
        return Ok(());
    }

    Err(AppError::AccessDenied(format!(
        "Story with id {} does not belong to user with id {}",
        story.id.unwrap_or_default(),
        acting_user_id
    )))
}
