// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Story service: persistence plus DTO mapping.
//!
//! The only place that decides whether a story exists. Ownership is checked
//! by the caller with [`crate::services::access::ensure_owner`] on the story
//! returned by [`StoryService::load`], which is then passed back in, so a
//! request reads each story once.

use crate::db::StoryDb;
use crate::dto::{SaveStoryDto, StoryDto};
use crate::error::{AppError, Result};
use crate::models::Story;
use crate::services::mapping::{story_to_dto, story_to_entity};

#[derive(Clone)]
pub struct StoryService {
    db: StoryDb,
}

impl StoryService {
    pub fn new(db: StoryDb) -> Self {
        Self { db }
    }

    /// Load a story entity, or `NotFound`.
    pub async fn load(&self, story_id: u64) -> Result<Story> {
        self.db
            .find_by_id(story_id)
            .await?
            .ok_or_else(|| AppError::story_not_found(story_id))
    }

    pub async fn find_by_id(&self, story_id: u64) -> Result<StoryDto> {
        self.view(self.load(story_id).await?)
    }

    /// Map a story from [`StoryService::load`] to its response form.
    pub fn view(&self, story: Story) -> Result<StoryDto> {
        story_to_dto(story)
    }

    /// Delete a story. Nothing is deleted if the id is unknown.
    pub async fn remove(&self, story_id: u64) -> Result<()> {
        if !self.db.exists_by_id(story_id).await? {
            return Err(AppError::story_not_found(story_id));
        }

        self.db.delete_by_id(story_id).await?;
        tracing::info!(story_id, "Story removed");
        Ok(())
    }

    pub async fn create(&self, user_id: u64, story: &SaveStoryDto) -> Result<StoryDto> {
        let saved = self.db.save(&story_to_entity(story, user_id, None)).await?;

        tracing::info!(
            story_id = saved.id,
            user_id,
            activities = saved.activities.len(),
            "Story created"
        );

        story_to_dto(saved)
    }

    /// Replace title and activities of an existing story.
    ///
    /// The owner is carried over from the stored record; anything the body
    /// says about ownership is ignored.
    pub async fn update(&self, story_id: u64, story: &SaveStoryDto) -> Result<StoryDto> {
        let existing = self.load(story_id).await?;
        self.replace(&existing, story).await
    }

    /// Same as [`StoryService::update`] for a story the caller already loaded.
    pub async fn replace(&self, existing: &Story, story: &SaveStoryDto) -> Result<StoryDto> {
        let story_id = existing.id.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "story retrieved from storage is supposed to have an id"
            ))
        })?;

        let saved = self
            .db
            .save(&story_to_entity(story, existing.user_id, Some(story_id)))
            .await?;

        tracing::info!(
            story_id,
            user_id = existing.user_id,
            activities = saved.activities.len(),
            "Story updated"
        );

        story_to_dto(saved)
    }

    /// One zero-indexed page of a user's stories. An empty page is not an error.
    pub async fn find_by_user_id(
        &self,
        user_id: u64,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<StoryDto>> {
        let stories = self.db.find_by_user_id(user_id, page, page_size).await?;

        tracing::debug!(user_id, page, page_size, count = stories.len(), "Fetched stories");

        stories.into_iter().map(story_to_dto).collect()
    }
}
