// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process table store.
//!
//! Holds the same four tables as the Firestore collections behind a single
//! `RwLock`, so each save or delete is applied atomically. Ids come from a
//! monotonic counter per table.

use crate::db::graph::{self, ReferencedRows, References, Table};
use crate::error::AppError;
use crate::models::{
    Activity, ActivityCategory, ActivityCategoryRecord, ActivityRecord, Story, StoryActivity,
    StoryRecord, MAX_ID,
};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    stories: BTreeMap<u64, StoryRecord>,
    activities: BTreeMap<u64, ActivityRecord>,
    categories: BTreeMap<u64, ActivityCategoryRecord>,
    story_activities: Vec<StoryActivity>,
    sequences: HashMap<Table, u64>,
}

impl Tables {
    fn next_id(&mut self, table: Table) -> Result<u64, AppError> {
        let seq = self.sequences.entry(table).or_insert(0);
        let id = seq
            .checked_add(1)
            .filter(|id| *id <= MAX_ID)
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("{:?} id sequence exhausted", table))
            })?;
        *seq = id;
        Ok(id)
    }

    /// Keep the sequence ahead of ids supplied by callers.
    fn observe_id(&mut self, table: Table, id: u64) {
        let seq = self.sequences.entry(table).or_insert(0);
        *seq = (*seq).max(id);
    }

    fn put_category(&mut self, row: ActivityCategoryRecord) {
        self.observe_id(Table::ActivityCategories, row.id);
        self.categories.insert(row.id, row);
    }

    fn put_activity(&mut self, row: ActivityRecord) {
        self.observe_id(Table::Activities, row.id);
        self.activities.insert(row.id, row);
    }

    /// Look up the stored rows a story points at. Missing ids are left out.
    fn referenced(&self, refs: &References) -> ReferencedRows {
        let activities = graph::index_by_id(
            refs.activity_ids
                .iter()
                .filter_map(|id| self.activities.get(id).cloned()),
            |a| a.id,
        );
        let categories = graph::index_by_id(
            refs.category_ids
                .iter()
                .copied()
                .chain(activities.values().map(|a| a.category_id))
                .filter_map(|id| self.categories.get(&id).cloned()),
            |c| c.id,
        );
        ReferencedRows {
            activities,
            categories,
        }
    }

    /// Assemble graphs for the given story rows.
    fn load(&self, records: Vec<StoryRecord>) -> Result<Vec<Story>, AppError> {
        let links: Vec<StoryActivity> = self
            .story_activities
            .iter()
            .filter(|link| records.iter().any(|r| r.id == link.story_id))
            .cloned()
            .collect();

        let activities = graph::index_by_id(
            links
                .iter()
                .filter_map(|link| self.activities.get(&link.activity_id).cloned()),
            |a| a.id,
        );
        let categories = graph::index_by_id(
            activities
                .values()
                .filter_map(|a| self.categories.get(&a.category_id).cloned()),
            |c| c.id,
        );

        graph::assemble_stories(records, links, &activities, &categories)
    }

    /// Stories in insertion order.
    fn ordered_stories(&self) -> Vec<&StoryRecord> {
        let mut stories: Vec<&StoryRecord> = self.stories.values().collect();
        stories.sort_by_key(|s| (s.created_at, s.id));
        stories
    }
}

/// In-memory database handle. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDb {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Story Operations ────────────────────────────────────────

    pub async fn find_story(&self, story_id: u64) -> Result<Option<Story>, AppError> {
        let tables = self.tables.read().await;
        let Some(record) = tables.stories.get(&story_id).cloned() else {
            return Ok(None);
        };
        Ok(tables.load(vec![record])?.pop())
    }

    pub async fn story_exists(&self, story_id: u64) -> Result<bool, AppError> {
        Ok(self.tables.read().await.stories.contains_key(&story_id))
    }

    /// Delete a story and its join rows. Activities and categories stay.
    pub async fn delete_story(&self, story_id: u64) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables.stories.remove(&story_id);
        tables
            .story_activities
            .retain(|link| link.story_id != story_id);
        Ok(())
    }

    /// Insert or fully replace a story.
    ///
    /// New activities and categories are inserted; ones given by id are
    /// linked as stored.
    pub async fn save_story(&self, story: &Story) -> Result<Story, AppError> {
        let mut tables = self.tables.write().await;

        let created_at = story
            .id
            .and_then(|id| tables.stories.get(&id))
            .map(|existing| existing.created_at)
            .unwrap_or_else(Utc::now);

        let referenced = tables.referenced(&graph::references(story));
        let rows = graph::flatten_story(story, created_at, referenced, |table| {
            tables.next_id(table)
        })?;

        for category in rows.categories.iter().cloned() {
            tables.put_category(category);
        }
        for activity in rows.activities.iter().cloned() {
            tables.put_activity(activity);
        }

        let story_id = rows.story.id;
        tables.observe_id(Table::Stories, story_id);
        tables.stories.insert(story_id, rows.story.clone());
        tables
            .story_activities
            .retain(|link| link.story_id != story_id);
        tables.story_activities.extend(rows.links.iter().cloned());

        rows.into_story()
    }

    /// One page of a user's stories, in insertion order.
    pub async fn find_stories_for_user(
        &self,
        user_id: u64,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Story>, AppError> {
        let tables = self.tables.read().await;
        let offset = (page as usize).saturating_mul(page_size as usize);

        let records: Vec<StoryRecord> = tables
            .ordered_stories()
            .into_iter()
            .filter(|s| s.user_id == user_id)
            .skip(offset)
            .take(page_size as usize)
            .cloned()
            .collect();

        tables.load(records)
    }

    pub async fn find_all_stories(&self) -> Result<Vec<Story>, AppError> {
        let tables = self.tables.read().await;
        let records: Vec<StoryRecord> = tables.ordered_stories().into_iter().cloned().collect();
        tables.load(records)
    }

    // ─── Activity Operations ─────────────────────────────────────

    pub async fn save_activity_category(
        &self,
        category: &ActivityCategory,
    ) -> Result<ActivityCategory, AppError> {
        let mut tables = self.tables.write().await;
        let row = graph::flatten_category(category, &mut |table| tables.next_id(table))?;
        let saved = ActivityCategory {
            id: Some(row.id),
            title: row.title.clone(),
        };
        tables.put_category(row);
        Ok(saved)
    }

    pub async fn save_activity(&self, activity: &Activity) -> Result<Activity, AppError> {
        let mut tables = self.tables.write().await;
        let (row, category) =
            graph::flatten_activity(activity, &mut |table| tables.next_id(table))?;
        let categories = graph::index_by_id([category.clone()], |c| c.id);
        let saved = graph::assemble_activity(&row, &categories)?;
        tables.put_category(category);
        tables.put_activity(row);
        Ok(saved)
    }

    pub async fn find_activity(&self, activity_id: u64) -> Result<Option<Activity>, AppError> {
        let tables = self.tables.read().await;
        let Some(row) = tables.activities.get(&activity_id) else {
            return Ok(None);
        };
        let categories = graph::index_by_id(
            tables.categories.get(&row.category_id).cloned(),
            |c| c.id,
        );
        graph::assemble_activity(row, &categories).map(Some)
    }
}
