// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Stories (one document per story, owner and insertion time)
//! - Activities and activity categories (shared between stories)
//! - Story-Activities (join collection, one document per attached activity)
//!
//! Listing a user's stories filters on `user_id` and orders by `created_at`,
//! which needs a composite index on `stories (user_id ASC, created_at ASC)`.

use crate::db::collections;
use crate::db::graph::{self, ReferencedRows, References, StoryRows};
use crate::error::AppError;
use crate::models::{
    Activity, ActivityCategory, ActivityCategoryRecord, ActivityRecord, Story, StoryActivity,
    StoryRecord, MAX_ID,
};
use futures_util::{stream, StreamExt};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Random id in the JSON-safe integer range (53 bits), never zero.
fn generate_id() -> u64 {
    (uuid::Uuid::new_v4().as_u64_pair().0 >> 11).clamp(1, MAX_ID)
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Story Operations ────────────────────────────────────────

    /// Get a story with its activities and their categories.
    pub async fn find_story(&self, story_id: u64) -> Result<Option<Story>, AppError> {
        let Some(record) = self.get_story_record(story_id).await? else {
            return Ok(None);
        };
        Ok(self.load_graphs(vec![record]).await?.pop())
    }

    pub async fn story_exists(&self, story_id: u64) -> Result<bool, AppError> {
        Ok(self.get_story_record(story_id).await?.is_some())
    }

    /// Delete a story document and its join documents in one transaction.
    pub async fn delete_story(&self, story_id: u64) -> Result<(), AppError> {
        let client = self.get_client()?;
        let links = self.get_links(story_id).await?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for link in &links {
            client
                .fluent()
                .delete()
                .from(collections::STORY_ACTIVITIES)
                .document_id(link.document_id())
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add link deletion to transaction: {}", e))
                })?;
        }

        client
            .fluent()
            .delete()
            .from(collections::STORIES)
            .document_id(story_id.to_string())
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add story deletion to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(story_id, links = links.len(), "Deleted story documents");
        Ok(())
    }

    /// Insert or fully replace a story.
    ///
    /// New categories and activities, the story and its join documents are
    /// written in one transaction. Activities and categories given by id are
    /// only linked. Join documents beyond the new activity count are deleted;
    /// the rest are overwritten in place.
    pub async fn save_story(&self, story: &Story) -> Result<Story, AppError> {
        let client = self.get_client()?;

        let (created_at, stale_links) = match story.id {
            Some(story_id) => (
                self.get_story_record(story_id)
                    .await?
                    .map(|existing| existing.created_at),
                self.get_links(story_id).await?,
            ),
            None => (None, Vec::new()),
        };
        let created_at = created_at.unwrap_or_else(chrono::Utc::now);

        let referenced = self.get_referenced(graph::references(story)).await?;
        let rows = graph::flatten_story(story, created_at, referenced, |_| Ok(generate_id()))?;
        let link_count = rows.links.len() as u32;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for link in stale_links.iter().filter(|l| l.position >= link_count) {
            client
                .fluent()
                .delete()
                .from(collections::STORY_ACTIVITIES)
                .document_id(link.document_id())
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add link deletion to transaction: {}", e))
                })?;
        }

        Self::write_rows(client, &rows, &mut transaction)?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            story_id = rows.story.id,
            activities = rows.links.len(),
            "Stored story documents"
        );

        rows.into_story()
    }

    /// Get one page of a user's stories, oldest first.
    pub async fn find_stories_for_user(
        &self,
        user_id: u64,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Story>, AppError> {
        let records: Vec<StoryRecord> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::STORIES)
            .filter(move |q| q.field("user_id").eq(user_id))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .limit(page_size)
            .offset(page.saturating_mul(page_size))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.load_graphs(records).await
    }

    /// Get every story with its activities.
    pub async fn find_all_stories(&self) -> Result<Vec<Story>, AppError> {
        let records: Vec<StoryRecord> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::STORIES)
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.load_graphs(records).await
    }

    // ─── Activity Operations ─────────────────────────────────────

    pub async fn save_activity_category(
        &self,
        category: &ActivityCategory,
    ) -> Result<ActivityCategory, AppError> {
        let row = graph::flatten_category(category, &mut |_| Ok(generate_id()))?;

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITY_CATEGORIES)
            .document_id(row.id.to_string())
            .object(&row)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ActivityCategory {
            id: Some(row.id),
            title: row.title,
        })
    }

    /// Store an activity together with its category.
    pub async fn save_activity(&self, activity: &Activity) -> Result<Activity, AppError> {
        let client = self.get_client()?;
        let (row, category) = graph::flatten_activity(activity, &mut |_| Ok(generate_id()))?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::ACTIVITY_CATEGORIES)
            .document_id(category.id.to_string())
            .object(&category)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add category to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(row.id.to_string())
            .object(&row)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add activity to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        let categories = graph::index_by_id([category], |c| c.id);
        graph::assemble_activity(&row, &categories)
    }

    pub async fn find_activity(&self, activity_id: u64) -> Result<Option<Activity>, AppError> {
        let Some(row) = self
            .get_documents::<ActivityRecord>(collections::ACTIVITIES, [activity_id].into())
            .await?
            .pop()
        else {
            return Ok(None);
        };

        let categories = graph::index_by_id(
            self.get_documents::<ActivityCategoryRecord>(
                collections::ACTIVITY_CATEGORIES,
                [row.category_id].into(),
            )
            .await?,
            |c| c.id,
        );

        graph::assemble_activity(&row, &categories).map(Some)
    }

    // ─── Helper Methods ────────────────────────────────────────────

    async fn get_story_record(&self, story_id: u64) -> Result<Option<StoryRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::STORIES)
            .obj()
            .one(&story_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Join documents for one story, in no particular order.
    async fn get_links(&self, story_id: u64) -> Result<Vec<StoryActivity>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::STORY_ACTIVITIES)
            .filter(move |q| q.field("story_id").eq(story_id))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch documents by id with bounded concurrency. Missing ids are skipped.
    async fn get_documents<T>(&self, collection: &str, ids: BTreeSet<u64>) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let client = self.get_client()?;

        let found = stream::iter(ids)
            .map(|id| async move {
                client
                    .fluent()
                    .select()
                    .by_id_in(collection)
                    .obj::<T>()
                    .one(&id.to_string())
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<T>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<T>>, AppError>>()?;

        Ok(found.into_iter().flatten().collect())
    }

    /// Fetch the stored rows a story points at. Missing ids are left out.
    async fn get_referenced(&self, refs: References) -> Result<ReferencedRows, AppError> {
        let activities = graph::index_by_id(
            self.get_documents::<ActivityRecord>(collections::ACTIVITIES, refs.activity_ids)
                .await?,
            |a| a.id,
        );

        let mut category_ids = refs.category_ids;
        category_ids.extend(activities.values().map(|a| a.category_id));
        let categories = graph::index_by_id(
            self.get_documents::<ActivityCategoryRecord>(
                collections::ACTIVITY_CATEGORIES,
                category_ids,
            )
            .await?,
            |c| c.id,
        );

        Ok(ReferencedRows {
            activities,
            categories,
        })
    }

    /// Load join rows, activities and categories for `records` and assemble them.
    async fn load_graphs(&self, records: Vec<StoryRecord>) -> Result<Vec<Story>, AppError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let links: Vec<StoryActivity> = stream::iter(records.iter().map(|r| r.id).collect::<Vec<u64>>())
            .map(|story_id| self.get_links(story_id))
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Vec<StoryActivity>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, AppError>>()?
            .into_iter()
            .flatten()
            .collect();

        let activity_ids: BTreeSet<u64> = links.iter().map(|l| l.activity_id).collect();
        let activities = graph::index_by_id(
            self.get_documents::<ActivityRecord>(collections::ACTIVITIES, activity_ids)
                .await?,
            |a| a.id,
        );

        let category_ids: BTreeSet<u64> = activities.values().map(|a| a.category_id).collect();
        let categories = graph::index_by_id(
            self.get_documents::<ActivityCategoryRecord>(
                collections::ACTIVITY_CATEGORIES,
                category_ids,
            )
            .await?,
            |c| c.id,
        );

        tracing::debug!(
            stories = records.len(),
            links = links.len(),
            activities = activities.len(),
            "Loaded story graphs"
        );

        graph::assemble_stories(records, links, &activities, &categories)
    }

    /// Add every row of a flattened story to `transaction`.
    fn write_rows(
        client: &firestore::FirestoreDb,
        rows: &StoryRows,
        transaction: &mut firestore::FirestoreTransaction<'_>,
    ) -> Result<(), AppError> {
        for category in &rows.categories {
            client
                .fluent()
                .update()
                .in_col(collections::ACTIVITY_CATEGORIES)
                .document_id(category.id.to_string())
                .object(category)
                .add_to_transaction(transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add category to transaction: {}", e))
                })?;
        }

        for activity in &rows.activities {
            client
                .fluent()
                .update()
                .in_col(collections::ACTIVITIES)
                .document_id(activity.id.to_string())
                .object(activity)
                .add_to_transaction(transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add activity to transaction: {}", e))
                })?;
        }

        client
            .fluent()
            .update()
            .in_col(collections::STORIES)
            .document_id(rows.story.id.to_string())
            .object(&rows.story)
            .add_to_transaction(transaction)
            .map_err(|e| AppError::Database(format!("Failed to add story to transaction: {}", e)))?;

        for link in &rows.links {
            client
                .fluent()
                .update()
                .in_col(collections::STORY_ACTIVITIES)
                .document_id(link.document_id())
                .object(link)
                .add_to_transaction(transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add link to transaction: {}", e))
                })?;
        }

        Ok(())
    }
}
