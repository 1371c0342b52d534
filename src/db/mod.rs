//! Database layer: the persistence gateway for stories.
//!
//! [`StoryDb`] is the handle the rest of the application uses. It forwards
//! to Firestore in production or to the in-process store for local runs and
//! tests. Both backends share the table layout in [`collections`] and the
//! graph assembly in [`graph`].

pub mod firestore;
pub mod graph;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::config::StorageBackend;
use crate::error::AppError;
use crate::models::{Activity, ActivityCategory, Story};

/// Collection names as constants.
pub mod collections {
    pub const STORIES: &str = "stories";
    pub const ACTIVITIES: &str = "activities";
    pub const ACTIVITY_CATEGORIES: &str = "activity_categories";
    /// Story-activity join rows (keyed by `{story_id}_{position}`)
    pub const STORY_ACTIVITIES: &str = "story_activities";
}

/// Persistence gateway over one of the storage backends.
#[derive(Clone)]
pub enum StoryDb {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl StoryDb {
    /// Connect to the configured backend.
    pub async fn connect(storage: &StorageBackend) -> Result<Self, AppError> {
        match storage {
            StorageBackend::Memory => {
                tracing::info!("Using in-memory story storage");
                Ok(Self::Memory(MemoryDb::new()))
            }
            StorageBackend::Firestore { project_id } => {
                Ok(Self::Firestore(FirestoreDb::new(project_id).await?))
            }
        }
    }

    /// Story with activities and categories loaded, if it exists.
    pub async fn find_by_id(&self, story_id: u64) -> Result<Option<Story>, AppError> {
        match self {
            Self::Firestore(db) => db.find_story(story_id).await,
            Self::Memory(db) => db.find_story(story_id).await,
        }
    }

    pub async fn exists_by_id(&self, story_id: u64) -> Result<bool, AppError> {
        match self {
            Self::Firestore(db) => db.story_exists(story_id).await,
            Self::Memory(db) => db.story_exists(story_id).await,
        }
    }

    /// Delete a story and its activity links. Absent ids are a no-op.
    pub async fn delete_by_id(&self, story_id: u64) -> Result<(), AppError> {
        match self {
            Self::Firestore(db) => db.delete_story(story_id).await,
            Self::Memory(db) => db.delete_story(story_id).await,
        }
    }

    /// Insert (no id) or fully replace (id present) a story.
    ///
    /// Returns the stored graph with every id assigned.
    pub async fn save(&self, story: &Story) -> Result<Story, AppError> {
        match self {
            Self::Firestore(db) => db.save_story(story).await,
            Self::Memory(db) => db.save_story(story).await,
        }
    }

    /// Zero-indexed page of the stories owned by `user_id`, in insertion order.
    pub async fn find_by_user_id(
        &self,
        user_id: u64,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Story>, AppError> {
        match self {
            Self::Firestore(db) => db.find_stories_for_user(user_id, page, page_size).await,
            Self::Memory(db) => db.find_stories_for_user(user_id, page, page_size).await,
        }
    }

    /// Every story, eagerly loaded. Only meant for consistency checks.
    pub async fn find_all(&self) -> Result<Vec<Story>, AppError> {
        match self {
            Self::Firestore(db) => db.find_all_stories().await,
            Self::Memory(db) => db.find_all_stories().await,
        }
    }

    pub async fn save_activity_category(
        &self,
        category: &ActivityCategory,
    ) -> Result<ActivityCategory, AppError> {
        match self {
            Self::Firestore(db) => db.save_activity_category(category).await,
            Self::Memory(db) => db.save_activity_category(category).await,
        }
    }

    pub async fn save_activity(&self, activity: &Activity) -> Result<Activity, AppError> {
        match self {
            Self::Firestore(db) => db.save_activity(activity).await,
            Self::Memory(db) => db.save_activity(activity).await,
        }
    }

    pub async fn find_activity(&self, activity_id: u64) -> Result<Option<Activity>, AppError> {
        match self {
            Self::Firestore(db) => db.find_activity(activity_id).await,
            Self::Memory(db) => db.find_activity(activity_id).await,
        }
    }
}
