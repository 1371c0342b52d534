// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversion between story graphs and flat table rows.
//!
//! Both storage backends keep the same four tables. Writes flatten a
//! [`Story`] into rows; reads fetch the rows for a set of stories and
//! assemble the graph in a single in-memory pass over the join table.

use crate::error::AppError;
use crate::models::{
    Activity, ActivityCategory, ActivityCategoryRecord, ActivityRecord, Story, StoryActivity,
    StoryRecord, MAX_ID,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

/// Tables that own an id sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Stories,
    Activities,
    ActivityCategories,
}

/// Ids of stored rows a story points at instead of defining them.
///
/// An activity with an id is linked as stored; the category sent with it is
/// ignored. A new activity may point at a stored category by id.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct References {
    pub activity_ids: BTreeSet<u64>,
    pub category_ids: BTreeSet<u64>,
}

/// Stored rows named by [`References`], plus the categories of those
/// activities.
#[derive(Debug, Clone, Default)]
pub struct ReferencedRows {
    pub activities: HashMap<u64, ActivityRecord>,
    pub categories: HashMap<u64, ActivityCategoryRecord>,
}

/// All rows needed to store one story.
#[derive(Debug, Clone)]
pub struct StoryRows {
    pub story: StoryRecord,
    /// Rows to insert. Referenced rows are never rewritten.
    pub activities: Vec<ActivityRecord>,
    pub categories: Vec<ActivityCategoryRecord>,
    /// One link per submitted activity, positions `0..n`
    pub links: Vec<StoryActivity>,
    referenced: ReferencedRows,
}

impl StoryRows {
    /// Rebuild the stored graph from the new rows and the referenced ones.
    pub fn into_story(self) -> Result<Story, AppError> {
        let mut activities = self.referenced.activities;
        activities.extend(self.activities.into_iter().map(|a| (a.id, a)));
        let mut categories = self.referenced.categories;
        categories.extend(self.categories.into_iter().map(|c| (c.id, c)));

        assemble_stories(vec![self.story], self.links, &activities, &categories)?
            .pop()
            .ok_or_else(|| AppError::Database("Story rows assembled to nothing".to_string()))
    }
}

fn check_id_range(entity: &str, id: u64) -> Result<u64, AppError> {
    if id == 0 || id > MAX_ID {
        return Err(AppError::BadRequest(format!(
            "{} id {} is out of range",
            entity, id
        )));
    }
    Ok(id)
}

fn missing_reference(entity: &str, id: u64) -> AppError {
    AppError::BadRequest(format!("{} with id {} does not exist", entity, id))
}

/// Collect the stored rows a story refers to by id.
pub fn references(story: &Story) -> References {
    let mut refs = References::default();
    for activity in &story.activities {
        match (activity.id, activity.category.id) {
            (Some(id), _) => {
                refs.activity_ids.insert(id);
            }
            (None, Some(category_id)) => {
                refs.category_ids.insert(category_id);
            }
            (None, None) => {}
        }
    }
    refs
}

/// Flatten a category for a standalone save, allocating an id if it has none.
pub fn flatten_category(
    category: &ActivityCategory,
    next_id: &mut impl FnMut(Table) -> Result<u64, AppError>,
) -> Result<ActivityCategoryRecord, AppError> {
    let id = match category.id {
        Some(id) => check_id_range("Category", id)?,
        None => next_id(Table::ActivityCategories)?,
    };
    Ok(ActivityCategoryRecord {
        id,
        title: category.title.clone(),
    })
}

/// Flatten an activity and its category for a standalone save.
pub fn flatten_activity(
    activity: &Activity,
    next_id: &mut impl FnMut(Table) -> Result<u64, AppError>,
) -> Result<(ActivityRecord, ActivityCategoryRecord), AppError> {
    let category = flatten_category(&activity.category, next_id)?;
    let id = match activity.id {
        Some(id) => check_id_range("Activity", id)?,
        None => next_id(Table::Activities)?,
    };
    let record = ActivityRecord {
        id,
        title: activity.title.clone(),
        category_id: category.id,
    };
    Ok((record, category))
}

/// Flatten a whole story for writing.
///
/// Activities and categories that carry an id must be present in
/// `referenced`; they are only linked. Rows without an id are allocated and
/// returned for insertion. `created_at` is passed in so a replace can keep
/// the original insertion time.
pub fn flatten_story(
    story: &Story,
    created_at: DateTime<Utc>,
    referenced: ReferencedRows,
    mut next_id: impl FnMut(Table) -> Result<u64, AppError>,
) -> Result<StoryRows, AppError> {
    let story_id = match story.id {
        Some(id) => id,
        None => next_id(Table::Stories)?,
    };
    let mut activities = Vec::new();
    let mut categories = Vec::new();
    let mut links = Vec::with_capacity(story.activities.len());

    for (position, activity) in story.activities.iter().enumerate() {
        let activity_id = match activity.id {
            Some(id) if referenced.activities.contains_key(&id) => id,
            Some(id) => return Err(missing_reference("Activity", id)),
            None => {
                let category_id = match activity.category.id {
                    Some(id) if referenced.categories.contains_key(&id) => id,
                    Some(id) => return Err(missing_reference("Category", id)),
                    None => {
                        let id = next_id(Table::ActivityCategories)?;
                        categories.push(ActivityCategoryRecord {
                            id,
                            title: activity.category.title.clone(),
                        });
                        id
                    }
                };
                let id = next_id(Table::Activities)?;
                activities.push(ActivityRecord {
                    id,
                    title: activity.title.clone(),
                    category_id,
                });
                id
            }
        };

        links.push(StoryActivity {
            story_id,
            activity_id,
            position: position as u32,
        });
    }

    Ok(StoryRows {
        story: StoryRecord {
            id: story_id,
            user_id: story.user_id,
            title: story.title.clone(),
            created_at,
        },
        activities,
        categories,
        links,
        referenced,
    })
}

/// Assemble story graphs from their rows.
///
/// `links` may contain rows for stories not in `stories`; they are ignored.
/// A link to a missing activity, or an activity with a missing category,
/// is reported as a database error.
pub fn assemble_stories(
    stories: Vec<StoryRecord>,
    links: Vec<StoryActivity>,
    activities: &HashMap<u64, ActivityRecord>,
    categories: &HashMap<u64, ActivityCategoryRecord>,
) -> Result<Vec<Story>, AppError> {
    let mut adjacency: HashMap<u64, Vec<StoryActivity>> = HashMap::new();
    for link in links {
        adjacency.entry(link.story_id).or_default().push(link);
    }

    stories
        .into_iter()
        .map(|record| {
            let mut story_links = adjacency.remove(&record.id).unwrap_or_default();
            story_links.sort_by_key(|l| l.position);

            let activities = story_links
                .iter()
                .map(|link| {
                    let activity = activities.get(&link.activity_id).ok_or_else(|| {
                        AppError::Database(format!(
                            "Story {} references missing activity {}",
                            record.id, link.activity_id
                        ))
                    })?;
                    assemble_activity(activity, categories)
                })
                .collect::<Result<Vec<_>, AppError>>()?;

            Ok(Story {
                id: Some(record.id),
                user_id: record.user_id,
                title: record.title,
                activities,
            })
        })
        .collect()
}

/// Assemble a single activity with its category.
pub fn assemble_activity(
    activity: &ActivityRecord,
    categories: &HashMap<u64, ActivityCategoryRecord>,
) -> Result<Activity, AppError> {
    let category = categories.get(&activity.category_id).ok_or_else(|| {
        AppError::Database(format!(
            "Activity {} references missing category {}",
            activity.id, activity.category_id
        ))
    })?;

    Ok(Activity {
        id: Some(activity.id),
        title: activity.title.clone(),
        category: ActivityCategory {
            id: Some(category.id),
            title: category.title.clone(),
        },
    })
}

/// Key rows by their id.
pub fn index_by_id<T>(rows: impl IntoIterator<Item = T>, id: impl Fn(&T) -> u64) -> HashMap<u64, T> {
    rows.into_iter().map(|row| (id(&row), row)).collect()
}
