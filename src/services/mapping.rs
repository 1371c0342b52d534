// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversions between story entities and their transfer representations.

use crate::dto::{
    ActivityCategoryDto, ActivityDto, SaveActivityCategoryDto, SaveActivityDto, SaveStoryDto,
    StoryDto,
};
use crate::error::AppError;
use crate::models::{Activity, ActivityCategory, Story};

/// Build a story entity from a request body.
///
/// The owner is always supplied by the caller, never read from the body.
/// `id` is `None` for a new story and the target id for a replace.
pub fn story_to_entity(dto: &SaveStoryDto, user_id: u64, id: Option<u64>) -> Story {
    Story {
        id,
        user_id,
        title: dto.title.clone(),
        activities: dto.activities.iter().map(activity_to_entity).collect(),
    }
}

pub fn activity_to_entity(dto: &SaveActivityDto) -> Activity {
    Activity {
        id: dto.id,
        title: dto.title.clone(),
        category: category_to_entity(&dto.category),
    }
}

pub fn category_to_entity(dto: &SaveActivityCategoryDto) -> ActivityCategory {
    ActivityCategory {
        id: dto.id,
        title: dto.title.clone(),
    }
}

/// Project a stored story onto its response shape.
///
/// Stored entities always have ids; a missing one means the storage layer is
/// broken and is reported as an internal error.
pub fn story_to_dto(story: Story) -> Result<StoryDto, AppError> {
    Ok(StoryDto {
        id: require_id(story.id, "story")?,
        user_id: story.user_id,
        title: story.title,
        activities: story
            .activities
            .into_iter()
            .map(activity_to_dto)
            .collect::<Result<Vec<_>, _>>()?,
    })
}

pub fn activity_to_dto(activity: Activity) -> Result<ActivityDto, AppError> {
    Ok(ActivityDto {
        id: require_id(activity.id, "activity")?,
        title: activity.title,
        category: category_to_dto(activity.category)?,
    })
}

pub fn category_to_dto(category: ActivityCategory) -> Result<ActivityCategoryDto, AppError> {
    Ok(ActivityCategoryDto {
        id: require_id(category.id, "activity category")?,
        title: category.title,
    })
}

fn require_id(id: Option<u64>, entity: &'static str) -> Result<u64, AppError> {
    id.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "{} retrieved from storage is supposed to have an id",
            entity
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn save_dto_with_activity() -> SaveStoryDto {
        SaveStoryDto {
            title: "Story Title".to_string(),
            activities: vec![SaveActivityDto {
                id: Some(777),
                title: "X".to_string(),
                category: SaveActivityCategoryDto {
                    id: Some(888),
                    title: "Y".to_string(),
                },
            }],
        }
    }

    #[test]
    fn test_activity_data_survives_round_trip() {
        let dto = save_dto_with_activity();

        let entity = story_to_entity(&dto, 6, Some(5));
        let response = story_to_dto(entity).unwrap();

        assert_eq!(response.id, 5);
        assert_eq!(response.user_id, 6);
        assert_eq!(response.title, "Story Title");
        assert_eq!(
            response.activities,
            vec![ActivityDto {
                id: 777,
                title: "X".to_string(),
                category: ActivityCategoryDto {
                    id: 888,
                    title: "Y".to_string(),
                },
            }]
        );
    }

    #[test]
    fn test_owner_comes_from_caller() {
        let entity = story_to_entity(&save_dto_with_activity(), 42, None);
        assert_eq!(entity.user_id, 42);
        assert_eq!(entity.id, None);
    }

    #[test]
    fn test_missing_story_id_is_internal_error() {
        let entity = story_to_entity(&save_dto_with_activity(), 6, None);
        let err = story_to_dto(entity).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_missing_category_id_is_internal_error() {
        let mut dto = save_dto_with_activity();
        dto.activities[0].category.id = None;

        let err = story_to_dto(story_to_entity(&dto, 6, Some(1))).unwrap_err();
        assert!(err.to_string().contains("activity category"));
    }
}
