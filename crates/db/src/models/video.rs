//! Video entity model and DTOs.
//!
//! Videos link to categories (`category_video`) and genres (`genre_video`).

use catalog_core::rating::Rating;
use catalog_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `videos` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Video {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub year_launched: i16,
    pub opened: bool,
    /// One of [`catalog_core::rating::RATING_CODES`].
    pub rating: String,
    pub duration: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

/// A video enriched with the ids of its linked categories and genres.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoWithRelations {
    #[serde(flatten)]
    pub video: Video,
    pub categories_id: Vec<DbId>,
    pub genres_id: Vec<DbId>,
}

/// DTO for creating a new video.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVideo {
    pub title: String,
    pub description: String,
    pub year_launched: i16,
    /// Defaults to `false` if omitted.
    pub opened: Option<bool>,
    pub rating: Rating,
    pub duration: i32,
}

/// DTO for updating an existing video. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub year_launched: Option<i16>,
    pub opened: Option<bool>,
    pub rating: Option<Rating>,
    pub duration: Option<i32>,
}
