//! Genre entity model and DTOs.
//!
//! Genres link to categories through the `category_genre` junction table.
//! The link set is not part of the DTOs: it is synced separately from the
//! `categories_id` input field.

use catalog_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `genres` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Genre {
    pub id: DbId,
    pub name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

/// A genre together with the ids of its linked categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreWithCategories {
    #[serde(flatten)]
    pub genre: Genre,
    pub categories_id: Vec<DbId>,
}

/// DTO for creating a new genre.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGenre {
    pub name: String,
    /// Defaults to `true` if omitted.
    pub is_active: Option<bool>,
}

/// DTO for updating an existing genre. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGenre {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}
