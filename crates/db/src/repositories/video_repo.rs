//! Repository for the `videos` table.

use catalog_core::types::{new_id, DbId};
use sqlx::{PgConnection, PgPool};

use super::relation_repo::{Relation, RelationRepo};
use crate::models::video::{CreateVideo, UpdateVideo, Video, VideoWithRelations};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, year_launched, opened, rating, duration, \
    created_at, updated_at, deleted_at";

/// Provides CRUD and soft-delete operations for videos.
pub struct VideoRepo;

impl VideoRepo {
    /// Insert a new video, returning the created row.
    ///
    /// If `opened` is `None` in the input, defaults to `false`. Category and
    /// genre links are synced separately.
    pub async fn create(conn: &mut PgConnection, input: &CreateVideo) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (id, title, description, year_launched, opened, rating, duration)
             VALUES ($1, $2, $3, $4, COALESCE($5, false), $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(new_id())
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.year_launched)
            .bind(input.opened)
            .bind(input.rating.as_str())
            .bind(input.duration)
            .fetch_one(conn)
            .await
    }

    /// Find a video by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a video by ID, including soft-deleted rows.
    pub async fn find_by_id_include_deleted(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live video by ID, enriched with its category and genre ids.
    pub async fn find_by_id_with_relations(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<VideoWithRelations>, sqlx::Error> {
        match Self::find_by_id(pool, id).await? {
            Some(video) => Ok(Some(Self::with_relations(pool, video).await?)),
            None => Ok(None),
        }
    }

    /// Attach the linked category and genre ids to a loaded video.
    pub async fn with_relations(
        pool: &PgPool,
        video: Video,
    ) -> Result<VideoWithRelations, sqlx::Error> {
        let categories_id =
            RelationRepo::related_ids(pool, video.id, Relation::VideoCategories).await?;
        let genres_id = RelationRepo::related_ids(pool, video.id, Relation::VideoGenres).await?;
        Ok(VideoWithRelations {
            video,
            categories_id,
            genres_id,
        })
    }

    /// List live videos in creation order.
    pub async fn list(pool: &PgPool) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM videos WHERE deleted_at IS NULL ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Video>(&query).fetch_all(pool).await
    }

    /// List all videos, soft-deleted included, in creation order.
    pub async fn list_include_deleted(pool: &PgPool) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos ORDER BY created_at, id");
        sqlx::query_as::<_, Video>(&query).fetch_all(pool).await
    }

    /// Update a live video. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no live row with the given `id` exists.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateVideo,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                year_launched = COALESCE($4, year_launched),
                opened = COALESCE($5, opened),
                rating = COALESCE($6, rating),
                duration = COALESCE($7, duration),
                updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.year_launched)
            .bind(input.opened)
            .bind(input.rating.map(|r| r.as_str()))
            .bind(input.duration)
            .fetch_optional(conn)
            .await
    }

    /// Soft-delete a video by ID. Returns `true` if a live row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Restore a video. Returns `true` if the row exists, whether or not it
    /// was deleted.
    pub async fn restore(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE videos SET deleted_at = NULL WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
