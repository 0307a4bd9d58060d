//! Repository for the `genres` table.

use catalog_core::types::{new_id, DbId};
use sqlx::{PgConnection, PgPool};

use super::relation_repo::{Relation, RelationRepo};
use crate::models::genre::{CreateGenre, Genre, GenreWithCategories, UpdateGenre};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, is_active, created_at, updated_at, deleted_at";

/// Provides CRUD and soft-delete operations for genres.
pub struct GenreRepo;

impl GenreRepo {
    /// Insert a new genre, returning the created row.
    ///
    /// If `is_active` is `None` in the input, defaults to `true`. Category
    /// links are synced separately.
    pub async fn create(conn: &mut PgConnection, input: &CreateGenre) -> Result<Genre, sqlx::Error> {
        let query = format!(
            "INSERT INTO genres (id, name, is_active)
             VALUES ($1, $2, COALESCE($3, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Genre>(&query)
            .bind(new_id())
            .bind(&input.name)
            .bind(input.is_active)
            .fetch_one(conn)
            .await
    }

    /// Find a genre by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Genre>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM genres WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Genre>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a genre by ID, including soft-deleted rows.
    pub async fn find_by_id_include_deleted(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Genre>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM genres WHERE id = $1");
        sqlx::query_as::<_, Genre>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live genre by ID, enriched with its category ids.
    pub async fn find_by_id_with_categories(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<GenreWithCategories>, sqlx::Error> {
        match Self::find_by_id(pool, id).await? {
            Some(genre) => Ok(Some(Self::with_categories(pool, genre).await?)),
            None => Ok(None),
        }
    }

    /// Attach the linked category ids to a loaded genre.
    pub async fn with_categories(
        pool: &PgPool,
        genre: Genre,
    ) -> Result<GenreWithCategories, sqlx::Error> {
        let categories_id =
            RelationRepo::related_ids(pool, genre.id, Relation::GenreCategories).await?;
        Ok(GenreWithCategories {
            genre,
            categories_id,
        })
    }

    /// List live genres in creation order.
    pub async fn list(pool: &PgPool) -> Result<Vec<Genre>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM genres WHERE deleted_at IS NULL ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Genre>(&query).fetch_all(pool).await
    }

    /// List all genres, soft-deleted included, in creation order.
    pub async fn list_include_deleted(pool: &PgPool) -> Result<Vec<Genre>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM genres ORDER BY created_at, id");
        sqlx::query_as::<_, Genre>(&query).fetch_all(pool).await
    }

    /// Update a live genre. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no live row with the given `id` exists.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateGenre,
    ) -> Result<Option<Genre>, sqlx::Error> {
        let query = format!(
            "UPDATE genres SET
                name = COALESCE($2, name),
                is_active = COALESCE($3, is_active),
                updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Genre>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.is_active)
            .fetch_optional(conn)
            .await
    }

    /// Soft-delete a genre by ID. Returns `true` if a live row was marked deleted.
    ///
    /// Category links are kept.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE genres SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Restore a genre. Returns `true` if the row exists, whether or not it
    /// was deleted.
    pub async fn restore(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE genres SET deleted_at = NULL WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
