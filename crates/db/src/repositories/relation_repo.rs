//! Repository for the many-to-many junction tables.
//!
//! `category_genre`, `category_video` and `genre_video` each hold one row per
//! link, keyed by the (owner, related) pair.

use catalog_core::sync::SyncPlan;
use catalog_core::types::DbId;
use sqlx::{PgConnection, PgPool};

/// A many-to-many relation, seen from its owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// genre -> categories via `category_genre`
    GenreCategories,
    /// video -> categories via `category_video`
    VideoCategories,
    /// video -> genres via `genre_video`
    VideoGenres,
}

impl Relation {
    pub fn name(self) -> &'static str {
        match self {
            Relation::GenreCategories => "genre.categories",
            Relation::VideoCategories => "video.categories",
            Relation::VideoGenres => "video.genres",
        }
    }

    fn table(self) -> &'static str {
        match self {
            Relation::GenreCategories => "category_genre",
            Relation::VideoCategories => "category_video",
            Relation::VideoGenres => "genre_video",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            Relation::GenreCategories => "genre_id",
            Relation::VideoCategories | Relation::VideoGenres => "video_id",
        }
    }

    fn related_column(self) -> &'static str {
        match self {
            Relation::GenreCategories | Relation::VideoCategories => "category_id",
            Relation::VideoGenres => "genre_id",
        }
    }
}

/// Reads and syncs junction rows.
pub struct RelationRepo;

impl RelationRepo {
    /// Ids linked to `owner_id` through `relation`, sorted.
    pub async fn related_ids(
        pool: &PgPool,
        owner_id: DbId,
        relation: Relation,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(&select_query(relation))
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Make the links of `owner_id` through `relation` equal `target_ids`.
    ///
    /// Inserts missing links, deletes extra ones, and leaves shared links
    /// alone. Target ids are not checked for liveness here. Returns the
    /// applied plan.
    pub async fn sync(
        conn: &mut PgConnection,
        owner_id: DbId,
        relation: Relation,
        target_ids: &[DbId],
    ) -> Result<SyncPlan, sqlx::Error> {
        let current = sqlx::query_scalar::<_, DbId>(&select_query(relation))
            .bind(owner_id)
            .fetch_all(&mut *conn)
            .await?;

        let plan = SyncPlan::diff(&current, target_ids);
        if plan.is_noop() {
            return Ok(plan);
        }

        let table = relation.table();
        let owner = relation.owner_column();
        let related = relation.related_column();

        if !plan.detach.is_empty() {
            sqlx::query(&format!(
                "DELETE FROM {table} WHERE {owner} = $1 AND {related} = ANY($2)"
            ))
            .bind(owner_id)
            .bind(&plan.detach)
            .execute(&mut *conn)
            .await?;
        }

        let insert = format!("INSERT INTO {table} ({owner}, {related}) VALUES ($1, $2)");
        for &related_id in &plan.attach {
            sqlx::query(&insert)
                .bind(owner_id)
                .bind(related_id)
                .execute(&mut *conn)
                .await?;
        }

        Ok(plan)
    }
}

fn select_query(relation: Relation) -> String {
    format!(
        "SELECT {related} FROM {table} WHERE {owner} = $1 ORDER BY {related}",
        related = relation.related_column(),
        table = relation.table(),
        owner = relation.owner_column(),
    )
}
