//! Transactional create/update with relation sync.
//!
//! A request goes through:
//!
//! ```text
//! create: Validating -> Creating -> Syncing -> Committed
//! update: Locating -> Validating -> Updating -> Syncing -> Committed
//! ```
//!
//! Validation (and, for update, locating the live row) happens before the
//! transaction opens and has no side effects. The root write and every
//! relation sync share one transaction; any error inside it rolls back all
//! of them, including a just-inserted root row, and is returned unchanged.

use async_trait::async_trait;
use catalog_core::error::CoreError;
use catalog_core::types::DbId;
use catalog_core::validation::rule_sets::{category_rules, genre_rules, video_rules};
use catalog_core::validation::{validate, RuleSet, ValidatedFields};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::existence::LiveRows;
use crate::models::category::{Category, CreateCategory, UpdateCategory};
use crate::models::genre::{CreateGenre, Genre, GenreWithCategories, UpdateGenre};
use crate::models::video::{CreateVideo, UpdateVideo, Video, VideoWithRelations};
use crate::repositories::{CategoryRepo, GenreRepo, Relation, RelationRepo, VideoRepo};

/// Errors surfaced by [`create`] and [`update`].
#[derive(Debug, thiserror::Error)]
pub enum UpsertError {
    /// Validation failure or missing entity.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage or transaction failure. Everything written in the
    /// transaction has been rolled back.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The target id set for one relation, taken from a request field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationTarget {
    pub relation: Relation,
    pub ids: Vec<DbId>,
}

/// An entity type that can be created and updated through the orchestrator.
#[async_trait]
pub trait UpsertTarget: Sync {
    /// Row returned by the root insert/update.
    type Row: Send;
    /// Shape returned to the caller after commit.
    type Entity: Send;
    type Create: DeserializeOwned + Send + Sync;
    type Update: DeserializeOwned + Send + Sync;

    /// Entity name used in `NotFound` errors and logs.
    const ENTITY: &'static str;

    /// Relations synced on every upsert, with the input field holding the ids.
    const RELATIONS: &'static [(Relation, &'static str)];

    fn rules(&self) -> RuleSet;

    fn row_id(row: &Self::Row) -> DbId;

    async fn insert(
        &self,
        conn: &mut PgConnection,
        input: &Self::Create,
    ) -> Result<Self::Row, sqlx::Error>;

    /// Returns `None` when no live row matches `id`.
    async fn update(
        &self,
        conn: &mut PgConnection,
        id: DbId,
        input: &Self::Update,
    ) -> Result<Option<Self::Row>, sqlx::Error>;

    /// Load the live entity as returned to callers.
    async fn load(&self, pool: &PgPool, id: DbId) -> Result<Option<Self::Entity>, sqlx::Error>;

    /// Sync every relation target for `owner_id` on the given connection.
    async fn sync_relations(
        &self,
        conn: &mut PgConnection,
        owner_id: DbId,
        targets: &[RelationTarget],
    ) -> Result<(), UpsertError> {
        for target in targets {
            let plan = RelationRepo::sync(conn, owner_id, target.relation, &target.ids).await?;
            tracing::debug!(
                entity = Self::ENTITY,
                %owner_id,
                relation = target.relation.name(),
                attached = plan.attach.len(),
                detached = plan.detach.len(),
                "Relation synced"
            );
        }
        Ok(())
    }
}

/// Validate `input`, insert the root entity and sync its relations in one
/// transaction, then return the reloaded entity.
pub async fn create<T: UpsertTarget>(
    pool: &PgPool,
    target: &T,
    input: &Map<String, Value>,
) -> Result<T::Entity, UpsertError> {
    let validated = validate(input, &target.rules(), &LiveRows(pool)).await?;
    let relations = relation_targets::<T>(&validated)?;
    let dto: T::Create = validated.to_dto()?;

    let mut tx = pool.begin().await?;
    let id = match insert_and_sync(&mut tx, target, &dto, &relations).await {
        Ok(id) => id,
        Err(err) => {
            rollback(tx, T::ENTITY, &err).await;
            return Err(err);
        }
    };
    tx.commit().await?;
    tracing::info!(entity = T::ENTITY, %id, "Entity created");

    reload(pool, target, id).await
}

/// Locate the live entity, validate `input`, update it and sync its
/// relations in one transaction, then return the reloaded entity.
pub async fn update<T: UpsertTarget>(
    pool: &PgPool,
    target: &T,
    id: DbId,
    input: &Map<String, Value>,
) -> Result<T::Entity, UpsertError> {
    if target.load(pool, id).await?.is_none() {
        return Err(not_found::<T>(id));
    }

    let validated = validate(input, &target.rules(), &LiveRows(pool)).await?;
    let relations = relation_targets::<T>(&validated)?;
    let dto: T::Update = validated.to_dto()?;

    let mut tx = pool.begin().await?;
    if let Err(err) = update_and_sync(&mut tx, target, id, &dto, &relations).await {
        rollback(tx, T::ENTITY, &err).await;
        return Err(err);
    }
    tx.commit().await?;
    tracing::info!(entity = T::ENTITY, %id, "Entity updated");

    reload(pool, target, id).await
}

async fn insert_and_sync<T: UpsertTarget>(
    tx: &mut Transaction<'_, Postgres>,
    target: &T,
    dto: &T::Create,
    relations: &[RelationTarget],
) -> Result<DbId, UpsertError> {
    let row = target.insert(&mut **tx, dto).await?;
    let id = T::row_id(&row);
    tracing::debug!(entity = T::ENTITY, %id, "Root row inserted");

    target.sync_relations(&mut **tx, id, relations).await?;
    Ok(id)
}

async fn update_and_sync<T: UpsertTarget>(
    tx: &mut Transaction<'_, Postgres>,
    target: &T,
    id: DbId,
    dto: &T::Update,
    relations: &[RelationTarget],
) -> Result<(), UpsertError> {
    // The row may have been soft-deleted since it was located.
    target
        .update(&mut **tx, id, dto)
        .await?
        .ok_or_else(|| not_found::<T>(id))?;
    tracing::debug!(entity = T::ENTITY, %id, "Root row updated");

    target.sync_relations(&mut **tx, id, relations).await
}

async fn rollback(tx: Transaction<'_, Postgres>, entity: &'static str, cause: &UpsertError) {
    tracing::warn!(entity, error = %cause, "Rolling back upsert");
    if let Err(err) = tx.rollback().await {
        tracing::error!(entity, error = %err, "Rollback failed");
    }
}

async fn reload<T: UpsertTarget>(
    pool: &PgPool,
    target: &T,
    id: DbId,
) -> Result<T::Entity, UpsertError> {
    target
        .load(pool, id)
        .await?
        .ok_or_else(|| not_found::<T>(id))
}

fn relation_targets<T: UpsertTarget>(
    validated: &ValidatedFields,
) -> Result<Vec<RelationTarget>, CoreError> {
    let mut targets = Vec::with_capacity(T::RELATIONS.len());
    for &(relation, field) in T::RELATIONS {
        if let Some(ids) = validated.id_list(field)? {
            targets.push(RelationTarget { relation, ids });
        }
    }
    Ok(targets)
}

fn not_found<T: UpsertTarget>(id: DbId) -> UpsertError {
    UpsertError::Core(CoreError::NotFound {
        entity: T::ENTITY,
        id,
    })
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

#[async_trait]
impl UpsertTarget for CategoryRepo {
    type Row = Category;
    type Entity = Category;
    type Create = CreateCategory;
    type Update = UpdateCategory;

    const ENTITY: &'static str = "Category";
    const RELATIONS: &'static [(Relation, &'static str)] = &[];

    fn rules(&self) -> RuleSet {
        category_rules()
    }

    fn row_id(row: &Category) -> DbId {
        row.id
    }

    async fn insert(
        &self,
        conn: &mut PgConnection,
        input: &CreateCategory,
    ) -> Result<Category, sqlx::Error> {
        CategoryRepo::create(conn, input).await
    }

    async fn update(
        &self,
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, sqlx::Error> {
        CategoryRepo::update(conn, id, input).await
    }

    async fn load(&self, pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        CategoryRepo::find_by_id(pool, id).await
    }
}

#[async_trait]
impl UpsertTarget for GenreRepo {
    type Row = Genre;
    type Entity = GenreWithCategories;
    type Create = CreateGenre;
    type Update = UpdateGenre;

    const ENTITY: &'static str = "Genre";
    const RELATIONS: &'static [(Relation, &'static str)] =
        &[(Relation::GenreCategories, "categories_id")];

    fn rules(&self) -> RuleSet {
        genre_rules()
    }

    fn row_id(row: &Genre) -> DbId {
        row.id
    }

    async fn insert(
        &self,
        conn: &mut PgConnection,
        input: &CreateGenre,
    ) -> Result<Genre, sqlx::Error> {
        GenreRepo::create(conn, input).await
    }

    async fn update(
        &self,
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateGenre,
    ) -> Result<Option<Genre>, sqlx::Error> {
        GenreRepo::update(conn, id, input).await
    }

    async fn load(
        &self,
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<GenreWithCategories>, sqlx::Error> {
        GenreRepo::find_by_id_with_categories(pool, id).await
    }
}

#[async_trait]
impl UpsertTarget for VideoRepo {
    type Row = Video;
    type Entity = VideoWithRelations;
    type Create = CreateVideo;
    type Update = UpdateVideo;

    const ENTITY: &'static str = "Video";
    const RELATIONS: &'static [(Relation, &'static str)] = &[
        (Relation::VideoCategories, "categories_id"),
        (Relation::VideoGenres, "genres_id"),
    ];

    fn rules(&self) -> RuleSet {
        video_rules()
    }

    fn row_id(row: &Video) -> DbId {
        row.id
    }

    async fn insert(
        &self,
        conn: &mut PgConnection,
        input: &CreateVideo,
    ) -> Result<Video, sqlx::Error> {
        VideoRepo::create(conn, input).await
    }

    async fn update(
        &self,
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateVideo,
    ) -> Result<Option<Video>, sqlx::Error> {
        VideoRepo::update(conn, id, input).await
    }

    async fn load(
        &self,
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<VideoWithRelations>, sqlx::Error> {
        VideoRepo::find_by_id_with_relations(pool, id).await
    }
}
