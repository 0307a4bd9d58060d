//! Integration tests for the transactional upsert orchestrator.
//!
//! Covers validation before any write, the create and update paths with
//! relation sync, and rollback when a relation sync fails after the root
//! row has been written.

use assert_matches::assert_matches;
use async_trait::async_trait;
use catalog_core::error::CoreError;
use catalog_core::types::DbId;
use catalog_core::validation::RuleSet;
use catalog_db::models::category::CreateCategory;
use catalog_db::models::genre::CreateGenre;
use catalog_db::repositories::{CategoryRepo, GenreRepo, Relation, RelationRepo, VideoRepo};
use catalog_db::upsert::{self, RelationTarget, UpsertError, UpsertTarget};
use serde_json::{json, Map, Value};
use sqlx::{PgConnection, PgPool};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn body(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

async fn seed_category(pool: &PgPool, name: &str) -> DbId {
    let mut conn = pool.acquire().await.unwrap();
    CategoryRepo::create(
        &mut conn,
        &CreateCategory {
            name: name.to_string(),
            description: None,
            is_active: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_genre(pool: &PgPool, name: &str) -> DbId {
    let mut conn = pool.acquire().await.unwrap();
    GenreRepo::create(
        &mut conn,
        &CreateGenre {
            name: name.to_string(),
            is_active: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn video_body(categories: &[DbId], genres: &[DbId]) -> Map<String, Value> {
    body(json!({
        "title": "Title A",
        "description": "Descricao A",
        "year_launched": "2022",
        "rating": "L",
        "duration": 60,
        "categories_id": categories,
        "genres_id": genres,
    }))
}

async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

fn validation_errors(err: UpsertError) -> catalog_core::validation::ValidationErrors {
    match err {
        UpsertError::Core(CoreError::Validation(errors)) => errors,
        other => panic!("expected validation error, got {other:?}"),
    }
}

/// Delegates to `T` but fails after its relations have been synced.
struct FailingRelations<T>(T);

#[async_trait]
impl<T: UpsertTarget + 'static> UpsertTarget for FailingRelations<T> {
    type Row = T::Row;
    type Entity = T::Entity;
    type Create = T::Create;
    type Update = T::Update;

    const ENTITY: &'static str = T::ENTITY;
    const RELATIONS: &'static [(Relation, &'static str)] = T::RELATIONS;

    fn rules(&self) -> RuleSet {
        self.0.rules()
    }

    fn row_id(row: &T::Row) -> DbId {
        T::row_id(row)
    }

    async fn insert(
        &self,
        conn: &mut PgConnection,
        input: &T::Create,
    ) -> Result<T::Row, sqlx::Error> {
        self.0.insert(conn, input).await
    }

    async fn update(
        &self,
        conn: &mut PgConnection,
        id: DbId,
        input: &T::Update,
    ) -> Result<Option<T::Row>, sqlx::Error> {
        self.0.update(conn, id, input).await
    }

    async fn load(&self, pool: &PgPool, id: DbId) -> Result<Option<T::Entity>, sqlx::Error> {
        self.0.load(pool, id).await
    }

    async fn sync_relations(
        &self,
        conn: &mut PgConnection,
        owner_id: DbId,
        targets: &[RelationTarget],
    ) -> Result<(), UpsertError> {
        self.0.sync_relations(conn, owner_id, targets).await?;
        Err(UpsertError::Database(sqlx::Error::Protocol(
            "sync failure".to_string(),
        )))
    }
}

// ---------------------------------------------------------------------------
// Test: create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_create_video_with_relations(pool: PgPool) {
    let c1 = seed_category(&pool, "C1").await;
    let g1 = seed_genre(&pool, "G1").await;

    let video = upsert::create(&pool, &VideoRepo, &video_body(&[c1], &[g1]))
        .await
        .unwrap();

    assert_eq!(video.video.title, "Title A");
    assert_eq!(video.video.year_launched, 2022);
    assert_eq!(video.video.rating, "L");
    assert!(!video.video.opened);
    assert_eq!(video.categories_id, vec![c1]);
    assert_eq!(video.genres_id, vec![g1]);

    assert_eq!(count_rows(&pool, "category_video").await, 1);
    assert_eq!(count_rows(&pool, "genre_video").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_category_without_relations(pool: PgPool) {
    let category = upsert::create(
        &pool,
        &CategoryRepo,
        &body(json!({ "name": "Movies", "is_active": "0" })),
    )
    .await
    .unwrap();

    assert_eq!(category.name, "Movies");
    assert!(!category.is_active);
    assert!(category.description.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_genre_requires_categories(pool: PgPool) {
    let err = upsert::create(
        &pool,
        &GenreRepo,
        &body(json!({ "name": "Drama", "categories_id": [] })),
    )
    .await
    .unwrap_err();

    let errors = validation_errors(err);
    assert_eq!(errors.rule_for("categories_id"), Some("required"));
    assert_eq!(count_rows(&pool, "genres").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_collects_every_failing_field(pool: PgPool) {
    let err = upsert::create(
        &pool,
        &VideoRepo,
        &body(json!({
            "title": "a".repeat(256),
            "year_launched": "22",
            "rating": "99",
            "duration": "long",
            "opened": "yes",
            "categories_id": "not-an-array",
        })),
    )
    .await
    .unwrap_err();

    let errors = validation_errors(err);
    assert_eq!(errors.rule_for("title"), Some("max.string"));
    assert_eq!(errors.rule_for("description"), Some("required"));
    assert_eq!(errors.rule_for("year_launched"), Some("date_format"));
    assert_eq!(errors.rule_for("rating"), Some("in"));
    assert_eq!(errors.rule_for("duration"), Some("integer"));
    assert_eq!(errors.rule_for("opened"), Some("boolean"));
    assert_eq!(errors.rule_for("categories_id"), Some("array"));
    assert_eq!(errors.rule_for("genres_id"), Some("required"));
    assert_eq!(count_rows(&pool, "videos").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_non_string_text_is_a_validation_error(pool: PgPool) {
    for input in [
        json!({ "name": 123 }),
        json!({ "name": true }),
        json!({ "name": ["a"] }),
        json!({ "name": "Docs", "description": 5 }),
    ] {
        let err = upsert::create(&pool, &CategoryRepo, &body(input))
            .await
            .unwrap_err();
        let errors = validation_errors(err);
        assert!(
            errors.fields().all(|field| errors.rule_for(field) == Some("string")),
            "unexpected violations: {errors}"
        );
    }

    let c1 = seed_category(&pool, "C1").await;
    let g1 = seed_genre(&pool, "G1").await;
    let mut input = video_body(&[c1], &[g1]);
    input.insert("description".to_string(), json!({ "x": 1 }));
    let err = upsert::create(&pool, &VideoRepo, &input).await.unwrap_err();
    assert_eq!(validation_errors(err).rule_for("description"), Some("string"));

    assert_eq!(count_rows(&pool, "categories").await, 1);
    assert_eq!(count_rows(&pool, "videos").await, 0);
}

// ---------------------------------------------------------------------------
// Test: exists checks only accept live rows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_exists_rejects_soft_deleted_and_unknown_ids(pool: PgPool) {
    let live = seed_category(&pool, "Live").await;
    let trashed = seed_category(&pool, "Trashed").await;
    CategoryRepo::soft_delete(&pool, trashed).await.unwrap();
    let g1 = seed_genre(&pool, "G1").await;

    let err = upsert::create(&pool, &VideoRepo, &video_body(&[live, trashed], &[g1]))
        .await
        .unwrap_err();
    assert_eq!(validation_errors(err).rule_for("categories_id"), Some("exists"));

    let mut input = video_body(&[live], &[g1]);
    input.insert("genres_id".to_string(), json!(["not-a-uuid"]));
    let err = upsert::create(&pool, &VideoRepo, &input).await.unwrap_err();
    assert_eq!(validation_errors(err).rule_for("genres_id"), Some("exists"));

    let err = upsert::create(
        &pool,
        &VideoRepo,
        &video_body(&[live], &[uuid::Uuid::new_v4()]),
    )
    .await
    .unwrap_err();
    assert_eq!(validation_errors(err).rule_for("genres_id"), Some("exists"));

    assert_eq!(count_rows(&pool, "videos").await, 0);
}

// ---------------------------------------------------------------------------
// Test: update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_update_replaces_links(pool: PgPool) {
    let c1 = seed_category(&pool, "C1").await;
    let c2 = seed_category(&pool, "C2").await;

    let genre = upsert::create(
        &pool,
        &GenreRepo,
        &body(json!({ "name": "Action", "categories_id": [c1] })),
    )
    .await
    .unwrap();
    assert_eq!(genre.categories_id, vec![c1]);

    let updated = upsert::update(
        &pool,
        &GenreRepo,
        genre.genre.id,
        &body(json!({ "name": "Action 2", "is_active": false, "categories_id": [c2] })),
    )
    .await
    .unwrap();

    assert_eq!(updated.genre.name, "Action 2");
    assert!(!updated.genre.is_active);
    assert_eq!(updated.categories_id, vec![c2]);
    assert_eq!(count_rows(&pool, "category_genre").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_soft_deleted_is_not_found(pool: PgPool) {
    let c1 = seed_category(&pool, "C1").await;
    let genre = upsert::create(
        &pool,
        &GenreRepo,
        &body(json!({ "name": "Gone", "categories_id": [c1] })),
    )
    .await
    .unwrap();
    GenreRepo::soft_delete(&pool, genre.genre.id).await.unwrap();

    let err = upsert::update(
        &pool,
        &GenreRepo,
        genre.genre.id,
        &body(json!({ "name": "Back", "categories_id": [c1] })),
    )
    .await
    .unwrap_err();
    assert_matches!(
        err,
        UpsertError::Core(CoreError::NotFound { entity: "Genre", id }) if id == genre.genre.id
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_unknown_id_reports_not_found_before_validation(pool: PgPool) {
    let err = upsert::update(&pool, &VideoRepo, uuid::Uuid::new_v4(), &Map::new())
        .await
        .unwrap_err();
    assert_matches!(err, UpsertError::Core(CoreError::NotFound { entity: "Video", .. }));
}

// ---------------------------------------------------------------------------
// Test: rollback when relation sync fails
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_sync_rolls_back_create(pool: PgPool) {
    let c1 = seed_category(&pool, "C1").await;

    let err = upsert::create(
        &pool,
        &FailingRelations(GenreRepo),
        &body(json!({ "name": "Never", "categories_id": [c1] })),
    )
    .await
    .unwrap_err();
    assert_matches!(err, UpsertError::Database(_));

    assert_eq!(count_rows(&pool, "genres").await, 0);
    assert_eq!(count_rows(&pool, "category_genre").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_sync_rolls_back_update(pool: PgPool) {
    let c1 = seed_category(&pool, "C1").await;
    let c2 = seed_category(&pool, "C2").await;
    let g1 = seed_genre(&pool, "G1").await;

    let video = upsert::create(&pool, &VideoRepo, &video_body(&[c1], &[g1]))
        .await
        .unwrap();

    let mut input = video_body(&[c2], &[g1]);
    input.insert("title".to_string(), json!("Changed"));
    let err = upsert::update(&pool, &FailingRelations(VideoRepo), video.video.id, &input)
        .await
        .unwrap_err();
    assert_matches!(err, UpsertError::Database(_));

    let stored = VideoRepo::find_by_id_with_relations(&pool, video.video.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, video);
    assert_eq!(
        RelationRepo::related_ids(&pool, video.video.id, Relation::VideoCategories)
            .await
            .unwrap(),
        vec![c1]
    );
}
