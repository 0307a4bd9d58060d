//! Handlers for the `/genres` resource.
//!
//! Create and update go through the upsert orchestrator so the
//! `categories_id` links are synced in the same transaction as the genre row.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use catalog_core::error::CoreError;
use catalog_core::types::DbId;
use catalog_db::models::genre::{Genre, GenreWithCategories};
use catalog_db::repositories::GenreRepo;
use catalog_db::upsert;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::query::WithTrashedParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Genre",
        id,
    })
}

/// GET /api/v1/genres
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<WithTrashedParams>,
) -> AppResult<Json<DataResponse<Vec<Genre>>>> {
    let genres = if params.with_trashed {
        GenreRepo::list_include_deleted(&state.pool).await?
    } else {
        GenreRepo::list(&state.pool).await?
    };
    Ok(Json(DataResponse { data: genres }))
}

/// POST /api/v1/genres
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<Map<String, Value>>,
) -> AppResult<(StatusCode, Json<DataResponse<GenreWithCategories>>)> {
    let genre = upsert::create(&state.pool, &GenreRepo, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: genre })))
}

/// GET /api/v1/genres/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<GenreWithCategories>>> {
    let genre = GenreRepo::find_by_id_with_categories(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: genre }))
}

/// PUT /api/v1/genres/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<Map<String, Value>>,
) -> AppResult<Json<DataResponse<GenreWithCategories>>> {
    let genre = upsert::update(&state.pool, &GenreRepo, id, &input).await?;
    Ok(Json(DataResponse { data: genre }))
}

/// DELETE /api/v1/genres/{id}
///
/// Links to categories are kept so a restore brings them back.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if GenreRepo::soft_delete(&state.pool, id).await? {
        tracing::info!(%id, "Genre soft-deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// POST /api/v1/genres/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<GenreWithCategories>>> {
    if !GenreRepo::restore(&state.pool, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(%id, "Genre restored");

    let genre = GenreRepo::find_by_id_with_categories(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: genre }))
}
