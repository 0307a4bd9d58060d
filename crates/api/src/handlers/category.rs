//! Handlers for the `/categories` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use catalog_core::error::CoreError;
use catalog_core::types::DbId;
use catalog_db::models::category::Category;
use catalog_db::repositories::CategoryRepo;
use catalog_db::upsert;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::query::WithTrashedParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Category",
        id,
    })
}

/// GET /api/v1/categories
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<WithTrashedParams>,
) -> AppResult<Json<DataResponse<Vec<Category>>>> {
    let categories = if params.with_trashed {
        CategoryRepo::list_include_deleted(&state.pool).await?
    } else {
        CategoryRepo::list(&state.pool).await?
    };
    Ok(Json(DataResponse { data: categories }))
}

/// POST /api/v1/categories
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<Map<String, Value>>,
) -> AppResult<(StatusCode, Json<DataResponse<Category>>)> {
    let category = upsert::create(&state.pool, &CategoryRepo, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// GET /api/v1/categories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Category>>> {
    let category = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: category }))
}

/// PUT /api/v1/categories/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<Map<String, Value>>,
) -> AppResult<Json<DataResponse<Category>>> {
    let category = upsert::update(&state.pool, &CategoryRepo, id, &input).await?;
    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/v1/categories/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if CategoryRepo::soft_delete(&state.pool, id).await? {
        tracing::info!(%id, "Category soft-deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// POST /api/v1/categories/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Category>>> {
    if !CategoryRepo::restore(&state.pool, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(%id, "Category restored");

    let category = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: category }))
}
