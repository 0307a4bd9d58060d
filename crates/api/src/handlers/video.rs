//! Handlers for the `/videos` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use catalog_core::error::CoreError;
use catalog_core::types::DbId;
use catalog_db::models::video::{Video, VideoWithRelations};
use catalog_db::repositories::VideoRepo;
use catalog_db::upsert;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::query::WithTrashedParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Video",
        id,
    })
}

/// GET /api/v1/videos
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<WithTrashedParams>,
) -> AppResult<Json<DataResponse<Vec<Video>>>> {
    let videos = if params.with_trashed {
        VideoRepo::list_include_deleted(&state.pool).await?
    } else {
        VideoRepo::list(&state.pool).await?
    };
    Ok(Json(DataResponse { data: videos }))
}

/// POST /api/v1/videos
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<Map<String, Value>>,
) -> AppResult<(StatusCode, Json<DataResponse<VideoWithRelations>>)> {
    let video = upsert::create(&state.pool, &VideoRepo, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: video })))
}

/// GET /api/v1/videos/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<VideoWithRelations>>> {
    let video = VideoRepo::find_by_id_with_relations(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: video }))
}

/// PUT /api/v1/videos/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<Map<String, Value>>,
) -> AppResult<Json<DataResponse<VideoWithRelations>>> {
    let video = upsert::update(&state.pool, &VideoRepo, id, &input).await?;
    Ok(Json(DataResponse { data: video }))
}

/// DELETE /api/v1/videos/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if VideoRepo::soft_delete(&state.pool, id).await? {
        tracing::info!(%id, "Video soft-deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// POST /api/v1/videos/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<VideoWithRelations>>> {
    if !VideoRepo::restore(&state.pool, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(%id, "Video restored");

    let video = VideoRepo::find_by_id_with_relations(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: video }))
}
