use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use super::{AnimeQuery, ApiError, ApiResponse, AppState, FieldUpdateQuery, IdQuery};
use crate::domain::RecordId;
use crate::models::anime::{Anime, AnimePattern};
use crate::services::AnimeService;

pub async fn list_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnimeQuery>,
) -> Result<Response, ApiError> {
    let pattern = AnimePattern::from(query);
    let found = state.anime_service().find_matches(&pattern, false).await?;

    if found.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok(Json(ApiResponse::success(found)).into_response())
}

pub async fn redirect_to_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnimeQuery>,
) -> Result<Response, ApiError> {
    let pattern = AnimePattern::from(query);
    let found = state.anime_service().find_matches(&pattern, false).await?;

    let Some(link) = found.first().and_then(|anime| anime.resolved_link()) else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    match HeaderValue::from_str(&link) {
        Ok(location) => Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response()),
        Err(_) => {
            warn!(link = %link, "Stored link is not a valid Location header");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

pub async fn add_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnimeQuery>,
) -> Result<Json<ApiResponse<Anime>>, ApiError> {
    let created = state
        .anime_service()
        .validate_and_create(AnimePattern::from(query))
        .await
        .map_err(ApiError::from_create)?;

    Ok(Json(ApiResponse::success(created)))
}

pub async fn remove_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<Anime>>, ApiError> {
    let deleted = state
        .anime_service()
        .delete_by_id(&RecordId::from(query.id))
        .await?;

    Ok(Json(ApiResponse::success(deleted)))
}

pub async fn update_anime_field(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FieldUpdateQuery>,
) -> Result<Json<ApiResponse<Anime>>, ApiError> {
    let updated = state
        .anime_service()
        .partial_update(&RecordId::from(query.id), &query.field, &query.value)
        .await
        .map_err(ApiError::from_update)?;

    Ok(Json(ApiResponse::success(updated)))
}

pub async fn update_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnimeQuery>,
) -> Result<Json<ApiResponse<Anime>>, ApiError> {
    let changes = AnimePattern::from(query);
    let Some(id) = changes.id.clone() else {
        return Err(ApiError::InvalidRecord(vec![
            "Property id cannot be empty".to_string(),
        ]));
    };

    let updated = state
        .anime_service()
        .validate_and_full_update(&id, &changes)
        .await
        .map_err(ApiError::from_update)?;

    Ok(Json(ApiResponse::success(updated)))
}
