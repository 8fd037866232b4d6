use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::AnimeError;

/// Body of every refused PATCH and of PUT refusals that are not validation lists.
pub const UPDATE_REJECTED: &str = "update rejected";

pub const CREATE_FAILED: &str = "Couldn't create the anime";

#[derive(Debug)]
pub enum ApiError {
    /// Answered with an empty body.
    NotFound,

    InvalidRecord(Vec<String>),

    UpdateRejected,

    CreateFailed,

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "Not found"),
            Self::InvalidRecord(errors) => write!(f, "Invalid record: {}", errors.join("; ")),
            Self::UpdateRejected => f.write_str(UPDATE_REJECTED),
            Self::CreateFailed => f.write_str(CREATE_FAILED),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::InvalidRecord(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::errors(errors)),
            )
                .into_response(),
            Self::UpdateRejected => (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error(UPDATE_REJECTED)),
            )
                .into_response(),
            Self::CreateFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(CREATE_FAILED)),
            )
                .into_response(),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<()>::error("An internal error occurred")),
                )
                    .into_response()
            }
        }
    }
}

impl From<AnimeError> for ApiError {
    fn from(err: AnimeError) -> Self {
        match err {
            AnimeError::Validation(errors) => Self::InvalidRecord(errors),
            AnimeError::NotFound(_) => Self::NotFound,
            AnimeError::DuplicateName(_) | AnimeError::Rejected(_) => Self::UpdateRejected,
            AnimeError::Store(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    /// Creation failures other than validation all look the same to clients.
    pub fn from_create(err: AnimeError) -> Self {
        match err {
            AnimeError::Validation(errors) => Self::InvalidRecord(errors),
            AnimeError::Store(msg) => {
                tracing::error!("Failed to create anime: {}", msg);
                Self::CreateFailed
            }
            other => {
                tracing::info!("Anime not created: {}", other);
                Self::CreateFailed
            }
        }
    }

    /// Updates answer a missing record like any other refusal.
    pub fn from_update(err: AnimeError) -> Self {
        match err {
            AnimeError::Validation(errors) => Self::InvalidRecord(errors),
            AnimeError::Store(msg) => Self::InternalError(msg),
            _ => Self::UpdateRejected,
        }
    }
}
