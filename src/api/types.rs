use serde::{Deserialize, Serialize};

use crate::domain::RecordId;
use crate::models::anime::AnimePattern;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: None,
        }
    }

    pub const fn errors(messages: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: None,
            errors: Some(messages),
        }
    }
}

/// Sparse record fields as they arrive in a query string.
///
/// Legacy property names are accepted alongside the wire names.
#[derive(Debug, Default, Deserialize)]
pub struct AnimeQuery {
    #[serde(alias = "Id", alias = "_id")]
    pub id: Option<String>,
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Link")]
    pub link: Option<String>,
    #[serde(alias = "CurrentEpisode")]
    pub current_episode: Option<i32>,
    #[serde(alias = "TotalEpisodes")]
    pub total_episodes: Option<i32>,
    #[serde(alias = "IsAiringFinished", alias = "finished_airing")]
    pub is_airing_finished: Option<bool>,
    #[serde(alias = "IsFinished", alias = "DoneWatching", alias = "finished")]
    pub is_finished: Option<bool>,
}

impl From<AnimeQuery> for AnimePattern {
    fn from(query: AnimeQuery) -> Self {
        Self {
            id: query.id.map(RecordId::from),
            name: query.name,
            link: query.link,
            current_episode: query.current_episode,
            total_episodes: query.total_episodes,
            is_airing_finished: query.is_airing_finished,
            is_finished: query.is_finished,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct FieldUpdateQuery {
    pub id: String,
    pub field: String,
    pub value: String,
}
