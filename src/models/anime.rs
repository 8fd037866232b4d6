use serde::{Deserialize, Serialize};

use crate::domain::{Field, FieldValue, RecordId};

/// Placeholder in a link that is replaced by the current episode number.
pub const EPISODE_PLACEHOLDER: &str = "%ep";

/// A committed watch-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anime {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub current_episode: u32,
    pub total_episodes: u32,
    pub is_airing_finished: bool,
    pub is_finished: bool,
}

impl Anime {
    /// The link with `%ep` replaced by the current episode, if there is a link to follow.
    #[must_use]
    pub fn resolved_link(&self) -> Option<String> {
        self.link
            .as_deref()
            .filter(|link| !link.is_empty())
            .map(|link| link.replace(EPISODE_PLACEHOLDER, &self.current_episode.to_string()))
    }

    /// Returns a copy with `field` set to `value`.
    ///
    /// Mismatched kinds leave the record untouched; the id never changes.
    #[must_use]
    pub fn with_field(&self, field: Field, value: &FieldValue) -> Self {
        let mut next = self.clone();
        match (field, value) {
            (Field::Name, FieldValue::Text(name)) => next.name.clone_from(name),
            (Field::Link, FieldValue::Text(link)) => next.link = Some(link.clone()),
            (Field::CurrentEpisode, FieldValue::Count(n)) => next.current_episode = *n,
            (Field::TotalEpisodes, FieldValue::Count(n)) => next.total_episodes = *n,
            (Field::IsAiringFinished, FieldValue::Flag(b)) => next.is_airing_finished = *b,
            (Field::IsFinished, FieldValue::Flag(b)) => next.is_finished = *b,
            _ => {}
        }
        next
    }
}

/// A record-shaped input where any subset of fields may be unset.
///
/// Episode counts are signed 32-bit, the same range a single-field update
/// accepts, so that negative client input survives binding and is reported by
/// validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimePattern {
    pub id: Option<RecordId>,
    pub name: Option<String>,
    pub link: Option<String>,
    pub current_episode: Option<i32>,
    pub total_episodes: Option<i32>,
    pub is_airing_finished: Option<bool>,
    pub is_finished: Option<bool>,
}

impl AnimePattern {
    #[must_use]
    pub fn by_id(id: RecordId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// True when no field is set; such a pattern matches every record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Field::ALL.into_iter().all(|field| !self.is_set(field))
    }

    #[must_use]
    pub const fn is_set(&self, field: Field) -> bool {
        match field {
            Field::Id => self.id.is_some(),
            Field::Name => self.name.is_some(),
            Field::Link => self.link.is_some(),
            Field::CurrentEpisode => self.current_episode.is_some(),
            Field::TotalEpisodes => self.total_episodes.is_some(),
            Field::IsAiringFinished => self.is_airing_finished.is_some(),
            Field::IsFinished => self.is_finished.is_some(),
        }
    }

    /// The supplied value of `field` rendered as a raw string, as a client would send it.
    #[must_use]
    pub fn raw_value(&self, field: Field) -> Option<String> {
        match field {
            Field::Id => self.id.as_ref().map(ToString::to_string),
            Field::Name => self.name.clone(),
            Field::Link => self.link.clone(),
            Field::CurrentEpisode => self.current_episode.map(|n| n.to_string()),
            Field::TotalEpisodes => self.total_episodes.map(|n| n.to_string()),
            Field::IsAiringFinished => self.is_airing_finished.map(|b| b.to_string()),
            Field::IsFinished => self.is_finished.map(|b| b.to_string()),
        }
    }

    /// A pattern holding only `field`, used to run the single-field rules.
    #[must_use]
    pub fn from_field(field: Field, value: &FieldValue) -> Self {
        let mut pattern = Self::default();
        match (field, value) {
            (Field::Id, FieldValue::Text(id)) => pattern.id = Some(RecordId::new(id.clone())),
            (Field::Name, FieldValue::Text(name)) => pattern.name = Some(name.clone()),
            (Field::Link, FieldValue::Text(link)) => pattern.link = Some(link.clone()),
            (Field::CurrentEpisode, FieldValue::Count(n)) => {
                pattern.current_episode = i32::try_from(*n).ok();
            }
            (Field::TotalEpisodes, FieldValue::Count(n)) => {
                pattern.total_episodes = i32::try_from(*n).ok();
            }
            (Field::IsAiringFinished, FieldValue::Flag(b)) => {
                pattern.is_airing_finished = Some(*b);
            }
            (Field::IsFinished, FieldValue::Flag(b)) => pattern.is_finished = Some(*b),
            _ => {}
        }
        pattern
    }

    /// Converts a complete pattern into a record.
    ///
    /// Returns `None` when a required field is missing or a count does not fit;
    /// callers validate first, so this only fails on inputs validation rejects.
    #[must_use]
    pub fn into_record(self) -> Option<Anime> {
        Some(Anime {
            id: self.id?,
            name: self.name?,
            link: self.link,
            current_episode: u32::try_from(self.current_episode?).ok()?,
            total_episodes: u32::try_from(self.total_episodes?).ok()?,
            is_airing_finished: self.is_airing_finished?,
            is_finished: self.is_finished?,
        })
    }
}

impl From<&Anime> for AnimePattern {
    fn from(anime: &Anime) -> Self {
        Self {
            id: Some(anime.id.clone()),
            name: Some(anime.name.clone()),
            link: anime.link.clone(),
            current_episode: i32::try_from(anime.current_episode).ok(),
            total_episodes: i32::try_from(anime.total_episodes).ok(),
            is_airing_finished: Some(anime.is_airing_finished),
            is_finished: Some(anime.is_finished),
        }
    }
}
