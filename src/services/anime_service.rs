//! Domain service for watch-list records.
//!
//! The pure pieces (validation, matching, update guards) live here as free
//! functions so they can be tested without a store; the trait describes the
//! operations the HTTP layer relies on.

use crate::domain::{Field, FieldError, FieldValue, RECORD_ID_LEN, RecordId};
use crate::models::anime::{Anime, AnimePattern};
use thiserror::Error;

/// Order in which a full update applies its fields.
///
/// Totals go before the current episode so that growing both in one request
/// passes the episode guards; the airing flag goes before the finished flag
/// for the same reason.
pub const FULL_UPDATE_ORDER: [Field; 6] = [
    Field::Name,
    Field::Link,
    Field::TotalEpisodes,
    Field::CurrentEpisode,
    Field::IsAiringFinished,
    Field::IsFinished,
];

/// [`FULL_UPDATE_ORDER`], except that clearing the finished flag goes before
/// the airing flag so a finished record can be moved back to airing.
#[must_use]
pub fn full_update_order(changes: &AnimePattern) -> [Field; 6] {
    if changes.is_finished == Some(false) {
        [
            Field::Name,
            Field::Link,
            Field::TotalEpisodes,
            Field::CurrentEpisode,
            Field::IsFinished,
            Field::IsAiringFinished,
        ]
    } else {
        FULL_UPDATE_ORDER
    }
}

/// Fields a full record must carry. The link is optional.
pub const REQUIRED_FIELDS: [Field; 6] = [
    Field::Id,
    Field::Name,
    Field::CurrentEpisode,
    Field::TotalEpisodes,
    Field::IsAiringFinished,
    Field::IsFinished,
];

pub const SECURE_LINK_PREFIX: &str = "https://";

/// Why a single-field update was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateRejection {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("Field {0} cannot be changed")]
    Immutable(Field),

    #[error("Current episode {current} would exceed total episodes {total}")]
    CurrentExceedsTotal { current: u32, total: u32 },

    #[error("Total episodes {total} would be below current episode {current}")]
    TotalBelowCurrent { total: u32, current: u32 },

    #[error("Anime cannot be finished if it's still airing")]
    FinishedWhileAiring,

    #[error("Name already in use: {0}")]
    DuplicateName(String),

    #[error("Invalid value: {}", .0.join("; "))]
    InvalidValue(Vec<String>),
}

/// Domain errors for watch-list operations.
#[derive(Debug, Error)]
pub enum AnimeError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Anime not found: {0}")]
    NotFound(RecordId),

    #[error("Anime name already exists: {0}")]
    DuplicateName(String),

    #[error("Update rejected: {0}")]
    Rejected(#[from] UpdateRejection),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<anyhow::Error> for AnimeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Store(format!("{err:#}"))
    }
}

impl From<sea_orm::DbErr> for AnimeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Store(err.to_string())
    }
}

/// Domain service trait for watch-list operations.
///
/// Failures other than [`AnimeError::Store`] are ordinary outcomes and are not
/// logged as errors.
#[async_trait::async_trait]
pub trait AnimeService: Send + Sync {
    /// See [`validate`]; both orchestrators go through this.
    fn validate(&self, pattern: &AnimePattern, allow_partial: bool) -> Result<(), Vec<String>> {
        validate(pattern, allow_partial)
    }

    /// Every record when `pattern` is empty, otherwise the records matching
    /// any one of its fields. See [`matches`].
    async fn find_matches(
        &self,
        pattern: &AnimePattern,
        exact: bool,
    ) -> Result<Vec<Anime>, AnimeError>;

    /// True when a record with this name exists, ignoring case.
    async fn is_duplicate_name(&self, name: &str) -> Result<bool, AnimeError>;

    /// Inserts `anime` unless its name is taken.
    ///
    /// # Errors
    ///
    /// - [`AnimeError::DuplicateName`] if the name is already in use
    /// - [`AnimeError::Store`] on store failures
    async fn create(&self, anime: Anime) -> Result<Anime, AnimeError>;

    /// Deletes a record and returns it as it was before deletion.
    ///
    /// # Errors
    ///
    /// - [`AnimeError::NotFound`] if no record has this id
    /// - [`AnimeError::Store`] on store failures
    async fn delete_by_id(&self, id: &RecordId) -> Result<Anime, AnimeError>;

    /// Sets one field from an untyped value and returns the stored record.
    ///
    /// All-or-nothing: either the single field is written or nothing is.
    /// The guard checks and the write are not atomic with respect to other
    /// requests touching the same record.
    ///
    /// # Errors
    ///
    /// - [`AnimeError::Rejected`] if the field is unknown, the value does not
    ///   coerce, or a guard trips
    /// - [`AnimeError::NotFound`] if no record has this id
    /// - [`AnimeError::Store`] on store failures
    async fn partial_update(
        &self,
        id: &RecordId,
        field: &str,
        raw_value: &str,
    ) -> Result<Anime, AnimeError>;

    /// Applies every supplied field of `changes` as its own partial update, in
    /// [`full_update_order`]. The id in `changes` is ignored.
    ///
    /// Not atomic: when a field is rejected, the fields applied before it stay
    /// committed.
    async fn full_update(
        &self,
        id: &RecordId,
        changes: &AnimePattern,
    ) -> Result<Anime, AnimeError>;

    /// Fills creation defaults, validates the complete record and creates it.
    async fn validate_and_create(&self, pattern: AnimePattern) -> Result<Anime, AnimeError> {
        let pattern = prepare_for_create(pattern);
        self.validate(&pattern, false)
            .map_err(AnimeError::Validation)?;

        let anime = pattern
            .into_record()
            .ok_or_else(|| AnimeError::Validation(vec!["Incomplete anime".to_string()]))?;
        self.create(anime).await
    }

    /// Validates the supplied fields, then runs [`AnimeService::full_update`].
    async fn validate_and_full_update(
        &self,
        id: &RecordId,
        changes: &AnimePattern,
    ) -> Result<Anime, AnimeError> {
        self.validate(changes, true)
            .map_err(AnimeError::Validation)?;
        self.full_update(id, changes).await
    }
}

/// Fresh id, trimmed name and a default finished flag (`current == total`).
#[must_use]
pub fn prepare_for_create(mut pattern: AnimePattern) -> AnimePattern {
    pattern.id = Some(RecordId::generate());
    pattern.name = pattern.name.map(|name| name.trim().to_string());
    if pattern.is_finished.is_none() {
        pattern.is_finished = pattern
            .current_episode
            .zip(pattern.total_episodes)
            .map(|(current, total)| current == total);
    }
    pattern
}

/// Checks the record rules and returns every violated one.
///
/// With `allow_partial` unset fields are skipped; otherwise each missing
/// required field is a violation of its own. Rules spanning two fields only
/// apply when both are present.
pub fn validate(pattern: &AnimePattern, allow_partial: bool) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if !allow_partial {
        for field in REQUIRED_FIELDS {
            if !pattern.is_set(field) {
                errors.push(format!("Property {field} cannot be empty"));
            }
        }
    }

    if let Some(id) = &pattern.id {
        if id.as_str().is_empty() {
            errors.push("Id must not be empty".to_string());
        }
        if id.as_str().chars().count() != RECORD_ID_LEN {
            errors.push(format!("Id must be {RECORD_ID_LEN} characters long"));
        }
    }

    if let Some(name) = &pattern.name {
        if name.is_empty() {
            errors.push("Name must not be empty".to_string());
        }
        if name.chars().count() < 2 {
            errors.push("Name must be at least 2 characters long".to_string());
        }
    }

    if let Some(link) = &pattern.link
        && !link.is_empty()
        && !link.starts_with(SECURE_LINK_PREFIX)
    {
        errors.push(format!(
            "Link must be empty or start with {SECURE_LINK_PREFIX}"
        ));
    }

    if pattern.is_finished == Some(true) && pattern.is_airing_finished == Some(false) {
        errors.push("Anime cannot be finished if it's still airing".to_string());
    }

    if pattern.current_episode.is_some_and(|n| n < 0) {
        errors.push("Current_episode must hold a positive value".to_string());
    }

    if let Some(total) = pattern.total_episodes {
        if total < 0 {
            errors.push("Total_episodes must hold a positive value".to_string());
        }
        if pattern.current_episode.is_some_and(|current| total < current) {
            errors.push("Total_episodes must be greater or equal to current_episode".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// OR-match of `anime` against the supplied fields of `pattern`.
///
/// Names compare case-insensitively: by equality when `exact`, by substring
/// containment otherwise. An unset pattern field never matches.
#[must_use]
pub fn matches(anime: &Anime, pattern: &AnimePattern, exact: bool) -> bool {
    let name_matches = pattern.name.as_deref().is_some_and(|name| {
        let stored = anime.name.to_lowercase();
        let wanted = name.to_lowercase();
        if exact {
            stored == wanted
        } else {
            stored.contains(&wanted)
        }
    });

    pattern.id.as_ref() == Some(&anime.id)
        || name_matches
        || pattern
            .link
            .as_deref()
            .is_some_and(|link| anime.link.as_deref() == Some(link))
        || pattern.is_finished == Some(anime.is_finished)
        || pattern.is_airing_finished == Some(anime.is_airing_finished)
        || pattern
            .current_episode
            .is_some_and(|n| i64::from(n) == i64::from(anime.current_episode))
        || pattern
            .total_episodes
            .is_some_and(|n| i64::from(n) == i64::from(anime.total_episodes))
}

/// Applies [`matches`] to a loaded record set; an empty pattern keeps everything.
#[must_use]
pub fn filter_matches(records: Vec<Anime>, pattern: &AnimePattern, exact: bool) -> Vec<Anime> {
    if pattern.is_empty() {
        return records;
    }

    records
        .into_iter()
        .filter(|anime| matches(anime, pattern, exact))
        .collect()
}

/// The store-independent guards of a single-field update.
///
/// Name collisions need the store and are checked by the caller.
pub fn check_update_guards(
    current: &Anime,
    field: Field,
    value: &FieldValue,
) -> Result<(), UpdateRejection> {
    if field == Field::Id {
        return Err(UpdateRejection::Immutable(field));
    }

    validate(&AnimePattern::from_field(field, value), true)
        .map_err(UpdateRejection::InvalidValue)?;

    match (field, value) {
        (Field::CurrentEpisode, FieldValue::Count(n)) if *n > current.total_episodes => {
            Err(UpdateRejection::CurrentExceedsTotal {
                current: *n,
                total: current.total_episodes,
            })
        }
        (Field::TotalEpisodes, FieldValue::Count(n)) if *n < current.current_episode => {
            Err(UpdateRejection::TotalBelowCurrent {
                total: *n,
                current: current.current_episode,
            })
        }
        (Field::IsFinished | Field::IsAiringFinished, FieldValue::Flag(_)) => {
            let next = current.with_field(field, value);
            if next.is_finished && !next.is_airing_finished {
                Err(UpdateRejection::FinishedWhileAiring)
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}
