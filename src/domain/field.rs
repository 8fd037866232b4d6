//! Field resolution for single-field updates.
//!
//! Clients name fields loosely: by their wire name (`is_finished`), by the
//! storage name (`finished`) or by the legacy property name (`DoneWatching`).
//! This module maps all of them onto one [`Field`] and turns the raw string
//! value into the field's typed value.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Non-negative integer.
    Count,
    Flag,
}

/// A watch-list record attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Name,
    Link,
    CurrentEpisode,
    TotalEpisodes,
    IsAiringFinished,
    IsFinished,
}

impl Field {
    pub const ALL: [Self; 7] = [
        Self::Id,
        Self::Name,
        Self::Link,
        Self::CurrentEpisode,
        Self::TotalEpisodes,
        Self::IsAiringFinished,
        Self::IsFinished,
    ];

    /// Name used in query strings and JSON bodies.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Link => "link",
            Self::CurrentEpisode => "current_episode",
            Self::TotalEpisodes => "total_episodes",
            Self::IsAiringFinished => "is_airing_finished",
            Self::IsFinished => "is_finished",
        }
    }

    /// Column name in the collection.
    #[must_use]
    pub const fn storage_name(self) -> &'static str {
        match self {
            Self::Id => "_id",
            Self::Name => "name",
            Self::Link => "link",
            Self::CurrentEpisode => "current_episode",
            Self::TotalEpisodes => "total_episodes",
            Self::IsAiringFinished => "finished_airing",
            Self::IsFinished => "finished",
        }
    }

    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Id => &["Id"],
            Self::Name => &["Name"],
            Self::Link => &["Link"],
            Self::CurrentEpisode => &["CurrentEpisode"],
            Self::TotalEpisodes => &["TotalEpisodes"],
            Self::IsAiringFinished => &["IsAiringFinished"],
            Self::IsFinished => &["IsFinished", "DoneWatching"],
        }
    }

    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Id | Self::Name | Self::Link => FieldKind::Text,
            Self::CurrentEpisode | Self::TotalEpisodes => FieldKind::Count,
            Self::IsAiringFinished | Self::IsFinished => FieldKind::Flag,
        }
    }

    fn answers_to(self, name: &str) -> bool {
        name.eq_ignore_ascii_case(self.wire_name())
            || name.eq_ignore_ascii_case(self.storage_name())
            || self
                .aliases()
                .iter()
                .any(|alias| name.eq_ignore_ascii_case(alias))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Field {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve_field_name(s)
    }
}

/// A value coerced to the type its field stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Count(u32),
    Flag(bool),
}

impl FieldValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Value {value:?} is not valid for field {field}")]
    TypeMismatch { field: Field, value: String },
}

/// Maps an external field name onto its [`Field`], ignoring ASCII case.
pub fn resolve_field_name(name: &str) -> Result<Field, FieldError> {
    let name = name.trim();
    Field::ALL
        .into_iter()
        .find(|field| field.answers_to(name))
        .ok_or_else(|| FieldError::UnknownField(name.to_string()))
}

/// Parses `raw` into the type stored by `field`.
///
/// Counts are parsed as 32-bit signed integers and rejected when negative.
/// Flags accept `true`/`false` in any ASCII case.
pub fn coerce_value(field: Field, raw: &str) -> Result<FieldValue, FieldError> {
    let mismatch = || FieldError::TypeMismatch {
        field,
        value: raw.to_string(),
    };

    match field.kind() {
        FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
        FieldKind::Count => raw
            .parse::<i32>()
            .ok()
            .and_then(|n| u32::try_from(n).ok())
            .map(FieldValue::Count)
            .ok_or_else(mismatch),
        FieldKind::Flag => {
            if raw.eq_ignore_ascii_case("true") {
                Ok(FieldValue::Flag(true))
            } else if raw.eq_ignore_ascii_case("false") {
                Ok(FieldValue::Flag(false))
            } else {
                Err(mismatch())
            }
        }
    }
}
