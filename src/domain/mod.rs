//! Domain types for the watch-list with strong typing.
//!
//! Record identifiers are opaque strings; the service only ever generates them,
//! clients only ever echo them back.

pub mod field;

pub use field::{Field, FieldError, FieldKind, FieldValue, coerce_value, resolve_field_name};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

/// Length of a generated identifier in hex characters.
pub const RECORD_ID_LEN: usize = 24;

/// Unique identifier for a watch-list entry.
///
/// Generated ids are ObjectId-shaped: a 4-byte big-endian UNIX timestamp
/// followed by 8 random bytes, rendered as 24 lowercase hex characters.
/// Ids supplied by clients are accepted verbatim and only ever compared.
///
/// # Examples
///
/// ```rust
/// use watchlist::domain::RecordId;
///
/// let id = RecordId::generate();
/// assert_eq!(id.as_str().len(), 24);
/// assert_eq!(RecordId::new("abc").to_string(), "abc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a fresh identifier for a record about to be inserted.
    #[must_use]
    pub fn generate() -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let seconds = chrono::Utc::now().timestamp() as u32;
        let random: [u8; 8] = rand::random();

        let mut hex = String::with_capacity(RECORD_ID_LEN);
        for byte in seconds.to_be_bytes().iter().chain(random.iter()) {
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
