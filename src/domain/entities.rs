//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::domain::types::{PostFormat, PostStatus};

/// Storage format for `created_at` columns. Chosen so that lexicographic
/// ordering matches chronological ordering and the year is the first four
/// characters.
pub const STORED_TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Render the current UTC time in the stored column format.
pub fn timestamp_now() -> String {
    OffsetDateTime::now_utc()
        .format(STORED_TIMESTAMP_FORMAT)
        .expect("formatting a UTC timestamp cannot fail")
}

/// Parse a stored timestamp back into unix seconds. Unparseable legacy
/// values yield `None`.
pub fn stored_timestamp_unix(value: &str) -> Option<i64> {
    PrimitiveDateTime::parse(value, STORED_TIMESTAMP_FORMAT)
        .ok()
        .map(|stamp| stamp.assume_utc().unix_timestamp())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub tags: String,
    pub status: PostStatus,
    pub format: PostFormat,
    pub created_at: String,
}

impl PostRecord {
    /// Calendar year used for archive grouping: the leading four characters
    /// of the stored timestamp. Malformed legacy values group under
    /// themselves rather than panicking.
    pub fn year(&self) -> &str {
        self.created_at.get(..4).unwrap_or(&self.created_at)
    }

    /// Split the free-text tag column into display entries.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadRecord {
    pub id: i64,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: String,
}
