//! Shared domain enumerations aligned with persisted column values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {field} value `{value}`")]
pub struct UnknownValue {
    pub field: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PostStatus::Draft => "Draft",
            PostStatus::Published => "Published",
        }
    }

    /// Parse a submitted form value. Blank input falls back to the default.
    pub fn from_form_value(value: &str) -> Result<Self, UnknownValue> {
        match value.trim() {
            "" => Ok(Self::default()),
            other => Self::try_from(other),
        }
    }

    /// Interpret a stored column value. Rows written before the column checks
    /// existed may carry arbitrary text; those read as the default.
    pub fn from_stored(value: &str) -> Self {
        Self::try_from(value).unwrap_or_default()
    }
}

impl TryFrom<&str> for PostStatus {
    type Error = UnknownValue;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(UnknownValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Descriptive only; never alters rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostFormat {
    #[default]
    Standard,
    Html,
}

impl PostFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            PostFormat::Standard => "standard",
            PostFormat::Html => "html",
        }
    }

    pub fn from_form_value(value: &str) -> Result<Self, UnknownValue> {
        match value.trim() {
            "" => Ok(Self::default()),
            other => Self::try_from(other),
        }
    }

    pub fn from_stored(value: &str) -> Self {
        Self::try_from(value).unwrap_or_default()
    }
}

impl TryFrom<&str> for PostFormat {
    type Error = UnknownValue;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "standard" => Ok(PostFormat::Standard),
            "html" => Ok(PostFormat::Html),
            other => Err(UnknownValue {
                field: "format",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_form_values_fall_back_to_defaults() {
        assert_eq!(PostStatus::from_form_value("").unwrap(), PostStatus::Draft);
        assert_eq!(
            PostFormat::from_form_value("  ").unwrap(),
            PostFormat::Standard
        );
    }

    #[test]
    fn unknown_form_values_are_rejected() {
        let err = PostStatus::from_form_value("pending").unwrap_err();
        assert_eq!(err.field, "status");
        assert!(PostFormat::from_form_value("markdown").is_err());
    }

    #[test]
    fn stored_values_never_fail() {
        assert_eq!(PostStatus::from_stored("published"), PostStatus::Published);
        assert_eq!(PostStatus::from_stored("archived"), PostStatus::Draft);
        assert_eq!(PostFormat::from_stored("html"), PostFormat::Html);
    }
}
