//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{PostRecord, UploadRecord};
use crate::domain::types::{PostFormat, PostStatus};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint: {constraint}")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("integrity error: {message}")]
    Integrity { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Optional narrowing applied to list/count queries. Tag matching is a
/// substring search against the free-text `tags` column.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub tag: Option<String>,
}

impl PostFilter {
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
        }
    }
}

/// A LIMIT/OFFSET window over the newest-first post ordering.
#[derive(Debug, Clone, Copy)]
pub struct ListWindow {
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub slug: String,
    pub tags: String,
    pub status: PostStatus,
    pub format: PostFormat,
    pub created_at: String,
}

/// Fields overwritten by an edit. `id`, `slug`, and `created_at` are
/// immutable and deliberately absent.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub tags: String,
    pub status: PostStatus,
    pub format: PostFormat,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts ordered `created_at DESC`; `window: None` returns everything.
    async fn list_posts(
        &self,
        filter: &PostFilter,
        window: Option<ListWindow>,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError>;

    /// Published posts whose title or tags contain the query as a literal
    /// substring, newest first. The published-only restriction is specific
    /// to search; other listings do not filter on status.
    async fn search_posts(&self, query: &str) -> Result<Vec<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    /// Fails with [`RepoError::Duplicate`] when the slug is already taken.
    async fn create_post(&self, params: NewPost) -> Result<PostRecord, RepoError>;

    /// No-op when the slug does not exist; callers that need to distinguish
    /// must check existence first.
    async fn update_post(&self, slug: &str, changes: PostChanges) -> Result<(), RepoError>;

    /// Idempotent: deleting an absent slug succeeds.
    async fn delete_post(&self, slug: &str) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewUpload {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: String,
}

#[async_trait]
pub trait UploadsRepo: Send + Sync {
    /// Insert or replace the index row for a filename (last writer wins,
    /// mirroring the storage semantics).
    async fn record_upload(&self, params: NewUpload) -> Result<UploadRecord, RepoError>;

    async fn list_uploads(&self) -> Result<Vec<UploadRecord>, RepoError>;

    async fn find_upload(&self, filename: &str) -> Result<Option<UploadRecord>, RepoError>;

    /// Idempotent: removing an absent filename succeeds.
    async fn delete_upload(&self, filename: &str) -> Result<(), RepoError>;
}
