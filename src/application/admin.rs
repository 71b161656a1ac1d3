//! Administrative post operations behind the session gate.

use std::sync::Arc;

use thiserror::Error;

use crate::application::pagination::{PageWindow, clamp_page};
use crate::application::repos::{
    ListWindow, NewPost, PostChanges, PostFilter, PostsRepo, PostsWriteRepo, RepoError,
};
use crate::domain::entities::{PostRecord, timestamp_now};
use crate::domain::slug::{SlugError, normalize_slug_input, validate_slug};
use crate::domain::types::{PostFormat, PostStatus};
use crate::presentation::views::{DashboardContext, DashboardRow};

#[derive(Debug, Error)]
pub enum AdminError {
    /// User-correctable input problem; surfaced as a flash message.
    #[error("{0}")]
    Validation(String),
    /// Slug collision; also user-correctable, kept separate so callers can
    /// name the offending slug.
    #[error("a post with slug `{0}` already exists")]
    DuplicateSlug(String),
    #[error(transparent)]
    Repo(RepoError),
}

#[derive(Debug, Clone)]
pub struct NewPostInput {
    pub title: String,
    pub content: String,
    pub tags: String,
    pub status: String,
    pub format: String,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct EditPostInput {
    pub title: String,
    pub content: String,
    pub tags: String,
    pub status: String,
    pub format: String,
}

pub enum DashboardOutcome {
    /// The requested page is out of range; redirect to this boundary page.
    Redirect(u32),
    Page(DashboardContext),
}

pub struct AdminService {
    posts: Arc<dyn PostsRepo>,
    writes: Arc<dyn PostsWriteRepo>,
    page_size: u32,
}

impl AdminService {
    pub fn new(posts: Arc<dyn PostsRepo>, writes: Arc<dyn PostsWriteRepo>, page_size: u32) -> Self {
        Self {
            posts,
            writes,
            page_size,
        }
    }

    pub async fn create_post(&self, input: NewPostInput) -> Result<PostRecord, AdminError> {
        let NewPostInput {
            title,
            content,
            tags,
            status,
            format,
            slug,
        } = input;

        let title = required(title, "Title is required.")?;
        let content = required(content, "Content is required.")?;
        let slug = normalize_slug_input(&slug);
        validate_slug(&slug).map_err(slug_error_message)?;
        let (status, format) = parse_status_format(&status, &format)?;

        let params = NewPost {
            title,
            content,
            tags: tags.trim().to_string(),
            slug: slug.clone(),
            status,
            format,
            created_at: timestamp_now(),
        };

        let record = self.writes.create_post(params).await.map_err(|err| match err {
            RepoError::Duplicate { .. } => AdminError::DuplicateSlug(slug.clone()),
            other => AdminError::Repo(other),
        })?;

        tracing::info!(
            target: "foglio::admin::posts",
            slug = %record.slug,
            id = record.id,
            "post created"
        );
        Ok(record)
    }

    pub async fn load_post(&self, slug: &str) -> Result<Option<PostRecord>, AdminError> {
        self.posts.find_by_slug(slug).await.map_err(AdminError::Repo)
    }

    /// Overwrite the mutable fields of an existing post. `id`, `slug`, and
    /// `created_at` stay as created. Callers that need a 404 for unknown
    /// slugs must check existence first.
    pub async fn update_post(&self, slug: &str, input: EditPostInput) -> Result<(), AdminError> {
        let EditPostInput {
            title,
            content,
            tags,
            status,
            format,
        } = input;

        let title = required(title, "Title is required.")?;
        let content = required(content, "Content is required.")?;
        let (status, format) = parse_status_format(&status, &format)?;

        let changes = PostChanges {
            title,
            content,
            tags: tags.trim().to_string(),
            status,
            format,
        };

        self.writes
            .update_post(slug, changes)
            .await
            .map_err(AdminError::Repo)?;
        tracing::info!(target: "foglio::admin::posts", slug, "post updated");
        Ok(())
    }

    /// Idempotent delete by slug.
    pub async fn delete_post(&self, slug: &str) -> Result<(), AdminError> {
        self.writes
            .delete_post(slug)
            .await
            .map_err(AdminError::Repo)?;
        tracing::info!(target: "foglio::admin::posts", slug, "post deleted");
        Ok(())
    }

    /// The admin list clamps out-of-range pages to the nearest boundary and
    /// asks the handler to redirect there, unlike the public listings.
    pub async fn dashboard_page(&self, requested: i64) -> Result<DashboardOutcome, AdminError> {
        let filter = PostFilter::default();
        let total = self
            .posts
            .count_posts(&filter)
            .await
            .map_err(AdminError::Repo)?;
        let total_pages = PageWindow::compute(1, self.page_size, total).total_pages;

        if let Some(boundary) = clamp_page(requested, total_pages) {
            return Ok(DashboardOutcome::Redirect(boundary));
        }

        let page = requested as u32;
        let window = PageWindow::compute(page, self.page_size, total);
        let records = self
            .posts
            .list_posts(
                &filter,
                Some(ListWindow {
                    limit: window.limit,
                    offset: window.offset,
                }),
            )
            .await
            .map_err(AdminError::Repo)?;

        let rows = records
            .into_iter()
            .map(|record| DashboardRow {
                status_label: record.status.label(),
                slug: record.slug,
                title: record.title,
                created_at: record.created_at,
            })
            .collect();

        Ok(DashboardOutcome::Page(DashboardContext {
            rows,
            page,
            total_pages: window.total_pages,
        }))
    }
}

fn required(value: String, message: &str) -> Result<String, AdminError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AdminError::Validation(message.to_string()));
    }
    Ok(trimmed.to_string())
}

fn parse_status_format(
    status: &str,
    format: &str,
) -> Result<(PostStatus, PostFormat), AdminError> {
    let status = PostStatus::from_form_value(status)
        .map_err(|err| AdminError::Validation(err.to_string()))?;
    let format = PostFormat::from_form_value(format)
        .map_err(|err| AdminError::Validation(err.to_string()))?;
    Ok((status, format))
}

fn slug_error_message(err: SlugError) -> AdminError {
    let message = match err {
        SlugError::Empty => "Slug is required.",
        SlugError::InvalidCharacters => {
            "Slug can only contain lowercase letters, numbers, and hyphens."
        }
    };
    AdminError::Validation(message.to_string())
}
