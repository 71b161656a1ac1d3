use async_trait::async_trait;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::application::repos::{
    ListWindow, NewPost, PostChanges, PostFilter, PostsRepo, PostsWriteRepo, RepoError,
};
use crate::domain::entities::PostRecord;
use crate::domain::types::{PostFormat, PostStatus};

use super::SqliteRepositories;
use super::util::map_sqlx_error;

const POST_COLUMNS: &str =
    "id, title, content, COALESCE(slug, '') AS slug, tags, status, format, created_at";

#[derive(Debug, FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    slug: String,
    tags: String,
    status: String,
    format: String,
    created_at: String,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        PostRecord {
            id: row.id,
            title: row.title,
            content: row.content,
            slug: row.slug,
            tags: row.tags,
            status: PostStatus::from_stored(&row.status),
            format: PostFormat::from_stored(&row.format),
            created_at: row.created_at,
        }
    }
}

fn like_pattern(needle: &str) -> String {
    format!("%{needle}%")
}

fn push_tag_condition<'q>(qb: &mut QueryBuilder<'q, Sqlite>, filter: &'q PostFilter) {
    if let Some(tag) = filter.tag.as_ref() {
        qb.push(" AND tags LIKE ");
        qb.push_bind(like_pattern(tag));
    }
}

#[async_trait]
impl PostsRepo for SqliteRepositories {
    async fn list_posts(
        &self,
        filter: &PostFilter,
        window: Option<ListWindow>,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts WHERE 1=1 "));
        push_tag_condition(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC ");

        if let Some(window) = window {
            qb.push(" LIMIT ");
            qb.push_bind(i64::from(window.limit));
            qb.push(" OFFSET ");
            qb.push_bind(i64::from(window.offset));
        }

        let rows: Vec<PostRow> = qb
            .build_query_as()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts WHERE 1=1 ");
        push_tag_condition(&mut qb, filter);

        let (count,): (i64,) = qb
            .build_query_as()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        count
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let row: Option<PostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE slug = ?1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn search_posts(&self, query: &str) -> Result<Vec<PostRecord>, RepoError> {
        let pattern = like_pattern(query);
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE status = 'published' AND (title LIKE ?1 OR tags LIKE ?1) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(&pattern)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }
}

#[async_trait]
impl PostsWriteRepo for SqliteRepositories {
    async fn create_post(&self, params: NewPost) -> Result<PostRecord, RepoError> {
        let NewPost {
            title,
            content,
            slug,
            tags,
            status,
            format,
            created_at,
        } = params;

        let row: PostRow = sqlx::query_as(&format!(
            "INSERT INTO posts (title, content, slug, tags, status, format, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(&title)
        .bind(&content)
        .bind(&slug)
        .bind(&tags)
        .bind(status.as_str())
        .bind(format.as_str())
        .bind(&created_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, slug: &str, changes: PostChanges) -> Result<(), RepoError> {
        let PostChanges {
            title,
            content,
            tags,
            status,
            format,
        } = changes;

        // Zero affected rows means the slug does not exist; that is a no-op
        // by contract, not an error.
        sqlx::query(
            "UPDATE posts SET title = ?1, content = ?2, tags = ?3, status = ?4, format = ?5 \
             WHERE slug = ?6",
        )
        .bind(&title)
        .bind(&content)
        .bind(&tags)
        .bind(status.as_str())
        .bind(format.as_str())
        .bind(slug)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_post(&self, slug: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM posts WHERE slug = ?1")
            .bind(slug)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}
