//! SQLite-backed repository implementations.

mod posts;
mod uploads;
mod util;

pub use util::map_sqlx_error;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::{
    query,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};
use tracing::info;

use crate::application::repos::RepoError;
use crate::domain::entities::stored_timestamp_unix;
use crate::domain::slug::backfill_slug;

#[derive(Clone)]
pub struct SqliteRepositories {
    pool: Arc<SqlitePool>,
}

impl SqliteRepositories {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
        // `case_sensitive_like` makes LIKE a literal substring match; SQLite
        // defaults to ASCII-case-insensitive comparisons otherwise.
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("case_sensitive_like", "ON");

        SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
    }

    /// Apply pending schema migrations. Each step is recorded in
    /// `_sqlx_migrations`, so a step never reapplies.
    pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    /// Assign slugs to legacy rows that predate the slug column. Guarded by
    /// the NULL/empty predicate, so each post is touched at most once. The
    /// creation-time suffix keeps derived slugs unique; on the off chance of
    /// a residual collision the row id is appended as a tiebreaker.
    pub async fn backfill_missing_slugs(&self) -> Result<u64, RepoError> {
        let rows: Vec<(i64, String, String)> = sqlx::query_as(
            "SELECT id, title, created_at FROM posts WHERE slug IS NULL OR slug = ''",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut assigned = 0u64;
        for (id, title, created_at) in rows {
            let created_unix = stored_timestamp_unix(&created_at).unwrap_or(id);
            let candidate = backfill_slug(&title, created_unix);

            let result = sqlx::query("UPDATE posts SET slug = ?1 WHERE id = ?2")
                .bind(&candidate)
                .bind(id)
                .execute(self.pool())
                .await
                .map_err(map_sqlx_error);

            match result {
                Ok(_) => {}
                Err(RepoError::Duplicate { .. }) => {
                    let fallback = format!("{candidate}-{id}");
                    sqlx::query("UPDATE posts SET slug = ?1 WHERE id = ?2")
                        .bind(&fallback)
                        .bind(id)
                        .execute(self.pool())
                        .await
                        .map_err(map_sqlx_error)?;
                }
                Err(other) => return Err(other),
            }
            assigned += 1;
        }

        if assigned > 0 {
            info!(
                target: "foglio::db::backfill",
                posts = assigned,
                "assigned slugs to legacy posts"
            );
        }
        Ok(assigned)
    }
}
