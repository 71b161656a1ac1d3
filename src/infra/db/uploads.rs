use async_trait::async_trait;
use sqlx::FromRow;

use crate::application::repos::{NewUpload, RepoError, UploadsRepo};
use crate::domain::entities::UploadRecord;

use super::SqliteRepositories;
use super::util::map_sqlx_error;

const UPLOAD_COLUMNS: &str = "id, filename, content_type, size_bytes, created_at";

#[derive(Debug, FromRow)]
struct UploadRow {
    id: i64,
    filename: String,
    content_type: String,
    size_bytes: i64,
    created_at: String,
}

impl From<UploadRow> for UploadRecord {
    fn from(row: UploadRow) -> Self {
        UploadRecord {
            id: row.id,
            filename: row.filename,
            content_type: row.content_type,
            size_bytes: row.size_bytes,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl UploadsRepo for SqliteRepositories {
    async fn record_upload(&self, params: NewUpload) -> Result<UploadRecord, RepoError> {
        let NewUpload {
            filename,
            content_type,
            size_bytes,
            created_at,
        } = params;

        // Same-name uploads overwrite the stored file, so the index row
        // follows the same last-writer-wins rule.
        let row: UploadRow = sqlx::query_as(&format!(
            "INSERT INTO uploads (filename, content_type, size_bytes, created_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(filename) DO UPDATE SET \
                 content_type = excluded.content_type, \
                 size_bytes = excluded.size_bytes, \
                 created_at = excluded.created_at \
             RETURNING {UPLOAD_COLUMNS}"
        ))
        .bind(&filename)
        .bind(&content_type)
        .bind(size_bytes)
        .bind(&created_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(UploadRecord::from(row))
    }

    async fn list_uploads(&self) -> Result<Vec<UploadRecord>, RepoError> {
        let rows: Vec<UploadRow> = sqlx::query_as(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads ORDER BY created_at DESC, filename ASC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(UploadRecord::from).collect())
    }

    async fn find_upload(&self, filename: &str) -> Result<Option<UploadRecord>, RepoError> {
        let row: Option<UploadRow> = sqlx::query_as(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads WHERE filename = ?1"
        ))
        .bind(filename)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UploadRecord::from))
    }

    async fn delete_upload(&self, filename: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM uploads WHERE filename = ?1")
            .bind(filename)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}
