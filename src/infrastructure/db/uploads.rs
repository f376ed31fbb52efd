use sqlx::SqlitePool;

use crate::domain::error::{AppError, Result};
use crate::domain::upload::{DataUpload, NewUpload, UploadStatus};

#[derive(Clone)]
pub struct UploadRepository {
    pool: SqlitePool,
}

impl UploadRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &NewUpload) -> Result<DataUpload> {
        let entity = sqlx::query_as::<_, UploadEntity>(
            "INSERT INTO data_uploads (filename, file_type, stored_path, size_bytes, checksum, status)
             VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&input.filename)
        .bind(input.file_type.as_str())
        .bind(&input.stored_path)
        .bind(input.size_bytes)
        .bind(&input.checksum)
        .bind(UploadStatus::Processing.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create upload: {}", e)))?;

        entity.try_into()
    }

    pub async fn get(&self, id: i64) -> Result<DataUpload> {
        let entity = sqlx::query_as::<_, UploadEntity>(
            "SELECT id, filename, file_type, stored_path, size_bytes, checksum, status,
                    error_message, upload_time
             FROM data_uploads WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch upload: {}", e)))?;

        match entity {
            Some(entity) => entity.try_into(),
            None => Err(AppError::NotFound(format!("Upload not found: {}", id))),
        }
    }

    pub async fn list(&self, limit: i64) -> Result<Vec<DataUpload>> {
        let entities = sqlx::query_as::<_, UploadEntity>(
            "SELECT id, filename, file_type, stored_path, size_bytes, checksum, status,
                    error_message, upload_time
             FROM data_uploads ORDER BY upload_time DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list uploads: {}", e)))?;

        entities.into_iter().map(|e| e.try_into()).collect()
    }

    pub async fn mark_analyzed(&self, id: i64) -> Result<()> {
        self.set_status(id, UploadStatus::Analyzed, None).await
    }

    pub async fn mark_error(&self, id: i64, message: &str) -> Result<()> {
        self.set_status(id, UploadStatus::Error, Some(message)).await
    }

    async fn set_status(
        &self,
        id: i64,
        status: UploadStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE data_uploads SET status = ?, error_message = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(error_message)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update upload status: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Upload not found: {}", id)));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM data_uploads WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete upload: {}", e)))?;

        Ok(result.rows_affected())
    }
}

// Internal entity for database mapping
#[derive(sqlx::FromRow)]
struct UploadEntity {
    id: i64,
    filename: String,
    file_type: String,
    stored_path: String,
    size_bytes: i64,
    checksum: Option<String>,
    status: String,
    error_message: Option<String>,
    upload_time: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<UploadEntity> for DataUpload {
    type Error = AppError;

    fn try_from(e: UploadEntity) -> Result<Self> {
        Ok(Self {
            id: e.id,
            filename: e.filename,
            file_type: e.file_type.parse()?,
            stored_path: e.stored_path,
            size_bytes: e.size_bytes,
            checksum: e.checksum,
            status: e.status.parse()?,
            error_message: e.error_message,
            upload_time: e.upload_time,
        })
    }
}
