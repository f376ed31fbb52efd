use sqlx::SqlitePool;

use crate::domain::analysis::{Analysis, NewAnalysis};
use crate::domain::error::{AppError, Result};

#[derive(Clone)]
pub struct AnalysisRepository {
    pool: SqlitePool,
}

impl AnalysisRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &NewAnalysis) -> Result<Analysis> {
        let entity = sqlx::query_as::<_, AnalysisEntity>(
            "INSERT INTO analyses (data_upload_id, analysis_type, result, confidence)
             VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(input.data_upload_id)
        .bind(&input.analysis_type)
        .bind(&input.result)
        .bind(input.confidence)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create analysis: {}", e)))?;

        Ok(entity.into())
    }

    pub async fn get(&self, id: i64) -> Result<Analysis> {
        let entity = sqlx::query_as::<_, AnalysisEntity>(
            "SELECT id, data_upload_id, analysis_type, result, confidence, created_at
             FROM analyses WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch analysis: {}", e)))?;

        match entity {
            Some(entity) => Ok(entity.into()),
            None => Err(AppError::NotFound(format!("Analysis not found: {}", id))),
        }
    }

    /// Most recent analysis for an upload. Multiple analyses per upload are
    /// allowed; retrieval favors the newest.
    pub async fn latest_for_upload(&self, data_upload_id: i64) -> Result<Analysis> {
        let entity = sqlx::query_as::<_, AnalysisEntity>(
            "SELECT id, data_upload_id, analysis_type, result, confidence, created_at
             FROM analyses WHERE data_upload_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(data_upload_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch analysis: {}", e)))?;

        match entity {
            Some(entity) => Ok(entity.into()),
            None => Err(AppError::NotFound(format!(
                "No analysis for upload: {}",
                data_upload_id
            ))),
        }
    }

    pub async fn list_for_upload(
        &self,
        data_upload_id: i64,
        limit: i64,
    ) -> Result<Vec<Analysis>> {
        let entities = sqlx::query_as::<_, AnalysisEntity>(
            "SELECT id, data_upload_id, analysis_type, result, confidence, created_at
             FROM analyses WHERE data_upload_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(data_upload_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list analyses: {}", e)))?;

        Ok(entities.into_iter().map(|e| e.into()).collect())
    }

    pub async fn delete_for_upload(&self, data_upload_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM analyses WHERE data_upload_id = ?")
            .bind(data_upload_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete analyses: {}", e)))?;

        Ok(result.rows_affected())
    }
}

// Internal entity for database mapping
#[derive(sqlx::FromRow)]
struct AnalysisEntity {
    id: i64,
    data_upload_id: i64,
    analysis_type: String,
    result: String,
    confidence: Option<f64>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<AnalysisEntity> for Analysis {
    fn from(e: AnalysisEntity) -> Self {
        Self {
            id: e.id,
            data_upload_id: e.data_upload_id,
            analysis_type: e.analysis_type,
            result: e.result,
            confidence: e.confidence,
            created_at: e.created_at,
        }
    }
}
