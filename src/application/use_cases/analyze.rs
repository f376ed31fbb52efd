use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};

use super::summarize::{SummarizeOptions, Summarizer};
use crate::domain::analysis::{Analysis, NewAnalysis, TableSummary, ANALYSIS_TYPE_DESCRIPTIVE};
use crate::domain::error::{AppError, Result};
use crate::domain::upload::DataUpload;
use crate::infrastructure::db::analyses::AnalysisRepository;
use crate::infrastructure::db::uploads::UploadRepository;
use crate::infrastructure::parsers;

/// Parses an uploaded file, computes its descriptive summary, persists the
/// analysis row and moves the upload to its terminal status.
pub struct AnalyzeUseCase {
    uploads: Arc<UploadRepository>,
    analyses: Arc<AnalysisRepository>,
    options: SummarizeOptions,
}

impl AnalyzeUseCase {
    pub fn new(
        uploads: Arc<UploadRepository>,
        analyses: Arc<AnalysisRepository>,
        options: SummarizeOptions,
    ) -> Self {
        Self {
            uploads,
            analyses,
            options,
        }
    }

    /// Run the analysis for one upload. The upload ends up `analyzed` on
    /// success or `error` (with the message stored) on any failure.
    pub async fn run(&self, upload: &DataUpload) -> Result<Analysis> {
        match self.analyze(upload).await {
            Ok(analysis) => {
                self.uploads.mark_analyzed(upload.id).await?;
                info!(
                    upload_id = upload.id,
                    analysis_id = analysis.id,
                    confidence = ?analysis.confidence,
                    "Analysis complete"
                );
                Ok(analysis)
            }
            Err(err) => {
                error!(upload_id = upload.id, error = %err, "Analysis failed");
                self.uploads.mark_error(upload.id, &err.to_string()).await?;
                Err(err)
            }
        }
    }

    async fn analyze(&self, upload: &DataUpload) -> Result<Analysis> {
        let path = PathBuf::from(&upload.stored_path);
        let kind = upload.file_type;
        let options = self.options.clone();

        // Parsing and summarizing are CPU/IO bound; keep them off the
        // async workers.
        let summary = tokio::task::spawn_blocking(move || -> Result<TableSummary> {
            let table = parsers::load_table(&path, kind)?;
            Ok(Summarizer::new(options).summarize(&table))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Analysis task failed: {}", e)))??;

        let result = serde_json::to_string(&summary)
            .map_err(|e| AppError::Internal(format!("Failed to serialize summary: {}", e)))?;

        self.analyses
            .create(&NewAnalysis {
                data_upload_id: upload.id,
                analysis_type: ANALYSIS_TYPE_DESCRIPTIVE.to_string(),
                result,
                confidence: Some(summary.confidence),
            })
            .await
    }
}
