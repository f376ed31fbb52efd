use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::domain::error::Result;
use crate::domain::upload::{DataUpload, FileKind, NewUpload};
use crate::infrastructure::db::uploads::UploadRepository;

/// A file already persisted to the upload directory, ready to be recorded.
#[derive(Debug, Clone)]
pub struct SavedFile {
    pub filename: String,
    pub kind: FileKind,
    pub stored_path: PathBuf,
    pub size_bytes: i64,
    pub checksum: String,
}

/// Records an accepted upload. Analysis is dispatched separately so the
/// upload endpoint can answer immediately with status `processing`.
pub struct IngestUseCase {
    uploads: Arc<UploadRepository>,
}

impl IngestUseCase {
    pub fn new(uploads: Arc<UploadRepository>) -> Self {
        Self { uploads }
    }

    pub async fn execute(&self, saved: SavedFile) -> Result<DataUpload> {
        let upload = self
            .uploads
            .create(&NewUpload {
                filename: saved.filename,
                file_type: saved.kind,
                stored_path: saved.stored_path.to_string_lossy().into_owned(),
                size_bytes: saved.size_bytes,
                checksum: Some(saved.checksum),
            })
            .await?;

        info!(
            upload_id = upload.id,
            filename = %upload.filename,
            file_type = %upload.file_type,
            size_bytes = upload.size_bytes,
            "Upload recorded"
        );

        Ok(upload)
    }
}
