use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{AppError, Result};

/// Accepted tabular file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Csv,
    Xlsx,
}

impl FileKind {
    /// Resolve the file kind from the upload's content type and filename.
    ///
    /// The content type wins when it is one of the two accepted MIME types.
    /// Browsers are inconsistent about MIME types for spreadsheets, so the
    /// filename extension is accepted as a fallback.
    pub fn from_upload(content_type: Option<&str>, filename: &str) -> Result<Self> {
        match content_type {
            Some("text/csv") => return Ok(FileKind::Csv),
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet") => {
                return Ok(FileKind::Xlsx)
            }
            _ => {}
        }

        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(FileKind::Csv)
        } else if lower.ends_with(".xlsx") {
            Ok(FileKind::Xlsx)
        } else {
            Err(AppError::ValidationError(
                "Invalid file type. Only CSV and Excel files are allowed.".to_string(),
            ))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Csv => "csv",
            FileKind::Xlsx => "xlsx",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl std::str::FromStr for FileKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(FileKind::Csv),
            "xlsx" => Ok(FileKind::Xlsx),
            other => Err(AppError::ValidationError(format!(
                "Unknown file type: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing state of an upload. Stored as text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Processing,
    Analyzed,
    Error,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Processing => "processing",
            UploadStatus::Analyzed => "analyzed",
            UploadStatus::Error => "error",
        }
    }
}

impl std::str::FromStr for UploadStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "processing" => Ok(UploadStatus::Processing),
            "analyzed" => Ok(UploadStatus::Analyzed),
            "error" => Ok(UploadStatus::Error),
            other => Err(AppError::Internal(format!(
                "Unknown upload status: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted file and its processing state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataUpload {
    pub id: i64,
    pub filename: String,
    pub file_type: FileKind,
    pub stored_path: String,
    pub size_bytes: i64,
    pub checksum: Option<String>,
    pub status: UploadStatus,
    pub error_message: Option<String>,
    pub upload_time: chrono::DateTime<chrono::Utc>,
}

/// Fields required to create an upload row.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub filename: String,
    pub file_type: FileKind,
    pub stored_path: String,
    pub size_bytes: i64,
    pub checksum: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(
            FileKind::from_upload(Some("text/csv"), "anything.bin").unwrap(),
            FileKind::Csv
        );
        assert_eq!(
            FileKind::from_upload(
                Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
                "report"
            )
            .unwrap(),
            FileKind::Xlsx
        );
    }

    #[test]
    fn test_kind_from_extension_fallback() {
        assert_eq!(
            FileKind::from_upload(Some("application/octet-stream"), "Sales.CSV").unwrap(),
            FileKind::Csv
        );
        assert_eq!(
            FileKind::from_upload(None, "report.xlsx").unwrap(),
            FileKind::Xlsx
        );
    }

    #[test]
    fn test_kind_rejects_unknown() {
        assert!(FileKind::from_upload(Some("application/pdf"), "doc.pdf").is_err());
        assert!(FileKind::from_upload(None, "notes.txt").is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            UploadStatus::Processing,
            UploadStatus::Analyzed,
            UploadStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<UploadStatus>().unwrap(), status);
        }
    }
}
