use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::upload::FileKind;

/// Create the upload root if it is missing and return it.
pub fn ensure_upload_root(upload_dir: &Path) -> std::io::Result<PathBuf> {
    ensure_dir(upload_dir)?;
    Ok(upload_dir.to_path_buf())
}

/// Path for a newly stored upload: a fresh UUID plus the kind's extension,
/// so original filenames never touch the filesystem.
pub fn stored_file_path(upload_dir: &Path, kind: FileKind) -> PathBuf {
    let name = format!("{}.{}", uuid::Uuid::new_v4(), kind.extension());
    upload_dir.join(name)
}

/// Best-effort removal of a stored upload. Missing files are not an error;
/// the row may outlive the file.
pub fn remove_stored_file(path: &str) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path, error = %err, "Failed to remove stored upload");
        }
    }
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
