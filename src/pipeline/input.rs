//! Input validation: make sure the operator's path names a readable file
//! before anything is created on disk or in the backend.

use crate::error::IngestError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Check that `path` exists and can be opened for reading.
///
/// Content is not sniffed: a file that is not a PDF fails
/// later, when the rasterizer tries to open it.
pub fn resolve_local(path: &Path) -> Result<PathBuf, IngestError> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(IngestError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(IngestError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Resolved local input: {}", path.display());
    Ok(path.to_path_buf())
}

/// Name of the JPEG written for a page: `<stem>-p<page_num>.jpg`.
///
/// `page_num` is 1-indexed.
pub fn page_image_name(source: &Path, page_num: usize) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    format!("{stem}-p{page_num}.jpg")
}
