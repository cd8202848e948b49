//! File metadata extraction and coarse type classification.
//!
//! Everything here is a read-only `stat` of the input path. The
//! [`FileType`] label is advisory: only PDFs can actually be rendered, and a
//! `.docx` handed to the rasterizer fails there rather than here.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use std::time::SystemTime;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Coarse document category derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    #[serde(rename = "PDF")]
    Pdf,
    Word,
    PowerPoint,
    Other,
}

impl FileType {
    /// Classify an extension, with or without its leading dot, ignoring case.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => FileType::Pdf,
            "doc" | "docx" => FileType::Word,
            "ppt" | "pptx" => FileType::PowerPoint,
            _ => FileType::Other,
        }
    }

    /// Label stored in the `file_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "PDF",
            FileType::Word => "Word",
            FileType::PowerPoint => "PowerPoint",
            FileType::Other => "Other",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filesystem attributes of an input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    /// Base name including extension, e.g. `report.PDF`.
    pub filename: String,
    /// Lowercase extension without the dot; empty when there is none.
    pub file_extension: String,
    pub file_type: FileType,
    /// Size in KiB, truncated.
    pub size_kb: u64,
    /// ISO-8601 local time. Falls back to `last_modified` where the platform
    /// has no birth time.
    pub created_at: String,
    /// ISO-8601 local time.
    pub last_modified: String,
}

/// Stat `path` and describe it.
///
/// Fails with the underlying I/O error when the path does not exist; callers
/// check existence first.
pub fn file_info(path: &Path) -> io::Result<FileMetadata> {
    let stats = std::fs::metadata(path)?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let modified = stats.modified()?;
    let created = stats.created().unwrap_or(modified);

    Ok(FileMetadata {
        file_type: FileType::from_extension(&file_extension),
        filename,
        file_extension,
        size_kb: size_kb(stats.len()),
        created_at: format_timestamp(created),
        last_modified: format_timestamp(modified),
    })
}

/// Bytes to whole KiB, rounding toward zero.
pub fn size_kb(bytes: u64) -> u64 {
    bytes / 1024
}

fn format_timestamp(t: SystemTime) -> String {
    DateTime::<Local>::from(t).format(TIMESTAMP_FORMAT).to_string()
}
