//! Error types for the docpages library.
//!
//! Two error types mirror the two collaborators an ingestion talks to:
//!
//! * [`IngestError`] — **Fatal for one ingestion**: the file is missing, the
//!   PDF cannot be opened, a page cannot be rendered or written, or the
//!   backend rejected a write. Returned from
//!   [`crate::ingest::DocumentIngestor::ingest`].
//!
//! * [`StoreError`] — **Backend failures**, classified by kind so callers can
//!   tell a network outage from a schema mismatch. Wrapped by
//!   [`IngestError::Store`] when it happens mid-ingestion.
//!
//! Nothing here is retried. A failure after the document row was written
//! leaves that row and every page stored before the failure in place.

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned while ingesting a single document.
#[derive(Debug, Error)]
pub enum IngestError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File {} not found!", path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{}'", path.display())]
    PermissionDenied { path: PathBuf },

    /// Filesystem attributes could not be read.
    #[error("Failed to read file attributes of '{}': {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The annotation prompts could not be answered (closed stdin etc.).
    #[error("Failed to read document details: {0}")]
    Prompt(#[source] std::io::Error),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The document could not be parsed by pdfium (corrupt or not a PDF).
    #[error("Failed to open '{}': {detail}", path.display())]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{}' is encrypted and requires a password", path.display())]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{}'", path.display())]
    WrongPassword { path: PathBuf },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or place the library in the working directory."
    )]
    PdfiumBindingFailed(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// The rendered page could not be encoded as JPEG.
    #[error("Failed to encode page {page} as JPEG: {source}")]
    ImageEncodeFailed {
        page: usize,
        #[source]
        source: image::ImageError,
    },

    /// The output directory or a page image could not be written or read back.
    #[error("Failed to access '{}': {source}", path.display())]
    OutputIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Backend errors ────────────────────────────────────────────────────
    /// A backend call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl IngestError {
    /// `true` when the failure happened before anything was written anywhere.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            IngestError::FileNotFound { .. }
                | IngestError::PermissionDenied { .. }
                | IngestError::Metadata { .. }
        )
    }
}

/// Errors returned by a [`crate::store::DocumentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached (DNS, refused connection, TLS, timeout).
    #[error("Could not reach the backend: {0}")]
    Connectivity(String),

    /// The backend rejected the payload (HTTP 400/409/422).
    #[error("Backend rejected the request ({status}): {body}")]
    Validation { status: StatusCode, body: String },

    /// The table or row does not exist (HTTP 404).
    #[error("Backend resource not found: {body}")]
    NotFound { body: String },

    /// The access key was refused (HTTP 401/403).
    #[error("Backend refused the access key ({status}): {body}")]
    Unauthorized { status: StatusCode, body: String },

    /// Any other non-success status.
    #[error("Unexpected backend response ({status}): {body}")]
    Server { status: StatusCode, body: String },

    /// The response arrived but was not what we expected.
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    /// Endpoint URL or key missing or malformed.
    #[error("Backend configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::NOT_FOUND => StoreError::NotFound { body },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                StoreError::Unauthorized { status, body }
            }
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                StoreError::Validation { status, body }
            }
            _ => StoreError::Server { status, body },
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::InvalidResponse(e.to_string())
        } else if e.is_builder() {
            StoreError::Configuration(e.to_string())
        } else {
            StoreError::Connectivity(e.to_string())
        }
    }
}
