//! Persistence of documents and page images.
//!
//! The ingestor only ever *emits inserts* and one full-table read; the rows
//! live in a remote backend it does not own. [`DocumentStore`] is the seam:
//! [`supabase::SupabaseStore`] talks to a Supabase/PostgREST endpoint, tests
//! substitute an in-memory implementation.
//!
//! ## Schema
//!
//! ```text
//! documents                      document_pages
//! ─────────                      ──────────────
//! id            (backend key) ◀── document_id
//! filename                       page_number   1-based
//! file_extension                 page_image    base64 JPEG
//! file_type
//! size_kb
//! author / title / description
//! page_count
//! version
//! ```

pub mod supabase;

use crate::error::StoreError;
use crate::metadata::{FileMetadata, FileType};
use crate::prompts::DocumentAnnotations;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use supabase::SupabaseStore;

/// Table holding one row per ingested document.
pub const DOCUMENTS_TABLE: &str = "documents";
/// Table holding one row per rendered page.
pub const PAGES_TABLE: &str = "document_pages";

/// Identifier the backend assigned to a document row.
///
/// Kept as raw JSON so both integer and UUID primary keys round-trip
/// unchanged into `document_pages.document_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub serde_json::Value);

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        DocumentId(serde_json::Value::from(id))
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        DocumentId(serde_json::Value::from(id))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// Insert payload for the `documents` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDocument {
    pub filename: String,
    pub file_extension: String,
    pub file_type: FileType,
    pub size_kb: u64,
    pub author: String,
    pub title: String,
    pub description: String,
    pub page_count: usize,
    pub version: String,
}

impl NewDocument {
    /// Combine what the filesystem and the operator know about a document.
    pub fn assemble(
        info: &FileMetadata,
        annotations: &DocumentAnnotations,
        page_count: usize,
    ) -> Self {
        Self {
            filename: info.filename.clone(),
            file_extension: info.file_extension.clone(),
            file_type: info.file_type,
            size_kb: info.size_kb,
            author: annotations.author.clone(),
            title: annotations.title.clone(),
            description: annotations.description.clone(),
            page_count,
            version: annotations.version.clone(),
        }
    }
}

/// Insert payload for the `document_pages` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPage {
    pub document_id: DocumentId,
    /// 1-based.
    pub page_number: usize,
    /// Base64 of the JPEG file bytes.
    pub page_image: String,
}

/// The columns of a `documents` row shown in listings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub page_count: Option<i64>,
}

/// Backend holding documents and their pages.
///
/// Every call is attempted once; implementations do not retry.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document row and return the identifier the backend assigned.
    async fn insert_document(&self, document: &NewDocument) -> Result<DocumentId, StoreError>;

    /// Insert one page row.
    async fn insert_page(&self, page: &NewPage) -> Result<(), StoreError>;

    /// Fetch every document row, in backend order, in a single call.
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, StoreError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
