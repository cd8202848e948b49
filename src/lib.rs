//! # docpages
//!
//! Rasterise PDF pages to JPEG and store each document, with one base64 page
//! image per page, in a Supabase (PostgREST) backend.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     check the path exists and is readable
//!  ├─ 2. Metadata  filename, extension, type label, size in KiB, timestamps
//!  ├─ 3. Open      load the document via pdfium, count pages
//!  ├─ 4. Annotate  author / title / description / version from the operator
//!  ├─ 5. Document  insert into `documents`, receive the id
//!  └─ 6. Pages     render → <stem>-p<N>.jpg → base64 → insert into `document_pages`
//! ```
//!
//! Pages are handled one at a time, in order. There are no retries and no
//! rollback: a failure on page N leaves the document row and pages 1..N−1.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docpages::{
//!     BackendConfig, DocumentAnnotations, DocumentIngestor, IngestConfig, PdfiumRasterizer,
//!     SupabaseStore,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SupabaseStore::new(&BackendConfig::from_env()?)?;
//!     let config = IngestConfig::default();
//!     let rasterizer = PdfiumRasterizer::new(&config);
//!     let ingestor = DocumentIngestor::new(Arc::new(store), Box::new(rasterizer), config);
//!
//!     let mut details = DocumentAnnotations::new("Ada", "Notes", "Engine notes", "");
//!     let outcome = ingestor.ingest("notes.pdf", &mut details).await?;
//!     println!("stored document {} with {} pages", outcome.document_id, outcome.page_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docpages` binary (clap + anyhow + dotenvy + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod ingest;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BackendConfig, IngestConfig, IngestConfigBuilder};
pub use error::{IngestError, StoreError};
pub use ingest::{format_document_list, DocumentIngestor, IngestOutcome};
pub use metadata::{file_info, FileMetadata, FileType};
pub use pipeline::render::{PageRasterizer, PdfiumRasterizer, RasterDocument};
pub use progress::{IngestProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::{AnnotationSource, ConsolePrompter, DocumentAnnotations, DEFAULT_VERSION};
pub use store::{
    DocumentId, DocumentStore, DocumentSummary, NewDocument, NewPage, SupabaseStore,
};
