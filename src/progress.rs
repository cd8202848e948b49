//! Progress-callback trait for ingestion events.
//!
//! Inject an [`Arc<dyn IngestProgressCallback>`] via
//! [`crate::config::IngestConfigBuilder::progress`] to hear about each stored
//! page and about the final outcome. The library itself never prints; the
//! binary turns these events into console lines and a progress bar.
//!
//! # Example
//!
//! ```rust
//! use docpages::{IngestConfig, IngestProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter(AtomicUsize);
//!
//! impl IngestProgressCallback for PageCounter {
//!     fn on_page_stored(&self, page_num: usize, total_pages: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Processed page {page_num} of {total_pages}");
//!     }
//! }
//!
//! let config = IngestConfig::builder()
//!     .progress(Arc::new(PageCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::IngestError;
use crate::store::DocumentId;
use std::path::Path;
use std::sync::Arc;

/// Called by the ingestor as a document moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait IngestProgressCallback: Send + Sync {
    /// Called once the document is open and annotated, before any write.
    fn on_ingest_start(&self, path: &Path, total_pages: usize) {
        let _ = (path, total_pages);
    }

    /// Called after the document row was accepted by the backend.
    fn on_document_created(&self, document_id: &DocumentId) {
        let _ = document_id;
    }

    /// Called after a page image was written to disk and its row inserted.
    ///
    /// `page_num` is 1-indexed.
    fn on_page_stored(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called once every page has been stored.
    fn on_ingest_complete(&self, document_id: &DocumentId, total_pages: usize) {
        let _ = (document_id, total_pages);
    }

    /// Called when the ingestion stops on an error.
    fn on_ingest_failed(&self, error: &IngestError) {
        let _ = error;
    }
}

/// Used when no callback is configured.
pub struct NoopProgressCallback;

impl IngestProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::IngestConfig`].
pub type ProgressCallback = Arc<dyn IngestProgressCallback>;
