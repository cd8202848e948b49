//! Document ingestion: one PDF in, one document row and N page rows out.
//!
//! [`DocumentIngestor`] holds the backend store, the rasterizer and the
//! configuration; nothing is global. An ingestion runs strictly in order:
//!
//! ```text
//! check path ─▶ stat ─▶ mkdir output ─▶ open PDF ─▶ annotations
//!     ─▶ insert document ─▶ for each page: render ─▶ JPEG ─▶ base64 ─▶ insert page
//! ```
//!
//! Nothing is rolled back. A failure on page N leaves the document row and
//! pages 1..N−1 in the backend and their JPEGs on disk.

use crate::config::IngestConfig;
use crate::error::{IngestError, StoreError};
use crate::metadata::{self, FileMetadata};
use crate::pipeline::render::{PageRasterizer, RasterDocument};
use crate::pipeline::{encode, input};
use crate::progress::{IngestProgressCallback, NoopProgressCallback};
use crate::prompts::{AnnotationSource, DocumentAnnotations};
use crate::store::{DocumentId, DocumentStore, DocumentSummary, NewDocument, NewPage};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const RULE_WIDTH: usize = 80;

/// What a successful ingestion produced.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub document_id: DocumentId,
    pub page_count: usize,
    /// JPEGs written to the output directory, in page order.
    pub image_paths: Vec<PathBuf>,
    pub file: FileMetadata,
    pub annotations: DocumentAnnotations,
}

/// Sequences metadata extraction, rendering and backend writes for a document.
pub struct DocumentIngestor {
    store: Arc<dyn DocumentStore>,
    rasterizer: Box<dyn PageRasterizer>,
    config: IngestConfig,
}

impl DocumentIngestor {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        rasterizer: Box<dyn PageRasterizer>,
        config: IngestConfig,
    ) -> Self {
        Self {
            store,
            rasterizer,
            config,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    fn progress(&self) -> &dyn IngestProgressCallback {
        match self.config.progress {
            Some(ref cb) => cb.as_ref(),
            None => &NoopProgressCallback,
        }
    }

    /// Ingest `path`, reporting the outcome through the progress callback.
    ///
    /// Returns `true` when the document and all of its pages were stored.
    /// Errors never escape: they go to
    /// [`IngestProgressCallback::on_ingest_failed`] and yield `false`.
    pub async fn process(
        &self,
        path: impl AsRef<Path>,
        annotations: &mut dyn AnnotationSource,
    ) -> bool {
        match self.ingest(path, annotations).await {
            Ok(outcome) => {
                self.progress()
                    .on_ingest_complete(&outcome.document_id, outcome.page_count);
                true
            }
            Err(e) => {
                warn!("Ingestion failed: {}", e);
                self.progress().on_ingest_failed(&e);
                false
            }
        }
    }

    /// Ingest `path` and return what was stored.
    ///
    /// # Errors
    /// - [`IngestError::FileNotFound`] / [`IngestError::PermissionDenied`]
    ///   before anything is written
    /// - rendering errors when the PDF cannot be opened (no rows written)
    /// - [`IngestError::Store`], rendering or output errors during the page
    ///   loop (document row and earlier pages stay stored)
    pub async fn ingest(
        &self,
        path: impl AsRef<Path>,
        annotations: &mut dyn AnnotationSource,
    ) -> Result<IngestOutcome, IngestError> {
        let total_start = Instant::now();
        let path = input::resolve_local(path.as_ref())?;
        info!("Starting ingestion: {}", path.display());

        let file = metadata::file_info(&path).map_err(|source| IngestError::Metadata {
            path: path.clone(),
            source,
        })?;
        debug!(
            "{}: {} KiB, type {}, created {}, modified {}",
            file.filename, file.size_kb, file.file_type, file.created_at, file.last_modified
        );

        let output_dir = &self.config.output_dir;
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| IngestError::OutputIo {
                path: output_dir.clone(),
                source,
            })?;

        let document = self
            .rasterizer
            .open(&path, self.config.password.as_deref())?;
        let page_count = document.page_count();

        let annotations = annotations.collect().map_err(IngestError::Prompt)?;
        self.progress().on_ingest_start(&path, page_count);

        let result = self
            .store_document(&path, &file, &annotations, document.as_ref())
            .await;
        drop(document);

        let (document_id, image_paths) = result?;
        info!(
            "Stored document {} ({} pages) in {}ms",
            document_id,
            page_count,
            total_start.elapsed().as_millis()
        );

        Ok(IngestOutcome {
            document_id,
            page_count,
            image_paths,
            file,
            annotations,
        })
    }

    /// Insert the document row, then render and insert every page in order.
    async fn store_document(
        &self,
        path: &Path,
        file: &FileMetadata,
        annotations: &DocumentAnnotations,
        document: &dyn RasterDocument,
    ) -> Result<(DocumentId, Vec<PathBuf>), IngestError> {
        let page_count = document.page_count();
        let record = NewDocument::assemble(file, annotations, page_count);
        let document_id = self.store.insert_document(&record).await?;
        debug!("{} assigned id {}", self.store.name(), document_id);
        self.progress().on_document_created(&document_id);

        let mut image_paths = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let page_num = index + 1;

            let image = document.render_page(index)?;
            let image_path = self
                .config
                .output_dir
                .join(input::page_image_name(path, page_num));
            let page_image =
                encode::save_and_encode(&image, &image_path, self.config.jpeg_quality, page_num)
                    .await?;

            self.store
                .insert_page(&NewPage {
                    document_id: document_id.clone(),
                    page_number: page_num,
                    page_image,
                })
                .await?;

            self.progress().on_page_stored(page_num, page_count);
            image_paths.push(image_path);
        }

        Ok((document_id, image_paths))
    }

    /// Fetch every stored document.
    pub async fn fetch_documents(&self) -> Result<Vec<DocumentSummary>, StoreError> {
        self.store.list_documents().await
    }

    /// Print a summary of every stored document to `out`.
    ///
    /// Backend failures are written to `out` as well; only write errors on
    /// `out` itself are returned.
    pub async fn list_documents<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self.fetch_documents().await {
            Ok(rows) => out.write_all(format_document_list(&rows).as_bytes()),
            Err(e) => {
                warn!("Listing documents failed: {}", e);
                writeln!(out, "Error listing documents: {e}")
            }
        }
    }
}

/// Render rows the way `list_documents` prints them.
pub fn format_document_list(rows: &[DocumentSummary]) -> String {
    if rows.is_empty() {
        return "\nNo documents found in the database.\n".to_string();
    }

    let rule = "-".repeat(RULE_WIDTH);
    let mut out = String::from("\nDocuments in the database:\n");
    out.push_str(&rule);
    out.push('\n');
    for row in rows {
        out.push_str(&format!("ID: {}\n", row.id));
        out.push_str(&format!("Title: {}\n", row.title.as_deref().unwrap_or("-")));
        out.push_str(&format!("Author: {}\n", row.author.as_deref().unwrap_or("-")));
        match row.page_count {
            Some(n) => out.push_str(&format!("Pages: {n}\n")),
            None => out.push_str("Pages: -\n"),
        }
        out.push_str(&rule);
        out.push('\n');
    }
    out
}
