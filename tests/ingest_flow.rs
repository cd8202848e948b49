//! Ingestion flow tests against a synthetic rasterizer, with either an
//! in-memory backend or `SupabaseStore` talking to a mock PostgREST server.
//! No pdfium needed.
//!
//! Set `RUST_LOG=docpages=debug` to see the library's logs in test output.
//!
//! Run with:
//!   cargo test --test ingest_flow

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use docpages::{
    DocumentAnnotations, DocumentId, DocumentIngestor, DocumentStore, DocumentSummary,
    IngestConfig, IngestError, IngestProgressCallback, NewDocument, NewPage, PageRasterizer,
    RasterDocument, StoreError, SupabaseStore,
};
use httpmock::prelude::*;
use image::{DynamicImage, Rgba, RgbaImage};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

// ── In-memory backend ────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryStore {
    documents: Mutex<Vec<NewDocument>>,
    pages: Mutex<Vec<NewPage>>,
    listing: Mutex<Option<Result<Vec<DocumentSummary>, String>>>,
    /// Reject the insert of this 1-indexed page number.
    fail_page: Option<usize>,
}

impl MemoryStore {
    fn failing_on_page(page: usize) -> Self {
        Self {
            fail_page: Some(page),
            ..Default::default()
        }
    }

    fn documents(&self) -> Vec<NewDocument> {
        self.documents.lock().unwrap().clone()
    }

    fn pages(&self) -> Vec<NewPage> {
        self.pages.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_document(&self, document: &NewDocument) -> Result<DocumentId, StoreError> {
        let mut docs = self.documents.lock().unwrap();
        docs.push(document.clone());
        Ok(DocumentId::from(100 + docs.len() as i64))
    }

    async fn insert_page(&self, page: &NewPage) -> Result<(), StoreError> {
        if self.fail_page == Some(page.page_number) {
            return Err(StoreError::Server {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "disk full".into(),
            });
        }
        self.pages.lock().unwrap().push(page.clone());
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, StoreError> {
        match self.listing.lock().unwrap().clone() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(msg)) => Err(StoreError::Connectivity(msg)),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ── Synthetic rasterizer ─────────────────────────────────────────────────────

struct FakeRasterizer {
    pages: usize,
    fail_open: bool,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl FakeRasterizer {
    fn with_pages(pages: usize) -> Self {
        Self {
            pages,
            fail_open: false,
            opened: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl PageRasterizer for FakeRasterizer {
    fn open<'a>(
        &'a self,
        path: &Path,
        _password: Option<&'a str>,
    ) -> Result<Box<dyn RasterDocument + 'a>, IngestError> {
        if self.fail_open {
            return Err(IngestError::CorruptPdf {
                path: path.to_path_buf(),
                detail: "not a PDF".into(),
            });
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeDocument {
            pages: self.pages,
            released: Arc::clone(&self.released),
        }))
    }
}

struct FakeDocument {
    pages: usize,
    released: Arc<AtomicUsize>,
}

impl RasterDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn render_page(&self, index: usize) -> Result<DynamicImage, IngestError> {
        // Shade varies per page so every JPEG differs.
        let shade = (index * 40 % 256) as u8;
        let img = RgbaImage::from_pixel(24, 32, Rgba([shade, 80, 160, 255]));
        Ok(DynamicImage::ImageRgba8(img))
    }
}

impl Drop for FakeDocument {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Recording progress callback ──────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    stored: Mutex<Vec<(usize, usize)>>,
    completed: AtomicUsize,
    failed: Mutex<Vec<String>>,
}

impl IngestProgressCallback for Recorder {
    fn on_page_stored(&self, page_num: usize, total_pages: usize) {
        self.stored.lock().unwrap().push((page_num, total_pages));
    }

    fn on_ingest_complete(&self, _document_id: &DocumentId, _total_pages: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_ingest_failed(&self, error: &IngestError) {
        self.failed.lock().unwrap().push(error.to_string());
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Route library logs to the test harness; filtered by `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Fixture {
    dir: TempDir,
    source: PathBuf,
    output: PathBuf,
}

fn fixture() -> Fixture {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("report.pdf");
    std::fs::write(&source, vec![b'%'; 3000]).unwrap();
    let output = dir.path().join("output");
    Fixture {
        dir,
        source,
        output,
    }
}

fn ingestor(
    store: Arc<MemoryStore>,
    rasterizer: FakeRasterizer,
    output: &Path,
    recorder: Arc<Recorder>,
) -> DocumentIngestor {
    let config = IngestConfig::builder()
        .output_dir(output)
        .progress(recorder)
        .build()
        .unwrap();
    DocumentIngestor::new(store, Box::new(rasterizer), config)
}

fn annotations(version: &str) -> DocumentAnnotations {
    DocumentAnnotations::new("Ada Lovelace", "Engine Notes", "Notes on the engine", version)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stores_one_row_per_page_in_order() {
    let fx = fixture();
    let store = Arc::new(MemoryStore::default());
    let recorder = Arc::new(Recorder::default());
    let rasterizer = FakeRasterizer::with_pages(3);
    let released = Arc::clone(&rasterizer.released);
    let ing = ingestor(store.clone(), rasterizer, &fx.output, recorder.clone());

    let outcome = ing
        .ingest(&fx.source, &mut annotations("2.1"))
        .await
        .expect("ingestion should succeed");

    let docs = store.documents();
    assert_eq!(docs.len(), 1);
    let doc = &docs[0];
    assert_eq!(doc.filename, "report.pdf");
    assert_eq!(doc.file_extension, "pdf");
    assert_eq!(doc.file_type.as_str(), "PDF");
    assert_eq!(doc.size_kb, 2);
    assert_eq!(doc.author, "Ada Lovelace");
    assert_eq!(doc.title, "Engine Notes");
    assert_eq!(doc.description, "Notes on the engine");
    assert_eq!(doc.version, "2.1");
    assert_eq!(doc.page_count, 3);

    let pages = store.pages();
    let numbers: Vec<usize> = pages.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert!(pages.iter().all(|p| p.document_id == outcome.document_id));

    assert_eq!(outcome.page_count, 3);
    assert_eq!(
        *recorder.stored.lock().unwrap(),
        vec![(1, 3), (2, 3), (3, 3)]
    );
    assert_eq!(released.load(Ordering::SeqCst), 1, "document handle released");
}

#[tokio::test]
async fn page_images_match_files_on_disk() {
    let fx = fixture();
    let store = Arc::new(MemoryStore::default());
    let ing = ingestor(
        store.clone(),
        FakeRasterizer::with_pages(2),
        &fx.output,
        Arc::new(Recorder::default()),
    );

    let outcome = ing.ingest(&fx.source, &mut annotations("")).await.unwrap();

    assert_eq!(
        outcome.image_paths,
        vec![fx.output.join("report-p1.jpg"), fx.output.join("report-p2.jpg")]
    );
    for (page, path) in store.pages().iter().zip(&outcome.image_paths) {
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF], "JPEG magic");
        assert_eq!(STANDARD.decode(&page.page_image).unwrap(), bytes);
    }
}

#[tokio::test]
async fn empty_version_defaults() {
    let fx = fixture();
    let store = Arc::new(MemoryStore::default());
    let ing = ingestor(
        store.clone(),
        FakeRasterizer::with_pages(1),
        &fx.output,
        Arc::new(Recorder::default()),
    );

    ing.ingest(&fx.source, &mut annotations("")).await.unwrap();

    assert_eq!(store.documents()[0].version, "1.0");
}

#[tokio::test]
async fn missing_file_writes_nothing() {
    let fx = fixture();
    let store = Arc::new(MemoryStore::default());
    let recorder = Arc::new(Recorder::default());
    let rasterizer = FakeRasterizer::with_pages(2);
    let opened = Arc::clone(&rasterizer.opened);
    let ing = ingestor(store.clone(), rasterizer, &fx.output, recorder.clone());

    let missing = fx.dir.path().join("nope.pdf");
    let ok = ing.process(&missing, &mut annotations("")).await;

    assert!(!ok);
    assert!(store.documents().is_empty());
    assert!(store.pages().is_empty());
    assert!(!fx.output.exists(), "output directory must not be created");
    assert_eq!(opened.load(Ordering::SeqCst), 0);

    let failed = recorder.failed.lock().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0], format!("File {} not found!", missing.display()));
}

#[tokio::test]
async fn missing_file_is_an_input_error() {
    let fx = fixture();
    let ing = ingestor(
        Arc::new(MemoryStore::default()),
        FakeRasterizer::with_pages(1),
        &fx.output,
        Arc::new(Recorder::default()),
    );

    let err = ing
        .ingest(fx.dir.path().join("gone.pdf"), &mut annotations(""))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }), "got: {err:?}");
    assert!(err.is_input_error());
}

#[tokio::test]
async fn failure_mid_document_keeps_earlier_rows() {
    let fx = fixture();
    let store = Arc::new(MemoryStore::failing_on_page(3));
    let recorder = Arc::new(Recorder::default());
    let rasterizer = FakeRasterizer::with_pages(5);
    let released = Arc::clone(&rasterizer.released);
    let ing = ingestor(store.clone(), rasterizer, &fx.output, recorder.clone());

    let ok = ing.process(&fx.source, &mut annotations("")).await;

    assert!(!ok);
    assert_eq!(store.documents().len(), 1, "no rollback of the document row");
    let numbers: Vec<usize> = store.pages().iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(released.load(Ordering::SeqCst), 1, "handle released on failure");
    assert_eq!(recorder.completed.load(Ordering::SeqCst), 0);

    let failed = recorder.failed.lock().unwrap();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].contains("disk full"), "got: {}", failed[0]);
}

#[tokio::test]
async fn open_failure_writes_nothing() {
    let fx = fixture();
    let store = Arc::new(MemoryStore::default());
    let recorder = Arc::new(Recorder::default());
    let mut rasterizer = FakeRasterizer::with_pages(1);
    rasterizer.fail_open = true;
    let ing = ingestor(store.clone(), rasterizer, &fx.output, recorder.clone());

    let ok = ing.process(&fx.source, &mut annotations("")).await;

    assert!(!ok);
    assert!(store.documents().is_empty());
    assert!(store.pages().is_empty());
    let failed = recorder.failed.lock().unwrap();
    assert!(failed[0].contains("not a PDF"), "got: {}", failed[0]);
}

#[tokio::test]
async fn zero_page_document_succeeds() {
    let fx = fixture();
    let store = Arc::new(MemoryStore::default());
    let recorder = Arc::new(Recorder::default());
    let ing = ingestor(
        store.clone(),
        FakeRasterizer::with_pages(0),
        &fx.output,
        recorder.clone(),
    );

    let ok = ing.process(&fx.source, &mut annotations("")).await;

    assert!(ok);
    assert_eq!(store.documents().len(), 1);
    assert_eq!(store.documents()[0].page_count, 0);
    assert!(store.pages().is_empty());
    assert_eq!(recorder.completed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn consecutive_uploads_get_distinct_ids() {
    let fx = fixture();
    let store = Arc::new(MemoryStore::default());
    let ing = ingestor(
        store.clone(),
        FakeRasterizer::with_pages(1),
        &fx.output,
        Arc::new(Recorder::default()),
    );

    let first = ing.ingest(&fx.source, &mut annotations("")).await.unwrap();
    let second = ing.ingest(&fx.source, &mut annotations("")).await.unwrap();

    assert_ne!(first.document_id, second.document_id);
    assert_eq!(store.documents().len(), 2);
    assert_eq!(store.pages().len(), 2);
}

#[tokio::test]
async fn listing_prints_rows_or_empty_message() {
    let fx = fixture();
    let store = Arc::new(MemoryStore::default());
    let ing = ingestor(
        store.clone(),
        FakeRasterizer::with_pages(1),
        &fx.output,
        Arc::new(Recorder::default()),
    );

    let mut out = Vec::new();
    ing.list_documents(&mut out).await.unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "\nNo documents found in the database.\n"
    );

    *store.listing.lock().unwrap() = Some(Ok(vec![DocumentSummary {
        id: DocumentId::from(7),
        title: Some("Engine Notes".into()),
        author: Some("Ada Lovelace".into()),
        page_count: Some(3),
    }]));
    let mut out = Vec::new();
    ing.list_documents(&mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("\nDocuments in the database:\n"));
    assert!(text.contains("ID: 7\nTitle: Engine Notes\nAuthor: Ada Lovelace\nPages: 3\n"));
}

#[tokio::test]
async fn listing_failure_is_reported_not_returned() {
    let fx = fixture();
    let store = Arc::new(MemoryStore::default());
    *store.listing.lock().unwrap() = Some(Err("connection refused".into()));
    let ing = ingestor(
        store,
        FakeRasterizer::with_pages(1),
        &fx.output,
        Arc::new(Recorder::default()),
    );

    let mut out = Vec::new();
    ing.list_documents(&mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Error listing documents: "), "got: {text}");
    assert!(text.contains("connection refused"));
}

// ── PostgREST wire path ──────────────────────────────────────────────────────

#[tokio::test]
async fn http_page_failure_keeps_document_and_earlier_pages() {
    let fx = fixture();
    let server = MockServer::start_async().await;

    let doc_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/documents")
                .header("apikey", "anon-key")
                .header("prefer", "return=representation")
                .json_body_partial(r#"{ "filename": "report.pdf", "page_count": 4 }"#);
            then.status(201)
                .header("content-type", "application/json")
                .body(r#"[{ "id": 42 }]"#);
        })
        .await;

    let mut stored = Vec::new();
    for page in 1..=2 {
        let body = format!(r#"{{ "document_id": 42, "page_number": {page} }}"#);
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/rest/v1/document_pages")
                    .header("prefer", "return=minimal")
                    .json_body_partial(body);
                then.status(201);
            })
            .await;
        stored.push(mock);
    }
    let failing = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/document_pages")
                .json_body_partial(r#"{ "document_id": 42, "page_number": 3 }"#);
            then.status(500).body("could not extend file");
        })
        .await;
    let never = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/document_pages")
                .json_body_partial(r#"{ "page_number": 4 }"#);
            then.status(201);
        })
        .await;

    let store = SupabaseStore::with_client(reqwest::Client::new(), &server.base_url(), "anon-key")
        .unwrap();
    let recorder = Arc::new(Recorder::default());
    let rasterizer = FakeRasterizer::with_pages(4);
    let released = Arc::clone(&rasterizer.released);
    let config = IngestConfig::builder()
        .output_dir(&fx.output)
        .progress(recorder.clone())
        .build()
        .unwrap();
    let ing = DocumentIngestor::new(Arc::new(store), Box::new(rasterizer), config);

    let ok = ing.process(&fx.source, &mut annotations("")).await;

    assert!(!ok);
    doc_mock.assert_hits_async(1).await;
    for mock in &stored {
        mock.assert_hits_async(1).await;
    }
    failing.assert_hits_async(1).await;
    never.assert_hits_async(0).await;
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert_eq!(*recorder.stored.lock().unwrap(), vec![(1, 4), (2, 4)]);

    let failed = recorder.failed.lock().unwrap();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].contains("could not extend file"), "got: {}", failed[0]);
}
