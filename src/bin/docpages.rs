//! CLI binary for docpages.
//!
//! An interactive menu over the library crate: upload a PDF, list stored
//! documents, or exit. Settings come from the environment (a `.env` file is
//! loaded first) and may be overridden with flags.

use anyhow::{Context, Result};
use clap::Parser;
use docpages::{
    BackendConfig, ConsolePrompter, DocumentId, DocumentIngestor, IngestConfig, IngestError,
    IngestProgressCallback, PdfiumRasterizer, ProgressCallback, SupabaseStore,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Console progress callback ────────────────────────────────────────────────

/// Prints the per-page and final messages, with an indicatif bar underneath
/// while pages are uploading.
struct CliProgressCallback {
    bar: Mutex<Option<ProgressBar>>,
    show_bar: bool,
    color: bool,
}

impl CliProgressCallback {
    fn new(show_bar: bool, color: bool) -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
            show_bar,
            color,
        })
    }

    fn paint(&self, s: &str, f: fn(&str) -> String) -> String {
        if self.color {
            f(s)
        } else {
            s.to_string()
        }
    }

    /// Print above the bar when one is drawn, plainly otherwise.
    fn line(&self, msg: String) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref().filter(|b| !b.is_hidden()) {
                bar.println(msg);
                return;
            }
        }
        println!("{msg}");
    }

    fn clear_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl IngestProgressCallback for CliProgressCallback {
    fn on_ingest_start(&self, path: &Path, total_pages: usize) {
        if !self.show_bar || total_pages == 0 {
            return;
        }
        let bar = ProgressBar::new(total_pages as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        bar.set_prefix(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Uploading".into()),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_page_stored(&self, page_num: usize, total_pages: usize) {
        self.line(format!("Processed page {page_num} of {total_pages}"));
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                bar.inc(1);
            }
        }
    }

    fn on_ingest_complete(&self, document_id: &DocumentId, _total_pages: usize) {
        self.clear_bar();
        println!(
            "\n{} Document ID: {}",
            self.paint("Document processed successfully!", green),
            self.paint(&document_id.to_string(), bold)
        );
    }

    fn on_ingest_failed(&self, error: &IngestError) {
        self.clear_bar();
        let msg = match error {
            IngestError::FileNotFound { .. } => format!("Error: {error}"),
            other => format!("Error processing document: {other}"),
        };
        println!("{}", self.paint(&msg, red));
    }
}

const AFTER_HELP: &str = r#"MENU:
  1  Upload new document   asks for a PDF path, then author, title,
                           description and version (Enter keeps 1.0)
  2  List all documents
  3  Exit

Each page is saved as <output-dir>/<stem>-p<N>.jpg and uploaded as base64
to the `document_pages` table; the document itself goes to `documents`.

ENVIRONMENT VARIABLES (a .env file in the working directory is loaded first):
  SUPABASE_URL               Project URL, e.g. https://abcd.supabase.co
  SUPABASE_KEY               Project API key
  DOCPAGES_OUTPUT_DIR        Directory for page JPEGs (default: output)
  DOCPAGES_DPI               Render resolution (default: 72)
  DOCPAGES_MAX_PIXELS        Cap on rendered width/height (default: 4000)
  DOCPAGES_JPEG_QUALITY      JPEG quality 1-100 (default: 95)
  DOCPAGES_PDF_PASSWORD      Password for encrypted PDFs
  DOCPAGES_REQUEST_TIMEOUT   Backend request timeout in seconds (default: none)
  PDFIUM_LIB_PATH            Path to libpdfium (file or directory)
  RUST_LOG                   Log filter, e.g. docpages=debug
"#;

/// Store PDF documents and their page images in Supabase.
#[derive(Parser, Debug)]
#[command(
    name = "docpages",
    version,
    about = "Store PDF documents and their page images in Supabase",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Supabase project URL.
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    /// Supabase API key.
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    /// Directory receiving the per-page JPEG files.
    #[arg(long, env = "DOCPAGES_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Rendering DPI (36–400).
    #[arg(long, env = "DOCPAGES_DPI", default_value_t = 72,
          value_parser = clap::value_parser!(u32).range(36..=400))]
    dpi: u32,

    /// Cap on rendered width/height in pixels.
    #[arg(long, env = "DOCPAGES_MAX_PIXELS", default_value_t = 4000)]
    max_pixels: u32,

    /// JPEG quality (1–100).
    #[arg(long, env = "DOCPAGES_JPEG_QUALITY", default_value_t = 95,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DOCPAGES_PDF_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Backend request timeout in seconds. Unset waits indefinitely.
    #[arg(long, env = "DOCPAGES_REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// Path to the pdfium shared library (or a directory containing it).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Disable the upload progress bar.
    #[arg(long, env = "DOCPAGES_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs on stderr.
    #[arg(short, long, env = "DOCPAGES_VERBOSE")]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads `env = ...` fallbacks.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library logs stay quiet by default so they do not interleave with the
    // menu; the console messages come from CliProgressCallback.
    let filter = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Backend client ───────────────────────────────────────────────────
    let backend = build_backend_config(&cli)?;
    let store = SupabaseStore::new(&backend).context("Failed to create the Supabase client")?;

    // ── Ingestor ─────────────────────────────────────────────────────────
    let color = std::env::var_os("NO_COLOR").is_none();
    let progress = CliProgressCallback::new(!cli.no_progress, color);
    let config = build_config(&cli, progress)?;
    let rasterizer = PdfiumRasterizer::new(&config).with_library_path(cli.pdfium_lib.clone());
    let ingestor = DocumentIngestor::new(Arc::new(store), Box::new(rasterizer), config);

    run_menu(&ingestor).await
}

/// Main menu loop. Returns when the operator picks Exit or stdin closes.
async fn run_menu(ingestor: &DocumentIngestor) -> Result<()> {
    let mut prompter = ConsolePrompter::stdio();

    loop {
        let menu = "\nDocument Management System\n\
                    1. Upload new document\n\
                    2. List all documents\n\
                    3. Exit\n\
                    Select an option (1-3): ";
        let Some(choice) = prompter.ask(menu).context("Failed to read menu choice")? else {
            println!();
            break;
        };

        match choice.trim() {
            "1" => {
                let Some(path) = prompter
                    .ask("\nPlease enter the path to your document: ")
                    .context("Failed to read document path")?
                else {
                    println!();
                    break;
                };
                ingestor.process(path.trim(), &mut prompter).await;
            }
            "2" => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                ingestor
                    .list_documents(&mut handle)
                    .await
                    .context("Failed to write document list")?;
                handle.flush().ok();
            }
            "3" => {
                println!("\nExiting the program. Goodbye!");
                break;
            }
            _ => println!("\nInvalid option. Please try again."),
        }
    }

    Ok(())
}

fn build_backend_config(cli: &Cli) -> Result<BackendConfig> {
    let url = cli
        .supabase_url
        .clone()
        .context("SUPABASE_URL is not set (environment, .env file or --supabase-url)")?;
    let key = cli
        .supabase_key
        .clone()
        .context("SUPABASE_KEY is not set (environment, .env file or --supabase-key)")?;
    Ok(BackendConfig::new(url, key).with_request_timeout(cli.request_timeout))
}

/// Map CLI args to `IngestConfig`.
fn build_config(cli: &Cli, progress: Arc<CliProgressCallback>) -> Result<IngestConfig> {
    let mut builder = IngestConfig::builder()
        .output_dir(&cli.output_dir)
        .dpi(cli.dpi)
        .max_rendered_pixels(cli.max_pixels)
        .jpeg_quality(cli.jpeg_quality)
        .progress(progress as ProgressCallback);

    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }

    builder.build().context("Invalid configuration")
}
