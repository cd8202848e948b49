//! PDF rasterisation: open a document and render its pages to `DynamicImage`.
//!
//! [`PageRasterizer`] is the seam between the ingestor and the rendering
//! engine. An opened [`RasterDocument`] is the document handle: it stays
//! alive for the whole page loop and is released when dropped.
//!
//! [`PdfiumRasterizer`] is the production implementation. pdfium is bound on
//! the first `open`, so listing documents works on machines without the
//! library installed.
//!
//! ## Scale and pixel cap
//!
//! Pages are rendered at `dpi / 72` times their point size, then capped so
//! neither edge exceeds `max_rendered_pixels`. At the default 72 DPI a page
//! renders at its natural size.
//!
//! ## Threading
//!
//! Rendering runs inline on the caller's thread, not in `spawn_blocking`:
//! a `PdfDocument` borrows the bound `Pdfium` and is `!Send`, and it must
//! outlive the whole page loop. The binary therefore drives ingestion on a
//! current-thread runtime.

use crate::config::IngestConfig;
use crate::error::IngestError;
use image::DynamicImage;
use once_cell::unsync::OnceCell;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Opens documents for rendering.
pub trait PageRasterizer {
    /// Open `path`, decrypting with `password` when given.
    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Box<dyn RasterDocument + 'a>, IngestError>;
}

/// An open document. Dropping it releases the underlying handle.
pub trait RasterDocument {
    fn page_count(&self) -> usize;

    /// Render the page at 0-based `index`.
    fn render_page(&self, index: usize) -> Result<DynamicImage, IngestError>;
}

/// [`PageRasterizer`] backed by pdfium.
pub struct PdfiumRasterizer {
    library_path: Option<PathBuf>,
    scale: f32,
    max_pixels: u32,
    pdfium: OnceCell<Pdfium>,
}

impl PdfiumRasterizer {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            library_path: None,
            scale: config.render_scale(),
            max_pixels: config.max_rendered_pixels,
            pdfium: OnceCell::new(),
        }
    }

    /// Load pdfium from this file (or from the platform library name inside
    /// this directory) instead of searching the working directory and system
    /// paths.
    pub fn with_library_path(mut self, path: Option<PathBuf>) -> Self {
        self.library_path = path;
        self
    }

    fn pdfium(&self) -> Result<&Pdfium, IngestError> {
        self.pdfium
            .get_or_try_init(|| bind_pdfium(self.library_path.as_deref()))
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Box<dyn RasterDocument + 'a>, IngestError> {
        let pdfium = self.pdfium()?;

        let document = pdfium.load_pdf_from_file(path, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    IngestError::WrongPassword {
                        path: path.to_path_buf(),
                    }
                } else {
                    IngestError::PasswordRequired {
                        path: path.to_path_buf(),
                    }
                }
            } else {
                IngestError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: err_str,
                }
            }
        })?;

        let page_count = document.pages().len() as usize;
        info!("PDF loaded: {} ({} pages)", path.display(), page_count);

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(self.scale)
            .set_maximum_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32);

        Ok(Box::new(PdfiumDocument {
            document,
            render_config,
            page_count,
        }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    render_config: PdfRenderConfig,
    page_count: usize,
}

impl RasterDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn render_page(&self, index: usize) -> Result<DynamicImage, IngestError> {
        let failed = |detail: String| IngestError::RasterisationFailed {
            page: index + 1,
            detail,
        };

        let page_index = u16::try_from(index)
            .map_err(|_| failed(format!("page index {index} exceeds pdfium's range")))?;
        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|e| failed(format!("{:?}", e)))?;

        let bitmap = page
            .render_with_config(&self.render_config)
            .map_err(|e| failed(format!("{:?}", e)))?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

/// Bind to a pdfium library.
///
/// With `library_path`, load exactly that file (or the platform library name
/// inside that directory). Otherwise try the working directory, then the
/// system library search path.
pub fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, IngestError> {
    let bindings = match library_path {
        Some(path) if path.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
        }
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| IngestError::PdfiumBindingFailed(format!("{:?}", e)))?;

    debug!("Bound pdfium library");
    Ok(Pdfium::new(bindings))
}
