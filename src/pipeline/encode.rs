//! Image encoding: `DynamicImage` → JPEG file on disk → base64 text.
//!
//! The JPEG written to the output directory is the artefact the backend
//! receives: the bytes are read back from disk after writing and
//! base64-encoded, so the stored page image and the local file are identical.

use crate::error::IngestError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::path::Path;
use tracing::debug;

/// Encode a rendered page as JPEG bytes.
///
/// pdfium hands back RGBA bitmaps; JPEG has no alpha channel, so the image is
/// flattened to RGB first.
pub fn encode_jpeg(
    img: &DynamicImage,
    quality: u8,
    page_num: usize,
) -> Result<Vec<u8>, IngestError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .map_err(|source| IngestError::ImageEncodeFailed {
            page: page_num,
            source,
        })?;
    Ok(buf)
}

/// Write the page JPEG to `path`, then read it back and base64-encode it.
pub async fn save_and_encode(
    img: &DynamicImage,
    path: &Path,
    quality: u8,
    page_num: usize,
) -> Result<String, IngestError> {
    let jpeg = encode_jpeg(img, quality, page_num)?;
    tokio::fs::write(path, &jpeg)
        .await
        .map_err(|source| IngestError::OutputIo {
            path: path.to_path_buf(),
            source,
        })?;

    let on_disk = tokio::fs::read(path)
        .await
        .map_err(|source| IngestError::OutputIo {
            path: path.to_path_buf(),
            source,
        })?;

    let b64 = STANDARD.encode(&on_disk);
    debug!(
        "Saved {} ({} bytes) → {} bytes base64",
        path.display(),
        on_disk.len(),
        b64.len()
    );
    Ok(b64)
}
