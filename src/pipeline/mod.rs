//! Per-page stages of an ingestion.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ store
//! (path)    (pdfium)   (JPEG, base64)
//! ```
//!
//! 1. [`input`]  — confirm the operator's path is a readable file and name
//!    the per-page output files
//! 2. [`render`] — open the PDF and rasterise one page at a time
//! 3. [`encode`] — write each page as JPEG and base64 the bytes read back
//!
//! Storing is done by [`crate::store`]; sequencing by [`crate::ingest`].

pub mod encode;
pub mod input;
pub mod render;
