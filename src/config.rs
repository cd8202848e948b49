//! Configuration types for document ingestion.
//!
//! Two structs, one per collaborator:
//!
//! * [`IngestConfig`] — how pages are rendered and where the JPEGs go. Built
//!   through [`IngestConfigBuilder`] so callers only set what they care about.
//! * [`BackendConfig`] — where the Supabase REST endpoint lives and the key
//!   used to talk to it. Usually read from the environment.

use crate::error::{IngestError, StoreError};
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the backend endpoint URL.
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
/// Environment variable holding the backend access key.
pub const SUPABASE_KEY_ENV: &str = "SUPABASE_KEY";

/// Configuration for rendering and storing a document.
///
/// Built via [`IngestConfig::builder()`] or using [`IngestConfig::default()`].
///
/// # Example
/// ```rust
/// use docpages::IngestConfig;
///
/// let config = IngestConfig::builder()
///     .output_dir("scans")
///     .dpi(144)
///     .jpeg_quality(90)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 144);
/// ```
#[derive(Clone)]
pub struct IngestConfig {
    /// Directory receiving `<stem>-p<N>.jpg` files. Default: `output`.
    ///
    /// Relative paths resolve against the working directory. Files written
    /// here are never removed.
    pub output_dir: PathBuf,

    /// Rendering DPI. Range: 36–400. Default: 72.
    ///
    /// 72 DPI renders a page at its natural point size (a US-Letter page
    /// becomes 612 × 792 px).
    pub dpi: u32,

    /// Maximum rendered width or height in pixels. Default: 4000.
    pub max_rendered_pixels: u32,

    /// JPEG quality, 1–100. Default: 95.
    pub jpeg_quality: u8,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Receives per-document and per-page events.
    pub progress: Option<ProgressCallback>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            dpi: 72,
            max_rendered_pixels: 4000,
            jpeg_quality: 95,
            password: None,
            progress: None,
        }
    }
}

impl fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestConfig")
            .field("output_dir", &self.output_dir)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress",
                &self.progress.as_ref().map(|_| "<dyn IngestProgressCallback>"),
            )
            .finish()
    }
}

impl IngestConfig {
    /// Create a new builder for `IngestConfig`.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder {
            config: Self::default(),
        }
    }

    /// Scale factor applied to the page's point size when rendering.
    pub fn render_scale(&self) -> f32 {
        self.dpi as f32 / 72.0
    }
}

/// Builder for [`IngestConfig`].
#[derive(Debug)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(36, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress(mut self, callback: ProgressCallback) -> Self {
        self.config.progress = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<IngestConfig, IngestError> {
        let c = &self.config;
        if c.output_dir.as_os_str().is_empty() {
            return Err(IngestError::InvalidConfig(
                "output directory must not be empty".into(),
            ));
        }
        if c.dpi < 36 || c.dpi > 400 {
            return Err(IngestError::InvalidConfig(format!(
                "DPI must be 36–400, got {}",
                c.dpi
            )));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(IngestError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        Ok(self.config)
    }
}

/// Connection settings for the Supabase REST endpoint.
#[derive(Clone)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`.
    pub url: String,
    /// Anon or service-role key, sent as `apikey` and bearer token.
    pub api_key: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            request_timeout_secs: None,
        }
    }

    /// Read `SUPABASE_URL` and `SUPABASE_KEY` from the process environment.
    ///
    /// Load a `.env` file beforehand (the binary does this with `dotenvy`)
    /// if the values live there.
    pub fn from_env() -> Result<Self, StoreError> {
        Ok(Self::new(
            load_env(SUPABASE_URL_ENV)?,
            load_env(SUPABASE_KEY_ENV)?,
        ))
    }

    pub fn with_request_timeout(mut self, secs: Option<u64>) -> Self {
        self.request_timeout_secs = secs;
        self
    }
}

fn load_env(key: &str) -> Result<String, StoreError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(StoreError::Configuration(format!("{key} is not set"))),
    }
}
