//! HTTP client for a Supabase project's PostgREST endpoint.
//!
//! Rows are written with `POST {url}/rest/v1/{table}` and read with
//! `GET {url}/rest/v1/{table}?select=*`. Both the `apikey` header and a bearer
//! token carry the project key, which is what Supabase's gateway expects.

use crate::config::BackendConfig;
use crate::error::StoreError;
use crate::store::{
    DocumentId, DocumentStore, DocumentSummary, NewDocument, NewPage, DOCUMENTS_TABLE,
    PAGES_TABLE,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// [`DocumentStore`] backed by Supabase's REST API.
pub struct SupabaseStore {
    client: Client,
    rest_url: String,
    api_key: String,
}

impl SupabaseStore {
    /// Build the HTTP client once; it is reused for every call.
    pub fn new(config: &BackendConfig) -> Result<Self, StoreError> {
        if config.api_key.trim().is_empty() {
            return Err(StoreError::Configuration("access key is empty".into()));
        }

        let mut builder =
            Client::builder().user_agent(concat!("docpages/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        let store = Self::with_client(client, &config.url, &config.api_key)?;
        debug!(
            "Initialised Supabase client for {} (timeout: {:?})",
            store.rest_url, config.request_timeout_secs
        );
        Ok(store)
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client, url: &str, api_key: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client,
            rest_url: rest_endpoint(url)?,
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Pass successful responses through; classify the rest.
    async fn ensure_success(response: Response, table: &str) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = StoreError::from_status(status, body);
        warn!("Request to '{}' failed: {}", table, err);
        Err(err)
    }
}

#[async_trait]
impl DocumentStore for SupabaseStore {
    async fn insert_document(&self, document: &NewDocument) -> Result<DocumentId, StoreError> {
        let response = self
            .request(Method::POST, DOCUMENTS_TABLE)
            .header("Prefer", "return=representation")
            .json(document)
            .send()
            .await?;
        let response = Self::ensure_success(response, DOCUMENTS_TABLE).await?;

        let rows: Vec<Map<String, Value>> = response.json().await?;
        let id = rows
            .into_iter()
            .next()
            .and_then(|mut row| row.remove("id"))
            .filter(|id| !id.is_null())
            .ok_or_else(|| {
                StoreError::InvalidResponse(format!(
                    "insert into '{DOCUMENTS_TABLE}' returned no id"
                ))
            })?;

        let id = DocumentId(id);
        debug!("Inserted document '{}' as {}", document.filename, id);
        Ok(id)
    }

    async fn insert_page(&self, page: &NewPage) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, PAGES_TABLE)
            .header("Prefer", "return=minimal")
            .json(page)
            .send()
            .await?;
        Self::ensure_success(response, PAGES_TABLE).await?;
        debug!(
            "Inserted page {} of document {} ({} base64 bytes)",
            page.page_number,
            page.document_id,
            page.page_image.len()
        );
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, StoreError> {
        let response = self
            .request(Method::GET, DOCUMENTS_TABLE)
            .query(&[("select", "*")])
            .send()
            .await?;
        let response = Self::ensure_success(response, DOCUMENTS_TABLE).await?;
        let rows: Vec<DocumentSummary> = response.json().await?;
        debug!("Fetched {} document rows", rows.len());
        Ok(rows)
    }

    fn name(&self) -> &str {
        "supabase"
    }
}

/// `https://x.supabase.co/` → `https://x.supabase.co/rest/v1`.
fn rest_endpoint(url: &str) -> Result<String, StoreError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Configuration("backend URL is empty".into()));
    }
    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|e| StoreError::Configuration(format!("invalid backend URL '{trimmed}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(StoreError::Configuration(format!(
            "backend URL must be http or https, got '{}'",
            parsed.scheme()
        )));
    }
    let base = parsed.as_str().trim_end_matches('/');
    Ok(format!("{base}/rest/v1"))
}
