// ABOUTME: The Scraper ties fetching, parsing, and extraction together for one page at a time.
// ABOUTME: Provides scrape() for URLs and extract_bytes()/extract_html() for markup already in hand.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::dom::Document;
use crate::error::ScrapeError;
use crate::extractors::assemble::{extract_document, ExtractionResult};
use crate::extractors::field::FieldSet;
use crate::options::{Options, ScraperBuilder};
use crate::resource::{validate_url, Fetch, FetchResult};

/// A fetched and extracted page.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub fetched_at: DateTime<Utc>,
    /// The response body exactly as received.
    pub raw: Bytes,
    pub result: ExtractionResult,
}

/// Extracts records from catalog pages using a compiled set of fields.
///
/// Holds no per-page state: each call parses its own document, so one
/// Scraper can serve several pages concurrently.
pub struct Scraper {
    opts: Options,
    fields: FieldSet,
    fetcher: Arc<dyn Fetch>,
}

impl std::fmt::Debug for Scraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scraper")
            .field("opts", &self.opts)
            .field("fields", &self.fields)
            .finish()
    }
}

impl Scraper {
    /// Create a new ScraperBuilder.
    pub fn builder() -> ScraperBuilder {
        ScraperBuilder::new()
    }

    pub(crate) fn new(opts: Options, fields: FieldSet, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            opts,
            fields,
            fetcher,
        }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Fetch a page without parsing it.
    pub fn fetch(&self, url: &str) -> Result<FetchResult, ScrapeError> {
        validate_url(url, "Fetch")?;
        self.fetcher.fetch(url)
    }

    /// Fetch a page and extract its records.
    pub fn scrape(&self, url: &str) -> Result<Page, ScrapeError> {
        let fetched = self.fetch(url)?;
        let result = self
            .extract_bytes(&fetched.body, fetched.content_type.as_deref())
            .map_err(|e| e.with_target(url))?;

        info!(url, records = result.len(), "scraped page");

        Ok(Page {
            url: fetched.url,
            final_url: fetched.final_url,
            status: fetched.status,
            content_type: fetched.content_type,
            fetched_at: fetched.fetched_at,
            raw: fetched.body,
            result,
        })
    }

    /// Parse raw bytes and extract records.
    pub fn extract_bytes(
        &self,
        raw: &[u8],
        content_type: Option<&str>,
    ) -> Result<ExtractionResult, ScrapeError> {
        let doc = Document::parse_bytes(raw, content_type, self.opts.parse_mode)?;
        Ok(extract_document(&doc, &self.fields))
    }

    /// Parse decoded markup and extract records.
    pub fn extract_html(&self, html: &str) -> Result<ExtractionResult, ScrapeError> {
        let doc = Document::parse_str(html, self.opts.parse_mode)?;
        Ok(extract_document(&doc, &self.fields))
    }
}
