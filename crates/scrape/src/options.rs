// ABOUTME: Configuration options for the scraper and the ScraperBuilder fluent API.
// ABOUTME: Building validates every field expression, so selector errors surface before any fetch.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::client::Scraper;
use crate::dom::ParseMode;
use crate::error::ScrapeError;
use crate::extractors::field::{FieldSet, FieldSpec};
use crate::resource::{Fetch, FetchOptions, HttpFetcher, MAX_CONTENT_LENGTH};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("bookshelf/", env!("CARGO_PKG_VERSION"));

/// Configuration options for the scraper.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    pub parse_mode: ParseMode,
    pub max_content_length: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: HashMap::new(),
            parse_mode: ParseMode::Tolerant,
            max_content_length: MAX_CONTENT_LENGTH,
        }
    }
}

impl Options {
    pub(crate) fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            user_agent: self.user_agent.clone(),
            timeout: self.timeout,
            headers: self.headers.clone(),
            max_content_length: self.max_content_length,
        }
    }
}

/// Builder for constructing Scraper instances.
#[derive(Clone)]
pub struct ScraperBuilder {
    opts: Options,
    fields: Vec<FieldSpec>,
    fetcher: Option<Arc<dyn Fetch>>,
}

impl fmt::Debug for ScraperBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScraperBuilder")
            .field("opts", &self.opts)
            .field("fields", &self.fields)
            .field("custom_fetcher", &self.fetcher.is_some())
            .finish()
    }
}

impl ScraperBuilder {
    /// Create a new ScraperBuilder with default options and no fields.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
            fields: Vec::new(),
            fetcher: None,
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Choose how malformed markup is handled.
    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.opts.parse_mode = mode;
        self
    }

    /// Set the largest response body accepted, in bytes.
    pub fn max_content_length(mut self, bytes: usize) -> Self {
        self.opts.max_content_length = bytes;
        self
    }

    /// Declare one field to extract.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Declare several fields to extract, appended in order.
    pub fn fields(mut self, specs: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(specs);
        self
    }

    /// Use a custom transport instead of the default HTTP fetcher.
    pub fn fetcher(mut self, fetcher: impl Fetch + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Compile the fields and build the Scraper.
    ///
    /// Fails with a Selector or Config error when a field is invalid; no
    /// network activity happens here.
    pub fn build(self) -> Result<Scraper, ScrapeError> {
        let fields = FieldSet::compile(self.fields)?;
        let fetcher: Arc<dyn Fetch> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(self.opts.fetch_options())?),
        };
        Ok(Scraper::new(self.opts, fields, fetcher))
    }
}

impl Default for ScraperBuilder {
    fn default() -> Self {
        Self::new()
    }
}
