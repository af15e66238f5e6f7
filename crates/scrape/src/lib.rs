// ABOUTME: Main library entry point for the bookshelf catalog scraper.
// ABOUTME: Re-exports the public API: Scraper, ScraperBuilder, FieldSpec, ExtractionResult, sinks, and run().

//! Bookshelf - extracts aligned records from product catalog pages.
//!
//! Each field is a path expression (an XPath subset or CSS) evaluated over the
//! whole document. The per-field match lists are aligned by position into
//! records, so the i-th record holds the i-th match of every field.
//!
//! # Example
//!
//! ```no_run
//! use bookshelf_scrape::{FieldSpec, ScrapeError, Scraper};
//!
//! fn main() -> Result<(), ScrapeError> {
//!     let scraper = Scraper::builder()
//!         .field(FieldSpec::text("title", "//div[@class='product-title__head']"))
//!         .field(FieldSpec::attribute("link", "//a[@class='product-card__picture']", "href"))
//!         .build()?;
//!     let page = scraper.scrape("https://example.com/catalog")?;
//!     for record in page.result.records() {
//!         println!("{:?}", record.get("title"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod dom;
pub mod error;
pub mod extractors;
pub mod options;
pub mod resource;
pub mod run;
pub mod selector;
pub mod sink;

pub use crate::client::{Page, Scraper};
pub use crate::dom::{Document, ParseMode};
pub use crate::error::{ErrorCode, ScrapeError};
pub use crate::extractors::assemble::{Column, ExtractionResult, Record};
pub use crate::extractors::field::{ExtractMode, FieldSet, FieldSpec};
pub use crate::extractors::loader::{load_builtin_profile, load_profile, Profile};
pub use crate::options::{Options, ScraperBuilder};
pub use crate::resource::{Fetch, FetchOptions, FetchResult, HttpFetcher};
pub use crate::run::{run, run_offline, OutputPlan, RunReport};
pub use crate::selector::PathExpr;
pub use crate::sink::{FileSink, MemorySink, Payload, RecordFormat, Sink};
