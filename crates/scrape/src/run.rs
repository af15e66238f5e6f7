// ABOUTME: One-page run pipeline: scrape a URL, then write records, per-field files, and the raw page.
// ABOUTME: Fetch and parse failures abort before any write; a failed optional write does not stop the others.

use tracing::{error, info};

use crate::client::Scraper;
use crate::error::ScrapeError;
use crate::extractors::assemble::ExtractionResult;
use crate::sink::{column_destination, Payload, RecordFormat, Sink};

/// Where a run writes its output. `None` skips that output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    pub records: Option<String>,
    pub record_format: RecordFormat,
    /// Directory receiving one `<field>.txt` per field.
    pub fields_dir: Option<String>,
    /// Raw page destination. When set, failing to write it fails the run.
    pub raw: Option<String>,
}

impl Default for OutputPlan {
    fn default() -> Self {
        Self {
            records: Some("books_info.txt".to_string()),
            record_format: RecordFormat::Labeled,
            fields_dir: None,
            raw: Some("site_code.txt".to_string()),
        }
    }
}

/// Outcome of a run that got as far as writing.
#[derive(Debug)]
pub struct RunReport {
    pub url: String,
    pub records: usize,
    /// Destinations written successfully, in write order.
    pub written: Vec<String>,
    /// Optional writes that failed.
    pub failed: Vec<ScrapeError>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Scrape one page and write the planned outputs.
///
/// Returns `Err` for fetch and parse failures (nothing is written) and for a
/// failed raw-page write. Records and per-field write failures are collected
/// in the report.
pub fn run(
    scraper: &Scraper,
    url: &str,
    plan: &OutputPlan,
    sink: &dyn Sink,
) -> Result<RunReport, ScrapeError> {
    let page = scraper.scrape(url)?;
    write_outputs(url, &page.result, &page.raw, plan, sink)
}

/// Same as [`run`] for markup already on disk or in memory.
///
/// `origin` names the source in errors and the report.
pub fn run_offline(
    scraper: &Scraper,
    origin: &str,
    raw: &[u8],
    plan: &OutputPlan,
    sink: &dyn Sink,
) -> Result<RunReport, ScrapeError> {
    let result = scraper
        .extract_bytes(raw, None)
        .map_err(|e| e.with_target(origin))?;
    write_outputs(origin, &result, raw, plan, sink)
}

fn write_outputs(
    origin: &str,
    result: &ExtractionResult,
    raw: &[u8],
    plan: &OutputPlan,
    sink: &dyn Sink,
) -> Result<RunReport, ScrapeError> {
    let mut report = RunReport {
        url: origin.to_string(),
        records: result.len(),
        written: Vec::new(),
        failed: Vec::new(),
    };

    if let Some(dest) = &plan.records {
        let payload = Payload::Records {
            result,
            format: plan.record_format,
        };
        record_write(&mut report, dest, sink.write(dest, payload));
    }

    if let Some(dir) = &plan.fields_dir {
        for column in result.columns() {
            let dest = column_destination(dir, column.name());
            let outcome = sink.write(&dest, Payload::Column(column));
            record_write(&mut report, &dest, outcome);
        }
    }

    if let Some(dest) = &plan.raw {
        sink.write(dest, Payload::Raw(raw))?;
        report.written.push(dest.clone());
    }

    info!(
        origin,
        records = report.records,
        written = report.written.len(),
        failed = report.failed.len(),
        "run finished"
    );
    Ok(report)
}

fn record_write(report: &mut RunReport, dest: &str, outcome: Result<(), ScrapeError>) {
    match outcome {
        Ok(()) => report.written.push(dest.to_string()),
        Err(e) => {
            error!(destination = dest, error = %e, "write failed");
            report.failed.push(e);
        }
    }
}
