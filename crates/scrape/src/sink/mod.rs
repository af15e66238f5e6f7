// ABOUTME: Sink boundary: writes records, per-field columns, or raw page bytes to named destinations.
// ABOUTME: FileSink writes text files under a root directory; MemorySink keeps writes in memory.

pub mod format;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::info;

use crate::error::ScrapeError;
use crate::extractors::assemble::{Column, ExtractionResult};
pub use crate::sink::format::RecordFormat;

/// What to write.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    /// All records of one extraction pass.
    Records {
        result: &'a ExtractionResult,
        format: RecordFormat,
    },
    /// One field's values, independent of record alignment.
    Column(&'a Column),
    /// The fetched page, byte for byte.
    Raw(&'a [u8]),
}

impl Payload<'_> {
    /// Bytes this payload writes.
    pub fn render(&self) -> Vec<u8> {
        match self {
            Payload::Records { result, format } => {
                format::render_records(result, *format).into_bytes()
            }
            Payload::Column(column) => format::render_column(column).into_bytes(),
            Payload::Raw(bytes) => bytes.to_vec(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Payload::Records { .. } => "records",
            Payload::Column(_) => "column",
            Payload::Raw(_) => "raw",
        }
    }
}

/// A destination for pipeline output.
///
/// A failed write affects only that destination; callers decide whether
/// to continue with other writes.
pub trait Sink {
    fn write(&self, destination: &str, payload: Payload<'_>) -> Result<(), ScrapeError>;
}

/// Destination name for a field's per-field output inside `dir`.
pub fn column_destination(dir: &str, field: &str) -> String {
    if dir.is_empty() {
        format!("{}.txt", field)
    } else {
        format!("{}/{}.txt", dir.trim_end_matches('/'), field)
    }
}

/// Writes each destination as a file relative to a root directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Full path of a destination; absolute destinations are used as-is.
    pub fn path_for(&self, destination: &str) -> PathBuf {
        self.root.join(destination)
    }
}

impl Sink for FileSink {
    fn write(&self, destination: &str, payload: Payload<'_>) -> Result<(), ScrapeError> {
        let path = self.path_for(destination);
        let target = path.display().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ScrapeError::io(
                    target.clone(),
                    "Write",
                    Some(anyhow::anyhow!("failed to create directory: {}", e)),
                )
            })?;
        }

        let bytes = payload.render();
        fs::write(&path, &bytes).map_err(|e| {
            ScrapeError::io(target.clone(), "Write", Some(anyhow::anyhow!("{}", e)))
        })?;

        info!(path = %target, kind = payload.kind(), bytes = bytes.len(), "wrote output");
        Ok(())
    }
}

/// Keeps every write in memory, keyed by destination.
#[derive(Debug, Default)]
pub struct MemorySink {
    writes: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes last written to a destination.
    pub fn get(&self, destination: &str) -> Option<Vec<u8>> {
        self.lock().get(destination).cloned()
    }

    /// Destinations written so far, sorted.
    pub fn destinations(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Sink for MemorySink {
    fn write(&self, destination: &str, payload: Payload<'_>) -> Result<(), ScrapeError> {
        self.lock().insert(destination.to_string(), payload.render());
        Ok(())
    }
}
