// ABOUTME: Text renderings of extraction output: labeled record lines, JSON records, and per-field lines.
// ABOUTME: Values are written verbatim; embedded delimiters are not escaped.

use std::fmt;
use std::str::FromStr;

use crate::extractors::assemble::{Column, ExtractionResult, Record};

/// How records are rendered to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    /// `Title:...Author:...` per record, each record followed by a blank line.
    #[default]
    Labeled,
    /// Pretty-printed JSON array of objects, absent values as `null`.
    Json,
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordFormat::Labeled => "text",
            RecordFormat::Json => "json",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RecordFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "labeled" => Ok(RecordFormat::Labeled),
            "json" => Ok(RecordFormat::Json),
            other => Err(format!("unknown record format: {}", other)),
        }
    }
}

/// Render records in the requested format.
pub fn render_records(result: &ExtractionResult, format: RecordFormat) -> String {
    match format {
        RecordFormat::Labeled => render_labeled(result),
        RecordFormat::Json => render_json(result),
    }
}

/// One line per record, each present field as `<Label>:<value>` with no separator.
///
/// Absent fields are left out entirely; a present empty value keeps its label.
pub fn render_labeled(result: &ExtractionResult) -> String {
    let mut out = String::new();
    for record in result.records() {
        out.push_str(&labeled_line(record));
        out.push_str("\n\n");
    }
    out
}

fn labeled_line(record: &Record) -> String {
    let mut line = String::new();
    for (name, value) in record.fields() {
        if let Some(value) = value {
            line.push_str(&label(name));
            line.push(':');
            line.push_str(value);
        }
    }
    line
}

fn render_json(result: &ExtractionResult) -> String {
    let mut json = serde_json::to_string_pretty(result).unwrap_or_else(|_| "[]".to_string());
    json.push('\n');
    json
}

/// One line per present value of a column, in document order.
pub fn render_column(column: &Column) -> String {
    let mut out = String::new();
    for value in column.present() {
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Field name with its first letter upper-cased.
fn label(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
