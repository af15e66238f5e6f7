// ABOUTME: Record assembler aligning independently matched field columns into records by position.
// ABOUTME: Defines Column, Record and ExtractionResult, the output of one extraction pass.

//! Record assembly.
//!
//! Every field is evaluated on its own, giving one column of values per
//! field. Records are then built by index: record `i` takes the `i`-th value
//! of each column, or nothing when that column is shorter. The number of
//! records is the length of the longest column.
//!
//! Pairing by index assumes the page lists items as parallel sibling
//! sequences. If one item lacks a field node, later values of that field
//! shift up and attach to the wrong item; nothing here can detect that. A
//! warning is logged whenever column lengths differ.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dom::Document;
use crate::extractors::field::{extract, FieldSet};

/// Extracted values of one field, one entry per matched node, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    name: String,
    values: Vec<Option<String>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// One entry per matched node; `None` where the node lacked the content.
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Present values only.
    pub fn present(&self) -> impl Iterator<Item = &str> {
        self.values.iter().filter_map(|v| v.as_deref())
    }
}

/// One logical catalog item: field names mapped to optional values, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Option<String>)>,
}

impl Record {
    /// Value of a field if it is declared and present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entry(name).and_then(|v| v.as_deref())
    }

    /// True when the field is declared but has no value in this record.
    pub fn is_absent(&self, name: &str) -> bool {
        matches!(self.entry(name), Some(None))
    }

    /// `(name, value)` pairs in field order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    fn entry(&self, name: &str) -> Option<&Option<String>> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Records of one extraction pass plus the per-field columns they were built from.
///
/// An empty result is a successful pass over a page with no matches, not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractionResult {
    records: Vec<Record>,
    columns: Vec<Column>,
}

impl ExtractionResult {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

/// Evaluate every field against the same document and extract each match.
pub fn extract_columns(doc: &Document, fields: &FieldSet) -> Vec<Column> {
    fields
        .iter()
        .map(|field| {
            let matches = field.expr().evaluate(doc);
            debug!(
                field = field.name(),
                expr = field.expr().as_str(),
                matches = matches.len(),
                "evaluated field"
            );
            let values = matches
                .iter()
                .map(|node| extract(node, field.spec().extract()))
                .collect();
            Column::new(field.name(), values)
        })
        .collect()
}

/// Align columns by position into records.
///
/// Produces `max(column lengths)` records; a column shorter than that
/// contributes `None` for the missing positions.
pub fn assemble(columns: Vec<Column>) -> ExtractionResult {
    let n = columns.iter().map(Column::len).max().unwrap_or(0);

    if columns.iter().any(|c| c.len() != n) {
        let counts = columns
            .iter()
            .map(|c| format!("{}={}", c.name(), c.len()))
            .collect::<Vec<_>>()
            .join(", ");
        warn!(%counts, "field match counts differ; records are paired by position");
    }

    let records = (0..n)
        .map(|i| Record {
            fields: columns
                .iter()
                .map(|c| (c.name.clone(), c.values.get(i).cloned().flatten()))
                .collect(),
        })
        .collect();

    ExtractionResult { records, columns }
}

/// Run a full extraction pass: evaluate every field, then assemble records.
pub fn extract_document(doc: &Document, fields: &FieldSet) -> ExtractionResult {
    let result = assemble(extract_columns(doc, fields));
    info!(records = result.len(), fields = fields.len(), "extracted records");
    result
}
