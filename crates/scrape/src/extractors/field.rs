// ABOUTME: Field specifications and the field extractor turning a matched node into an optional string.
// ABOUTME: FieldSet compiles every path expression once, at configuration time.

//! Field declarations and per-node extraction.
//!
//! Key behaviors:
//! - Text extraction joins descendant text and normalizes whitespace.
//! - Attribute extraction returns the attribute value trimmed.
//! - A node without text, or without the requested attribute, yields `None`.
//!   A present value that is blank yields `Some("")`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::dom::Node;
use crate::error::ScrapeError;
use crate::selector::PathExpr;

/// What to read from a matched node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// Concatenated, whitespace-normalized text of the node and its descendants.
    #[default]
    Text,
    /// Value of the named attribute.
    Attribute(String),
}

/// Declaration of one field: its name, path expression and extract mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    name: String,
    path: String,
    #[serde(default)]
    extract: ExtractMode,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, path: impl Into<String>, extract: ExtractMode) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            extract,
        }
    }

    /// A field read as text.
    pub fn text(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, ExtractMode::Text)
    }

    /// A field read from an attribute.
    pub fn attribute(
        name: impl Into<String>,
        path: impl Into<String>,
        attr: impl Into<String>,
    ) -> Self {
        Self::new(name, path, ExtractMode::Attribute(attr.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn extract(&self) -> &ExtractMode {
        &self.extract
    }
}

/// A field whose path expression has been compiled.
#[derive(Debug, Clone)]
pub struct CompiledField {
    spec: FieldSpec,
    expr: PathExpr,
}

impl CompiledField {
    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn expr(&self) -> &PathExpr {
        &self.expr
    }
}

/// Validated, compiled set of fields in declaration order.
#[derive(Debug, Clone)]
pub struct FieldSet {
    fields: Vec<CompiledField>,
}

impl FieldSet {
    /// Compile every field's expression and check the set is usable.
    ///
    /// Fails with a Selector error for the first invalid expression, or a
    /// Config error for an empty set, an empty name, an empty attribute
    /// name, or a duplicated name.
    pub fn compile(specs: impl IntoIterator<Item = FieldSpec>) -> Result<Self, ScrapeError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::new();

        for spec in specs {
            if spec.name.trim().is_empty() {
                return Err(ScrapeError::config(
                    spec.path.clone(),
                    "Compile",
                    Some(anyhow::anyhow!("field name must not be empty")),
                ));
            }
            if !seen.insert(spec.name.clone()) {
                return Err(ScrapeError::config(
                    spec.name.clone(),
                    "Compile",
                    Some(anyhow::anyhow!("duplicate field name")),
                ));
            }
            if let ExtractMode::Attribute(attr) = &spec.extract {
                if attr.trim().is_empty() {
                    return Err(ScrapeError::config(
                        spec.name.clone(),
                        "Compile",
                        Some(anyhow::anyhow!("attribute name must not be empty")),
                    ));
                }
            }

            let expr = PathExpr::parse(&spec.path)?;
            fields.push(CompiledField { spec, expr });
        }

        if fields.is_empty() {
            return Err(ScrapeError::config(
                "fields",
                "Compile",
                Some(anyhow::anyhow!("at least one field is required")),
            ));
        }

        Ok(Self { fields })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompiledField> {
        self.fields.iter()
    }

    /// Field names in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.spec.name.clone()).collect()
    }
}

/// Normalizes whitespace in a string by collapsing runs of whitespace into single spaces.
pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract a value from a node. `None` means the content is absent, not an error.
pub fn extract(node: &Node<'_>, mode: &ExtractMode) -> Option<String> {
    match mode {
        ExtractMode::Text => {
            let mut parts = node.text_nodes().peekable();
            // No text nodes at all: nothing to extract.
            parts.peek()?;
            let joined: String = parts.collect();
            Some(normalize_whitespace(&joined))
        }
        ExtractMode::Attribute(name) => node.attr(name).map(|v| v.trim().to_string()),
    }
}
