// ABOUTME: Document parser producing a read-only HTML tree, tolerant or strict about malformed markup.
// ABOUTME: Node handles and match sets borrow the Document, so they cannot outlive their parse.

//! Parsed document model.
//!
//! A [`Document`] is built once per page and never mutated. Selector
//! evaluation hands out [`Node`] handles that borrow it; the borrow checker
//! keeps them scoped to the document they came from.

use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::resource::decode_body;

/// Number of leading bytes inspected when checking for binary input.
const BINARY_SNIFF_LEN: usize = 8000;

/// How the parser treats recoverable markup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Repair unclosed tags, stray end tags and bad entities silently.
    #[default]
    Tolerant,
    /// Reject any document the HTML parser had to repair.
    Strict,
}

/// A parsed, read-only HTML document.
pub struct Document {
    html: Html,
    recovered: Vec<String>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("recovered", &self.recovered.len())
            .finish()
    }
}

impl Document {
    /// Parse raw bytes, decoding them with the content-type charset or detection.
    pub fn parse_bytes(
        raw: &[u8],
        content_type: Option<&str>,
        mode: ParseMode,
    ) -> Result<Self, ScrapeError> {
        // UTF-16 text is full of NUL bytes; a BOM marks it as text.
        let has_bom = encoding_rs::Encoding::for_bom(raw).is_some();
        let sniff = &raw[..raw.len().min(BINARY_SNIFF_LEN)];
        if !has_bom && sniff.contains(&0) {
            return Err(ScrapeError::parse(
                "",
                "Parse",
                Some(anyhow::anyhow!("input looks binary (NUL byte found)")),
            ));
        }
        Self::parse_str(&decode_body(raw, content_type), mode)
    }

    /// Parse already-decoded markup.
    pub fn parse_str(markup: &str, mode: ParseMode) -> Result<Self, ScrapeError> {
        if markup.trim().is_empty() {
            return Err(ScrapeError::parse(
                "",
                "Parse",
                Some(anyhow::anyhow!("empty document")),
            ));
        }

        let html = Html::parse_document(markup);
        let recovered: Vec<String> = html.errors.iter().map(|e| e.to_string()).collect();

        if !recovered.is_empty() {
            match mode {
                ParseMode::Strict => {
                    return Err(ScrapeError::parse(
                        "",
                        "Parse",
                        Some(anyhow::anyhow!(
                            "strict mode: {} markup error(s), first: {}",
                            recovered.len(),
                            recovered[0]
                        )),
                    ));
                }
                ParseMode::Tolerant => {
                    warn!(count = recovered.len(), "repaired malformed markup");
                }
            }
        }

        debug!(bytes = markup.len(), "parsed document");
        Ok(Self { html, recovered })
    }

    /// Markup errors the parser repaired (always empty in strict mode).
    pub fn recovered_errors(&self) -> &[String] {
        &self.recovered
    }

    pub(crate) fn html(&self) -> &Html {
        &self.html
    }
}

/// Opaque handle to one element of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'doc> {
    element: ElementRef<'doc>,
}

impl<'doc> Node<'doc> {
    pub(crate) fn new(element: ElementRef<'doc>) -> Self {
        Self { element }
    }

    /// Lower-case tag name.
    pub fn tag(&self) -> &'doc str {
        self.element.value().name()
    }

    /// Attribute value as written in the markup, or `None` when missing.
    pub fn attr(&self, name: &str) -> Option<&'doc str> {
        self.element.value().attr(name)
    }

    /// Text nodes of this element and its descendants, in document order.
    pub fn text_nodes(&self) -> impl Iterator<Item = &'doc str> {
        self.element.text()
    }
}

/// Ordered result of evaluating one path expression: matched nodes in document order.
#[derive(Debug, Clone, Default)]
pub struct MatchSet<'doc> {
    nodes: Vec<Node<'doc>>,
}

impl<'doc> MatchSet<'doc> {
    pub(crate) fn new(nodes: Vec<Node<'doc>>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Node<'doc>> {
        self.nodes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node<'doc>> {
        self.nodes.iter()
    }
}

impl<'a, 'doc> IntoIterator for &'a MatchSet<'doc> {
    type Item = &'a Node<'doc>;
    type IntoIter = std::slice::Iter<'a, Node<'doc>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
