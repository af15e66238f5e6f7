// ABOUTME: Selector engine: compiles path expressions (CSS or an XPath subset) and evaluates them on a Document.
// ABOUTME: Compilation is the only failure point; evaluation is read-only and returns matches in document order.

//! Path expressions.
//!
//! Expressions starting with `/`, `./` or `.//` are read as XPath and
//! translated to CSS by the xpath submodule; everything else is a CSS selector. Both compile to a
//! `scraper::Selector`, so evaluation is identical for the two syntaxes.

mod xpath;

use std::fmt;
use std::str::FromStr;

use scraper::Selector;

use crate::dom::{Document, MatchSet, Node};
use crate::error::ScrapeError;

/// Which syntax an expression was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Css,
    XPath,
}

/// A compiled, validated path expression.
#[derive(Debug, Clone)]
pub struct PathExpr {
    source: String,
    syntax: Syntax,
    css: String,
    selector: Selector,
}

impl PathExpr {
    /// Compile an expression, failing with a Selector error on invalid syntax.
    pub fn parse(expression: &str) -> Result<Self, ScrapeError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(ScrapeError::selector(
                expression,
                "Compile",
                Some(anyhow::anyhow!("empty path expression")),
            ));
        }

        let syntax = if is_xpath(trimmed) {
            Syntax::XPath
        } else {
            Syntax::Css
        };

        let css = match syntax {
            Syntax::XPath => xpath::to_css(trimmed).map_err(|msg| {
                ScrapeError::selector(expression, "Compile", Some(anyhow::anyhow!(msg)))
            })?,
            Syntax::Css => trimmed.to_string(),
        };

        let selector = Selector::parse(&css).map_err(|e| {
            ScrapeError::selector(
                expression,
                "Compile",
                Some(anyhow::anyhow!("invalid selector {:?}: {}", css, e)),
            )
        })?;

        Ok(Self {
            source: expression.to_string(),
            syntax,
            css,
            selector,
        })
    }

    /// The expression as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    /// The CSS selector the expression compiled to.
    pub fn css(&self) -> &str {
        &self.css
    }

    /// Evaluate against a document. Never fails; no match is an empty set.
    pub fn evaluate<'doc>(&self, doc: &'doc Document) -> MatchSet<'doc> {
        evaluate(doc, self)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for PathExpr {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Evaluate a compiled expression, returning matching elements in document order.
pub fn evaluate<'doc>(doc: &'doc Document, expr: &PathExpr) -> MatchSet<'doc> {
    let nodes = doc.html().select(&expr.selector).map(Node::new).collect();
    MatchSet::new(nodes)
}

/// Compile and evaluate an expression in one step.
pub fn select<'doc>(doc: &'doc Document, expression: &str) -> Result<MatchSet<'doc>, ScrapeError> {
    Ok(PathExpr::parse(expression)?.evaluate(doc))
}

fn is_xpath(expression: &str) -> bool {
    expression.starts_with('/') || expression.starts_with("./") || expression.starts_with(".//")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ParseMode;

    const CATALOG: &str = r#"
        <html><body>
          <div class="card">
            <div class="product-title__head">One</div>
            <a class="product-card__picture product-card__row" href="/p/1">img</a>
          </div>
          <div class="card">
            <div class="product-title__head">Two</div>
            <div class="product-title__head extra">Not exact</div>
          </div>
          <ul><li>a</li><li>b</li><li>c</li></ul>
        </body></html>
    "#;

    fn doc() -> Document {
        Document::parse_str(CATALOG, ParseMode::Tolerant).unwrap()
    }

    fn tags_and_text(set: &MatchSet<'_>) -> Vec<String> {
        set.iter()
            .map(|n| format!("{}:{}", n.tag(), n.text_nodes().collect::<String>().trim()))
            .collect()
    }

    #[test]
    fn xpath_class_equality_is_exact() {
        let expr = PathExpr::parse("//div[@class='product-title__head']").unwrap();
        assert_eq!(expr.syntax(), Syntax::XPath);
        let doc = doc();
        let set = expr.evaluate(&doc);
        assert_eq!(tags_and_text(&set), vec!["div:One", "div:Two"]);
    }

    #[test]
    fn css_class_selector_matches_tokens() {
        let expr = PathExpr::parse("div.product-title__head").unwrap();
        assert_eq!(expr.syntax(), Syntax::Css);
        let doc = doc();
        assert_eq!(expr.evaluate(&doc).len(), 3);
    }

    #[test]
    fn positional_xpath() {
        let doc = doc();
        let second = PathExpr::parse("//ul/li[2]").unwrap();
        assert_eq!(tags_and_text(&second.evaluate(&doc)), vec!["li:b"]);
        let last = PathExpr::parse("//ul/li[last()]").unwrap();
        assert_eq!(tags_and_text(&last.evaluate(&doc)), vec!["li:c"]);
    }

    #[test]
    fn union_keeps_document_order() {
        let doc = doc();
        let expr = PathExpr::parse("//li | //div[@class='product-title__head']").unwrap();
        assert_eq!(
            tags_and_text(&expr.evaluate(&doc)),
            vec!["div:One", "div:Two", "li:a", "li:b", "li:c"]
        );
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let doc = doc();
        let expr = PathExpr::parse("//table[@id='missing']").unwrap();
        assert!(expr.evaluate(&doc).is_empty());
    }

    #[test]
    fn select_reports_invalid_expression() {
        let doc = doc();
        assert_eq!(select(&doc, "//li").unwrap().len(), 3);
        assert!(select(&doc, "//li[").unwrap_err().is_selector());
    }

    #[test]
    fn contains_empty_literal_matches_without_attribute() {
        let doc = Document::parse_str(
            "<html><body><div>no id</div><div id='x'>with id</div></body></html>",
            ParseMode::Tolerant,
        )
        .unwrap();
        assert_eq!(select(&doc, "//div[contains(@id,'')]").unwrap().len(), 2);
        assert_eq!(select(&doc, "//div[starts-with(@id,'')]").unwrap().len(), 2);
    }

    #[test]
    fn whitespace_around_step_separators() {
        let doc = doc();
        let spaced = select(&doc, "//ul / li").unwrap();
        let tight = select(&doc, "//ul/li").unwrap();
        assert_eq!(tags_and_text(&spaced), tags_and_text(&tight));
        assert_eq!(spaced.len(), 3);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let doc = doc();
        let expr = PathExpr::parse("//div").unwrap();
        let first = tags_and_text(&expr.evaluate(&doc));
        let second = tags_and_text(&expr.evaluate(&doc));
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_expressions_are_selector_errors() {
        for bad in ["", "   ", "//div[@class='x'", "//a/@href", "div[[[", "p >", "/"] {
            let err = PathExpr::parse(bad).expect_err(bad);
            assert!(err.is_selector(), "{bad:?} gave {err}");
        }
    }

    #[test]
    fn from_str_and_display_round_trip_source() {
        let expr: PathExpr = "//a[@href]".parse().unwrap();
        assert_eq!(expr.to_string(), "//a[@href]");
        assert_eq!(expr.css(), "a[href]");
    }
}
