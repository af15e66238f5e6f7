// ABOUTME: Translates the location-path subset of XPath used by catalog profiles into CSS selectors.
// ABOUTME: Rejects constructs with no faithful CSS equivalent instead of approximating them.

//! XPath subset.
//!
//! Supported grammar:
//!
//! ```text
//! union     := path ('|' path)*
//! path      := ('/' | '//') step (('/' | '//') step)*
//! step      := (NAME | '*') predicate*
//! predicate := '[' INTEGER ']' | '[' 'last()' ']' | '[' test ('and' test)* ']'
//! test      := '@' NAME | '@' NAME ('=' | '!=') LITERAL
//!            | 'contains(' '@' NAME ',' LITERAL ')'
//!            | 'starts-with(' '@' NAME ',' LITERAL ')'
//! ```
//!
//! Positional predicates must precede attribute tests in a step: XPath
//! `div[@class='x'][2]` counts only filtered siblings, which CSS cannot
//! express, while `div[2][@class='x']` maps to `div:nth-of-type(2)[class="x"]`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

/// Convert an XPath expression to an equivalent CSS selector list.
///
/// Returns a human-readable message on unsupported or malformed input.
pub(crate) fn to_css(xpath: &str) -> Result<String, String> {
    let branches = split_top_level(xpath, '|')?;
    let mut out = Vec::with_capacity(branches.len());
    for branch in branches {
        let branch = branch.trim();
        if branch.is_empty() {
            return Err("empty branch in union".to_string());
        }
        out.push(path_to_css(branch)?);
    }
    Ok(out.join(", "))
}

fn path_to_css(path: &str) -> Result<String, String> {
    // "./x" and ".//x" are relative to the document node, same as "/x" and "//x".
    let path = path.strip_prefix('.').filter(|p| p.starts_with('/')).unwrap_or(path);

    let mut cursor = Cursor::new(path);
    let mut css = String::new();
    let mut first = true;

    loop {
        cursor.skip_ws();
        if cursor.at_end() {
            break;
        }
        let axis = if cursor.eat("//") {
            Axis::Descendant
        } else if cursor.eat("/") {
            Axis::Child
        } else {
            return Err(format!(
                "expected '/' or '//' at offset {}",
                cursor.offset()
            ));
        };
        cursor.skip_ws();

        let compound = parse_step(&mut cursor)?;

        if first {
            css.push_str(&compound);
            if axis == Axis::Child {
                // "/html" selects the document element itself.
                css.push_str(":root");
            }
            first = false;
        } else {
            css.push_str(match axis {
                Axis::Child => " > ",
                Axis::Descendant => " ",
            });
            css.push_str(&compound);
        }
    }

    if first {
        return Err("expression has no steps".to_string());
    }
    Ok(css)
}

fn parse_step(cursor: &mut Cursor<'_>) -> Result<String, String> {
    if cursor.peek() == Some('@') {
        return Err("attribute steps are not supported; use an attribute extract mode".to_string());
    }

    let name = if cursor.eat("*") {
        None
    } else {
        let name = cursor.name();
        if name.is_empty() {
            return Err(format!("expected element name at offset {}", cursor.offset()));
        }
        Some(name)
    };

    if cursor.eat("::") {
        return Err("axes other than child and descendant are not supported".to_string());
    }
    if cursor.peek() == Some('(') {
        return Err(format!(
            "node test {}() is not supported",
            name.unwrap_or("*")
        ));
    }

    let mut compound = name.unwrap_or("*").to_string();
    let mut seen_filter = false;

    while cursor.eat("[") {
        let body = cursor.until_bracket_close()?;
        let body = body.trim();

        if let Some(pseudo) = positional(body, name.is_some())? {
            if seen_filter {
                return Err(format!(
                    "positional predicate [{}] must come before attribute predicates",
                    body
                ));
            }
            compound.push_str(&pseudo);
            continue;
        }

        for test in split_and(body)? {
            compound.push_str(&attribute_test(test.trim())?);
        }
        seen_filter = true;
    }

    Ok(compound)
}

/// `[n]` and `[last()]` relative to same-named siblings (or all siblings for `*`).
fn positional(body: &str, named: bool) -> Result<Option<String>, String> {
    let kind = if named { "of-type" } else { "child" };
    if body == "last()" {
        return Ok(Some(format!(":last-{}", kind)));
    }
    if !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()) {
        let n: u32 = body
            .parse()
            .map_err(|_| format!("position {} is out of range", body))?;
        if n == 0 {
            return Err("positions start at 1".to_string());
        }
        return Ok(Some(format!(":nth-{}({})", kind, n)));
    }
    Ok(None)
}

fn attribute_test(test: &str) -> Result<String, String> {
    for (func, op) in [("contains(", "*="), ("starts-with(", "^=")] {
        if let Some(args) = test.strip_prefix(func) {
            let args = args
                .strip_suffix(')')
                .ok_or_else(|| format!("unterminated {}...)", func))?;
            let mut cursor = Cursor::new(args.trim());
            if !cursor.eat("@") {
                return Err(format!("{}) expects an attribute as first argument", func));
            }
            let attr = cursor.name();
            if attr.is_empty() {
                return Err(format!("missing attribute name in {}...)", func));
            }
            cursor.skip_ws();
            if !cursor.eat(",") {
                return Err(format!("expected ',' in {}...)", func));
            }
            cursor.skip_ws();
            let value = cursor.literal()?;
            cursor.skip_ws();
            if !cursor.at_end() {
                return Err(format!("unexpected input after {}...)", func));
            }
            // A missing attribute reads as "", and every string contains
            // (and starts with) "": the test holds for every element.
            if value.is_empty() {
                return Ok(String::new());
            }
            return Ok(format!("[{}{}{}]", attr, op, css_string(value)));
        }
    }

    let mut cursor = Cursor::new(test);
    if !cursor.eat("@") {
        return Err(format!("unsupported predicate [{}]", test));
    }
    let attr = cursor.name();
    if attr.is_empty() {
        return Err(format!("missing attribute name in [{}]", test));
    }
    cursor.skip_ws();
    if cursor.at_end() {
        return Ok(format!("[{}]", attr));
    }

    let negate = if cursor.eat("!=") {
        true
    } else if cursor.eat("=") {
        false
    } else {
        return Err(format!("unsupported predicate [{}]", test));
    };
    cursor.skip_ws();
    let value = cursor.literal()?;
    cursor.skip_ws();
    if !cursor.at_end() {
        return Err(format!("unexpected input in predicate [{}]", test));
    }

    let exact = format!("[{}={}]", attr, css_string(value));
    if negate {
        // XPath `@a != 'v'` is false when the attribute is missing.
        Ok(format!("[{}]:not({})", attr, exact))
    } else {
        Ok(exact)
    }
}

/// Quote a value as a CSS string.
fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Split on `sep` outside quotes and brackets.
fn split_top_level(input: &str, sep: char) -> Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unbalanced ']' at offset {}", i))?;
            }
            (None, c) if c == sep && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err("unterminated string literal".to_string());
    }
    if depth != 0 {
        return Err("unbalanced '['".to_string());
    }
    parts.push(&input[start..]);
    Ok(parts)
}

/// Split a predicate body on the `and` keyword outside quotes.
fn split_and(body: &str) -> Result<Vec<&str>, String> {
    const AND: &str = " and ";
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut resume = 0;

    for (i, c) in body.char_indices() {
        if i < resume {
            continue;
        }
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if body[i..].starts_with(AND) => {
                parts.push(&body[start..i]);
                start = i + AND.len();
                resume = start;
            }
            None => {}
        }
    }
    if quote.is_some() {
        return Err("unterminated string literal".to_string());
    }
    parts.push(&body[start..]);
    if parts.iter().any(|p| p.trim().is_empty()) {
        return Err(format!("empty test in predicate [{}]", body));
    }
    Ok(parts)
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn offset(&self) -> usize {
        self.pos
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    /// Element or attribute name: a letter or '_' followed by letters, digits, '-' or '_'.
    fn name(&mut self) -> &'a str {
        let rest = self.rest();
        let mut end = 0;
        for (i, c) in rest.char_indices() {
            let ok = if i == 0 {
                c.is_ascii_alphabetic() || c == '_'
            } else {
                c.is_ascii_alphanumeric() || c == '-' || c == '_'
            };
            if !ok {
                break;
            }
            end = i + c.len_utf8();
        }
        self.pos += end;
        &rest[..end]
    }

    /// A quoted literal; XPath 1.0 has no escapes inside quotes.
    fn literal(&mut self) -> Result<&'a str, String> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(format!("expected string literal at offset {}", self.pos)),
        };
        let body = &self.rest()[1..];
        let end = body
            .find(quote)
            .ok_or_else(|| "unterminated string literal".to_string())?;
        self.pos += 1 + end + 1;
        Ok(&body[..end])
    }

    /// Consume a predicate body up to its matching ']', honouring quotes.
    fn until_bracket_close(&mut self) -> Result<&'a str, String> {
        let rest = self.rest();
        let mut quote: Option<char> = None;
        let mut depth = 0usize;
        for (i, c) in rest.char_indices() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(c),
                (None, '[') => depth += 1,
                (None, ']') if depth == 0 => {
                    self.pos += i + 1;
                    return Ok(&rest[..i]);
                }
                (None, ']') => depth -= 1,
                _ => {}
            }
        }
        Err("unterminated predicate".to_string())
    }
}
