//! Document parsers: turn a [`Response`] into a line-structured [`Document`].
//!
//! The grammar is picked by URL scheme, then gated by MIME type:
//! - gemini: `text/gemini` gets the full grammar, `text/plain` one Text line
//!   per input line, anything else stays opaque
//! - gopher: `text/gopher` menus, `text/plain` files, anything else opaque

pub mod gemini;
pub mod gopher;

use std::borrow::Cow;

use starsearch_core::{Document, Line, Response};

/// Longest accepted input line, terminator included.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Parsing stopped early. `document` holds every line parsed before the failure.
#[derive(Debug, thiserror::Error)]
#[error("PARSE_ERROR: {reason} (after {} lines)", .document.lines.len())]
pub struct ParseError {
    pub reason: String,
    pub document: Box<Document>,
}

/// Parse a response with the grammar its URL scheme calls for.
pub fn parse(response: &Response) -> Result<Document, ParseError> {
    if response.url.starts_with("gopher://") {
        gopher::parse(response)
    } else {
        gemini::parse(response)
    }
}

/// Display title: first non-empty heading, else the URL host, else the URL.
pub fn title(doc: &Document) -> String {
    let heading = doc
        .lines
        .iter()
        .find(|line| line.kind.is_heading() && !line.text.is_empty());
    if let Some(line) = heading {
        return line.text.clone();
    }

    match url::Url::parse(&doc.url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => doc.url.clone(),
        },
        Err(_) => doc.url.clone(),
    }
}

/// Split `body` into lines on `\n`, dropping one trailing `\r` per line.
///
/// A trailing terminator does not produce an empty final line. Invalid
/// UTF-8 is replaced rather than rejected.
pub(crate) struct ScanLines<'a> {
    rest: &'a [u8],
    line_no: usize,
}

impl<'a> ScanLines<'a> {
    pub(crate) fn new(body: &'a [u8]) -> Self {
        Self { rest: body, line_no: 0 }
    }
}

impl<'a> Iterator for ScanLines<'a> {
    type Item = Result<Cow<'a, str>, String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        self.line_no += 1;

        let rest = self.rest;
        let (line, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(i) => (&rest[..i], i + 1),
            None => (rest, rest.len()),
        };

        if consumed > MAX_LINE_LEN {
            self.rest = &[];
            return Some(Err(format!("line {} exceeds {} bytes", self.line_no, MAX_LINE_LEN)));
        }
        self.rest = &rest[consumed..];

        let line = line.strip_suffix(b"\r").unwrap_or(line);
        Some(Ok(String::from_utf8_lossy(line)))
    }
}

/// Run `body` through `parse_line`, collecting into `doc`.
pub(crate) fn fill<F>(mut doc: Document, body: &[u8], mut parse_line: F) -> Result<Document, ParseError>
where
    F: FnMut(&str, usize) -> Line,
{
    for line in ScanLines::new(body) {
        match line {
            Ok(line) => {
                let next = doc.next_link_num();
                doc.push(parse_line(&line, next));
            }
            Err(reason) => return Err(ParseError { reason, document: Box::new(doc) }),
        }
    }
    Ok(doc)
}
