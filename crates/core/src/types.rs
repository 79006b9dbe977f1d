//! Response and document types shared by clients, parsers and the cache.

use bytes::Bytes;
use serde::Serialize;

use crate::status;

/// MIME type of a Gemini document.
pub const TEXT_GEMINI: &str = "text/gemini";

/// MIME type of a plain text document.
pub const TEXT_PLAIN: &str = "text/plain";

/// MIME type assigned to Gopher menus.
pub const TEXT_GOPHER: &str = "text/gopher";

/// A protocol response. Gopher responses are wrapped with status 20.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Two-digit status, always within 10-69.
    pub status: u8,
    /// MIME type, redirect target or input prompt depending on `status`.
    pub meta: String,
    pub body: Bytes,
    /// Canonical URL the response was fetched from.
    pub url: String,
}

impl Response {
    pub fn new(status: u8, meta: impl Into<String>, body: impl Into<Bytes>, url: impl Into<String>) -> Self {
        Self { status, meta: meta.into(), body: body.into(), url: url.into() }
    }

    pub fn is_success(&self) -> bool {
        status::is_success(i32::from(self.status))
    }

    /// The declared MIME type; empty unless the response is a success.
    pub fn mime_type(&self) -> &str {
        if self.is_success() { &self.meta } else { "" }
    }
}

/// Kind of a parsed document line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Text,
    Link,
    Heading1,
    Heading2,
    Heading3,
    List,
    Quote,
    PreformatStart,
    PreformatText,
    PreformatEnd,
}

impl LineKind {
    pub fn is_heading(self) -> bool {
        matches!(self, LineKind::Heading1 | LineKind::Heading2 | LineKind::Heading3)
    }
}

/// One line of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub kind: LineKind,
    /// Input line with the trailing line terminator removed.
    pub raw: String,
    /// Display text.
    pub text: String,
    /// Resolved target, links only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// 1-based position among the document's links, links only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_num: Option<usize>,
}

impl Line {
    pub fn new(kind: LineKind, raw: impl Into<String>, text: impl Into<String>) -> Self {
        Self { kind, raw: raw.into(), text: text.into(), url: None, link_num: None }
    }

    pub fn text(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self::new(LineKind::Text, raw.clone(), raw)
    }

    pub fn link(raw: impl Into<String>, text: impl Into<String>, url: impl Into<String>, link_num: usize) -> Self {
        Self {
            kind: LineKind::Link,
            raw: raw.into(),
            text: text.into(),
            url: Some(url.into()),
            link_num: Some(link_num),
        }
    }
}

/// A parsed document. Built once per navigation and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub url: String,
    #[serde(skip)]
    pub raw_body: Bytes,
    pub lines: Vec<Line>,
    /// The `Link` lines of `lines`, in document order.
    pub links: Vec<Line>,
    pub mime_type: String,
}

impl Document {
    /// An unparsed document: no lines, body retained.
    pub fn opaque(response: &Response, mime_type: impl Into<String>) -> Self {
        Self {
            url: response.url.clone(),
            raw_body: response.body.clone(),
            lines: Vec::new(),
            links: Vec::new(),
            mime_type: mime_type.into(),
        }
    }

    /// Append a line, tracking it in `links` when it is a link.
    pub fn push(&mut self, line: Line) {
        if line.kind == LineKind::Link {
            self.links.push(line.clone());
        }
        self.lines.push(line);
    }

    /// Number of the next link to be appended.
    pub fn next_link_num(&self) -> usize {
        self.links.len() + 1
    }
}

/// Media type without parameters, lowercased.
pub fn essence(mime: &str) -> String {
    mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

/// `text/gemini`, with or without parameters.
pub fn is_text_gemini(mime: &str) -> bool {
    essence(mime) == TEXT_GEMINI
}

/// `text/plain`, with or without parameters.
pub fn is_text_plain(mime: &str) -> bool {
    essence(mime) == TEXT_PLAIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_only_for_success() {
        let ok = Response::new(20, "text/gemini", Bytes::new(), "gemini://x/");
        assert_eq!(ok.mime_type(), "text/gemini");

        let redirect = Response::new(30, "gemini://y/", Bytes::new(), "gemini://x/");
        assert_eq!(redirect.mime_type(), "");
    }

    #[test]
    fn test_mime_parameters_ignored() {
        assert!(is_text_gemini("text/gemini; charset=utf-8"));
        assert!(is_text_gemini("text/gemini;lang=en"));
        assert!(is_text_plain("TEXT/PLAIN"));
        assert!(!is_text_gemini("text/plain"));
        assert!(!is_text_plain("image/png"));
    }

    #[test]
    fn test_push_tracks_links() {
        let resp = Response::new(20, "text/gemini", Bytes::new(), "gemini://x/");
        let mut doc = Document::opaque(&resp, "text/gemini");
        doc.push(Line::text("hello"));
        assert_eq!(doc.next_link_num(), 1);
        doc.push(Line::link("=> /a", "a", "gemini://x/a", doc.next_link_num()));
        assert_eq!(doc.lines.len(), 2);
        assert_eq!(doc.links.len(), 1);
        assert_eq!(doc.next_link_num(), 2);
    }
}
