//! Plain-text and JSON rendering of parsed documents.

use serde::Serialize;
use starsearch_client::title;
use starsearch_core::{Document, Line, LineKind};

/// JSON shape printed by `--json`.
#[derive(Debug, Serialize)]
pub struct PageOutput<'a> {
    pub url: &'a str,
    pub title: String,
    pub mime_type: &'a str,
    pub lines: &'a [Line],
    pub link_count: usize,
}

impl<'a> PageOutput<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self {
            url: &doc.url,
            title: title(doc),
            mime_type: &doc.mime_type,
            lines: &doc.lines,
            link_count: doc.links.len(),
        }
    }
}

/// Render one line for a terminal.
pub fn line(line: &Line) -> String {
    match line.kind {
        LineKind::Heading1 => format!("# {}", line.text),
        LineKind::Heading2 => format!("## {}", line.text),
        LineKind::Heading3 => format!("### {}", line.text),
        LineKind::Link => format!(
            "[{}] {} => {}",
            line.link_num.unwrap_or_default(),
            line.text,
            line.url.as_deref().unwrap_or_default()
        ),
        LineKind::List => format!("  • {}", line.text),
        LineKind::Quote => format!("  > {}", line.text),
        LineKind::PreformatStart | LineKind::PreformatEnd => String::from("```"),
        LineKind::PreformatText | LineKind::Text => line.text.clone(),
    }
}

/// Render a whole document, one output line per input line.
pub fn document(doc: &Document) -> String {
    let mut out = String::new();
    for l in &doc.lines {
        out.push_str(&line(l));
        out.push('\n');
    }
    out
}
