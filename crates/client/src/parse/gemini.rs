//! text/gemini line grammar.

use starsearch_core::types::{is_text_gemini, is_text_plain};
use starsearch_core::{Document, Line, LineKind, Response};
use url::Url;

use super::{ParseError, fill};

const PREFORMAT_TOGGLE: &str = "```";

/// Parser state carried from one line to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Normal,
    Preformat,
}

/// Parse a Gemini response. Non-text MIME types produce an opaque document.
pub fn parse(response: &Response) -> Result<Document, ParseError> {
    let mime = response.mime_type();
    let doc = Document::opaque(response, mime);

    if is_text_gemini(mime) {
        let base = Url::parse(&response.url).ok();
        let mut state = State::Normal;
        fill(doc, &response.body, |raw, next_link| {
            let (line, next_state) = parse_line(raw, state, base.as_ref(), next_link);
            state = next_state;
            line
        })
    } else if is_text_plain(mime) {
        fill(doc, &response.body, |raw, _| Line::text(raw))
    } else {
        Ok(doc)
    }
}

/// Classify one line. `next_link` is the number a link on this line receives.
pub fn parse_line(raw: &str, state: State, base: Option<&Url>, next_link: usize) -> (Line, State) {
    if let Some(alt) = raw.strip_prefix(PREFORMAT_TOGGLE) {
        return match state {
            State::Normal => (Line::new(LineKind::PreformatStart, raw, alt.trim()), State::Preformat),
            State::Preformat => (Line::new(LineKind::PreformatEnd, raw, ""), State::Normal),
        };
    }

    if state == State::Preformat {
        return (Line::new(LineKind::PreformatText, raw, raw), state);
    }

    let line = if let Some(rest) = raw.strip_prefix("=>") {
        parse_link(raw, rest, base, next_link)
    } else if let Some(text) = raw.strip_prefix("###") {
        Line::new(LineKind::Heading3, raw, text.trim())
    } else if let Some(text) = raw.strip_prefix("##") {
        Line::new(LineKind::Heading2, raw, text.trim())
    } else if let Some(text) = raw.strip_prefix('#') {
        Line::new(LineKind::Heading1, raw, text.trim())
    } else if let Some(text) = raw.strip_prefix("* ") {
        Line::new(LineKind::List, raw, text.trim())
    } else if let Some(text) = raw.strip_prefix('>') {
        Line::new(LineKind::Quote, raw, text.trim())
    } else {
        Line::text(raw)
    };

    (line, state)
}

/// `=> target [display text]`. A line without a target is plain text.
fn parse_link(raw: &str, rest: &str, base: Option<&Url>, next_link: usize) -> Line {
    let mut tokens = rest.split_whitespace();
    let Some(target) = tokens.next() else {
        return Line::text(raw);
    };

    let resolved = match base {
        Some(base) => base.join(target).map(|u| u.to_string()),
        None => Url::parse(target).map(|u| u.to_string()),
    }
    .unwrap_or_else(|_| target.to_string());

    let text = tokens.collect::<Vec<_>>().join(" ");
    let text = if text.is_empty() { target.to_string() } else { text };

    Line::link(raw, text, resolved, next_link)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        parse(&Response::new(20, "text/gemini", body.to_string(), "gemini://example.org/dir/page.gmi")).unwrap()
    }

    #[test]
    fn test_basic_document() {
        let doc = doc("# Title\n=> gemini://x/ Link text\nplain line\n");

        assert_eq!(doc.lines.len(), 3);
        assert_eq!(doc.lines[0].kind, LineKind::Heading1);
        assert_eq!(doc.lines[0].text, "Title");

        let link = &doc.lines[1];
        assert_eq!(link.kind, LineKind::Link);
        assert_eq!(link.text, "Link text");
        assert_eq!(link.url.as_deref(), Some("gemini://x/"));
        assert_eq!(link.link_num, Some(1));

        assert_eq!(doc.lines[2].kind, LineKind::Text);
        assert_eq!(doc.lines[2].text, "plain line");

        assert_eq!(doc.links, vec![link.clone()]);
    }

    #[test]
    fn test_relative_links_resolved() {
        let doc = doc("=> other.gmi\n=> /root.gmi Root\n=> ../up.gmi\n=> gopher://g.org/1/ Gopher\n");
        let urls: Vec<_> = doc.links.iter().map(|l| l.url.clone().unwrap()).collect();
        assert_eq!(
            urls,
            vec![
                "gemini://example.org/dir/other.gmi",
                "gemini://example.org/root.gmi",
                "gemini://example.org/up.gmi",
                "gopher://g.org/1/",
            ]
        );
        assert_eq!(doc.links[0].text, "other.gmi");
        assert_eq!(doc.links[1].text, "Root");
    }

    #[test]
    fn test_link_numbers_sequential() {
        let doc = doc("=> /a A\ntext\n=>\n=> /b  B   c\n");
        assert_eq!(doc.links.len(), 2);
        for (i, link) in doc.links.iter().enumerate() {
            assert_eq!(link.link_num, Some(i + 1));
        }
        assert_eq!(doc.links[1].text, "B c");
        assert_eq!(doc.lines[2].kind, LineKind::Text);
        assert_eq!(doc.lines.iter().filter(|l| l.kind == LineKind::Link).count(), doc.links.len());
    }

    #[test]
    fn test_headings_longest_prefix() {
        let doc = doc("###Three\n## Two\n#One\n#### Four\n");
        assert_eq!(doc.lines[0].kind, LineKind::Heading3);
        assert_eq!(doc.lines[0].text, "Three");
        assert_eq!(doc.lines[1].kind, LineKind::Heading2);
        assert_eq!(doc.lines[2].kind, LineKind::Heading1);
        assert_eq!(doc.lines[3].kind, LineKind::Heading3);
        assert_eq!(doc.lines[3].text, "# Four");
    }

    #[test]
    fn test_list_and_quote() {
        let doc = doc("* item\n*not a list\n> quoted\n>\n");
        assert_eq!(doc.lines[0].kind, LineKind::List);
        assert_eq!(doc.lines[0].text, "item");
        assert_eq!(doc.lines[1].kind, LineKind::Text);
        assert_eq!(doc.lines[2].kind, LineKind::Quote);
        assert_eq!(doc.lines[2].text, "quoted");
        assert_eq!(doc.lines[3].kind, LineKind::Quote);
    }

    #[test]
    fn test_preformat_block() {
        let doc = doc("```rust code\n# not a heading\n=> /not-a-link\n```\n# heading\n");
        let kinds: Vec<_> = doc.lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::PreformatStart,
                LineKind::PreformatText,
                LineKind::PreformatText,
                LineKind::PreformatEnd,
                LineKind::Heading1,
            ]
        );
        assert_eq!(doc.lines[0].text, "rust code");
        assert_eq!(doc.lines[1].text, "# not a heading");
        assert!(doc.links.is_empty());
    }

    #[test]
    fn test_unterminated_preformat() {
        let doc = doc("```\n  indented\n");
        assert_eq!(doc.lines[1].kind, LineKind::PreformatText);
        assert_eq!(doc.lines[1].text, "  indented");
    }

    #[test]
    fn test_blank_lines_preserved() {
        let doc = doc("a\n\n\nb\n");
        assert_eq!(doc.lines.len(), 4);
        assert_eq!(doc.lines[1].kind, LineKind::Text);
        assert_eq!(doc.lines[1].text, "");
    }

    #[test]
    fn test_plain_text_not_parsed_as_gemini() {
        let resp = Response::new(20, "text/plain; charset=utf-8", "# not a heading\n=> /x\n", "gemini://x/");
        let doc = parse(&resp).unwrap();
        assert!(doc.lines.iter().all(|l| l.kind == LineKind::Text));
        assert!(doc.links.is_empty());
        assert_eq!(doc.lines[0].text, "# not a heading");
    }

    #[test]
    fn test_gemini_with_parameters() {
        let resp = Response::new(20, "text/gemini; lang=en", "# Hi\n", "gemini://x/");
        assert_eq!(parse(&resp).unwrap().lines[0].kind, LineKind::Heading1);
    }

    #[test]
    fn test_binary_left_opaque() {
        let resp = Response::new(20, "image/png", vec![0x89, b'P', b'N', b'G', b'\n'], "gemini://x/img.png");
        let doc = parse(&resp).unwrap();
        assert!(doc.lines.is_empty());
        assert!(doc.links.is_empty());
        assert_eq!(doc.raw_body.len(), 5);
        assert_eq!(doc.mime_type, "image/png");
    }

    #[test]
    fn test_non_success_left_opaque() {
        let resp = Response::new(51, "Not found", "", "gemini://x/missing");
        let doc = parse(&resp).unwrap();
        assert!(doc.lines.is_empty());
        assert_eq!(doc.mime_type, "");
    }

    #[test]
    fn test_parse_line_state_threading() {
        let (line, state) = parse_line("``` alt", State::Normal, None, 1);
        assert_eq!(line.kind, LineKind::PreformatStart);
        assert_eq!(state, State::Preformat);

        let (line, state) = parse_line("```", state, None, 1);
        assert_eq!(line.kind, LineKind::PreformatEnd);
        assert_eq!(state, State::Normal);
    }
}
