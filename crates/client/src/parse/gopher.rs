//! Gopher menu grammar: `<type><display>\t<selector>\t<host>\t<port>`.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use starsearch_core::types::{TEXT_GOPHER, essence, is_text_plain};
use starsearch_core::{Document, Line, LineKind, Response};

use super::{ParseError, fill};
use crate::fetch::gopher::DEFAULT_PORT;

/// Selector bytes that would otherwise be read as URL syntax. The fetch
/// client decodes the path back into the exact selector.
const SELECTOR: &AsciiSet = &CONTROLS.add(b' ').add(b'%').add(b'?').add(b'#');

/// Parse a Gopher response: menus get the menu grammar, text files are
/// split into lines and anything else stays opaque.
pub fn parse(response: &Response) -> Result<Document, ParseError> {
    let doc = Document::opaque(response, response.meta.as_str());

    if essence(&response.meta) == TEXT_GOPHER {
        fill(doc, &response.body, parse_menu_line)
    } else if is_text_plain(&response.meta) {
        fill(doc, &response.body, |raw, _| Line::text(raw))
    } else {
        Ok(doc)
    }
}

/// Classify one menu line. `next_link` is the number a link on this line receives.
pub fn parse_menu_line(raw: &str, next_link: usize) -> Line {
    let mut chars = raw.chars();
    let Some(item_type) = chars.next() else {
        return Line::new(LineKind::Text, raw, "");
    };
    if raw == "." {
        return Line::new(LineKind::Text, raw, "");
    }

    let fields: Vec<&str> = chars.as_str().split('\t').collect();
    let display = fields.first().copied().unwrap_or_default();

    if fields.len() < 3 || matches!(item_type, 'i' | '3') {
        return Line::new(LineKind::Text, raw, display);
    }

    let selector = fields[1];
    let host = fields[2];
    if host.is_empty() {
        return Line::new(LineKind::Text, raw, display);
    }
    let port = match fields.get(3) {
        Some(port) if !port.is_empty() => (*port).to_string(),
        _ => DEFAULT_PORT.to_string(),
    };

    let target = match (item_type, selector.strip_prefix("URL:")) {
        ('h', Some(external)) => external.to_string(),
        _ => format!("gopher://{host}:{port}/{item_type}{}", utf8_percent_encode(selector, SELECTOR)),
    };

    Line::link(raw, display, target, next_link)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(body: &str) -> Document {
        parse(&Response::new(20, "text/gopher", body.to_string(), "gopher://example.org/")).unwrap()
    }

    #[test]
    fn test_directory_link() {
        let doc = menu("1Home\t/\texample.org\t70\r\n");
        assert_eq!(doc.lines.len(), 1);

        let link = &doc.lines[0];
        assert_eq!(link.kind, LineKind::Link);
        assert_eq!(link.text, "Home");
        assert_eq!(link.url.as_deref(), Some("gopher://example.org:70/1/"));
        assert_eq!(link.link_num, Some(1));
        assert_eq!(doc.links.len(), 1);
    }

    #[test]
    fn test_info_and_error_lines_never_link() {
        let doc = menu("iWelcome\tfake\t(NULL)\t0\r\n3Oops\t\terror.host\t1\r\n");
        assert!(doc.links.is_empty());
        assert_eq!(doc.lines[0].kind, LineKind::Text);
        assert_eq!(doc.lines[0].text, "Welcome");
        assert_eq!(doc.lines[1].text, "Oops");
    }

    #[test]
    fn test_item_types_become_links() {
        let doc = menu(concat!(
            "0About\t/about.txt\thost\t70\n",
            "7Search\t/search\thost\t7070\n",
            "9Bin\t/f.bin\thost\t70\n",
            "IPic\t/p.png\thost\t70\n",
            "XOdd\t/x\thost\t70\n",
        ));
        let urls: Vec<_> = doc.links.iter().map(|l| l.url.clone().unwrap()).collect();
        assert_eq!(
            urls,
            vec![
                "gopher://host:70/0/about.txt",
                "gopher://host:7070/7/search",
                "gopher://host:70/9/f.bin",
                "gopher://host:70/I/p.png",
                "gopher://host:70/X/x",
            ]
        );
        for (i, link) in doc.links.iter().enumerate() {
            assert_eq!(link.link_num, Some(i + 1));
        }
    }

    #[test]
    fn test_html_links() {
        let doc = menu("hWeb\tURL:https://example.com/\thost\t70\nhLocal\t/page.html\thost\t70\n");
        assert_eq!(doc.links[0].url.as_deref(), Some("https://example.com/"));
        assert_eq!(doc.links[1].url.as_deref(), Some("gopher://host:70/h/page.html"));
    }

    #[test]
    fn test_missing_port_defaults() {
        let doc = menu("1Dir\t/dir\thost\t\n1Dir2\t/dir2\thost\n");
        assert_eq!(doc.links[0].url.as_deref(), Some("gopher://host:70/1/dir"));
        assert_eq!(doc.links[1].url.as_deref(), Some("gopher://host:70/1/dir2"));
    }

    #[test]
    fn test_incomplete_line_demoted_to_text() {
        let doc = menu("1Broken\t/only-selector\n");
        assert!(doc.links.is_empty());
        assert_eq!(doc.lines[0].kind, LineKind::Text);
        assert_eq!(doc.lines[0].text, "Broken");
    }

    #[test]
    fn test_empty_host_demoted_to_text() {
        let doc = menu("1Nowhere\t/sel\t\t70\n");
        assert!(doc.links.is_empty());
        assert_eq!(doc.lines[0].kind, LineKind::Text);
        assert_eq!(doc.lines[0].text, "Nowhere");
    }

    #[test]
    fn test_selector_escaped_in_link() {
        let doc = menu("0Lookup\t/cgi-bin/lookup?word=rust#1\thost\t70\n0Spaced\t/a b/100%.txt\thost\t70\n");
        assert_eq!(doc.links[0].url.as_deref(), Some("gopher://host:70/0/cgi-bin/lookup%3Fword=rust%231"));
        assert_eq!(doc.links[1].url.as_deref(), Some("gopher://host:70/0/a%20b/100%25.txt"));
    }

    #[test]
    fn test_terminator_and_blank_lines() {
        let doc = menu("iHello\t\t\t\r\n\r\n.\r\n");
        assert_eq!(doc.lines.len(), 3);
        assert_eq!(doc.lines[1].text, "");
        assert_eq!(doc.lines[2].kind, LineKind::Text);
        assert_eq!(doc.lines[2].text, "");
        assert_eq!(doc.lines[2].raw, ".");
    }

    #[test]
    fn test_text_file() {
        let resp = Response::new(20, "text/plain", "1Not\ta\tmenu\t70\n.\n", "gopher://example.org/0/file.txt");
        let doc = parse(&resp).unwrap();
        assert!(doc.links.is_empty());
        assert_eq!(doc.lines[0].text, "1Not\ta\tmenu\t70");
        assert_eq!(doc.lines[1].text, ".");
    }

    #[test]
    fn test_binary_opaque() {
        let resp = Response::new(20, "image/gif", vec![b'G', b'I', b'F', b'\n'], "gopher://example.org/g/pic.gif");
        let doc = parse(&resp).unwrap();
        assert!(doc.lines.is_empty());
        assert_eq!(doc.raw_body.len(), 4);
    }
}
