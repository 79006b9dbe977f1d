//! gopher:// client: plain TCP, selector in, bytes out until EOF.
//!
//! Gopher has no status codes; every response is wrapped as a status 20
//! with a MIME type derived from the item type in the URL path.

use std::time::{Duration, Instant};

use percent_encoding::percent_decode_str;
use starsearch_core::types::{TEXT_GOPHER, TEXT_PLAIN};
use starsearch_core::{Error, Response};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::url::{canonicalize, host_name};
use super::{FetchConfig, read_to_limit};

pub const DEFAULT_PORT: u16 = 70;

/// Item type assumed for an empty path.
pub const DEFAULT_ITEM_TYPE: char = '1';

pub struct GopherClient {
    timeout: Duration,
    max_bytes: usize,
}

impl GopherClient {
    pub fn new(config: &FetchConfig) -> Self {
        Self { timeout: config.timeout, max_bytes: config.max_bytes }
    }

    /// Fetch a gopher:// URL of the form `gopher://host:port/<type><selector>`.
    pub async fn fetch(&self, url_str: &str) -> Result<Response, Error> {
        let start = Instant::now();
        let url = canonicalize(url_str, "gopher")?;

        if url.scheme() != "gopher" {
            return Err(Error::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = host_name(&url)?;
        let port = url.port().unwrap_or(DEFAULT_PORT);
        let (item_type, selector) = split_path(url.path());

        let request = match (item_type, url.query()) {
            ('7', Some(query)) => format!("{selector}\t{}\r\n", percent_decode_str(query).decode_utf8_lossy()),
            _ => format!("{selector}\r\n"),
        };

        let body = tokio::time::timeout(self.timeout, self.exchange(&host, port, &request))
            .await
            .map_err(|_| Error::FetchTimeout(format!("{} after {}ms", url, self.timeout.as_millis())))??;

        tracing::debug!("gopher {} ({} bytes, {}ms)", url, body.len(), start.elapsed().as_millis());

        Ok(Response::new(20, mime_for_item_type(item_type), body, url.as_str()))
    }

    async fn exchange(&self, host: &str, port: u16, request: &str) -> Result<Vec<u8>, Error> {
        let mut stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| Error::Connect(format!("{host}:{port}: {e}")))?;

        stream.write_all(request.as_bytes()).await?;
        stream.flush().await?;

        read_to_limit(&mut stream, self.max_bytes).await
    }
}

/// Split a URL path into its item type and decoded selector.
pub fn split_path(path: &str) -> (char, String) {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let trimmed: &str = decoded.strip_prefix('/').unwrap_or(&*decoded);
    let mut chars = trimmed.chars();

    match chars.next() {
        Some(item_type) => (item_type, chars.as_str().to_string()),
        None => (DEFAULT_ITEM_TYPE, String::new()),
    }
}

/// MIME type a response of the given item type is wrapped with.
pub fn mime_for_item_type(item_type: char) -> &'static str {
    match item_type {
        '0' => TEXT_PLAIN,
        '1' => TEXT_GOPHER,
        'g' | 'I' => "image/gif",
        'h' => "text/html",
        's' => "audio/basic",
        '5' | '9' => "application/octet-stream",
        _ => TEXT_GOPHER,
    }
}

/// Human-readable name of an item type.
pub fn item_type_description(item_type: char) -> &'static str {
    match item_type {
        '0' => "Text file",
        '1' => "Directory",
        '2' => "CSO phone book",
        '3' => "Error",
        '4' => "BinHex file",
        '5' => "DOS archive",
        '6' => "UUEncoded file",
        '7' => "Search",
        '8' => "Telnet session",
        '9' => "Binary file",
        '+' => "Redundant server",
        'g' => "GIF image",
        'I' => "Image",
        'T' => "TN3270 session",
        'h' => "HTML",
        'i' => "Info",
        's' => "Sound",
        _ => "Unknown",
    }
}
