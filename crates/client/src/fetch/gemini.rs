//! gemini:// client: one TLS request per fetch, gated by the TOFU store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use rustls::pki_types::ServerName;
use starsearch_core::types::TEXT_GEMINI;
use starsearch_core::{Error, PeerCertificate, Response, TofuStore, status};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use super::url::{canonicalize, host_name};
use super::{FetchConfig, read_to_limit, tls};

pub const DEFAULT_PORT: u16 = 1965;

/// Longest request URL a server must accept.
pub const MAX_URL_LEN: usize = 1024;

const MAX_META_LEN: usize = 1024;
const MAX_HEADER_LEN: usize = 2 + 1 + MAX_META_LEN + 2;

pub struct GeminiClient {
    connector: TlsConnector,
    tofu: Arc<TofuStore>,
    timeout: Duration,
    max_bytes: usize,
}

impl GeminiClient {
    pub fn new(tofu: Arc<TofuStore>, config: &FetchConfig) -> Result<Self, Error> {
        let connector = TlsConnector::from(tls::client_config()?);
        Ok(Self { connector, tofu, timeout: config.timeout, max_bytes: config.max_bytes })
    }

    /// Fetch a gemini:// URL.
    ///
    /// Trust is decided before the request line is written, so a refused
    /// certificate never sees the URL and no body is read from it.
    /// Connect+handshake and request+read each get their own deadline;
    /// time spent in the trust decider counts against neither.
    pub async fn fetch(&self, url_str: &str) -> Result<Response, Error> {
        let start = Instant::now();
        let url = canonicalize(url_str, "gemini")?;

        if url.scheme() != "gemini" {
            return Err(Error::UnsupportedScheme(url.scheme().to_string()));
        }
        if url.as_str().len() > MAX_URL_LEN {
            return Err(Error::InvalidUrl(format!("request URL exceeds {MAX_URL_LEN} bytes")));
        }

        let host = host_name(&url)?;
        let port = url.port().unwrap_or(DEFAULT_PORT);

        let timed_out = |_: tokio::time::error::Elapsed| {
            Error::FetchTimeout(format!("{} after {}ms", url, self.timeout.as_millis()))
        };

        let mut stream = tokio::time::timeout(self.timeout, self.connect(&host, port))
            .await
            .map_err(timed_out)??;
        self.check_trust(&host, &stream).await?;
        let response = tokio::time::timeout(self.timeout, self.request(&mut stream, url.as_str()))
            .await
            .map_err(timed_out)??;

        tracing::debug!(
            "gemini {} -> {} {} ({} bytes, {}ms)",
            url,
            response.status,
            response.meta,
            response.body.len(),
            start.elapsed().as_millis()
        );

        Ok(response)
    }

    async fn connect(&self, host: &str, port: u16) -> Result<TlsStream<TcpStream>, Error> {
        let tcp = TcpStream::connect((host, port))
            .await
            .map_err(|e| Error::Connect(format!("{host}:{port}: {e}")))?;

        let server_name =
            ServerName::try_from(host.to_string()).map_err(|e| Error::InvalidUrl(format!("{host}: {e}")))?;
        self.connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| Error::Tls(format!("{host}:{port}: {e}")))
    }

    /// Not deadline-bounded; the decider may be waiting on the user.
    async fn check_trust(&self, host: &str, stream: &TlsStream<TcpStream>) -> Result<(), Error> {
        let leaf = stream
            .get_ref()
            .1
            .peer_certificates()
            .and_then(|certs| certs.first())
            .ok_or_else(|| Error::MissingCertificate(host.to_string()))?;
        let cert = PeerCertificate::from_der(leaf.as_ref())?;

        // The decider may prompt and the store writes to disk.
        let tofu = Arc::clone(&self.tofu);
        let owned_host = host.to_string();
        tokio::task::spawn_blocking(move || tofu.verify(&owned_host, &cert))
            .await
            .map_err(|e| Error::Io(format!("trust check aborted: {e}")))?
    }

    async fn request(&self, stream: &mut TlsStream<TcpStream>, url: &str) -> Result<Response, Error> {
        stream.write_all(format!("{url}\r\n").as_bytes()).await?;
        stream.flush().await?;

        let raw = read_to_limit(stream, self.max_bytes.saturating_add(MAX_HEADER_LEN)).await?;
        let (status, meta, offset) = parse_header(&raw)?;

        let body = Bytes::from(raw).slice(offset..);
        if body.len() > self.max_bytes {
            return Err(Error::FetchTooLarge(format!("response exceeds {} bytes", self.max_bytes)));
        }

        Ok(Response::new(status, meta, body, url))
    }
}

/// Parse `<two digits>[ <meta>]\r\n` at the start of `raw`.
///
/// Returns the status, the meta and the offset of the body. A success
/// with an empty meta defaults to `text/gemini`.
pub fn parse_header(raw: &[u8]) -> Result<(u8, String, usize), Error> {
    let window = &raw[..raw.len().min(MAX_HEADER_LEN)];
    let newline = window
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| Error::MalformedHeader("header line not terminated".into()))?;

    let line = window[..newline].strip_suffix(b"\r").unwrap_or(&window[..newline]);
    let line = std::str::from_utf8(line).map_err(|_| Error::MalformedHeader("header is not UTF-8".into()))?;

    let digits = line.as_bytes();
    if digits.len() < 2 || !digits[0].is_ascii_digit() || !digits[1].is_ascii_digit() {
        return Err(Error::MalformedHeader(format!("bad status in {line:?}")));
    }
    let code = (digits[0] - b'0') * 10 + (digits[1] - b'0');
    if status::StatusCategory::from_code(i32::from(code)).is_none() {
        return Err(Error::UnexpectedStatus(i32::from(code)));
    }

    let rest = &line[2..];
    let meta = match rest.strip_prefix(' ') {
        Some(meta) => meta.trim(),
        None if rest.is_empty() => "",
        None => return Err(Error::MalformedHeader(format!("missing space after status in {line:?}"))),
    };
    if meta.len() > MAX_META_LEN {
        return Err(Error::MalformedHeader(format!("meta exceeds {MAX_META_LEN} bytes")));
    }

    let meta = if meta.is_empty() && status::is_success(i32::from(code)) { TEXT_GEMINI } else { meta };

    Ok((code, meta.to_string(), newline + 1))
}
