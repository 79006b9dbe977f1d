//! Fetch pipeline for gemini:// and gopher:// with page caching.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `gemini`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Dispatch
//! - `gemini` → TLS client gated by the TOFU store
//! - `gopher` → plain TCP client
//! - anything else is refused
//!
//! ### Limits
//! - Deadline per phase (default: 30s): connect+handshake, then request+read
//! - The gemini trust decision sits between the two phases, outside both
//! - Max body bytes: 5MB (configurable)
//! - No retries; a fetch abandoned by the caller still runs to completion

pub mod gemini;
pub mod gopher;
pub mod tls;
pub mod url;

use std::sync::Arc;
use std::time::Duration;

use starsearch_core::{AppConfig, Document, Error, PageCache, Response, TofuStore, status};
use tokio::io::{AsyncRead, AsyncReadExt};

pub use gemini::GeminiClient;
pub use gopher::GopherClient;
pub use url::{UrlError, canonicalize};

use crate::parse::{self, ParseError};

/// Configuration for the fetch clients.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Deadline for each fetch phase (default: 30s)
    pub timeout: Duration,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), max_bytes: 5 * 1024 * 1024 }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { timeout: config.timeout(), max_bytes: config.max_bytes }
    }
}

/// Failure of [`FetchClient::load`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] Error),

    /// The server answered with a non-success status.
    #[error("STATUS_{status}: {message}: {meta}")]
    Status { status: u8, message: String, meta: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Scheme-dispatching client with page caching.
///
/// The TOFU store and page cache are shared process-wide; build one
/// `FetchClient` and hand out references to every tab.
pub struct FetchClient {
    gemini: GeminiClient,
    gopher: GopherClient,
    cache: Arc<PageCache>,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig, tofu: Arc<TofuStore>, cache: Arc<PageCache>) -> Result<Self, Error> {
        let gemini = GeminiClient::new(tofu, &config)?;
        let gopher = GopherClient::new(&config);
        Ok(Self { gemini, gopher, cache, config })
    }

    /// Fetch a URL, serving fresh cached responses without touching the network.
    pub async fn fetch(&self, url_str: &str) -> Result<Response, Error> {
        let url = canonicalize(url_str, "gemini")?;

        if let Some(cached) = self.cache.get(url.as_str()) {
            tracing::debug!("cache hit for {}", url);
            return Ok(cached);
        }
        tracing::debug!("cache miss for {}", url);

        let response = match url.scheme() {
            "gemini" => self.gemini.fetch(url.as_str()).await?,
            "gopher" => self.gopher.fetch(url.as_str()).await?,
            other => return Err(Error::UnsupportedScheme(other.to_string())),
        };

        if response.is_success() {
            self.cache.set(url.as_str(), &response, Duration::ZERO);
        }

        Ok(response)
    }

    /// Drop any cached copy, then fetch.
    pub async fn reload(&self, url_str: &str) -> Result<Response, Error> {
        let url = canonicalize(url_str, "gemini")?;
        self.cache.invalidate(url.as_str());
        self.fetch(url.as_str()).await
    }

    /// Fetch and parse a URL that is expected to succeed.
    pub async fn load(&self, url_str: &str) -> Result<Document, LoadError> {
        let response = self.fetch(url_str).await?;

        if !response.is_success() {
            return Err(LoadError::Status {
                status: response.status,
                message: status::status_message(i32::from(response.status)),
                meta: response.meta,
            });
        }

        Ok(parse::parse(&response)?)
    }

    /// Get reference to the page cache.
    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

/// Read until EOF, failing once more than `limit` bytes arrive.
///
/// A peer that closes a TLS session without `close_notify` ends the body
/// rather than failing it; many Gemini servers do this.
pub(crate) async fn read_to_limit<S>(stream: &mut S, limit: usize) -> Result<Vec<u8>, Error>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 8192];

    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };

        if buf.len() + n > limit {
            return Err(Error::FetchTooLarge(format!("response exceeds {limit} bytes")));
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { timeout_ms: 1500, max_bytes: 42, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.max_bytes, 42);
    }

    #[tokio::test]
    async fn test_read_to_limit() {
        let mut data: &[u8] = b"hello world";
        let body = read_to_limit(&mut data, 64).await.unwrap();
        assert_eq!(body, b"hello world");

        let mut data: &[u8] = b"hello world";
        let result = read_to_limit(&mut data, 5).await;
        assert!(matches!(result, Err(Error::FetchTooLarge(_))));
    }

    #[tokio::test]
    async fn test_fetch_rejects_unsupported_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let tofu = Arc::new(
            TofuStore::open(dir.path().join("known_hosts.json"), Arc::new(starsearch_core::TrustPolicy::AcceptAll))
                .unwrap(),
        );
        let cache = Arc::new(PageCache::new(1024, Duration::from_secs(60)));
        let client = FetchClient::new(FetchConfig::default(), tofu, cache).unwrap();

        let result = client.fetch("https://example.org/").await;
        assert!(matches!(result, Err(Error::UnsupportedScheme(s)) if s == "https"));
    }

    #[tokio::test]
    async fn test_fetch_serves_cached_response() {
        let dir = tempfile::tempdir().unwrap();
        let tofu = Arc::new(
            TofuStore::open(dir.path().join("known_hosts.json"), Arc::new(starsearch_core::TrustPolicy::AcceptAll))
                .unwrap(),
        );
        let cache = Arc::new(PageCache::new(1024, Duration::from_secs(60)));
        let cached = Response::new(20, "text/gemini", "# Cached\n", "gemini://unreachable.invalid/");
        cache.set("gemini://unreachable.invalid/", &cached, Duration::ZERO);

        let client = FetchClient::new(FetchConfig::default(), tofu, Arc::clone(&cache)).unwrap();
        let response = client.fetch("unreachable.invalid").await.unwrap();
        assert_eq!(response, cached);

        let doc = client.load("gemini://unreachable.invalid/#top").await.unwrap();
        assert_eq!(parse::title(&doc), "Cached");
    }
}
