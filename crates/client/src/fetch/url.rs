//! URL canonicalization for consistent caching and scheme dispatch.

use starsearch_core::Error;

/// Schemes the fetch pipeline speaks.
pub const SUPPORTED_SCHEMES: &[&str] = &["gemini", "gopher"];

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("missing host")]
    MissingHost,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for Error {
    fn from(err: UrlError) -> Self {
        match err {
            UrlError::UnsupportedScheme(scheme) => Error::UnsupportedScheme(scheme),
            other => Error::InvalidUrl(other.to_string()),
        }
    }
}

/// Canonicalize a URL string for consistent caching and dispatch.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to `default_scheme` if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Empty path becomes `/`
/// 6. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str, default_scheme: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("{default_scheme}://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
        return Err(UrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    let host = match parsed.host_str() {
        Some(host) if !host.is_empty() => host.to_lowercase(),
        _ => return Err(UrlError::MissingHost),
    };
    parsed
        .set_host(Some(&host))
        .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    parsed.set_fragment(None);

    if parsed.path().is_empty() {
        parsed.set_path("/");
    }

    Ok(parsed)
}

/// Hostname without port or IPv6 brackets, as used for TOFU and SNI.
pub fn host_name(url: &url::Url) -> Result<String, UrlError> {
    match url.host() {
        Some(url::Host::Domain(domain)) => Ok(domain.to_string()),
        Some(url::Host::Ipv4(addr)) => Ok(addr.to_string()),
        Some(url::Host::Ipv6(addr)) => Ok(addr.to_string()),
        None => Err(UrlError::MissingHost),
    }
}
