//! Unified error types for starsearch.
//!
//! Every display string starts with a stable code so front ends can match
//! on the prefix without depending on the variant layout.

use std::io;

/// Unified error types for fetching, trust decisions and persistence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid URL or URL too long for the protocol.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Scheme the client cannot speak.
    #[error("UNSUPPORTED_SCHEME: {0}")]
    UnsupportedScheme(String),

    /// DNS resolution or TCP connect failed.
    #[error("CONNECT_FAILED: {0}")]
    Connect(String),

    /// TLS setup or handshake failed.
    #[error("TLS_ERROR: {0}")]
    Tls(String),

    /// Connect + read deadline elapsed.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Response body exceeded the configured limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Network I/O failed after the connection was established.
    #[error("IO_ERROR: {0}")]
    Io(String),

    /// Response header is not `<two digits>[ <meta>]\r\n`.
    #[error("MALFORMED_HEADER: {0}")]
    MalformedHeader(String),

    /// Status code outside the 10-69 range.
    #[error("UNEXPECTED_STATUS: {0}")]
    UnexpectedStatus(i32),

    /// Presented certificate is outside its validity window.
    #[error("CERT_EXPIRED: certificate for {host} is outside its validity window")]
    CertificateExpired { host: String },

    /// Presented certificate differs from the trusted one and the change was refused.
    #[error("CERT_CHANGED: certificate for {host} has changed since first use")]
    CertificateChanged { host: String },

    /// New certificate refused by the trust decider.
    #[error("CERT_REJECTED: certificate for {host} rejected")]
    CertificateRejected { host: String },

    /// Certificate could not be decoded.
    #[error("CERT_INVALID: {0}")]
    InvalidCertificate(String),

    /// TLS session completed without a peer certificate.
    #[error("CERT_MISSING: no peer certificate presented by {0}")]
    MissingCertificate(String),

    /// Reading or writing the trust ledger failed.
    #[error("PERSIST_ERROR: {0}")]
    Persist(String),
}

impl Error {
    /// True for errors raised by a trust decision; the body must never be used.
    pub fn is_trust_failure(&self) -> bool {
        matches!(
            self,
            Error::CertificateExpired { .. }
                | Error::CertificateChanged { .. }
                | Error::CertificateRejected { .. }
                | Error::InvalidCertificate(_)
                | Error::MissingCertificate(_)
        )
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => Error::FetchTimeout(err.to_string()),
            _ => Error::Io(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Persist(err.to_string())
    }
}
