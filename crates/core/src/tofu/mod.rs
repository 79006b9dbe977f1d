//! Trust-on-first-use certificate trust for gemini:// hosts.
//!
//! The ledger maps a hostname (without port) to the SHA-256 fingerprint of
//! the DER certificate it presented, plus its validity window. Raw
//! certificates are never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::Error;

mod store;

pub use store::TofuStore;

/// Ledger record for one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub fingerprint: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub subject: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

/// Leaf certificate presented during a TLS handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCertificate {
    /// DER encoding.
    pub raw: Vec<u8>,
    pub subject: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl PeerCertificate {
    /// Decode the metadata TOFU needs from a DER certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let (_, cert) = X509Certificate::from_der(der).map_err(|e| Error::InvalidCertificate(e.to_string()))?;
        let validity = cert.validity();

        Ok(Self {
            raw: der.to_vec(),
            subject: cert.subject().to_string(),
            not_before: from_unix(validity.not_before.timestamp())?,
            not_after: from_unix(validity.not_after.timestamp())?,
        })
    }

    /// Hex SHA-256 of the DER bytes.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.raw))
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.not_before && now <= self.not_after
    }
}

fn from_unix(secs: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::InvalidCertificate(format!("validity timestamp out of range: {secs}")))
}

/// Decides whether to trust certificates the ledger has not approved yet.
///
/// Implemented by the front end; called with the ledger lock held.
pub trait TrustDecider: Send + Sync {
    /// First certificate seen for `host`.
    fn decide_new_certificate(&self, host: &str, cert: &PeerCertificate) -> bool;

    /// `host` presented a certificate whose fingerprint differs from `previous`.
    fn decide_certificate_change(&self, host: &str, previous: &CertificateInfo, presented: &PeerCertificate) -> bool;
}

/// Built-in trust policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustPolicy {
    /// Accept new and changed certificates.
    #[default]
    AcceptAll,
    /// Accept new certificates, refuse changed ones.
    PinFirst,
}

impl TrustDecider for TrustPolicy {
    fn decide_new_certificate(&self, _host: &str, _cert: &PeerCertificate) -> bool {
        true
    }

    fn decide_certificate_change(&self, host: &str, previous: &CertificateInfo, presented: &PeerCertificate) -> bool {
        tracing::warn!(
            host,
            previous = %format_fingerprint(&previous.fingerprint),
            presented = %format_fingerprint(&presented.fingerprint()),
            policy = ?self,
            "certificate changed since first use"
        );
        matches!(self, TrustPolicy::AcceptAll)
    }
}

/// Format a hex fingerprint as colon-separated byte pairs.
pub fn format_fingerprint(fingerprint: &str) -> String {
    fingerprint
        .as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_der(not_before: (i32, u8, u8), not_after: (i32, u8, u8)) -> Vec<u8> {
        let mut params = rcgen::CertificateParams::new(vec!["example.org".to_string()]).unwrap();
        params.not_before = rcgen::date_time_ymd(not_before.0, not_before.1, not_before.2);
        params.not_after = rcgen::date_time_ymd(not_after.0, not_after.1, not_after.2);
        let key = rcgen::KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap().der().to_vec()
    }

    #[test]
    fn test_from_der_reads_validity() {
        let der = make_der((2020, 1, 1), (2030, 1, 1));
        let cert = PeerCertificate::from_der(&der).unwrap();

        assert_eq!(cert.not_before.to_rfc3339(), "2020-01-01T00:00:00+00:00");
        assert_eq!(cert.not_after.to_rfc3339(), "2030-01-01T00:00:00+00:00");
        assert_eq!(cert.raw, der);
    }

    #[test]
    fn test_fingerprint_is_sha256_of_der() {
        let der = make_der((2020, 1, 1), (2030, 1, 1));
        let cert = PeerCertificate::from_der(&der).unwrap();
        assert_eq!(cert.fingerprint(), hex::encode(Sha256::digest(&der)));
        assert_eq!(cert.fingerprint().len(), 64);
    }

    #[test]
    fn test_from_der_rejects_garbage() {
        let result = PeerCertificate::from_der(b"not a certificate");
        assert!(matches!(result, Err(Error::InvalidCertificate(_))));
    }

    #[test]
    fn test_format_fingerprint() {
        assert_eq!(format_fingerprint("3af289"), "3a:f2:89");
        assert_eq!(format_fingerprint(""), "");
    }

    #[test]
    fn test_pin_first_refuses_changes() {
        let der = make_der((2020, 1, 1), (2030, 1, 1));
        let cert = PeerCertificate::from_der(&der).unwrap();
        let info = CertificateInfo {
            fingerprint: "00".repeat(32),
            first_seen: Utc::now(),
            last_seen: Utc::now(),
            subject: cert.subject.clone(),
            not_before: cert.not_before,
            not_after: cert.not_after,
        };

        assert!(TrustPolicy::PinFirst.decide_new_certificate("example.org", &cert));
        assert!(!TrustPolicy::PinFirst.decide_certificate_change("example.org", &info, &cert));
        assert!(TrustPolicy::AcceptAll.decide_certificate_change("example.org", &info, &cert));
    }
}
