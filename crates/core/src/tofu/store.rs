//! Persistent TOFU ledger.
//!
//! Every `verify` runs its read-modify-persist sequence under one exclusive
//! lock, so trust decisions on different hosts are serialized globally.
//! Persistence is write-through; failures inside `verify` are logged and
//! swallowed to keep browsing available.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use super::{CertificateInfo, PeerCertificate, TrustDecider};
use crate::Error;
use crate::clock::{Clock, SystemClock};

type Ledger = BTreeMap<String, CertificateInfo>;

/// Trust ledger keyed by hostname.
pub struct TofuStore {
    certs: RwLock<Ledger>,
    path: PathBuf,
    decider: Arc<dyn TrustDecider>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TofuStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TofuStore")
            .field("path", &self.path)
            .field("hosts", &self.list_hosts().len())
            .finish()
    }
}

impl TofuStore {
    /// Open the ledger at `path`. A missing file is an empty ledger.
    pub fn open(path: impl Into<PathBuf>, decider: Arc<dyn TrustDecider>) -> Result<Self, Error> {
        Self::with_clock(path, decider, Arc::new(SystemClock))
    }

    pub fn with_clock(
        path: impl Into<PathBuf>, decider: Arc<dyn TrustDecider>, clock: Arc<dyn Clock>,
    ) -> Result<Self, Error> {
        let store = Self { certs: RwLock::new(Ledger::new()), path: path.into(), decider, clock };
        store.load()?;
        Ok(store)
    }

    /// Decide whether `cert` may be used for `host`.
    ///
    /// # Errors
    ///
    /// - `CertificateExpired` if now is outside the certificate's validity window
    /// - `CertificateRejected` if an unseen host's certificate is refused
    /// - `CertificateChanged` if a changed certificate is refused
    pub fn verify(&self, host: &str, cert: &PeerCertificate) -> Result<(), Error> {
        let mut certs = self.certs.write().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();

        if !cert.is_valid_at(now) {
            return Err(Error::CertificateExpired { host: host.to_string() });
        }

        let fingerprint = cert.fingerprint();

        match certs.get_mut(host) {
            None => {
                if !self.decider.decide_new_certificate(host, cert) {
                    return Err(Error::CertificateRejected { host: host.to_string() });
                }
                tracing::info!(host, fingerprint = %fingerprint, "trusting certificate on first use");
                certs.insert(
                    host.to_string(),
                    CertificateInfo {
                        fingerprint,
                        first_seen: now,
                        last_seen: now,
                        subject: cert.subject.clone(),
                        not_before: cert.not_before,
                        not_after: cert.not_after,
                    },
                );
            }
            Some(stored) if stored.fingerprint == fingerprint => {
                stored.last_seen = now;
            }
            Some(stored) => {
                if !self.decider.decide_certificate_change(host, stored, cert) {
                    return Err(Error::CertificateChanged { host: host.to_string() });
                }
                *stored = CertificateInfo {
                    fingerprint,
                    first_seen: stored.first_seen,
                    last_seen: now,
                    subject: cert.subject.clone(),
                    not_before: cert.not_before,
                    not_after: cert.not_after,
                };
            }
        }

        if let Err(e) = write_ledger(&self.path, &certs) {
            tracing::warn!(host, path = %self.path.display(), error = %e, "failed to persist TOFU ledger");
        }

        Ok(())
    }

    pub fn cert_info(&self, host: &str) -> Option<CertificateInfo> {
        self.certs.read().unwrap_or_else(PoisonError::into_inner).get(host).cloned()
    }

    /// Hosts with a trusted certificate, sorted.
    pub fn list_hosts(&self) -> Vec<String> {
        self.certs.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect()
    }

    /// Forget a host and persist. Returns whether the host was known.
    pub fn remove_cert(&self, host: &str) -> Result<bool, Error> {
        let mut certs = self.certs.write().unwrap_or_else(PoisonError::into_inner);
        let removed = certs.remove(host).is_some();
        write_ledger(&self.path, &certs)?;
        Ok(removed)
    }

    /// Replace the in-memory ledger with the file contents.
    pub fn load(&self) -> Result<(), Error> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::Persist(format!("failed to read {}: {e}", self.path.display()))),
        };

        let ledger: Ledger = serde_json::from_slice(&data)?;
        *self.certs.write().unwrap_or_else(PoisonError::into_inner) = ledger;
        Ok(())
    }

    /// Write the ledger to disk, reporting failures.
    pub fn save(&self) -> Result<(), Error> {
        let certs = self.certs.read().unwrap_or_else(PoisonError::into_inner);
        write_ledger(&self.path, &certs)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_ledger(path: &Path, certs: &Ledger) -> Result<(), Error> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_private_dir(dir).map_err(|e| Error::Persist(format!("failed to create {}: {e}", dir.display())))?;
    }

    let data = serde_json::to_vec_pretty(certs)?;
    let tmp = path.with_extension("json.tmp");

    let mut file =
        create_private_file(&tmp).map_err(|e| Error::Persist(format!("failed to write {}: {e}", tmp.display())))?;
    file.write_all(&data)
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::Persist(format!("failed to write {}: {e}", tmp.display())))?;

    fs::rename(&tmp, path).map_err(|e| Error::Persist(format!("failed to replace {}: {e}", path.display())))
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn create_private_file(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new().write(true).create(true).truncate(true).mode(0o600).open(path)
}

#[cfg(not(unix))]
fn create_private_file(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create(true).truncate(true).open(path)
}
