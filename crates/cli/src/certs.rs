//! Certificate manager: list, show and forget trusted hosts.

use anyhow::{Result, bail};
use starsearch_core::TofuStore;
use starsearch_core::tofu::format_fingerprint;

use crate::args::CertsAction;

pub fn run(store: &TofuStore, action: CertsAction) -> Result<()> {
    match action {
        CertsAction::List => {
            let hosts = store.list_hosts();
            if hosts.is_empty() {
                println!("no trusted hosts");
            }
            for host in hosts {
                if let Some(info) = store.cert_info(&host) {
                    let fingerprint = format_fingerprint(&info.fingerprint);
                    println!("{host}\t{fingerprint}\texpires {}", info.not_after.date_naive());
                }
            }
        }
        CertsAction::Show { host } => {
            let Some(info) = store.cert_info(&host) else {
                bail!("no certificate recorded for {host}");
            };
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        CertsAction::Forget { host } => {
            if store.remove_cert(&host)? {
                println!("forgot {host}");
            } else {
                bail!("no certificate recorded for {host}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use starsearch_core::TrustPolicy;

    use super::*;

    #[test]
    fn test_forget_unknown_host_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = TofuStore::open(dir.path().join("known_hosts.json"), Arc::new(TrustPolicy::AcceptAll)).unwrap();

        assert!(run(&store, CertsAction::List).is_ok());
        assert!(run(&store, CertsAction::Show { host: "example.org".into() }).is_err());
        assert!(run(&store, CertsAction::Forget { host: "example.org".into() }).is_err());
    }
}
