//! Browser settings: fetch limits, cache budget, trust policy and where the
//! TOFU ledger lives. Values come from figment layers, see [`AppConfig::load`].

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::tofu::TrustPolicy;

mod validation;

pub use validation::ConfigError;

/// Settings shared by every tab of one browser process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the TOFU ledger.
    ///
    /// Set via STARSEARCH_DATA_DIR environment variable.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Connect + read deadline per fetch, in milliseconds.
    ///
    /// Set via STARSEARCH_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body bytes.
    ///
    /// Set via STARSEARCH_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Page cache budget in bytes.
    ///
    /// Set via STARSEARCH_CACHE_MAX_BYTES environment variable.
    #[serde(default = "default_cache_max_bytes")]
    pub cache_max_bytes: u64,

    /// Default page cache TTL in seconds.
    ///
    /// Set via STARSEARCH_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Redirects followed before giving up.
    ///
    /// Set via STARSEARCH_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// How unseen and changed certificates are handled.
    ///
    /// Set via STARSEARCH_TRUST_POLICY environment variable (`accept_all` or `pin_first`).
    #[serde(default)]
    pub trust_policy: TrustPolicy,

    /// Page opened when no URL is given.
    ///
    /// Set via STARSEARCH_HOME_URL environment variable.
    #[serde(default = "default_home_url")]
    pub home_url: String,
}

fn default_data_dir() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(std::env::temp_dir);
    base.join("starsearch")
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_cache_max_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_max_redirects() -> usize {
    5
}

fn default_home_url() -> String {
    "gemini://geminiprotocol.net/".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            cache_max_bytes: default_cache_max_bytes(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_redirects: default_max_redirects(),
            trust_policy: TrustPolicy::default(),
            home_url: default_home_url(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Location of the TOFU ledger.
    pub fn known_hosts_path(&self) -> PathBuf {
        self.data_dir.join("known_hosts.json")
    }

    /// Merge defaults, the optional TOML file and the environment, then validate.
    ///
    /// `STARSEARCH_*` variables beat the file named by `STARSEARCH_CONFIG_FILE`,
    /// which beats the built-in defaults. Nested keys use `__`.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("STARSEARCH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("STARSEARCH_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
