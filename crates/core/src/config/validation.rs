//! Bounds checks applied to a loaded `AppConfig`.

use std::ops::RangeInclusive;

use crate::config::AppConfig;

const MIB: u64 = 1024 * 1024;

/// Failure to load or validate configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CONFIG_LOAD: {0}")]
    LoadFailed(String),

    #[error("CONFIG_INVALID: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn within(field: &'static str, value: u64, range: RangeInclusive<u64>) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("is {value}, expected {}..={}", range.start(), range.end()),
        })
    }
}

impl AppConfig {
    /// Reject values no fetch or cache could work with.
    ///
    /// | field             | accepted            |
    /// |-------------------|---------------------|
    /// | `timeout_ms`      | 100 ..= 300000      |
    /// | `max_bytes`       | 1 ..= 50 MiB        |
    /// | `cache_max_bytes` | at least 1          |
    /// | `cache_ttl_secs`  | at least 1          |
    /// | `max_redirects`   | 0 ..= 20            |
    /// | `home_url`        | not blank           |
    pub fn validate(&self) -> Result<(), ConfigError> {
        within("timeout_ms", self.timeout_ms, 100..=300_000)?;
        within("max_bytes", self.max_bytes as u64, 1..=50 * MIB)?;
        within("cache_max_bytes", self.cache_max_bytes, 1..=u64::MAX)?;
        within("cache_ttl_secs", self.cache_ttl_secs, 1..=u64::MAX)?;
        within("max_redirects", self.max_redirects as u64, 0..=20)?;

        if self.home_url.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "home_url", reason: "is blank".into() });
        }

        if self.cache_max_bytes < self.max_bytes as u64 {
            tracing::warn!(
                cache_max_bytes = self.cache_max_bytes,
                max_bytes = self.max_bytes,
                "pages larger than the cache budget will never be cached"
            );
        }

        Ok(())
    }
}
