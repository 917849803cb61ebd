use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

use crate::readiness::PollPolicy;

const ENV_PREFIX: &str = "STATBLOCK";

/// Runtime settings. Defaults, overlaid by `STATBLOCK_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub max_attempts: u32,
    pub interval_ms: u64,
    /// Written to the record's `Source`.
    pub source_tag: String,
    /// Written to the record's `Version`.
    pub schema_version: String,
    /// Prefix for relative thumbnail paths in embedded data.
    pub image_base_url: String,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_attempts: 40,
            interval_ms: 250,
            source_tag: "Pathfinder 2e".to_string(),
            schema_version: "3.13.2".to_string(),
            image_base_url: "https://2e.aonprd.com/Images".to_string(),
            user_agent: concat!("statblock/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let d = Settings::default();
        Config::builder()
            .set_default("max_attempts", i64::from(d.max_attempts))?
            .set_default("interval_ms", i64::try_from(d.interval_ms).unwrap_or(i64::MAX))?
            .set_default("source_tag", d.source_tag)?
            .set_default("schema_version", d.schema_version)?
            .set_default("image_base_url", d.image_base_url)?
            .set_default("user_agent", d.user_agent)?
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            max_attempts: self.max_attempts.max(1),
            interval: Duration::from_millis(self.interval_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_env() {
        let s = Settings::load().unwrap();
        assert_eq!(s.source_tag, "Pathfinder 2e");
        assert_eq!(s.schema_version, "3.13.2");
        assert_eq!(s.max_attempts, 40);
    }

    #[test]
    fn poll_policy_never_zero_attempts() {
        let s = Settings {
            max_attempts: 0,
            interval_ms: 10,
            ..Settings::default()
        };
        let p = s.poll_policy();
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.interval, Duration::from_millis(10));
    }
}
