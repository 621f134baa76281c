//! Configuration.
//!
//! ```yaml
//! timeout_ms: 15000
//! poll_interval_ms: 250
//! settle:
//!   max_polls: 20
//!   interval_ms: 500
//!   ready_streak: 3
//! pool:
//!   workers: 4
//!   drain_timeout_ms: 120000
//! detect_angular: false
//! ```
//!
//! Every key is optional. `PAGEBIND_*` environment variables override the
//! file, e.g. `PAGEBIND_TIMEOUT_MS=30000`.

use crate::notify::PoolConfig;
use crate::result::{PageError, PageResult};
use crate::wait::{SettlePolicy, WaitPolicy, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "PAGEBIND_";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Readiness wait timeout in milliseconds
    pub timeout_ms: u64,
    /// Readiness polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Document settle bounds
    pub settle: SettlePolicy,
    /// Notification pool
    pub pool: PoolConfig,
    /// Wait for AngularJS `$http` idle before readiness checks
    pub detect_angular: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle: SettlePolicy::default(),
            pool: PoolConfig::default(),
            detect_angular: true,
        }
    }
}

impl PageConfig {
    /// Parse YAML
    pub fn from_yaml_str(yaml: &str) -> PageResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> PageResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Defaults with `PAGEBIND_*` overrides from the process environment
    pub fn from_env() -> PageResult<Self> {
        let mut config = Self::default();
        config.apply_overrides(&std::env::vars().collect())?;
        Ok(config)
    }

    /// Apply `PAGEBIND_*` entries of `vars`; other entries are ignored
    pub fn apply_overrides(&mut self, vars: &HashMap<String, String>) -> PageResult<()> {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "TIMEOUT_MS" => self.timeout_ms = parse(key, value)?,
                "POLL_INTERVAL_MS" => self.poll_interval_ms = parse(key, value)?,
                "SETTLE_MAX_POLLS" => self.settle.max_polls = parse(key, value)?,
                "SETTLE_INTERVAL_MS" => self.settle.interval_ms = parse(key, value)?,
                "SETTLE_READY_STREAK" => self.settle.ready_streak = parse(key, value)?,
                "WORKERS" => self.pool.workers = parse(key, value)?,
                "DRAIN_TIMEOUT_MS" => self.pool.drain_timeout_ms = parse(key, value)?,
                "DETECT_ANGULAR" => self.detect_angular = parse(key, value)?,
                // logging reads its own variable
                _ => {}
            }
        }
        self.validate()
    }

    fn validate(&self) -> PageResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(PageError::Config {
                message: "poll_interval_ms must be positive".into(),
            });
        }
        if self.settle.max_polls == 0 || self.settle.ready_streak == 0 {
            return Err(PageError::Config {
                message: "settle max_polls and ready_streak must be positive".into(),
            });
        }
        if self.pool.workers == 0 {
            return Err(PageError::Config {
                message: "pool workers must be positive".into(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            timeout_ms: self.timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    #[must_use]
    pub const fn settle_policy(&self) -> SettlePolicy {
        self.settle
    }

    #[must_use]
    pub const fn pool_config(&self) -> PoolConfig {
        self.pool
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> PageResult<T> {
    value.trim().parse().map_err(|_| PageError::Config {
        message: format!("invalid value for {key}: '{value}'"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    mod yaml_tests {
        use super::*;

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config = PageConfig::from_yaml_str("timeout_ms: 15000\nsettle:\n  max_polls: 10\n").unwrap();
            assert_eq!(config.timeout_ms, 15_000);
            assert_eq!(config.poll_interval_ms, 100);
            assert_eq!(config.settle.max_polls, 10);
            assert_eq!(config.settle.interval_ms, 500);
            assert!(config.detect_angular);
        }

        #[test]
        fn test_invalid_values_are_rejected() {
            assert!(matches!(
                PageConfig::from_yaml_str("poll_interval_ms: 0"),
                Err(PageError::Config { .. })
            ));
            assert!(matches!(
                PageConfig::from_yaml_str("timeout_ms: [1, 2]"),
                Err(PageError::Yaml(_))
            ));
        }

        #[test]
        fn test_from_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "pool:\n  workers: 2\ndetect_angular: false").unwrap();
            let config = PageConfig::from_file(file.path()).unwrap();
            assert_eq!(config.pool_config().workers, 2);
            assert_eq!(config.pool_config().drain_timeout_ms, 120_000);
            assert!(!config.detect_angular);
        }

        #[test]
        fn test_missing_file_is_io_error() {
            let dir = tempfile::tempdir().unwrap();
            assert!(matches!(
                PageConfig::from_file(dir.path().join("absent.yaml")),
                Err(PageError::Io(_))
            ));
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn test_overrides_map_to_policies() {
            let mut config = PageConfig::default();
            config
                .apply_overrides(&vars(&[
                    ("PAGEBIND_TIMEOUT_MS", "30000"),
                    ("PAGEBIND_POLL_INTERVAL_MS", " 50 "),
                    ("PAGEBIND_SETTLE_READY_STREAK", "2"),
                    ("PAGEBIND_DETECT_ANGULAR", "false"),
                    ("PATH", "/usr/bin"),
                ]))
                .unwrap();

            assert_eq!(
                config.wait_policy(),
                WaitPolicy::new().with_timeout(30_000).with_poll_interval(50)
            );
            assert_eq!(config.settle_policy().ready_streak, 2);
            assert!(!config.detect_angular);
        }

        #[test]
        fn test_bad_override_names_the_variable() {
            let mut config = PageConfig::default();
            let err = config
                .apply_overrides(&vars(&[("PAGEBIND_WORKERS", "many")]))
                .unwrap_err();
            assert!(err.to_string().contains("PAGEBIND_WORKERS"));
        }
    }
}
