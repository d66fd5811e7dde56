//! Dashboard configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "storeplane.yaml";

/// Main dashboard configuration, loaded from storeplane.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base address of the provisioning backend
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout; unset means requests may wait forever
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: Option<u64>,

    /// What happens after a create request is acknowledged
    #[serde(default)]
    pub post_create: PostCreateConfig,
}

fn default_api_base() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_request_timeout() -> Option<u64> {
    Some(30)
}

/// Follow-up refresh after a create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCreateConfig {
    #[serde(default)]
    pub mode: PostCreateMode,

    /// Delay before the single follow-up refresh (delay mode)
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    /// Seconds between refreshes (poll mode)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Refresh cap (poll mode)
    #[serde(default = "default_poll_attempts")]
    pub poll_max_attempts: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostCreateMode {
    /// One refresh after `delay_secs`
    #[default]
    Delay,
    /// Refresh every `poll_interval_secs` until provisioning settles
    Poll,
}

fn default_delay_secs() -> u64 {
    3
}
fn default_poll_interval() -> u64 {
    5
}
fn default_poll_attempts() -> u32 {
    12
}

impl Default for PostCreateConfig {
    fn default() -> Self {
        Self {
            mode: PostCreateMode::default(),
            delay_secs: default_delay_secs(),
            poll_interval_secs: default_poll_interval(),
            poll_max_attempts: default_poll_attempts(),
        }
    }
}

/// Resolved post-create behaviour handed to the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCreatePolicy {
    Delay(Duration),
    Poll { interval: Duration, max_attempts: u32 },
}

impl Default for PostCreatePolicy {
    fn default() -> Self {
        PostCreatePolicy::Delay(Duration::from_secs(default_delay_secs()))
    }
}

impl PostCreateConfig {
    pub fn policy(&self) -> PostCreatePolicy {
        match self.mode {
            PostCreateMode::Delay => PostCreatePolicy::Delay(Duration::from_secs(self.delay_secs)),
            PostCreateMode::Poll => PostCreatePolicy::Poll {
                interval: Duration::from_secs(self.poll_interval_secs),
                max_attempts: self.poll_max_attempts,
            },
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout(),
            post_create: PostCreateConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load an explicit file, or storeplane.yaml from `dir` if present
    pub fn load_or_default(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path: PathBuf = dir.join(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject settings the client cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match reqwest::Url::parse(&self.api_base) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                if url.query().is_some() || url.fragment().is_some() {
                    return Err(ConfigError::ApiBaseQuery(self.api_base.clone()));
                }
            }
            _ => return Err(ConfigError::ApiBase(self.api_base.clone())),
        }

        if self.post_create.mode == PostCreateMode::Poll {
            if self.post_create.poll_interval_secs == 0 {
                return Err(ConfigError::PollInterval);
            }
            if self.post_create.poll_max_attempts == 0 {
                return Err(ConfigError::PollAttempts);
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_contract() {
        let config = DashboardConfig::default();
        assert_eq!(config.api_base, "http://127.0.0.1:8000");
        assert_eq!(
            config.post_create.policy(),
            PostCreatePolicy::Delay(Duration::from_secs(3))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: DashboardConfig = serde_yaml::from_str(
            "api_base: http://10.0.0.5:8000\npost_create:\n  mode: poll\n  poll_interval_secs: 2\n",
        )
        .unwrap();
        assert_eq!(config.api_base, "http://10.0.0.5:8000");
        assert_eq!(config.request_timeout_secs, Some(30));
        assert_eq!(
            config.post_create.policy(),
            PostCreatePolicy::Poll {
                interval: Duration::from_secs(2),
                max_attempts: 12,
            }
        );
    }

    #[test]
    fn validate_rejects_bad_settings() {
        let mut config = DashboardConfig {
            api_base: "ftp://example.com".to_string(),
            ..DashboardConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ApiBase(_))));

        config.api_base = "http://localhost:8000/?tenant=a".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ApiBaseQuery(_))));
        config.api_base = "http://localhost:8000/#stores".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ApiBaseQuery(_))));

        config.api_base = "http://localhost:8000".to_string();
        config.post_create.mode = PostCreateMode::Poll;
        config.post_create.poll_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::PollInterval)));

        config.post_create.poll_interval_secs = 1;
        config.post_create.poll_max_attempts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::PollAttempts)));
    }

    #[test]
    fn load_or_default_reads_file_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::load_or_default(None, dir.path()).unwrap();
        assert_eq!(config.api_base, default_api_base());

        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "api_base: https://stores.internal\nrequest_timeout_secs: null\n",
        )
        .unwrap();
        let config = DashboardConfig::load_or_default(None, dir.path()).unwrap();
        assert_eq!(config.api_base, "https://stores.internal");
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let err = DashboardConfig::load_or_default(Some(&missing), dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
