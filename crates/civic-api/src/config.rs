//! Server configuration from `CIVIC_*` environment variables
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub addr: String,
    /// Unset means reports are submitted as UNAVAILABLE
    pub classifier_url: Option<String>,
    pub classifier_timeout: Duration,
    pub upload_dir: PathBuf,
    pub seed_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8787".to_string(),
            classifier_url: None,
            classifier_timeout: civic_service::DEFAULT_TIMEOUT,
            upload_dir: PathBuf::from("uploads"),
            seed_file: None,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(addr) = get("CIVIC_ADDR") {
            config.addr = addr;
        }
        if let Some(url) = get("CIVIC_CLASSIFIER_URL") {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError {
                    var: "CIVIC_CLASSIFIER_URL",
                    reason: format!("'{url}' is not an http(s) URL"),
                });
            }
            config.classifier_url = Some(url);
        }
        if let Some(secs) = get("CIVIC_CLASSIFIER_TIMEOUT_SECS") {
            let secs = secs
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError {
                    var: "CIVIC_CLASSIFIER_TIMEOUT_SECS",
                    reason: format!("'{secs}' is not a positive number of seconds"),
                })?;
            config.classifier_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = get("CIVIC_UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        config.seed_file = get("CIVIC_SEED_FILE").map(PathBuf::from);

        Ok(config)
    }
}
