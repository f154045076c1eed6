use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ChurnError, Result};

pub const HOST_ENV: &str = "CHURN_API_HOST";
pub const DEFAULT_HOST: &str = "http://localhost:8000";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChurnConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    /// Unset leaves the transport default in place
    pub timeout_secs: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub developer_mode: bool,
}

impl ChurnConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: ChurnConfig = serde_json::from_str(&text).map_err(|e| {
            ChurnError::Config(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `CHURN_API_HOST` replaces the configured host when set and non-empty
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var(HOST_ENV) {
            if !host.trim().is_empty() {
                self.service.host = host;
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let host = self.service.host.trim();
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(ChurnError::Config(format!(
                "service host must be an http(s) URL, got '{}'",
                self.service.host
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChurnConfig::default();
        assert_eq!(config.service.host, "http://localhost:8000");
        assert_eq!(config.service.timeout_secs, None);
        assert!(!config.ui.developer_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ChurnConfig =
            serde_json::from_str(r#"{"ui": {"developer_mode": true}}"#).unwrap();
        assert!(config.ui.developer_mode);
        assert_eq!(config.service.host, DEFAULT_HOST);
    }

    #[test]
    fn test_service_section_without_host_keeps_default() {
        let config: ChurnConfig =
            serde_json::from_str(r#"{"service": {"timeout_secs": 5}}"#).unwrap();
        assert_eq!(config.service.host, DEFAULT_HOST);
        assert_eq!(config.service.timeout_secs, Some(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_host() {
        let mut config = ChurnConfig::default();
        config.service.host = "localhost:8000".into();
        assert!(matches!(config.validate(), Err(ChurnError::Config(_))));
    }
}
