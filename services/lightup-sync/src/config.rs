//! Configuration types for the LightUp sync service

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::model::{demo_alarms, Alarm};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Alarms shown when the alarm list cannot be fetched
    #[serde(default = "demo_alarms")]
    pub demo_alarms: Vec<Alarm>,
    /// Stylesheets the dashboard can switch between; the first is the default
    #[serde(default = "default_themes")]
    pub themes: Vec<Theme>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            polling: PollingConfig::default(),
            dashboard: DashboardConfig::default(),
            demo_alarms: demo_alarms(),
            themes: default_themes(),
        }
    }
}

impl Config {
    /// Check values serde cannot check on its own
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.backend.base_url.starts_with("http://")
            || self.backend.base_url.starts_with("https://"))
        {
            return Err(crate::SyncError::Config(format!(
                "backend.base_url must be an http(s) URL, got '{}'",
                self.backend.base_url
            )));
        }
        if self.polling.interval_ms == 0 {
            return Err(crate::SyncError::Config(
                "polling.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.themes.is_empty() {
            return Err(crate::SyncError::Config(
                "at least one theme is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the LightUpPi backend lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Periodic re-polling of both collections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
        }
    }
}

/// A named dashboard stylesheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub stylesheet: String,
}

fn default_base_url() -> String {
    "http://localhost".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

fn default_themes() -> Vec<Theme> {
    ["flatly", "darkly", "journal", "slate"]
        .iter()
        .map(|name| Theme {
            name: name.to_string(),
            stylesheet: format!(
                "https://cdn.jsdelivr.net/npm/bootswatch@5/dist/{}/bootstrap.min.css",
                name
            ),
        })
        .collect()
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::SyncError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "backend": { "base_url": "http://lightuppi.local:8080" },
            "polling": { "enabled": true, "interval_ms": 5000 },
            "dashboard": { "enabled": false, "port": 9000 },
            "demo_alarms": [{
                "id": 1, "hour": 6, "minute": 0, "enabled": true,
                "label": "Offline", "timestamp": 0, "monday": true
            }],
            "themes": [
                { "name": "plain", "stylesheet": "/plain.css" }
            ]
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.backend.base_url, "http://lightuppi.local:8080");
        assert!(config.polling.enabled);
        assert_eq!(config.polling.interval(), Duration::from_secs(5));
        assert!(!config.dashboard.enabled);
        assert_eq!(config.dashboard.port, 9000);
        assert_eq!(config.demo_alarms.len(), 1);
        assert_eq!(config.demo_alarms[0].label, "Offline");
        assert_eq!(config.themes[0].name, "plain");
        config.validate().unwrap();
    }

    #[test]
    fn parse_minimal_config() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert_eq!(config.backend.base_url, "http://localhost");
        assert!(!config.polling.enabled);
        assert_eq!(config.polling.interval_ms, 2000);
        assert!(config.dashboard.enabled);
        assert_eq!(config.dashboard.port, 11120);
        assert_eq!(config.demo_alarms, demo_alarms());
        assert_eq!(config.themes.len(), 4);
        assert_eq!(config.themes[0].name, "flatly");
    }

    #[test]
    fn default_config_matches_empty_json() {
        let parsed: Config = serde_json::from_str("{}").unwrap();
        let default = Config::default();
        assert_eq!(parsed.backend.base_url, default.backend.base_url);
        assert_eq!(parsed.polling.interval_ms, default.polling.interval_ms);
        assert_eq!(parsed.demo_alarms, default.demo_alarms);
        assert_eq!(parsed.themes, default.themes);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        config.backend.base_url = "lightuppi.local".to_string();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("backend.base_url"));

        let mut config = Config::default();
        config.polling.interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.themes.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/config.json"));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"backend": {"base_url": "http://10.0.0.5"}, "polling": {"enabled": true}}"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.backend.base_url, "http://10.0.0.5");
        assert!(config.polling.enabled);
        assert_eq!(config.polling.interval_ms, 2000);
    }

    #[test]
    fn load_config_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "not json").unwrap();

        let result = load_config(&config_path);
        assert!(matches!(result, Err(crate::SyncError::Json(_))));
    }
}
