//! Configuration management
//!
//! Settings are resolved in this order (later wins):
//! 1. Defaults
//! 2. `rjco-scraping.toml` (or the file passed with `--config`)
//! 3. Environment variables (`logLevel`, `RJCO_*`)
//!
//! The resulting [`Config`] is passed explicitly to every component; nothing
//! reads the environment after startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "rjco-scraping.toml";

/// Entry page of the judicial branch process query
pub const DEFAULT_ENTRY_URL: &str =
    "https://procesos.ramajudicial.gov.co/consultaprocesos/ConsultaJusticias21.aspx";

/// Main configuration for rjco-scraping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level or `EnvFilter` directive (env: `logLevel`)
    pub log_level: String,

    /// Portal navigation settings
    pub portal: PortalConfig,

    /// Browser launch settings
    pub browser: BrowserSettings,

    /// CSV download settings
    pub download: DownloadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            portal: PortalConfig::default(),
            browser: BrowserSettings::default(),
            download: DownloadConfig::default(),
        }
    }
}

/// Timeouts and page-interaction constants for the portal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PortalConfig {
    /// Entry page URL
    pub entry_url: String,

    /// Wait for form controls to become visible, in seconds
    pub element_timeout_secs: u64,

    /// Wait for the error modal to show up, in seconds
    pub overlay_timeout_secs: u64,

    /// Wait for the "loading" window to disappear after submitting, in seconds
    pub loading_timeout_secs: u64,

    /// Pause after submitting a search before polling the loading window
    pub settle_delay_ms: u64,

    /// Horizontal distance of the slider unlock drag, in CSS pixels
    pub slider_offset_px: f64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            entry_url: DEFAULT_ENTRY_URL.to_string(),
            element_timeout_secs: 10,
            overlay_timeout_secs: 3,
            loading_timeout_secs: 30,
            settle_delay_ms: 1000,
            slider_offset_px: 10.0,
        }
    }
}

impl PortalConfig {
    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn overlay_timeout(&self) -> Duration {
        Duration::from_secs(self.overlay_timeout_secs)
    }

    pub fn loading_timeout(&self) -> Duration {
        Duration::from_secs(self.loading_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Browser launch settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run Chromium without a window
    pub headless: bool,

    /// Window width in pixels
    pub window_width: u32,

    /// Window height in pixels
    pub window_height: u32,

    /// Custom user agent
    pub user_agent: Option<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: None,
        }
    }
}

/// CSV download settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadConfig {
    /// Directory for temporary CSV files
    pub dir: PathBuf,

    /// HTTP timeout for one download, in seconds
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: default_download_dir(),
            timeout_secs: 60,
        }
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_download_dir() -> PathBuf {
    std::env::temp_dir().join("rjco-scraping")
}

impl Config {
    /// Parse a TOML document without applying environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut cfg = Self::from_toml_str(&content)?;
        cfg.apply_env_overrides();

        Ok(cfg)
    }

    /// Load configuration from the default path
    ///
    /// Falls back to defaults plus environment when `rjco-scraping.toml` is
    /// not present in the working directory.
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Ok(Self::from_env())
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg
    }

    /// Override settings from environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("logLevel") {
            if !level.trim().is_empty() {
                self.log_level = level.trim().to_lowercase();
            }
        }

        if let Ok(url) = std::env::var("RJCO_ENTRY_URL") {
            if !url.is_empty() {
                self.portal.entry_url = url;
            }
        }
        if let Some(secs) = env_parse("RJCO_ELEMENT_TIMEOUT") {
            self.portal.element_timeout_secs = secs;
        }
        if let Some(secs) = env_parse("RJCO_LOADING_TIMEOUT") {
            self.portal.loading_timeout_secs = secs;
        }

        if let Ok(headless) = std::env::var("RJCO_HEADLESS") {
            self.browser.headless = headless.to_lowercase() != "false";
        }
        if let Ok(ua) = std::env::var("RJCO_USER_AGENT") {
            if !ua.is_empty() {
                self.browser.user_agent = Some(ua);
            }
        }

        if let Ok(dir) = std::env::var("RJCO_DOWNLOAD_DIR") {
            if !dir.is_empty() {
                self.download.dir = PathBuf::from(dir);
            }
        }
    }
}

fn env_parse(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.portal.entry_url, DEFAULT_ENTRY_URL);
        assert!(config.browser.headless);
        assert!(config.browser.user_agent.is_none());
        assert!(config.download.dir.ends_with("rjco-scraping"));
    }

    #[test]
    fn test_portal_config_timeouts() {
        let portal = PortalConfig::default();
        assert_eq!(portal.element_timeout(), Duration::from_secs(10));
        assert_eq!(portal.overlay_timeout(), Duration::from_secs(3));
        assert_eq!(portal.loading_timeout(), Duration::from_secs(30));
        assert_eq!(portal.settle_delay(), Duration::from_millis(1000));
        assert_eq!(portal.slider_offset_px, 10.0);
    }

    #[test]
    fn test_toml_config_parsing() {
        let toml_content = r#"
log_level = "debug"

[portal]
entry_url = "http://localhost:8080/consulta.aspx"
element_timeout_secs = 20
loading_timeout_secs = 90

[browser]
headless = false
user_agent = "Custom Agent"

[download]
dir = "/tmp/csv"
"#;

        let config = Config::from_toml_str(toml_content).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.portal.entry_url, "http://localhost:8080/consulta.aspx");
        assert_eq!(config.portal.element_timeout_secs, 20);
        assert_eq!(config.portal.loading_timeout_secs, 90);
        // Untouched keys keep their defaults
        assert_eq!(config.portal.overlay_timeout_secs, 3);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.user_agent, Some("Custom Agent".to_string()));
        assert_eq!(config.browser.window_width, 1920);
        assert_eq!(config.download.dir, PathBuf::from("/tmp/csv"));
        assert_eq!(config.download.timeout_secs, 60);
    }

    #[test]
    fn test_toml_config_invalid() {
        let result = Config::from_toml_str("[portal]\nelement_timeout_secs = \"soon\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = Config::from_toml_file("/nonexistent/rjco-scraping.toml");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        unsafe {
            std::env::set_var("logLevel", "DEBUG");
            std::env::set_var("RJCO_ELEMENT_TIMEOUT", "25");
            std::env::set_var("RJCO_HEADLESS", "false");
            std::env::set_var("RJCO_DOWNLOAD_DIR", "/tmp/rjco-test");
        }

        let mut config = Config::default();
        config.apply_env_overrides();

        unsafe {
            std::env::remove_var("logLevel");
            std::env::remove_var("RJCO_ELEMENT_TIMEOUT");
            std::env::remove_var("RJCO_HEADLESS");
            std::env::remove_var("RJCO_DOWNLOAD_DIR");
        }

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.portal.element_timeout_secs, 25);
        assert!(!config.browser.headless);
        assert_eq!(config.download.dir, PathBuf::from("/tmp/rjco-test"));
    }
}
