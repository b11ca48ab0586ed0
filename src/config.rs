//! Configuration management for brewdeck

use crate::error::{ConfigError, Result, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for brewdeck.
///
/// Holds registry endpoints, cache location and freshness settings, and the
/// platform the catalog is filtered for. Loaded from
/// `~/.config/brewdeck/config.toml` when present, with environment variable
/// overrides applied on top.
///
/// # Example
///
/// ```rust,no_run
/// use brewdeck::config::BrewDeckConfig;
///
/// let config = BrewDeckConfig::load().unwrap();
/// println!("Formula catalog: {}", config.registry.formula_url);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BrewDeckConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub platform: Platform,
}

/// Remote catalog and analytics endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_formula_url")]
    pub formula_url: String,
    #[serde(default = "default_cask_url")]
    pub cask_url: String,
    #[serde(default = "default_formula_analytics_url")]
    pub formula_analytics_url: String,
    #[serde(default = "default_cask_analytics_url")]
    pub cask_analytics_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Disk cache location and per-source freshness, in ticks (minutes).
///
/// Installed-state sources change with every user action and get a short
/// TTL; remote catalogs change slowly and get a long one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub dir: PathBuf,
    #[serde(default = "default_installed_ttl")]
    pub installed_ttl: u64,
    #[serde(default = "default_remote_ttl")]
    pub remote_ttl: u64,
    #[serde(default = "default_analytics_ttl")]
    pub analytics_ttl: u64,
    #[serde(default = "default_tap_ttl")]
    pub tap_ttl: u64,
}

/// Platform the merged catalog is filtered for.
///
/// Casks and macOS-gated formulae are excluded on Linux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    MacOs,
    Linux,
}

impl Default for Platform {
    fn default() -> Self {
        Platform::detect()
    }
}

impl Platform {
    /// Detect the platform from the build target.
    pub fn detect() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::MacOs
        }
    }

    pub fn is_linux(&self) -> bool {
        matches!(self, Platform::Linux)
    }
}

fn default_formula_url() -> String {
    "https://formulae.brew.sh/api/formula.json".to_string()
}

fn default_cask_url() -> String {
    "https://formulae.brew.sh/api/cask.json".to_string()
}

fn default_formula_analytics_url() -> String {
    "https://formulae.brew.sh/api/analytics/install-on-request/90d.json".to_string()
}

fn default_cask_analytics_url() -> String {
    "https://formulae.brew.sh/api/analytics/cask-install/90d.json".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_installed_ttl() -> u64 {
    10
}

fn default_remote_ttl() -> u64 {
    1000
}

fn default_analytics_ttl() -> u64 {
    100
}

fn default_tap_ttl() -> u64 {
    10
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("brewdeck")
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            formula_url: default_formula_url(),
            cask_url: default_cask_url(),
            formula_analytics_url: default_formula_analytics_url(),
            cask_analytics_url: default_cask_analytics_url(),
            timeout: default_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            installed_ttl: default_installed_ttl(),
            remote_ttl: default_remote_ttl(),
            analytics_ttl: default_analytics_ttl(),
            tap_ttl: default_tap_ttl(),
        }
    }
}

impl BrewDeckConfig {
    /// Load configuration from the default location.
    ///
    /// Missing file falls back to defaults; environment overrides
    /// (`BREWDECK_CACHE_DIR`, `BREWDECK_FORMULA_URL`, `BREWDECK_CASK_URL`)
    /// are applied afterwards either way.
    pub fn load() -> Result<Self> {
        let path = Self::default_config_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::InvalidFile {
            path: path.to_path_buf(),
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Default config file location (`~/.config/brewdeck/config.toml`).
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("brewdeck")
            .join("config.toml")
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("BREWDECK_CACHE_DIR") {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("BREWDECK_FORMULA_URL") {
            self.registry.formula_url = url;
        }
        if let Ok(url) = std::env::var("BREWDECK_CASK_URL") {
            self.registry.cask_url = url;
        }
    }

    /// Configuration suitable for tests: everything under a temp directory.
    pub fn test_config(base: &Path) -> Self {
        let mut config = Self::default();
        config.cache.dir = base.join("cache");
        config
    }
}

impl Validate for BrewDeckConfig {
    type Error = ConfigError;

    fn validate(&self) -> std::result::Result<(), Self::Error> {
        for url in [
            &self.registry.formula_url,
            &self.registry.cask_url,
            &self.registry.formula_analytics_url,
            &self.registry.cask_analytics_url,
        ] {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ConfigError::InvalidCatalogUrl { url: url.clone() });
            }
        }
        if self.cache.dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed {
                message: "cache directory must not be empty".to_string(),
            });
        }
        if self.registry.timeout == 0 {
            return Err(ConfigError::ValidationFailed {
                message: "registry timeout must be nonzero".to_string(),
            });
        }
        Ok(())
    }
}
