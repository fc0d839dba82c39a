use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::i18n::Locale;

/// Default request timeout, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
/// Default response cache TTL (5 minutes), in milliseconds.
pub const DEFAULT_CACHE_TTL_MS: u64 = 5 * 60 * 1000;
/// Default delay between retry attempts, in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheSettings,
  /// Display language for notifications
  #[serde(default)]
  pub locale: Locale,
  /// Log filter directive (e.g., "info", "libris=debug")
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

fn default_log_level() -> String {
  "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL every request path is appended to
  #[serde(default)]
  pub base_url: Option<String>,
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
  /// Fixed backoff between retry attempts
  #[serde(default = "default_retry_delay_ms")]
  pub retry_delay_ms: u64,
}

fn default_timeout_ms() -> u64 {
  DEFAULT_TIMEOUT_MS
}

fn default_retry_delay_ms() -> u64 {
  DEFAULT_RETRY_DELAY_MS
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: None,
      timeout_ms: DEFAULT_TIMEOUT_MS,
      retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
  #[serde(default = "default_cache_ttl_ms")]
  pub ttl_ms: u64,
}

fn default_cache_ttl_ms() -> u64 {
  DEFAULT_CACHE_TTL_MS
}

impl Default for CacheSettings {
  fn default() -> Self {
    Self {
      ttl_ms: DEFAULT_CACHE_TTL_MS,
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: ApiConfig::default(),
      cache: CacheSettings::default(),
      locale: Locale::default(),
      log_level: default_log_level(),
    }
  }
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./libris.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/libris/config.yaml
  ///
  /// When no file is found the configuration comes from the environment alone.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    let config = config.with_env_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("libris.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("libris").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Apply `LIBRIS_BASE_API` and `LIBRIS_LOCALE` on top of file values.
  fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
    if let Some(base) = var("LIBRIS_BASE_API").filter(|v| !v.trim().is_empty()) {
      self.api.base_url = Some(base);
    }
    if let Some(locale) = var("LIBRIS_LOCALE").and_then(|v| Locale::from_tag(&v)) {
      self.locale = locale;
    }
    self
  }

  /// Check that everything the HTTP client needs is present.
  pub fn validate(&self) -> Result<()> {
    self.base_url()?;
    if self.api.timeout_ms == 0 {
      return Err(eyre!("api.timeout_ms must be greater than zero"));
    }
    Ok(())
  }

  /// The parsed base API URL.
  pub fn base_url(&self) -> Result<Url> {
    let raw = self.api.base_url.as_deref().ok_or_else(|| {
      eyre!(
        "Base API URL not configured. \
         Set api.base_url or the LIBRIS_BASE_API environment variable."
      )
    })?;
    Url::parse(raw).map_err(|e| eyre!("Invalid base API URL '{}': {}", raw, e))
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_millis(self.api.timeout_ms)
  }

  pub fn retry_delay(&self) -> Duration {
    Duration::from_millis(self.api.retry_delay_ms)
  }

  pub fn cache_ttl(&self) -> Duration {
    Duration::from_millis(self.cache.ttl_ms)
  }

  /// Get the login password from environment variables.
  ///
  /// Checks LIBRIS_PASSWORD.
  pub fn get_password() -> Result<String> {
    std::env::var("LIBRIS_PASSWORD")
      .map_err(|_| eyre!("Password not found. Set the LIBRIS_PASSWORD environment variable."))
  }
}
