use crate::model::Unit;
use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: Option<PathBuf>,
    pub config: AppConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        match self.fetch.mode {
            FetchMode::Http => {
                if self.provider.base_url.trim().is_empty() {
                    bail!("provider.base_url must not be empty for http mode");
                }
                let url = Url::parse(&self.provider.base_url)
                    .with_context(|| format!("invalid provider.base_url {}", self.provider.base_url))?;
                if !matches!(url.scheme(), "http" | "https") {
                    bail!("provider.base_url must use http or https");
                }
            }
            FetchMode::File => {
                if self.fetch.pages_dir.is_none() {
                    bail!("fetch.pages_dir is required for file mode");
                }
            }
        }

        if self.fetch.timeout_secs == 0 {
            bail!("fetch.timeout_secs must be greater than zero");
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    #[default]
    Http,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default)]
    pub mode: FetchMode,
    /// File mode: pages live at `{pages_dir}/{kind token}/{area}.html`.
    #[serde(default)]
    pub pages_dir: Option<PathBuf>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u8,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::Http,
            pages_dir: None,
            headers: BTreeMap::new(),
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DisplayConfig {
    #[serde(default)]
    pub unit: Unit,
}

pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    match path {
        Some(path) => load_config_file(path),
        None => Ok(LoadedConfig {
            path: None,
            config: AppConfig::default(),
        }),
    }
}

pub fn load_config_file(config_path: &Path) -> Result<LoadedConfig> {
    let text = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read config: {}", config_path.display()))?;
    let config: AppConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse toml in {}", config_path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", config_path.display()))?;
    Ok(LoadedConfig {
        path: Some(config_path.to_path_buf()),
        config,
    })
}

pub fn resolve_path(base_config_path: Option<&Path>, maybe_relative: &Path) -> Result<PathBuf> {
    if maybe_relative.is_absolute() {
        return Ok(maybe_relative.to_path_buf());
    }
    let Some(base_config_path) = base_config_path else {
        return Ok(maybe_relative.to_path_buf());
    };

    let parent = base_config_path.parent().ok_or_else(|| {
        anyhow!(
            "config file has no parent directory: {}",
            base_config_path.display()
        )
    })?;

    Ok(parent.join(maybe_relative))
}

fn default_base_url() -> String {
    "https://weather.com".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_retry_attempts() -> u8 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.provider.base_url, "https://weather.com");
        assert_eq!(config.fetch.mode, FetchMode::Http);
        assert_eq!(config.fetch.retry_attempts, 2);
        assert_eq!(config.display.unit, Unit::Fahrenheit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn file_mode_requires_pages_dir() {
        let config: AppConfig = toml::from_str("[fetch]\nmode = \"file\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pages_dir"));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let config: AppConfig =
            toml::from_str("[provider]\nbase_url = \"ftp://weather.example\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn display_unit_is_read() {
        let config: AppConfig = toml::from_str("[display]\nunit = \"celsius\"\n").unwrap();
        assert_eq!(config.display.unit, Unit::Celsius);
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let resolved =
            resolve_path(Some(Path::new("/etc/wx/config.toml")), Path::new("pages")).unwrap();
        assert_eq!(resolved, PathBuf::from("/etc/wx/pages"));

        let untouched = resolve_path(None, Path::new("pages")).unwrap();
        assert_eq!(untouched, PathBuf::from("pages"));
    }
}
