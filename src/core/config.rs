use super::retry::RetryPolicy;
use super::source::DataSource;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const API_KEY_ENV: &str = "TWELVE_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MyfinProviderConfig {
    pub base_url: String,
    pub city: String,
    pub include_online: bool,
    pub availability: String,
}

impl Default for MyfinProviderConfig {
    fn default() -> Self {
        MyfinProviderConfig {
            base_url: DataSource::Myfin.default_base_url().to_string(),
            city: "tbilisi".to_string(),
            include_online: true,
            availability: "All".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TwelvedataProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub symbol: String,
    pub interval: String,
    pub outputsize: u32,
}

impl Default for TwelvedataProviderConfig {
    fn default() -> Self {
        TwelvedataProviderConfig {
            base_url: DataSource::Twelvedata.default_base_url().to_string(),
            api_key: None,
            symbol: "USD/GEL".to_string(),
            interval: "1day".to_string(),
            outputsize: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub myfin: MyfinProviderConfig,
    #[serde(default)]
    pub twelvedata: TwelvedataProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub retries: usize,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        RetryConfig {
            retries: policy.retries,
            delay_ms: u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy {
            retries: config.retries,
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            retry: RetryConfig::default(),
            data_dir: None,
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, falling back to defaults when it does
    /// not exist yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default().with_env_overrides());
        }
        Self::load_from_path(&config_path)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("ge", "rateboard", "rateboard")
            .context("Could not determine project directories")
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.yaml"))
    }

    pub fn default_data_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                debug!("Using twelvedata api key from {API_KEY_ENV}");
                self.providers.twelvedata.api_key = Some(key);
            }
        }
        self
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_data_path(),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_yaml() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.cache_ttl(), Duration::from_secs(600));
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.providers.myfin.city, "tbilisi");
        assert_eq!(config.providers.twelvedata.symbol, "USD/GEL");
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
cache_ttl_secs: 120
retry:
  retries: 0
  delay_ms: 10
data_dir: "/tmp/rateboard"
providers:
  myfin:
    base_url: "http://example.com/myfin"
    city: "batumi"
    include_online: false
    availability: "Cash"
  twelvedata:
    base_url: "http://example.com/twelve"
    api_key: "demo"
    symbol: "EUR/GEL"
    interval: "1week"
    outputsize: 52
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.cache_ttl(), Duration::from_secs(120));
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(
            config.retry_policy(),
            RetryPolicy {
                retries: 0,
                delay: Duration::from_millis(10),
            }
        );
        assert_eq!(config.data_path().unwrap(), PathBuf::from("/tmp/rateboard"));
        assert_eq!(config.providers.myfin.base_url, "http://example.com/myfin");
        assert_eq!(config.providers.myfin.city, "batumi");
        assert!(!config.providers.myfin.include_online);
        assert_eq!(config.providers.twelvedata.api_key.as_deref(), Some("demo"));
        assert_eq!(config.providers.twelvedata.outputsize, 52);
    }

    #[test]
    fn test_partial_provider_blocks_keep_defaults() {
        let yaml_str = r#"
retry:
  retries: 5
providers:
  twelvedata:
    api_key: "k"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(
            config.retry_policy(),
            RetryPolicy {
                retries: 5,
                delay: RetryPolicy::default().delay,
            }
        );
        assert_eq!(config.providers.myfin, MyfinProviderConfig::default());
        assert_eq!(config.providers.twelvedata.api_key.as_deref(), Some("k"));
        assert_eq!(
            config.providers.twelvedata.base_url,
            DataSource::Twelvedata.default_base_url()
        );
        assert_eq!(config.providers.twelvedata.symbol, "USD/GEL");
        assert_eq!(config.providers.twelvedata.outputsize, 30);
    }

    #[test]
    fn test_retry_config_matches_default_policy() {
        assert_eq!(RetryConfig::default().delay_ms, 500);
        assert_eq!(
            RetryPolicy::from(&RetryConfig::default()),
            RetryPolicy::default()
        );
    }

    #[test]
    fn test_load_from_path_reports_parse_errors() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "cache_ttl_secs: [not, a, number]").unwrap();
        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
