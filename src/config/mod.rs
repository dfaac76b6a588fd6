//! Configuration management for ExpBoard
//!
//! Loads the TOML configuration file, applies `EXPBOARD_` environment
//! overrides and named profiles, then validates the result.

use crate::error::{ExpboardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod validator;

pub use validator::ConfigValidator;

/// Schema version understood by this build
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub storage: StorageConfig,
    pub http: HttpConfig,
    pub geocoding: GeocodingConfig,
    pub semantic: SemanticConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
}

impl StorageConfig {
    /// Full path of the candidate database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }
}

/// Shared HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Geocoding resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub result_limit: usize,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub cache_capacity: usize,
}

impl GeocodingConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// Semantic match oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    pub enabled: bool,
    pub endpoint: String,
    /// Environment variable holding the bearer token of the active session
    pub api_token_env: String,
}

impl SemanticConfig {
    /// Bearer token from the configured environment variable, if set and non-empty
    pub fn session_token(&self) -> Option<String> {
        std::env::var(&self.api_token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

/// Search and pagination defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_page_size: usize,
    pub page_size_options: Vec<usize>,
    /// `-1` means any distance
    pub default_radius_km: i64,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocoding_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_enabled: Option<bool>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ExpboardError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ExpboardError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ExpboardError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| ExpboardError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(page_size) = overrides.page_size {
            self.search.default_page_size = page_size;
        }
        if let Some(enabled) = overrides.geocoding_enabled {
            self.geocoding.enabled = enabled;
        }
        if let Some(enabled) = overrides.semantic_enabled {
            self.semantic.enabled = enabled;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: EXPBOARD_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("EXPBOARD_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "HTTP__TIMEOUT_SECS" => {
                self.http.timeout_secs = parse_env(path, value)?;
            }
            "GEOCODING__ENABLED" => {
                self.geocoding.enabled = parse_env(path, value)?;
            }
            "GEOCODING__ENDPOINT" => {
                self.geocoding.endpoint = value.to_string();
            }
            "GEOCODING__CACHE_CAPACITY" => {
                self.geocoding.cache_capacity = parse_env(path, value)?;
            }
            "SEMANTIC__ENABLED" => {
                self.semantic.enabled = parse_env(path, value)?;
            }
            "SEMANTIC__ENDPOINT" => {
                self.semantic.endpoint = value.to_string();
            }
            "SEARCH__DEFAULT_PAGE_SIZE" => {
                self.search.default_page_size = parse_env(path, value)?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ExpboardError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("expboard").join("config.toml"))
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| ExpboardError::Config("Cannot determine home directory".to_string()))?;

        Ok(home_dir.join(".expboard"))
    }
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| ExpboardError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("~/.expboard"),
                database_file: "expboard.sqlite".to_string(),
            },
            http: HttpConfig {
                timeout_secs: 30,
                user_agent: concat!("expboard/", env!("CARGO_PKG_VERSION")).to_string(),
            },
            geocoding: GeocodingConfig {
                enabled: true,
                endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
                result_limit: 1,
                batch_size: 5,
                batch_delay_ms: 200,
                cache_capacity: 1024,
            },
            semantic: SemanticConfig {
                enabled: true,
                endpoint: "http://localhost:54321/functions/v1/semantic-job-search".to_string(),
                api_token_env: "EXPBOARD_SESSION_TOKEN".to_string(),
            },
            search: SearchConfig {
                default_page_size: 10,
                page_size_options: vec![10, 20, 50],
                default_radius_km: -1,
            },
            profiles: HashMap::new(),
        }
    }
}
