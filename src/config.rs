//! Configuration types for the npa application.

use std::path::{Path, PathBuf};

use npa_search::SearchConfig;
use serde::{Deserialize, Serialize};

use crate::error::{NpaError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpaConfig {
    pub api: ApiConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

/// Registry API access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the registry JSON API.
    pub base_url: String,
    /// Base URL that serves published PDFs under `file/pdf`.
    pub file_base_url: String,
    pub user_agent: String,
    pub accept_language: String,
    /// Records requested per query.
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://publication.pravo.gov.ru/api".to_owned(),
            file_base_url: "http://publication.pravo.gov.ru".to_owned(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_owned(),
            accept_language: "ru-RU,ru;q=0.8,en-US;q=0.5,en;q=0.3".to_owned(),
            page_size: 20,
        }
    }
}

/// Logging setup for the host binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "npa=info,npa_search=info".to_owned(),
        }
    }
}

impl NpaConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| NpaError::Config(e.to_string()))
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| NpaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/npa/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("npa"))
            .unwrap_or_else(|| PathBuf::from("/tmp/npa-config"))
            .join("config.toml")
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        for (name, value) in [
            ("api.base_url", &self.api.base_url),
            ("api.file_base_url", &self.api.file_base_url),
        ] {
            url::Url::parse(value).map_err(|e| NpaError::Config(format!("{name}: {e}")))?;
        }
        if self.api.page_size == 0 {
            return Err(NpaError::Config("api.page_size must be greater than 0".into()));
        }
        Ok(())
    }
}
