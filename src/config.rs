use crate::constants::{
    BROWSER_USER_AGENT, DEFAULT_DELIMITER, DEFAULT_TIMEOUT_SECONDS, DNB_COVER_ENDPOINT, KNV_DATABASES,
    KNV_ENDPOINT,
};
use crate::error::{EnrichError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub csv: CsvConfig,
    pub cover: CoverConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub images: PathBuf,
    pub language: PathBuf,
    pub cache: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("src/Titelexport.csv"),
            output: PathBuf::from("dist/data.csv"),
            images: PathBuf::from("dist/images"),
            language: PathBuf::from("languages/de.json"),
            cache: PathBuf::from(".cache/knv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    pub delimiter: char,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl CsvConfig {
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| EnrichError::Config(format!("CSV delimiter '{}' is not ASCII", self.delimiter)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DNB_COVER_ENDPOINT.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl CoverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub databases: Vec<String>,
    pub login_file: PathBuf,
    pub timeout_seconds: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: KNV_ENDPOINT.to_string(),
            databases: KNV_DATABASES.iter().map(|db| db.to_string()).collect(),
            login_file: PathBuf::from("knv.login.json"),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

/// Catalog login, as stored in `knv.login.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "Benutzer")]
    pub user: String,
    #[serde(rename = "Passwort")]
    pub password: String,
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// `KNV_USER`/`KNV_PASSWORD` win over the login file; neither is an error
    /// only once a catalog request actually needs them.
    pub fn credentials(&self) -> Result<Option<Credentials>> {
        if let (Ok(user), Ok(password)) = (std::env::var("KNV_USER"), std::env::var("KNV_PASSWORD")) {
            return Ok(Some(Credentials { user, password }));
        }

        if !self.login_file.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.login_file).map_err(|e| {
            EnrichError::Config(format!(
                "Failed to read login file '{}': {}",
                self.login_file.display(),
                e
            ))
        })?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            EnrichError::Config(format!("Failed to read config file '{}': {}", config_path.display(), e))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        config.csv.delimiter_byte()?;
        Ok(config)
    }

    /// Falls back to defaults when no config file exists
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            Ok(Self::default())
        }
    }
}
