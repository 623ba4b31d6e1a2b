use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory for per-invocation scratch files; the system temp
    /// directory when unset.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl GeneralConfig {
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            scratch_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default = "default_input_container")]
    pub input_container: String,

    #[serde(default = "default_output_container")]
    pub output_container: String,

    #[serde(default)]
    pub local: Option<LocalStoreConfig>,

    #[serde(default)]
    pub azure: Option<AzureStoreConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            input_container: default_input_container(),
            output_container: default_output_container(),
            local: None,
            azure: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LocalStoreConfig {
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AzureStoreConfig {
    pub endpoint: String,

    pub sas_token: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpeechConfig {
    #[serde(default = "default_engine")]
    pub engine: String,

    #[serde(default)]
    pub rest: Option<RestSpeechConfig>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            rest: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RestSpeechConfig {
    pub endpoint: String,

    pub api_key: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend() -> String {
    "local".to_string()
}

fn default_input_container() -> String {
    "audio".to_string()
}

fn default_output_container() -> String {
    "text".to_string()
}

fn default_store_root() -> PathBuf {
    PathBuf::from("./blobs")
}

fn default_engine() -> String {
    "null".to_string()
}

fn default_language() -> String {
    "ja-JP".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = input.to_string();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => {
                return Err(ConfigError::EnvVarNotFound(var_name.to_string()));
            }
        }
    }

    Ok(result)
}

fn check_endpoint(field: &str, endpoint: &str) -> Result<(), ConfigError> {
    Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
        field: field.to_string(),
        message: e.to_string(),
    })?;
    Ok(())
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let interpolated = interpolate_env_vars(&content)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (for testing).
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }

    /// Eager validation, run once at startup: the selected storage backend
    /// and speech engine must have their sections present and endpoint
    /// fields must parse as URLs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == "azure" {
            let azure = self
                .storage
                .azure
                .as_ref()
                .ok_or_else(|| ConfigError::MissingSection("storage.azure".to_string()))?;
            check_endpoint("storage.azure.endpoint", &azure.endpoint)?;
        }

        if self.speech.engine == "rest" {
            let rest = self
                .speech
                .rest
                .as_ref()
                .ok_or_else(|| ConfigError::MissingSection("speech.rest".to_string()))?;
            check_endpoint("speech.rest.endpoint", &rest.endpoint)?;
        }

        Ok(())
    }
}
