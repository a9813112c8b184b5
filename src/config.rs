use serde::Deserialize;
use std::path::PathBuf;

/// Backend connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the backend REST interface, including the version prefix
    pub base_url: String,
    /// Application identifier sent with every request
    pub app_id: String,
    /// Master key sent with every request
    pub master_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/1".to_string(),
            app_id: String::new(),
            master_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Load settings with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut settings = Self::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            settings = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        }

        // Apply environment variable overrides
        if let Ok(base_url) = std::env::var("RESTMODEL_BASE_URL") {
            settings.base_url = base_url;
        }
        if let Ok(app_id) = std::env::var("RESTMODEL_APP_ID") {
            settings.app_id = app_id;
        }
        if let Ok(master_key) = std::env::var("RESTMODEL_MASTER_KEY") {
            settings.master_key = master_key;
        }

        Ok(settings)
    }

    /// Default config file path: ~/.config/restmodel/config.yaml
    pub fn default_config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".config")
            .join("restmodel")
            .join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    e
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
