use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of a login session in hours (default: 7 days)
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// Mark the session cookie `Secure` (enable behind HTTPS)
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl_hours(),
            secure_cookies: false,
        }
    }
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

/// Longest accepted login session lifetime (one year)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// JSON document with the encoder, scaler, reducer, classifier and label table
    #[serde(default = "default_artifacts_path")]
    pub artifacts_path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifacts_path: default_artifacts_path(),
        }
    }
}

fn default_artifacts_path() -> PathBuf {
    PathBuf::from("./model/artifacts.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Expose Prometheus metrics at /metrics
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse configuration file")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot be used
    pub fn validate(&self) -> Result<()> {
        let ttl = self.auth.session_ttl_hours;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&ttl) {
            bail!(
                "auth.session_ttl_hours must be between 1 and {}, got {}",
                MAX_SESSION_TTL_HOURS,
                ttl
            );
        }
        Ok(())
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            model: ModelConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}
