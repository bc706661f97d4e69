use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the model artifact, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "modelo_iris.json";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind (e.g., "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port for the HTTP API
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Serialization format of the model artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    /// `DenseNetwork` serialized as JSON
    #[default]
    DenseJson,
    /// ONNX graph, requires the `onnx` feature
    Onnx,
}

impl ModelFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DenseJson => "dense_json",
            Self::Onnx => "onnx",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path of the trained artifact
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub format: ModelFormat,
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            format: ModelFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for the daily rolling log file (disabled when unset)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("model.path", DEFAULT_MODEL_PATH)?
            .set_default("model.format", ModelFormat::default().as_str())?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("IRIS_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (IRIS_SERVER__PORT, etc.)
            .add_source(
                Environment::with_prefix("IRIS")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.host.trim().is_empty() {
            errors.push("server.host must not be empty".to_string());
        }

        if self.server.port == 0 {
            errors.push("server.port must be non-zero".to_string());
        }

        if self.model.path.as_os_str().is_empty() {
            errors.push("model.path must not be empty".to_string());
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!(
                "logging.level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.logging.level
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:5000");
        assert_eq!(cfg.model.path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(cfg.model.format, ModelFormat::DenseJson);
    }

    #[test]
    fn validate_collects_every_problem() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        cfg.model.path = PathBuf::new();
        cfg.logging.level = "loud".to_string();

        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn load_from_missing_dir_uses_defaults() {
        let dir = std::env::temp_dir().join("iris-predict-no-such-config-dir");
        let cfg = AppConfig::load_from(&dir).unwrap();
        assert_eq!(cfg.model.format, ModelFormat::DenseJson);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn load_from_reads_default_toml() {
        let dir = std::env::temp_dir().join(format!(
            "iris-predict-config-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("default.toml"),
            "[server]\nport = 6123\n\n[model]\npath = \"models/iris.json\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&dir).unwrap();
        assert_eq!(cfg.server.port, 6123);
        assert_eq!(cfg.model.path, PathBuf::from("models/iris.json"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
