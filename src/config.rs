//! Service configuration
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional TOML file, and environment variables (a `.env` file is loaded into
//! the environment by `main` before any of this runs).
use crate::ai_sql::config::AiSqlConfig;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const CONFIG_DIR_NAME: &str = "sqlchat";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::Invalid(format!("unknown log level '{other}'"))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub console_output: bool,
    pub file_output: bool,
    /// Directory for the rolling log file
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            console_output: true,
            file_output: false,
            file_path: default_log_dir(),
        }
    }
}

fn default_log_dir() -> String {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CONFIG_DIR_NAME)
        .join("logs")
        .to_string_lossy()
        .to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allow any origin, method and header (matches the browser frontend setup)
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_permissive: true,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual fields
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: None,
            name: "mysql".to_string(),
            max_connections: 10,
            acquire_timeout_seconds: 10,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field(
                "url",
                &self
                    .url
                    .as_ref()
                    .map(|url| crate::password_sanitizer::sanitize_connection_url(url)),
            )
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_seconds", &self.acquire_timeout_seconds)
            .finish()
    }
}

impl DatabaseConfig {
    /// Build the MySQL connection URL
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        let user = percent_encode(&self.user);
        match &self.password {
            Some(password) => format!(
                "mysql://{user}:{}@{}:{}/{}",
                percent_encode(password),
                self.host,
                self.port,
                self.name
            ),
            None => format!("mysql://{user}@{}:{}/{}", self.host, self.port, self.name),
        }
    }
}

fn percent_encode(component: &str) -> String {
    utf8_percent_encode(component, NON_ALPHANUMERIC).to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ai_sql: AiSqlConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Default config file location (`<config dir>/sqlchat/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration from `path` (or the default location) and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Config::default(),
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config file {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(port) = non_empty("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT is not a valid port: {port}")))?;
        }
        if let Some(host) = non_empty("HOST") {
            self.server.host = host;
        }

        if let Some(url) = non_empty("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(host) = non_empty("DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = non_empty("DB_PORT") {
            self.database.port = port.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("DB_PORT is not a valid port: {port}"))
            })?;
        }
        if let Some(user) = non_empty("DB_USER") {
            self.database.user = user;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            self.database.password = Some(password);
        }
        if let Some(name) = non_empty("DB_NAME") {
            self.database.name = name;
        }

        self.ai_sql.apply_env_overrides(&non_empty);

        if let Some(level) = non_empty("LOG_LEVEL") {
            self.logging.level = level.parse()?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be greater than 0".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        if self.database.acquire_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "database.acquire_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        self.ai_sql.validate().map_err(ConfigError::Invalid)
    }
}
