//! Server configuration parsing.

use std::path::Path;

use serde::Deserialize;

use crate::schema::SchemaRegistry;
use crate::service::DEFAULT_RESULT_SIZE;

/// Server configuration loaded from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Server settings.
    pub server: ServerConfig,
    /// Ledger storage settings.
    pub store: StoreConfig,
    /// Asset listing settings.
    #[serde(default)]
    pub assets: AssetsConfig,
    /// Identity header settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// CORS settings.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Field schemas, default plus per-type overrides.
    #[serde(default)]
    pub schema: SchemaRegistry,
}

/// Server bind settings.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1" or "0.0.0.0").
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
}

/// Ledger storage settings.
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Path to the ledger directory. Created on first start.
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Versions returned by the versions endpoint when `size` is not given.
    pub default_result_size: usize,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            default_result_size: DEFAULT_RESULT_SIZE,
        }
    }
}

/// Headers carrying the identity resolved by the upstream auth proxy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub user_header: String,
    pub admin_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: "x-asset-user".to_string(),
            admin_header: "x-asset-admin".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "asset_ledger=debug,tower_http=info".
    pub level: String,
    pub format: LogFormat,
    /// "stdout", "stderr", or a file path (appended to).
    pub output: String,
    pub color: bool,
    pub target: bool,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            output: "stdout".to_string(),
            color: true,
            target: true,
            timestamps: true,
        }
    }
}

/// CORS settings. Disabled means cross-origin requests are denied.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
    /// Preflight cache duration in seconds.
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_origins: vec!["*".to_string()],
            allow_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allow_headers: ["content-type", "x-asset-user", "x-asset-admin"]
                .into_iter()
                .map(String::from)
                .collect(),
            allow_credentials: false,
            max_age: 3600,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Get the socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Io(String, std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaProvider;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
bind = "127.0.0.1"
port = 8080

[store]
path = ".asset-ledger"

[assets]
default_result_size = 25

[logging]
format = "json"
output = "stderr"

[schema]
required_fields = ["name"]

[schema.enforced_fields]
status = ["enabled", "disabled"]

[schema.types.host]
required_fields = ["name", "ip"]
auto_create_requires_admin = false
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.store.path, ".asset-ledger");
        assert_eq!(config.assets.default_result_size, 25);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.auth.user_header, "x-asset-user");
        assert!(!config.cors.enabled);

        assert!(config.schema.schema("rack").required_fields.contains("name"));
        assert!(!config.schema.schema("host").auto_create_requires_admin);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let toml = r#"
[server]
bind = "0.0.0.0"
port = 9000

[store]
path = "/var/lib/asset-ledger"
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.assets.default_result_size, DEFAULT_RESULT_SIZE);
        assert!(config.schema.schema("host").required_fields.is_empty());
        assert!(config.schema.schema("host").auto_create_requires_admin);
    }
}
