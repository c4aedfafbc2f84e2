use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("relay_timeout_secs must be greater than zero")]
    ZeroRelayTimeout,
}

/// Status returned when a known client posts to a channel outside its scope.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDeniedStatus {
    /// 401, the historical behavior.
    #[default]
    Unauthorized,
    /// 403.
    Forbidden,
}

impl FromStr for PermissionDeniedStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unauthorized" | "401" => Ok(PermissionDeniedStatus::Unauthorized),
            "forbidden" | "403" => Ok(PermissionDeniedStatus::Forbidden),
            other => Err(other.to_string()),
        }
    }
}

/// Process settings. The relay document itself (clients, channels, secret)
/// lives in the file named by `relay_config_path`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_address: String,
    pub relay_config_path: PathBuf,
    pub log_dir: String,
    pub relay_timeout: Duration,
    pub permission_denied_status: PermissionDeniedStatus,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            relay_config_path: PathBuf::from(default_relay_config_path()),
            log_dir: default_log_dir(),
            relay_timeout: Duration::from_secs(DEFAULT_RELAY_TIMEOUT_SECS),
            permission_denied_status: PermissionDeniedStatus::default(),
        }
    }
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
struct PartialServerConfig {
    listen_address: Option<String>,
    relay_config_path: Option<String>,
    log_dir: Option<String>,
    relay_timeout_secs: Option<u64>,
    permission_denied_status: Option<PermissionDeniedStatus>,
}

const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 10;

fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_relay_config_path() -> String {
    "relay.toml".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl PartialServerConfig {
    fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    fn from_env() -> Result<Self, SettingsError> {
        let relay_timeout_secs = match env::var("RELAY_TIMEOUT_SECS") {
            Ok(value) => Some(value.parse::<u64>().map_err(|_| SettingsError::InvalidEnv {
                name: "RELAY_TIMEOUT_SECS",
                value,
            })?),
            Err(_) => None,
        };
        let permission_denied_status = match env::var("PERMISSION_DENIED_STATUS") {
            Ok(value) => Some(value.parse::<PermissionDeniedStatus>().map_err(|value| {
                SettingsError::InvalidEnv {
                    name: "PERMISSION_DENIED_STATUS",
                    value,
                }
            })?),
            Err(_) => None,
        };

        Ok(Self {
            listen_address: env::var("LISTEN_ADDRESS").ok(),
            relay_config_path: env::var("RELAY_CONFIG_PATH").ok(),
            log_dir: env::var("LOG_DIR").ok(),
            relay_timeout_secs,
            permission_denied_status,
        })
    }
}

impl ServerConfig {
    /// Loads settings from an optional TOML file, then lets environment
    /// variables override it. Missing values fall back to defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self, SettingsError> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = match config_path.map(Path::new) {
            Some(path) if path.exists() => PartialServerConfig::from_file(path)?,
            _ => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config = PartialServerConfig::from_env()?;

        // 3. Merge: environment overrides file
        let config = Self::merge(env_config, file_config);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.relay_timeout.is_zero() {
            return Err(SettingsError::ZeroRelayTimeout);
        }
        Ok(())
    }

    fn merge(env_config: PartialServerConfig, file_config: PartialServerConfig) -> Self {
        let defaults = ServerConfig::default();
        ServerConfig {
            listen_address: env_config
                .listen_address
                .or(file_config.listen_address)
                .unwrap_or(defaults.listen_address),
            relay_config_path: env_config
                .relay_config_path
                .or(file_config.relay_config_path)
                .map(PathBuf::from)
                .unwrap_or(defaults.relay_config_path),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or(defaults.log_dir),
            relay_timeout: env_config
                .relay_timeout_secs
                .or(file_config.relay_timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.relay_timeout),
            permission_denied_status: env_config
                .permission_denied_status
                .or(file_config.permission_denied_status)
                .unwrap_or(defaults.permission_denied_status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_values_fill_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "listen_address = \"127.0.0.1:9000\"\nrelay_timeout_secs = 3\npermission_denied_status = \"forbidden\""
        )
        .unwrap();

        let file_config = PartialServerConfig::from_file(file.path()).unwrap();
        let config = ServerConfig::merge(PartialServerConfig::default(), file_config);

        assert_eq!(config.listen_address, "127.0.0.1:9000");
        assert_eq!(config.relay_timeout, Duration::from_secs(3));
        assert_eq!(config.permission_denied_status, PermissionDeniedStatus::Forbidden);
        assert_eq!(config.relay_config_path, PathBuf::from("relay.toml"));
        assert_eq!(config.log_dir, "logs");
    }

    #[test]
    fn test_env_layer_overrides_file_layer() {
        let file_config = PartialServerConfig {
            log_dir: Some("/var/log/relay".to_string()),
            relay_timeout_secs: Some(30),
            ..Default::default()
        };
        let env_config = PartialServerConfig {
            relay_timeout_secs: Some(5),
            ..Default::default()
        };

        let config = ServerConfig::merge(env_config, file_config);
        assert_eq!(config.relay_timeout, Duration::from_secs(5));
        assert_eq!(config.log_dir, "/var/log/relay");
    }

    #[test]
    fn test_unknown_settings_key_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "jwt_secret = \"nope\"").unwrap();
        assert!(matches!(
            PartialServerConfig::from_file(file.path()),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn test_permission_denied_status_parsing() {
        assert_eq!(
            "FORBIDDEN".parse::<PermissionDeniedStatus>(),
            Ok(PermissionDeniedStatus::Forbidden)
        );
        assert_eq!(
            "401".parse::<PermissionDeniedStatus>(),
            Ok(PermissionDeniedStatus::Unauthorized)
        );
        assert!("teapot".parse::<PermissionDeniedStatus>().is_err());
    }

    #[test]
    fn test_zero_relay_timeout_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "relay_timeout_secs = 0").unwrap();

        let file_config = PartialServerConfig::from_file(file.path()).unwrap();
        let config = ServerConfig::merge(PartialServerConfig::default(), file_config);
        assert!(matches!(
            config.validate(),
            Err(SettingsError::ZeroRelayTimeout)
        ));
        assert!(ServerConfig::default().validate().is_ok());
    }
}
