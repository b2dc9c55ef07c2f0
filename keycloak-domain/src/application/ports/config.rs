use crate::domain::errors::{ConfigError, DomainResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration port for accessing application configuration
pub trait ConfigurationPort: Send + Sync {
    /// Get Keycloak server configuration
    fn get_keycloak_config(&self) -> &KeycloakConfig;

    /// Get HTTP client configuration
    fn get_http_config(&self) -> &HttpConfig;

    /// Get logging configuration
    fn get_logging_config(&self) -> &LoggingConfig;

    /// Validate all configuration
    fn validate(&self) -> DomainResult<()>;
}

/// Keycloak server and admin credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeycloakConfig {
    pub url: String,
    /// Realm the admin user authenticates against.
    pub realm: String,
    pub client_id: String,
    pub username: String,
    pub password: String,
    /// Path prefix in front of `/admin`, e.g. `/auth` on older servers.
    pub base_path: String,
}

impl Default for KeycloakConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            realm: "master".to_string(),
            client_id: "admin-cli".to_string(),
            username: String::new(),
            password: String::new(),
            base_path: String::new(),
        }
    }
}

impl KeycloakConfig {
    pub fn validate(&self) -> DomainResult<()> {
        if self.url.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "KEYCLOAK_URL".to_string(),
            }
            .into());
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "KEYCLOAK_URL".to_string(),
                message: "Must start with http:// or https://".to_string(),
            }
            .into());
        }

        if self.username.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "KEYCLOAK_USER".to_string(),
            }
            .into());
        }

        if self.password.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "KEYCLOAK_PASSWORD".to_string(),
            }
            .into());
        }

        if self.realm.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "KEYCLOAK_REALM".to_string(),
            }
            .into());
        }

        if self.client_id.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "KEYCLOAK_CLIENT_ID".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Server URL including the base path, without a trailing slash.
    pub fn server_url(&self) -> String {
        let base_path = self.base_path.trim_matches('/');
        let url = self.url.trim_end_matches('/');
        if base_path.is_empty() {
            url.to_string()
        } else {
            format!("{url}/{base_path}")
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            connect_timeout_seconds: 10,
            user_agent: concat!("terraform-provider-keycloak/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn validate(&self) -> DomainResult<()> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HTTP_TIMEOUT_SECONDS".to_string(),
                message: "Must be greater than 0".to_string(),
            }
            .into());
        }

        if self.connect_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HTTP_CONNECT_TIMEOUT_SECONDS".to_string(),
                message: "Must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    pub fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn get_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
        }
    }
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
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

/// Log format enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
    Full,
}

/// Complete application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub keycloak: KeycloakConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> DomainResult<()> {
        self.keycloak.validate()?;
        self.http.validate()?;
        Ok(())
    }

    /// Load configuration from environment variables.
    ///
    /// Missing credentials are not an error here: the provider block may
    /// still supply them. Call [`AppConfig::validate`] once all sources are
    /// merged.
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let keycloak = KeycloakConfig {
            url: var("KEYCLOAK_URL", ""),
            realm: var("KEYCLOAK_REALM", &defaults.keycloak.realm),
            client_id: var("KEYCLOAK_CLIENT_ID", &defaults.keycloak.client_id),
            username: var("KEYCLOAK_USER", ""),
            password: var("KEYCLOAK_PASSWORD", ""),
            base_path: var("KEYCLOAK_BASE_PATH", ""),
        };

        let http = HttpConfig {
            timeout_seconds: parse_number(
                "HTTP_TIMEOUT_SECONDS",
                lookup("HTTP_TIMEOUT_SECONDS"),
                defaults.http.timeout_seconds,
            )?,
            connect_timeout_seconds: parse_number(
                "HTTP_CONNECT_TIMEOUT_SECONDS",
                lookup("HTTP_CONNECT_TIMEOUT_SECONDS"),
                defaults.http.connect_timeout_seconds,
            )?,
            user_agent: var("HTTP_USER_AGENT", &defaults.http.user_agent),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL", "info").parse().unwrap_or(LogLevel::Info),
            format: var("LOG_FORMAT", "compact")
                .parse()
                .unwrap_or(LogFormat::Compact),
        };

        Ok(AppConfig {
            keycloak,
            http,
            logging,
        })
    }
}

fn parse_number(key: &str, raw: Option<String>, default: u64) -> DomainResult<u64> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a number of seconds, got {raw}"),
            }
            .into()
        }),
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {s}")),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "full" => Ok(LogFormat::Full),
            _ => Err(format!("Invalid log format: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.keycloak.realm, "master");
        assert_eq!(config.keycloak.client_id, "admin-cli");
        assert_eq!(config.http.timeout_seconds, 15);
        assert_eq!(config.http.connect_timeout_seconds, 10);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.validate().is_err());
    }

    #[test]
    fn reads_credentials_and_base_path() {
        let config = AppConfig::from_lookup(lookup(&[
            ("KEYCLOAK_URL", "http://localhost:8080/"),
            ("KEYCLOAK_USER", "admin"),
            ("KEYCLOAK_PASSWORD", "admin"),
            ("KEYCLOAK_BASE_PATH", "/auth"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.keycloak.server_url(), "http://localhost:8080/auth");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn rejects_url_without_scheme() {
        let config = KeycloakConfig {
            url: "localhost:8080".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_numeric_timeouts() {
        let err = AppConfig::from_lookup(lookup(&[("HTTP_TIMEOUT_SECONDS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("HTTP_TIMEOUT_SECONDS"));
    }
}
