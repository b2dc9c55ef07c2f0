use crate::application::ports::{
    AppConfig, ConfigurationPort, HttpConfig, KeycloakConfig, LoggingConfig,
};
use crate::domain::errors::DomainResult;

/// Environment-based configuration adapter
pub struct EnvConfigurationAdapter {
    config: AppConfig,
}

impl EnvConfigurationAdapter {
    pub fn new() -> DomainResult<Self> {
        let config = AppConfig::from_env()?;
        Ok(Self { config })
    }

    /// Wraps an already merged configuration, e.g. env defaults overridden
    /// by provider block attributes.
    pub fn from_config(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn into_inner(self) -> AppConfig {
        self.config
    }
}

impl ConfigurationPort for EnvConfigurationAdapter {
    fn get_keycloak_config(&self) -> &KeycloakConfig {
        &self.config.keycloak
    }

    fn get_http_config(&self) -> &HttpConfig {
        &self.config.http
    }

    fn get_logging_config(&self) -> &LoggingConfig {
        &self.config.logging
    }

    fn validate(&self) -> DomainResult<()> {
        self.config.validate()
    }
}
