use thiserror::Error;

/// Domain-specific errors for Keycloak provider operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Local validation failure, raised before any request is sent.
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("expected {field} to be one of [{allowed}], got {value}")]
    InvalidValue {
        field: String,
        allowed: String,
        value: String,
    },

    #[error("\"{field}\": conflicts with {other}")]
    Conflict { field: String, other: String },

    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Invalid import. Supported import formats: {expected}")]
    InvalidImportId { id: String, expected: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("External service error: {service} - {message}")]
    ExternalService {
        service: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity_type: entity_type.into(),
            identifier: identifier.into(),
        }
    }

    pub fn invalid_value(field: &str, allowed: &[&str], value: &str) -> Self {
        DomainError::InvalidValue {
            field: field.to_string(),
            allowed: allowed.join(" "),
            value: value.to_string(),
        }
    }

    /// True when Keycloak reported the object as missing (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::NotFound { .. }
                | DomainError::ExternalService {
                    status: Some(404),
                    ..
                }
        )
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Checks `value` against a fixed set of accepted values.
pub fn ensure_one_of(field: &str, value: &str, allowed: &[&str]) -> DomainResult<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(DomainError::invalid_value(field, allowed, value))
    }
}

/// Repository-specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request failed with status {status}: {message}")]
    HttpFailure { status: u16, message: String },

    #[error("Serialization failed: {message}")]
    SerializationFailed { message: String },

    #[error("Missing identifier in response for {entity_type}")]
    MissingIdentifier { entity_type: String },
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ConnectionFailed { message } => DomainError::ExternalService {
                service: "Keycloak".to_string(),
                status: None,
                message,
            },
            RepositoryError::HttpFailure { status, message } => DomainError::ExternalService {
                service: "Keycloak".to_string(),
                status: Some(status),
                message,
            },
            RepositoryError::SerializationFailed { message } => {
                DomainError::Serialization { message }
            }
            RepositoryError::MissingIdentifier { entity_type } => DomainError::ExternalService {
                service: "Keycloak".to_string(),
                status: None,
                message: format!("{entity_type} created but no id was returned"),
            },
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}")]
    MissingRequired { key: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl From<ConfigError> for DomainError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingRequired { key } => DomainError::Configuration {
                message: format!("Missing required configuration: {key}"),
            },
            ConfigError::InvalidValue { key, message } => DomainError::Configuration {
                message: format!("Invalid value for {key}: {message}"),
            },
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_carry_fixed_prefix() {
        let err = DomainError::validation("one of ClientId or ClientScopeId must be set");
        assert_eq!(
            err.to_string(),
            "validation error: one of ClientId or ClientScopeId must be set"
        );
    }

    #[test]
    fn enum_errors_list_allowed_values() {
        let err = ensure_one_of("claim_value_type", "float", &["String", "long"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected claim_value_type to be one of [String long], got float"
        );
    }

    #[test]
    fn http_404_counts_as_not_found() {
        let err: DomainError = RepositoryError::HttpFailure {
            status: 404,
            message: "Could not find".to_string(),
        }
        .into();
        assert!(err.is_not_found());

        let err: DomainError = RepositoryError::HttpFailure {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert!(!err.is_not_found());
    }
}
