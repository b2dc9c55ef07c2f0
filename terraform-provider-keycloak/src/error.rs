use crate::schema::Diagnostic;
use keycloak_domain::domain::errors::DomainError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Schema-level problems found before any request is made.
    #[error("{} invalid attribute(s)", .0.len())]
    Invalid(Vec<Diagnostic>),

    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    #[error("Unknown data source: {0}")]
    UnknownDataSource(String),

    #[error("Provider not configured")]
    NotConfigured,

    #[error("Cannot import non-existent remote object: {0}")]
    ImportNotFound(String),

    #[error("Invalid resource data: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Renders the error as the diagnostics returned to Terraform.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        match self {
            ProviderError::Invalid(diagnostics) => diagnostics,
            ProviderError::Domain(DomainError::Conflict { ref field, .. }) => {
                let attribute = field.clone();
                vec![Diagnostic::error(self.to_string()).with_attribute(attribute)]
            }
            ProviderError::Domain(DomainError::InvalidValue { ref field, .. }) => {
                let attribute = field.clone();
                vec![Diagnostic::error(self.to_string()).with_attribute(attribute)]
            }
            other => vec![Diagnostic::error(other.to_string())],
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Severity;

    #[test]
    fn domain_errors_keep_their_wording() {
        let err: ProviderError = DomainError::validation("realm must be set").into();
        let diagnostics = err.into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].summary, "validation error: realm must be set");
        assert!(diagnostics[0].attribute.is_none());
    }

    #[test]
    fn conflicts_point_at_the_attribute() {
        let err: ProviderError = DomainError::Conflict {
            field: "client_id".to_string(),
            other: "client_scope_id".to_string(),
        }
        .into();
        let diagnostics = err.into_diagnostics();
        assert_eq!(diagnostics[0].summary, "\"client_id\": conflicts with client_scope_id");
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("client_id"));
    }
}
