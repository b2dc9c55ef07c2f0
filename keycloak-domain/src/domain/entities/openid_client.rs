use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

pub const ACCESS_TYPES: &[&str] = &["CONFIDENTIAL", "PUBLIC", "BEARER-ONLY"];

/// How a client authenticates, derived from Keycloak's `publicClient` and
/// `bearerOnly` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccessType {
    #[default]
    Confidential,
    Public,
    BearerOnly,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Confidential => "CONFIDENTIAL",
            AccessType::Public => "PUBLIC",
            AccessType::BearerOnly => "BEARER-ONLY",
        }
    }

    pub fn parse(value: &str) -> DomainResult<Self> {
        match value {
            "CONFIDENTIAL" => Ok(AccessType::Confidential),
            "PUBLIC" => Ok(AccessType::Public),
            "BEARER-ONLY" => Ok(AccessType::BearerOnly),
            other => Err(DomainError::invalid_value("access_type", ACCESS_TYPES, other)),
        }
    }

    /// `bearerOnly` wins over `publicClient`.
    pub fn from_flags(public_client: bool, bearer_only: bool) -> Self {
        if bearer_only {
            AccessType::BearerOnly
        } else if public_client {
            AccessType::Public
        } else {
            AccessType::Confidential
        }
    }

    pub fn public_client(&self) -> bool {
        matches!(self, AccessType::Public)
    }

    pub fn bearer_only(&self) -> bool {
        matches!(self, AccessType::BearerOnly)
    }
}

/// OpenID Connect client registered in a realm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenIdClient {
    /// Keycloak's internal uuid
    pub id: Option<String>,
    pub realm_id: String,
    pub client_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
    pub access_type: AccessType,
    pub client_secret: Option<String>,
    pub standard_flow_enabled: bool,
    pub implicit_flow_enabled: bool,
    pub direct_access_grants_enabled: bool,
    pub service_accounts_enabled: bool,
    pub valid_redirect_uris: Vec<String>,
    pub web_origins: Vec<String>,
    pub root_url: Option<String>,
    pub base_url: Option<String>,
    pub admin_url: Option<String>,
    pub full_scope_allowed: bool,
}

impl OpenIdClient {
    pub fn new(realm_id: impl Into<String>, client_id: impl Into<String>, access_type: AccessType) -> Self {
        Self {
            id: None,
            realm_id: realm_id.into(),
            client_id: client_id.into(),
            name: None,
            description: None,
            enabled: true,
            access_type,
            client_secret: None,
            standard_flow_enabled: false,
            implicit_flow_enabled: false,
            direct_access_grants_enabled: false,
            service_accounts_enabled: false,
            valid_redirect_uris: Vec::new(),
            web_origins: Vec::new(),
            root_url: None,
            base_url: None,
            admin_url: None,
            full_scope_allowed: true,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.realm_id.is_empty() {
            return Err(DomainError::validation("realm_id must be set"));
        }
        if self.client_id.is_empty() {
            return Err(DomainError::validation("client_id must be set"));
        }

        match self.access_type {
            AccessType::BearerOnly => {
                if self.standard_flow_enabled
                    || self.implicit_flow_enabled
                    || self.direct_access_grants_enabled
                    || self.service_accounts_enabled
                {
                    return Err(DomainError::validation(
                        "login flows and service accounts cannot be enabled on a BEARER-ONLY client",
                    ));
                }
            }
            AccessType::Public => {
                if self.client_secret.as_deref().is_some_and(|s| !s.is_empty()) {
                    return Err(DomainError::validation(
                        "client_secret cannot be set on a PUBLIC client",
                    ));
                }
                if self.service_accounts_enabled {
                    return Err(DomainError::validation(
                        "service accounts cannot be enabled on a PUBLIC client",
                    ));
                }
            }
            AccessType::Confidential => {}
        }

        if (self.standard_flow_enabled || self.implicit_flow_enabled)
            && self.valid_redirect_uris.is_empty()
        {
            return Err(DomainError::validation(
                "must specify at least one valid redirect uri if standard flow or implicit flow is enabled",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_type_flags() {
        assert_eq!(AccessType::from_flags(true, true), AccessType::BearerOnly);
        assert_eq!(AccessType::from_flags(true, false), AccessType::Public);
        assert_eq!(AccessType::from_flags(false, false), AccessType::Confidential);
        assert_eq!(
            AccessType::parse("bearer").unwrap_err().to_string(),
            "expected access_type to be one of [CONFIDENTIAL PUBLIC BEARER-ONLY], got bearer"
        );
    }

    #[test]
    fn bearer_only_clients_have_no_flows() {
        let mut client = OpenIdClient::new("r1", "c1", AccessType::BearerOnly);
        assert!(client.validate().is_ok());

        client.direct_access_grants_enabled = true;
        assert!(client
            .validate()
            .unwrap_err()
            .to_string()
            .starts_with("validation error: "));
    }

    #[test]
    fn standard_flow_needs_redirect_uris() {
        let mut client = OpenIdClient::new("r1", "web", AccessType::Confidential);
        client.standard_flow_enabled = true;
        assert!(client.validate().is_err());

        client.valid_redirect_uris = vec!["https://app.example.com/*".to_string()];
        assert!(client.validate().is_ok());
    }
}
