use crate::domain::entities::protocol_mapper::MapperParent;
use crate::domain::errors::{DomainError, DomainResult};

pub const REALM_IMPORT_FORMAT: &str = "{{realm}}";
pub const IDENTITY_PROVIDER_IMPORT_FORMAT: &str = "{{realm}}/{{identityProviderAlias}}";
pub const PROTOCOL_MAPPER_IMPORT_FORMAT: &str = "{{realmId}}/client/{{clientId}}/{{protocolMapperId}}, {{realmId}}/client-scope/{{clientScopeId}}/{{protocolMapperId}}";
pub const LDAP_USER_FEDERATION_IMPORT_FORMAT: &str = "{{realmId}}/{{userFederationId}}";
pub const OPENID_CLIENT_IMPORT_FORMAT: &str = "{{realmId}}/{{openidClientId}}";

/// Location of a protocol mapper decoded from its import id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolMapperImportId {
    pub realm_id: String,
    pub parent: MapperParent,
    pub mapper_id: String,
}

fn invalid(id: &str, expected: &str) -> DomainError {
    DomainError::InvalidImportId {
        id: id.to_string(),
        expected: expected.to_string(),
    }
}

fn split_exact<'a>(id: &'a str, count: usize, expected: &str) -> DomainResult<Vec<&'a str>> {
    let parts: Vec<&str> = id.split('/').collect();
    if parts.len() != count || parts.iter().any(|p| p.is_empty()) {
        return Err(invalid(id, expected));
    }
    Ok(parts)
}

pub fn parse_realm_import_id(id: &str) -> DomainResult<String> {
    let parts = split_exact(id, 1, REALM_IMPORT_FORMAT)?;
    Ok(parts[0].to_string())
}

/// `{realm}/{alias}`
pub fn parse_identity_provider_import_id(id: &str) -> DomainResult<(String, String)> {
    let parts = split_exact(id, 2, IDENTITY_PROVIDER_IMPORT_FORMAT)?;
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// `{realmId}/client/{clientId}/{mapperId}` or
/// `{realmId}/client-scope/{clientScopeId}/{mapperId}`
pub fn parse_protocol_mapper_import_id(id: &str) -> DomainResult<ProtocolMapperImportId> {
    let parts = split_exact(id, 4, PROTOCOL_MAPPER_IMPORT_FORMAT)?;
    let parent = match parts[1] {
        "client" => MapperParent::Client(parts[2].to_string()),
        "client-scope" => MapperParent::ClientScope(parts[2].to_string()),
        _ => return Err(invalid(id, PROTOCOL_MAPPER_IMPORT_FORMAT)),
    };

    Ok(ProtocolMapperImportId {
        realm_id: parts[0].to_string(),
        parent,
        mapper_id: parts[3].to_string(),
    })
}

/// `{realmId}/{userFederationId}`
pub fn parse_ldap_user_federation_import_id(id: &str) -> DomainResult<(String, String)> {
    let parts = split_exact(id, 2, LDAP_USER_FEDERATION_IMPORT_FORMAT)?;
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// `{realmId}/{clientUuid}`
pub fn parse_openid_client_import_id(id: &str) -> DomainResult<(String, String)> {
    let parts = split_exact(id, 2, OPENID_CLIENT_IMPORT_FORMAT)?;
    Ok((parts[0].to_string(), parts[1].to_string()))
}

pub fn protocol_mapper_import_id(realm_id: &str, parent: &MapperParent, mapper_id: &str) -> String {
    format!("{realm_id}/{}/{}/{mapper_id}", parent.kind(), parent.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_provider_ids() {
        assert_eq!(
            parse_identity_provider_import_id("r1/github").unwrap(),
            ("r1".to_string(), "github".to_string())
        );
        let err = parse_identity_provider_import_id("r1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid import. Supported import formats: {{realm}}/{{identityProviderAlias}}"
        );
        assert!(parse_identity_provider_import_id("r1/a/b").is_err());
    }

    #[test]
    fn protocol_mapper_ids_on_clients_and_scopes() {
        let parsed = parse_protocol_mapper_import_id("r1/client/c-uuid/m-uuid").unwrap();
        assert_eq!(parsed.realm_id, "r1");
        assert_eq!(parsed.parent, MapperParent::Client("c-uuid".to_string()));
        assert_eq!(parsed.mapper_id, "m-uuid");

        let parsed = parse_protocol_mapper_import_id("r1/client-scope/s-uuid/m-uuid").unwrap();
        assert_eq!(parsed.parent, MapperParent::ClientScope("s-uuid".to_string()));

        assert_eq!(
            protocol_mapper_import_id(&parsed.realm_id, &parsed.parent, &parsed.mapper_id),
            "r1/client-scope/s-uuid/m-uuid"
        );
    }

    #[test]
    fn malformed_protocol_mapper_ids() {
        for id in ["r1/client/c", "r1/group/g/m", "r1//c/m", "r1/client/c/m/extra"] {
            let err = parse_protocol_mapper_import_id(id).unwrap_err();
            assert!(
                err.to_string().starts_with("Invalid import. Supported import formats:"),
                "{id}: {err}"
            );
        }
    }
}
