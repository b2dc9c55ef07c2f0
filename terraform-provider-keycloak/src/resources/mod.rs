pub mod identity_provider;
pub mod ldap_user_federation;
pub mod openid_client;
pub mod protocol_mapper;
pub mod realm;

use crate::resource::DynamicResource;
use keycloak_domain::domain::{
    errors::{DomainError, DomainResult},
    values::{durations_equivalent, format_duration_seconds, optional_duration_seconds},
};

/// Every managed resource type the provider serves.
pub fn all_resources() -> Vec<Box<dyn DynamicResource>> {
    let mut resources: Vec<Box<dyn DynamicResource>> = vec![
        Box::new(realm::RealmResource),
        Box::new(openid_client::OpenIdClientResource),
        Box::new(ldap_user_federation::LdapUserFederationResource),
    ];
    resources.extend(identity_provider::resources());
    resources.extend(protocol_mapper::resources());
    resources
}

/// Converts a configured duration string into the seconds Keycloak stores.
/// Empty and `"0"` leave the field out of the request.
pub(crate) fn seconds_from_duration(field: &str, value: Option<&str>) -> DomainResult<Option<i32>> {
    let Some(seconds) = value.map(optional_duration_seconds).transpose()?.flatten() else {
        return Ok(None);
    };
    i32::try_from(seconds)
        .map(Some)
        .map_err(|_| DomainError::validation(format!("{field} is out of range")))
}

/// Formats seconds read from Keycloak, keeping the configured spelling when
/// it denotes the same duration.
pub(crate) fn duration_from_seconds(seconds: Option<i32>, known: Option<&String>) -> Option<String> {
    let formatted = format_duration_seconds(i64::from(seconds?));
    match known {
        Some(known) if durations_equivalent(known, &formatted) => Some(known.clone()),
        _ => Some(formatted),
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_keep_configured_spelling() {
        assert_eq!(
            seconds_from_duration("access_token_lifespan", Some("1h30m")).unwrap(),
            Some(5_400)
        );
        assert_eq!(seconds_from_duration("access_token_lifespan", Some("0")).unwrap(), None);
        assert_eq!(seconds_from_duration("access_token_lifespan", None).unwrap(), None);

        let known = "90m".to_string();
        assert_eq!(duration_from_seconds(Some(5_400), Some(&known)), Some(known.clone()));
        assert_eq!(duration_from_seconds(Some(3_600), Some(&known)), Some("1h".to_string()));
        assert_eq!(duration_from_seconds(None, Some(&known)), None);
    }

    #[test]
    fn registry_has_unique_type_names() {
        let resources = all_resources();
        let mut names: Vec<_> = resources.iter().map(|r| r.type_name()).collect();
        let count = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), count);
        assert_eq!(count, 23);
    }
}
