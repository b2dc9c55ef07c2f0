use super::non_empty;
use crate::resource::Resource;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::ProviderState;
use async_trait::async_trait;
use keycloak_domain::domain::{
    entities::{
        LdapUserFederation, SearchScope, CACHE_POLICIES, EDIT_MODES, TRUSTSTORE_SPI_MODES, VENDORS,
    },
    errors::DomainResult,
    values::{
        durations_equivalent, format_duration_millis, parse_duration_millis,
        parse_ldap_user_federation_import_id,
    },
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LdapUserFederationModel {
    pub id: Option<String>,
    pub realm_id: String,
    pub name: String,
    pub enabled: bool,
    pub priority: i32,
    pub import_enabled: bool,
    pub edit_mode: String,
    pub sync_registrations: bool,
    pub vendor: String,
    pub username_ldap_attribute: String,
    pub rdn_ldap_attribute: String,
    pub uuid_ldap_attribute: String,
    pub user_object_classes: Vec<String>,
    pub connection_url: String,
    pub users_dn: String,
    pub bind_dn: Option<String>,
    pub bind_credential: Option<String>,
    pub custom_user_search_filter: Option<String>,
    pub search_scope: String,
    pub validate_password_policy: bool,
    pub use_truststore_spi: String,
    pub connection_timeout: Option<String>,
    pub read_timeout: Option<String>,
    pub pagination: bool,
    pub batch_size_for_sync: i32,
    pub full_sync_period: i32,
    pub changed_sync_period: i32,
    pub cache_policy: String,
}

fn millis_from_duration(value: &Option<String>) -> DomainResult<Option<i64>> {
    non_empty(value.clone())
        .map(|duration| parse_duration_millis(&duration))
        .transpose()
}

fn duration_from_millis(millis: Option<i64>, known: &Option<String>) -> Option<String> {
    let formatted = format_duration_millis(millis?);
    match known {
        Some(known) if durations_equivalent(known, &formatted) => Some(known.clone()),
        _ => Some(formatted),
    }
}

impl LdapUserFederationModel {
    fn to_entity(&self) -> DomainResult<LdapUserFederation> {
        Ok(LdapUserFederation {
            id: non_empty(self.id.clone()),
            realm_id: self.realm_id.clone(),
            name: self.name.clone(),
            enabled: self.enabled,
            priority: self.priority,
            import_enabled: self.import_enabled,
            edit_mode: self.edit_mode.clone(),
            sync_registrations: self.sync_registrations,
            vendor: self.vendor.clone(),
            username_ldap_attribute: self.username_ldap_attribute.clone(),
            rdn_ldap_attribute: self.rdn_ldap_attribute.clone(),
            uuid_ldap_attribute: self.uuid_ldap_attribute.clone(),
            user_object_classes: self.user_object_classes.clone(),
            connection_url: self.connection_url.clone(),
            users_dn: self.users_dn.clone(),
            bind_dn: non_empty(self.bind_dn.clone()),
            bind_credential: non_empty(self.bind_credential.clone()),
            custom_user_search_filter: non_empty(self.custom_user_search_filter.clone()),
            search_scope: SearchScope::parse(&self.search_scope)?,
            validate_password_policy: self.validate_password_policy,
            use_truststore_spi: self.use_truststore_spi.clone(),
            connection_timeout_ms: millis_from_duration(&self.connection_timeout)?,
            read_timeout_ms: millis_from_duration(&self.read_timeout)?,
            pagination: self.pagination,
            batch_size_for_sync: self.batch_size_for_sync,
            full_sync_period: self.full_sync_period,
            changed_sync_period: self.changed_sync_period,
            cache_policy: self.cache_policy.clone(),
        })
    }

    fn from_entity(federation: LdapUserFederation, known: Option<&Self>) -> Self {
        let known_timeout = |pick: fn(&Self) -> &Option<String>| {
            known.map(pick).cloned().flatten()
        };

        Self {
            id: federation.id,
            realm_id: federation.realm_id,
            name: federation.name,
            enabled: federation.enabled,
            priority: federation.priority,
            import_enabled: federation.import_enabled,
            edit_mode: federation.edit_mode,
            sync_registrations: federation.sync_registrations,
            vendor: federation.vendor,
            username_ldap_attribute: federation.username_ldap_attribute,
            rdn_ldap_attribute: federation.rdn_ldap_attribute,
            uuid_ldap_attribute: federation.uuid_ldap_attribute,
            user_object_classes: federation.user_object_classes,
            connection_url: federation.connection_url,
            users_dn: federation.users_dn,
            bind_dn: federation.bind_dn,
            bind_credential: federation.bind_credential,
            custom_user_search_filter: federation.custom_user_search_filter,
            search_scope: federation.search_scope.as_str().to_string(),
            validate_password_policy: federation.validate_password_policy,
            use_truststore_spi: federation.use_truststore_spi,
            connection_timeout: duration_from_millis(
                federation.connection_timeout_ms,
                &known_timeout(|k| &k.connection_timeout),
            ),
            read_timeout: duration_from_millis(
                federation.read_timeout_ms,
                &known_timeout(|k| &k.read_timeout),
            ),
            pagination: federation.pagination,
            batch_size_for_sync: federation.batch_size_for_sync,
            full_sync_period: federation.full_sync_period,
            changed_sync_period: federation.changed_sync_period,
            cache_policy: federation.cache_policy,
        }
    }
}

pub struct LdapUserFederationResource;

#[async_trait]
impl Resource for LdapUserFederationResource {
    type Model = LdapUserFederationModel;

    fn type_name(&self) -> &'static str {
        "keycloak_ldap_user_federation"
    }

    fn schema(&self) -> Schema {
        let defaults = LdapUserFederation::default();

        Schema::resource("LDAP user federation provider")
            .attribute("realm_id", Attribute::string().required().force_new())
            .attribute("name", Attribute::string().required())
            .attribute("enabled", Attribute::bool().default(true))
            .attribute("priority", Attribute::int().default(0))
            .attribute("import_enabled", Attribute::bool().default(true))
            .attribute(
                "edit_mode",
                Attribute::string().default(defaults.edit_mode).one_of(EDIT_MODES),
            )
            .attribute("sync_registrations", Attribute::bool().default(false))
            .attribute(
                "vendor",
                Attribute::string().default(defaults.vendor).one_of(VENDORS),
            )
            .attribute("username_ldap_attribute", Attribute::string().required())
            .attribute("rdn_ldap_attribute", Attribute::string().required())
            .attribute("uuid_ldap_attribute", Attribute::string().required())
            .attribute(
                "user_object_classes",
                Attribute::list(AttributeType::String).required(),
            )
            .attribute("connection_url", Attribute::string().required())
            .attribute("users_dn", Attribute::string().required())
            .attribute("bind_dn", Attribute::string())
            .attribute("bind_credential", Attribute::string().sensitive())
            .attribute("custom_user_search_filter", Attribute::string())
            .attribute(
                "search_scope",
                Attribute::string()
                    .default(SearchScope::OneLevel.as_str())
                    .one_of(SearchScope::VALUES),
            )
            .attribute("validate_password_policy", Attribute::bool().default(false))
            .attribute(
                "use_truststore_spi",
                Attribute::string()
                    .default(defaults.use_truststore_spi)
                    .one_of(TRUSTSTORE_SPI_MODES),
            )
            .attribute("connection_timeout", Attribute::duration())
            .attribute("read_timeout", Attribute::duration())
            .attribute("pagination", Attribute::bool().default(true))
            .attribute(
                "batch_size_for_sync",
                Attribute::int().default(defaults.batch_size_for_sync),
            )
            .attribute(
                "full_sync_period",
                Attribute::int().default(defaults.full_sync_period),
            )
            .attribute(
                "changed_sync_period",
                Attribute::int().default(defaults.changed_sync_period),
            )
            .attribute(
                "cache_policy",
                Attribute::string()
                    .default(defaults.cache_policy)
                    .one_of(CACHE_POLICIES),
            )
    }

    fn validate(&self, model: &LdapUserFederationModel) -> DomainResult<()> {
        model.to_entity()?.validate()
    }

    async fn create(
        &self,
        state: &ProviderState,
        planned: LdapUserFederationModel,
    ) -> DomainResult<LdapUserFederationModel> {
        let mut federation = state
            .user_federation_service
            .create_ldap_user_federation(&planned.to_entity()?)
            .await?;
        federation.restore_bind_credential(planned.bind_credential.as_deref());
        Ok(LdapUserFederationModel::from_entity(federation, Some(&planned)))
    }

    async fn read(
        &self,
        state: &ProviderState,
        current: LdapUserFederationModel,
    ) -> DomainResult<Option<LdapUserFederationModel>> {
        let Some(id) = non_empty(current.id.clone()) else {
            return Ok(None);
        };
        let Some(mut federation) = state
            .user_federation_service
            .get_ldap_user_federation(&current.realm_id, &id)
            .await?
        else {
            return Ok(None);
        };

        federation.restore_bind_credential(current.bind_credential.as_deref());
        Ok(Some(LdapUserFederationModel::from_entity(federation, Some(&current))))
    }

    async fn update(
        &self,
        state: &ProviderState,
        prior: LdapUserFederationModel,
        mut planned: LdapUserFederationModel,
    ) -> DomainResult<LdapUserFederationModel> {
        planned.id = prior.id;
        let mut federation = state
            .user_federation_service
            .update_ldap_user_federation(&planned.to_entity()?)
            .await?;
        federation.restore_bind_credential(planned.bind_credential.as_deref());
        Ok(LdapUserFederationModel::from_entity(federation, Some(&planned)))
    }

    async fn delete(&self, state: &ProviderState, current: LdapUserFederationModel) -> DomainResult<()> {
        let Some(id) = non_empty(current.id) else {
            return Ok(());
        };
        state
            .user_federation_service
            .delete_ldap_user_federation(&current.realm_id, &id)
            .await
    }

    fn import(&self, id: &str) -> DomainResult<LdapUserFederationModel> {
        let (realm_id, id) = parse_ldap_user_federation_import_id(id)?;
        Ok(LdapUserFederationModel {
            id: Some(id),
            realm_id,
            search_scope: SearchScope::OneLevel.as_str().to_string(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LdapUserFederationModel {
        LdapUserFederationModel {
            realm_id: "r1".to_string(),
            name: "openldap".to_string(),
            enabled: true,
            edit_mode: "READ_ONLY".to_string(),
            vendor: "OTHER".to_string(),
            username_ldap_attribute: "cn".to_string(),
            rdn_ldap_attribute: "cn".to_string(),
            uuid_ldap_attribute: "entryDN".to_string(),
            user_object_classes: vec!["simpleSecurityObject".to_string()],
            connection_url: "ldap://openldap".to_string(),
            users_dn: "dc=example,dc=org".to_string(),
            search_scope: "ONE_LEVEL".to_string(),
            use_truststore_spi: "ldapsOnly".to_string(),
            cache_policy: "DEFAULT".to_string(),
            connection_timeout: Some("5s".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn timeouts_travel_as_milliseconds() {
        let federation = model().to_entity().unwrap();
        assert_eq!(federation.connection_timeout_ms, Some(5_000));
        assert_eq!(federation.read_timeout_ms, None);

        let known = LdapUserFederationModel {
            connection_timeout: Some("5000ms".to_string()),
            ..model()
        };
        let read = LdapUserFederationModel::from_entity(federation, Some(&known));
        assert_eq!(read.connection_timeout.as_deref(), Some("5000ms"));
    }

    #[test]
    fn bind_dn_requires_a_credential() {
        let model = LdapUserFederationModel {
            bind_dn: Some("cn=admin,dc=example,dc=org".to_string()),
            ..model()
        };
        assert_eq!(
            LdapUserFederationResource.validate(&model).unwrap_err().to_string(),
            "validation error: authentication requires both BindDN and BindCredential to be set"
        );
    }

    #[test]
    fn search_scope_is_an_enum() {
        let model = LdapUserFederationModel {
            search_scope: "DEEP".to_string(),
            ..model()
        };
        assert_eq!(
            model.to_entity().unwrap_err().to_string(),
            "expected search_scope to be one of [ONE_LEVEL SUBTREE], got DEEP"
        );
    }
}
