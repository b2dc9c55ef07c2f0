use super::unmask_secret;
use crate::domain::errors::{ensure_one_of, DomainError, DomainResult};
use crate::domain::values::quoted_bool;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const LDAP_PROVIDER_ID: &str = "ldap";
pub const USER_STORAGE_PROVIDER_TYPE: &str = "org.keycloak.storage.UserStorageProvider";

pub const EDIT_MODES: &[&str] = &["READ_ONLY", "WRITABLE", "UNSYNCED"];
pub const VENDORS: &[&str] = &["OTHER", "EDIRECTORY", "AD", "RHDS", "TIVOLI"];
pub const TRUSTSTORE_SPI_MODES: &[&str] = &["ldapsOnly", "always", "never"];
pub const CACHE_POLICIES: &[&str] = &[
    "DEFAULT",
    "EVICT_DAILY",
    "EVICT_WEEKLY",
    "MAX_LIFESPAN",
    "NO_CACHE",
];

/// A Keycloak component as stored by the components endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: Option<String>,
    pub name: String,
    pub provider_id: String,
    pub provider_type: String,
    pub parent_id: String,
    pub config: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchScope {
    #[default]
    OneLevel,
    Subtree,
}

impl SearchScope {
    pub const VALUES: &'static [&'static str] = &["ONE_LEVEL", "SUBTREE"];

    /// Keycloak stores the scope as `"1"` or `"2"`.
    pub fn as_config_value(&self) -> &'static str {
        match self {
            SearchScope::OneLevel => "1",
            SearchScope::Subtree => "2",
        }
    }

    pub fn from_config_value(value: &str) -> DomainResult<Self> {
        match value {
            "1" => Ok(SearchScope::OneLevel),
            "2" => Ok(SearchScope::Subtree),
            other => Err(DomainError::invalid_value("search_scope", &["1", "2"], other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchScope::OneLevel => "ONE_LEVEL",
            SearchScope::Subtree => "SUBTREE",
        }
    }

    pub fn parse(value: &str) -> DomainResult<Self> {
        match value {
            "ONE_LEVEL" => Ok(SearchScope::OneLevel),
            "SUBTREE" => Ok(SearchScope::Subtree),
            other => Err(DomainError::invalid_value("search_scope", Self::VALUES, other)),
        }
    }
}

/// LDAP user storage provider configured on a realm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdapUserFederation {
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
    pub search_scope: SearchScope,

    pub validate_password_policy: bool,
    pub use_truststore_spi: String,
    pub connection_timeout_ms: Option<i64>,
    pub read_timeout_ms: Option<i64>,
    pub pagination: bool,

    pub batch_size_for_sync: i32,
    /// Seconds; `-1` disables periodic sync.
    pub full_sync_period: i32,
    pub changed_sync_period: i32,

    pub cache_policy: String,
}

impl Default for LdapUserFederation {
    fn default() -> Self {
        Self {
            id: None,
            realm_id: String::new(),
            name: String::new(),
            enabled: true,
            priority: 0,
            import_enabled: true,
            edit_mode: "READ_ONLY".to_string(),
            sync_registrations: false,
            vendor: "OTHER".to_string(),
            username_ldap_attribute: String::new(),
            rdn_ldap_attribute: String::new(),
            uuid_ldap_attribute: String::new(),
            user_object_classes: Vec::new(),
            connection_url: String::new(),
            users_dn: String::new(),
            bind_dn: None,
            bind_credential: None,
            custom_user_search_filter: None,
            search_scope: SearchScope::OneLevel,
            validate_password_policy: false,
            use_truststore_spi: "ldapsOnly".to_string(),
            connection_timeout_ms: None,
            read_timeout_ms: None,
            pagination: true,
            batch_size_for_sync: 1000,
            full_sync_period: -1,
            changed_sync_period: -1,
            cache_policy: "DEFAULT".to_string(),
        }
    }
}

fn single(value: impl Into<String>) -> Vec<String> {
    vec![value.into()]
}

struct ComponentConfig<'a>(&'a BTreeMap<String, Vec<String>>);

impl ComponentConfig<'_> {
    fn first(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str) -> String {
        self.first(key).unwrap_or_default().to_string()
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        self.first(key)
            .and_then(quoted_bool::parse)
            .unwrap_or(default)
    }

    fn number<T: std::str::FromStr>(&self, key: &str, default: T) -> DomainResult<T> {
        match self.first(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| DomainError::Serialization {
                message: format!("component config {key} is not a number: {raw}"),
            }),
        }
    }
}

impl LdapUserFederation {
    pub fn validate(&self) -> DomainResult<()> {
        if self.realm_id.is_empty() {
            return Err(DomainError::validation("realm_id must be set"));
        }
        if self.name.is_empty() {
            return Err(DomainError::validation("name must be set"));
        }

        let bind_dn = self.bind_dn.as_deref().filter(|v| !v.is_empty());
        let bind_credential = self.bind_credential.as_deref().filter(|v| !v.is_empty());
        if bind_dn.is_some() != bind_credential.is_some() {
            return Err(DomainError::validation(
                "authentication requires both BindDN and BindCredential to be set",
            ));
        }

        if let Some(filter) = self.custom_user_search_filter.as_deref().filter(|f| !f.is_empty()) {
            if !(filter.starts_with('(') && filter.ends_with(')')) {
                return Err(DomainError::validation(
                    "custom_user_search_filter must start with '(' and end with ')'",
                ));
            }
        }

        ensure_one_of("edit_mode", &self.edit_mode, EDIT_MODES)?;
        ensure_one_of("vendor", &self.vendor, VENDORS)?;
        ensure_one_of("use_truststore_spi", &self.use_truststore_spi, TRUSTSTORE_SPI_MODES)?;
        ensure_one_of("cache_policy", &self.cache_policy, CACHE_POLICIES)?;
        Ok(())
    }

    /// `simple` when a bind DN is configured, otherwise anonymous.
    pub fn auth_type(&self) -> &'static str {
        if self.bind_dn.as_deref().is_some_and(|dn| !dn.is_empty()) {
            "simple"
        } else {
            "none"
        }
    }

    pub fn to_component(&self) -> Component {
        let mut config = BTreeMap::new();
        let mut put = |key: &str, value: Vec<String>| {
            config.insert(key.to_string(), value);
        };

        put("enabled", single(self.enabled.to_string()));
        put("priority", single(self.priority.to_string()));
        put("importEnabled", single(self.import_enabled.to_string()));
        put("editMode", single(&self.edit_mode));
        put("syncRegistrations", single(self.sync_registrations.to_string()));
        put("vendor", single(self.vendor.to_lowercase()));
        put("usernameLDAPAttribute", single(&self.username_ldap_attribute));
        put("rdnLDAPAttribute", single(&self.rdn_ldap_attribute));
        put("uuidLDAPAttribute", single(&self.uuid_ldap_attribute));
        put("userObjectClasses", single(self.user_object_classes.join(", ")));
        put("connectionUrl", single(&self.connection_url));
        put("usersDn", single(&self.users_dn));
        put("authType", single(self.auth_type()));
        if let Some(bind_dn) = &self.bind_dn {
            put("bindDn", single(bind_dn));
        }
        if let Some(bind_credential) = &self.bind_credential {
            put("bindCredential", single(bind_credential));
        }
        if let Some(filter) = &self.custom_user_search_filter {
            put("customUserSearchFilter", single(filter));
        }
        put("searchScope", single(self.search_scope.as_config_value()));
        put(
            "validatePasswordPolicy",
            single(self.validate_password_policy.to_string()),
        );
        put("useTruststoreSpi", single(&self.use_truststore_spi));
        if let Some(timeout) = self.connection_timeout_ms {
            put("connectionTimeout", single(timeout.to_string()));
        }
        if let Some(timeout) = self.read_timeout_ms {
            put("readTimeout", single(timeout.to_string()));
        }
        put("pagination", single(self.pagination.to_string()));
        put("batchSizeForSync", single(self.batch_size_for_sync.to_string()));
        put("fullSyncPeriod", single(self.full_sync_period.to_string()));
        put("changedSyncPeriod", single(self.changed_sync_period.to_string()));
        put("cachePolicy", single(&self.cache_policy));

        Component {
            id: self.id.clone(),
            name: self.name.clone(),
            provider_id: LDAP_PROVIDER_ID.to_string(),
            provider_type: USER_STORAGE_PROVIDER_TYPE.to_string(),
            parent_id: self.realm_id.clone(),
            config,
        }
    }

    /// `realm_id` is the realm name; Keycloak's `parentId` holds the internal
    /// realm id and is not reused here.
    pub fn from_component(realm_id: &str, component: &Component) -> DomainResult<Self> {
        if component.provider_id != LDAP_PROVIDER_ID {
            return Err(DomainError::validation(format!(
                "component {} is not an ldap user federation provider",
                component.id.as_deref().unwrap_or_default()
            )));
        }

        let config = ComponentConfig(&component.config);
        let defaults = LdapUserFederation::default();

        let search_scope = match config.first("searchScope") {
            Some(raw) => SearchScope::from_config_value(raw)?,
            None => SearchScope::OneLevel,
        };
        let timeout = |key: &str| -> DomainResult<Option<i64>> {
            config.first(key).map(|raw| {
                raw.parse::<i64>().map_err(|_| DomainError::Serialization {
                    message: format!("component config {key} is not a number: {raw}"),
                })
            })
            .transpose()
        };

        Ok(Self {
            id: component.id.clone(),
            realm_id: realm_id.to_string(),
            name: component.name.clone(),
            enabled: config.flag("enabled", true),
            priority: config.number("priority", 0)?,
            import_enabled: config.flag("importEnabled", true),
            edit_mode: config.first("editMode").map(str::to_string).unwrap_or(defaults.edit_mode),
            sync_registrations: config.flag("syncRegistrations", false),
            vendor: config
                .first("vendor")
                .map(str::to_uppercase)
                .unwrap_or(defaults.vendor),
            username_ldap_attribute: config.string("usernameLDAPAttribute"),
            rdn_ldap_attribute: config.string("rdnLDAPAttribute"),
            uuid_ldap_attribute: config.string("uuidLDAPAttribute"),
            user_object_classes: config
                .string("userObjectClasses")
                .split(',')
                .map(str::trim)
                .filter(|class| !class.is_empty())
                .map(str::to_string)
                .collect(),
            connection_url: config.string("connectionUrl"),
            users_dn: config.string("usersDn"),
            bind_dn: config.first("bindDn").map(str::to_string),
            bind_credential: config.first("bindCredential").map(str::to_string),
            custom_user_search_filter: config.first("customUserSearchFilter").map(str::to_string),
            search_scope,
            validate_password_policy: config.flag("validatePasswordPolicy", false),
            use_truststore_spi: config
                .first("useTruststoreSpi")
                .map(str::to_string)
                .unwrap_or(defaults.use_truststore_spi),
            connection_timeout_ms: timeout("connectionTimeout")?,
            read_timeout_ms: timeout("readTimeout")?,
            pagination: config.flag("pagination", true),
            batch_size_for_sync: config.number("batchSizeForSync", defaults.batch_size_for_sync)?,
            full_sync_period: config.number("fullSyncPeriod", -1)?,
            changed_sync_period: config.number("changedSyncPeriod", -1)?,
            cache_policy: config
                .first("cachePolicy")
                .map(str::to_string)
                .unwrap_or(defaults.cache_policy),
        })
    }

    /// Keycloak returns the bind credential masked; keep the configured one.
    pub fn restore_bind_credential(&mut self, known: Option<&str>) {
        if let (Some(current), Some(known)) = (self.bind_credential.as_mut(), known) {
            unmask_secret(current, known);
        }
    }
}
