use crate::domain::errors::{ensure_one_of, DomainError, DomainResult};
use crate::domain::values::quoted_bool;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const OPENID_CONNECT: &str = "openid-connect";
pub const SAML: &str = "saml";
pub const PROTOCOLS: &[&str] = &[OPENID_CONNECT, SAML];

pub const CLAIM_VALUE_TYPES: &[&str] = &["JSON", "String", "long", "int", "boolean"];
pub const SAML_ATTRIBUTE_NAME_FORMATS: &[&str] = &["Basic", "URI Reference", "Unspecified"];

// Keycloak config keys
const ID_TOKEN_CLAIM: &str = "id.token.claim";
const ACCESS_TOKEN_CLAIM: &str = "access.token.claim";
const USERINFO_TOKEN_CLAIM: &str = "userinfo.token.claim";
const CLAIM_NAME: &str = "claim.name";
const CLAIM_VALUE: &str = "claim.value";
const CLAIM_VALUE_TYPE: &str = "jsonType.label";
const FULL_PATH: &str = "full.path";
const ROLE: &str = "role";
const USER_ATTRIBUTE: &str = "user.attribute";
const MULTIVALUED: &str = "multivalued";
const INCLUDED_CLIENT_AUDIENCE: &str = "included.client.audience";
const INCLUDED_CUSTOM_AUDIENCE: &str = "included.custom.audience";
const SCRIPT: &str = "script";
const USER_SESSION_NOTE: &str = "user.session.note";
const REALM_ROLE_PREFIX: &str = "usermodel.realmRoleMapping.rolePrefix";
const CLIENT_ROLE_CLIENT_ID: &str = "usermodel.clientRoleMapping.clientId";
const CLIENT_ROLE_PREFIX: &str = "usermodel.clientRoleMapping.rolePrefix";
const FRIENDLY_NAME: &str = "friendly.name";
const ATTRIBUTE_NAME: &str = "attribute.name";
const ATTRIBUTE_NAME_FORMAT: &str = "attribute.nameformat";
const SAML_SCRIPT: &str = "Script";
const SAML_SINGLE_VALUE: &str = "single";

/// The object a protocol mapper is attached to. A mapper belongs to exactly
/// one client or one client scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapperParent {
    Client(String),
    ClientScope(String),
}

impl MapperParent {
    /// Builds the parent from the two optional ids a mapper is configured
    /// with. Empty strings count as unset.
    pub fn from_ids(client_id: Option<&str>, client_scope_id: Option<&str>) -> DomainResult<Self> {
        let client_id = client_id.filter(|id| !id.is_empty());
        let client_scope_id = client_scope_id.filter(|id| !id.is_empty());

        match (client_id, client_scope_id) {
            (Some(client_id), None) => Ok(MapperParent::Client(client_id.to_string())),
            (None, Some(scope_id)) => Ok(MapperParent::ClientScope(scope_id.to_string())),
            (None, None) => Err(DomainError::validation(
                "one of ClientId or ClientScopeId must be set",
            )),
            (Some(_), Some(_)) => Err(DomainError::Conflict {
                field: "client_id".to_string(),
                other: "client_scope_id".to_string(),
            }),
        }
    }

    /// Path segment used in import ids.
    pub fn kind(&self) -> &'static str {
        match self {
            MapperParent::Client(_) => "client",
            MapperParent::ClientScope(_) => "client-scope",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            MapperParent::Client(id) | MapperParent::ClientScope(id) => id,
        }
    }

    pub fn client_id(&self) -> Option<&str> {
        match self {
            MapperParent::Client(id) => Some(id),
            MapperParent::ClientScope(_) => None,
        }
    }

    pub fn client_scope_id(&self) -> Option<&str> {
        match self {
            MapperParent::Client(_) => None,
            MapperParent::ClientScope(id) => Some(id),
        }
    }
}

impl std::fmt::Display for MapperParent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind(), self.id())
    }
}

/// Wire shape of every protocol mapper: Keycloak keeps the mapper-specific
/// settings in a flat string map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericProtocolMapper {
    pub id: Option<String>,
    pub name: String,
    pub protocol: String,
    pub protocol_mapper: String,
    pub config: BTreeMap<String, String>,
}

/// Read access to a mapper config map.
struct ConfigReader<'a>(&'a BTreeMap<String, String>);

impl ConfigReader<'_> {
    fn string(&self, key: &str) -> String {
        self.0.get(key).cloned().unwrap_or_default()
    }

    fn optional(&self, key: &str) -> Option<String> {
        self.0.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn flag(&self, key: &str) -> bool {
        self.0
            .get(key)
            .and_then(|v| quoted_bool::parse(v))
            .unwrap_or(false)
    }
}

#[derive(Default)]
struct ConfigWriter(BTreeMap<String, String>);

impl ConfigWriter {
    fn set(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    fn set_optional(mut self, key: &str, value: Option<&String>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.0.insert(key.to_string(), value.clone());
        }
        self
    }

    fn flag(mut self, key: &str, value: bool) -> Self {
        self.0.insert(key.to_string(), quoted_bool::to_string(value));
        self
    }

    fn build(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// Which tokens a claim is added to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenClaims {
    pub add_to_id_token: bool,
    pub add_to_access_token: bool,
    pub add_to_userinfo: bool,
}

impl TokenClaims {
    fn read(config: &ConfigReader<'_>) -> Self {
        Self {
            add_to_id_token: config.flag(ID_TOKEN_CLAIM),
            add_to_access_token: config.flag(ACCESS_TOKEN_CLAIM),
            add_to_userinfo: config.flag(USERINFO_TOKEN_CLAIM),
        }
    }

    fn write(&self, writer: ConfigWriter) -> ConfigWriter {
        writer
            .flag(ID_TOKEN_CLAIM, self.add_to_id_token)
            .flag(ACCESS_TOKEN_CLAIM, self.add_to_access_token)
            .flag(USERINFO_TOKEN_CLAIM, self.add_to_userinfo)
    }
}

/// Mapper-specific half of a protocol mapper.
pub trait ProtocolMapperKind: Clone + Send + Sync + 'static {
    fn protocol(&self) -> &str;

    /// Keycloak provider id of the mapper, e.g. `oidc-hardcoded-claim-mapper`.
    fn protocol_mapper(&self) -> &str;

    fn to_config(&self) -> BTreeMap<String, String>;

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self>;

    /// Local checks run before any request is sent.
    fn validate(&self) -> DomainResult<()> {
        Ok(())
    }
}

/// A protocol mapper of kind `K`, located in a realm under a client or
/// client scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolMapper<K> {
    pub id: Option<String>,
    pub realm_id: String,
    pub parent: MapperParent,
    pub name: String,
    pub kind: K,
}

impl<K: ProtocolMapperKind> ProtocolMapper<K> {
    pub fn new(realm_id: String, parent: MapperParent, name: String, kind: K) -> Self {
        Self {
            id: None,
            realm_id,
            parent,
            name,
            kind,
        }
    }

    pub fn to_generic(&self) -> GenericProtocolMapper {
        GenericProtocolMapper {
            id: self.id.clone(),
            name: self.name.clone(),
            protocol: self.kind.protocol().to_string(),
            protocol_mapper: self.kind.protocol_mapper().to_string(),
            config: self.kind.to_config(),
        }
    }

    pub fn from_generic(
        realm_id: String,
        parent: MapperParent,
        mapper: &GenericProtocolMapper,
    ) -> DomainResult<Self> {
        let kind = K::from_generic(mapper)?;
        if kind.protocol_mapper() != mapper.protocol_mapper {
            return Err(DomainError::validation(format!(
                "protocol mapper {} is a {} mapper, not a {}",
                mapper.name,
                mapper.protocol_mapper,
                kind.protocol_mapper()
            )));
        }

        Ok(Self {
            id: mapper.id.clone(),
            realm_id,
            parent,
            name: mapper.name.clone(),
            kind,
        })
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.realm_id.is_empty() {
            return Err(DomainError::validation("RealmId must be set"));
        }
        if self.name.is_empty() {
            return Err(DomainError::validation("Name must be set"));
        }
        self.kind.validate()
    }
}

fn validate_claim_value_type(value: &str) -> DomainResult<()> {
    ensure_one_of("claim_value_type", value, CLAIM_VALUE_TYPES)
}

fn default_claim_value_type() -> String {
    "String".to_string()
}

// ---------------------------------------------------------------------------
// OpenID Connect mappers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullNameMapper {
    #[serde(flatten)]
    pub tokens: TokenClaims,
}

impl ProtocolMapperKind for FullNameMapper {
    fn protocol(&self) -> &str {
        OPENID_CONNECT
    }

    fn protocol_mapper(&self) -> &str {
        "oidc-full-name-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        self.tokens.write(ConfigWriter::default()).build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        let config = ConfigReader(&mapper.config);
        Ok(Self {
            tokens: TokenClaims::read(&config),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupMembershipMapper {
    pub claim_name: String,
    pub full_path: bool,
    #[serde(flatten)]
    pub tokens: TokenClaims,
}

impl ProtocolMapperKind for GroupMembershipMapper {
    fn protocol(&self) -> &str {
        OPENID_CONNECT
    }

    fn protocol_mapper(&self) -> &str {
        "oidc-group-membership-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        self.tokens
            .write(ConfigWriter::default())
            .set(CLAIM_NAME, &self.claim_name)
            .flag(FULL_PATH, self.full_path)
            .build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        let config = ConfigReader(&mapper.config);
        Ok(Self {
            claim_name: config.string(CLAIM_NAME),
            full_path: config.flag(FULL_PATH),
            tokens: TokenClaims::read(&config),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardcodedClaimMapper {
    pub claim_name: String,
    pub claim_value: String,
    pub claim_value_type: String,
    #[serde(flatten)]
    pub tokens: TokenClaims,
}

impl Default for HardcodedClaimMapper {
    fn default() -> Self {
        Self {
            claim_name: String::new(),
            claim_value: String::new(),
            claim_value_type: default_claim_value_type(),
            tokens: TokenClaims::default(),
        }
    }
}

impl ProtocolMapperKind for HardcodedClaimMapper {
    fn protocol(&self) -> &str {
        OPENID_CONNECT
    }

    fn protocol_mapper(&self) -> &str {
        "oidc-hardcoded-claim-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        self.tokens
            .write(ConfigWriter::default())
            .set(CLAIM_NAME, &self.claim_name)
            .set(CLAIM_VALUE, &self.claim_value)
            .set(CLAIM_VALUE_TYPE, &self.claim_value_type)
            .build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        let config = ConfigReader(&mapper.config);
        Ok(Self {
            claim_name: config.string(CLAIM_NAME),
            claim_value: config.string(CLAIM_VALUE),
            claim_value_type: config.string(CLAIM_VALUE_TYPE),
            tokens: TokenClaims::read(&config),
        })
    }

    fn validate(&self) -> DomainResult<()> {
        validate_claim_value_type(&self.claim_value_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardcodedRoleMapper {
    pub role_id: String,
}

impl ProtocolMapperKind for HardcodedRoleMapper {
    fn protocol(&self) -> &str {
        OPENID_CONNECT
    }

    fn protocol_mapper(&self) -> &str {
        "oidc-hardcoded-role-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        ConfigWriter::default().set(ROLE, &self.role_id).build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        Ok(Self {
            role_id: ConfigReader(&mapper.config).string(ROLE),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAttributeMapper {
    pub user_attribute: String,
    pub claim_name: String,
    pub claim_value_type: String,
    pub multivalued: bool,
    #[serde(flatten)]
    pub tokens: TokenClaims,
}

impl Default for UserAttributeMapper {
    fn default() -> Self {
        Self {
            user_attribute: String::new(),
            claim_name: String::new(),
            claim_value_type: default_claim_value_type(),
            multivalued: false,
            tokens: TokenClaims::default(),
        }
    }
}

impl ProtocolMapperKind for UserAttributeMapper {
    fn protocol(&self) -> &str {
        OPENID_CONNECT
    }

    fn protocol_mapper(&self) -> &str {
        "oidc-usermodel-attribute-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        self.tokens
            .write(ConfigWriter::default())
            .set(USER_ATTRIBUTE, &self.user_attribute)
            .set(CLAIM_NAME, &self.claim_name)
            .set(CLAIM_VALUE_TYPE, &self.claim_value_type)
            .flag(MULTIVALUED, self.multivalued)
            .build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        let config = ConfigReader(&mapper.config);
        Ok(Self {
            user_attribute: config.string(USER_ATTRIBUTE),
            claim_name: config.string(CLAIM_NAME),
            claim_value_type: config.string(CLAIM_VALUE_TYPE),
            multivalued: config.flag(MULTIVALUED),
            tokens: TokenClaims::read(&config),
        })
    }

    fn validate(&self) -> DomainResult<()> {
        validate_claim_value_type(&self.claim_value_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPropertyMapper {
    pub user_property: String,
    pub claim_name: String,
    pub claim_value_type: String,
    #[serde(flatten)]
    pub tokens: TokenClaims,
}

impl Default for UserPropertyMapper {
    fn default() -> Self {
        Self {
            user_property: String::new(),
            claim_name: String::new(),
            claim_value_type: default_claim_value_type(),
            tokens: TokenClaims::default(),
        }
    }
}

impl ProtocolMapperKind for UserPropertyMapper {
    fn protocol(&self) -> &str {
        OPENID_CONNECT
    }

    fn protocol_mapper(&self) -> &str {
        "oidc-usermodel-property-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        self.tokens
            .write(ConfigWriter::default())
            .set(USER_ATTRIBUTE, &self.user_property)
            .set(CLAIM_NAME, &self.claim_name)
            .set(CLAIM_VALUE_TYPE, &self.claim_value_type)
            .build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        let config = ConfigReader(&mapper.config);
        Ok(Self {
            user_property: config.string(USER_ATTRIBUTE),
            claim_name: config.string(CLAIM_NAME),
            claim_value_type: config.string(CLAIM_VALUE_TYPE),
            tokens: TokenClaims::read(&config),
        })
    }

    fn validate(&self) -> DomainResult<()> {
        validate_claim_value_type(&self.claim_value_type)
    }
}

/// Adds a client id or a free-form value to the `aud` claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudienceMapper {
    pub included_client_audience: Option<String>,
    pub included_custom_audience: Option<String>,
    pub add_to_id_token: bool,
    pub add_to_access_token: bool,
}

impl ProtocolMapperKind for AudienceMapper {
    fn protocol(&self) -> &str {
        OPENID_CONNECT
    }

    fn protocol_mapper(&self) -> &str {
        "oidc-audience-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        ConfigWriter::default()
            .set_optional(INCLUDED_CLIENT_AUDIENCE, self.included_client_audience.as_ref())
            .set_optional(INCLUDED_CUSTOM_AUDIENCE, self.included_custom_audience.as_ref())
            .flag(ID_TOKEN_CLAIM, self.add_to_id_token)
            .flag(ACCESS_TOKEN_CLAIM, self.add_to_access_token)
            .build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        let config = ConfigReader(&mapper.config);
        Ok(Self {
            included_client_audience: config.optional(INCLUDED_CLIENT_AUDIENCE),
            included_custom_audience: config.optional(INCLUDED_CUSTOM_AUDIENCE),
            add_to_id_token: config.flag(ID_TOKEN_CLAIM),
            add_to_access_token: config.flag(ACCESS_TOKEN_CLAIM),
        })
    }

    fn validate(&self) -> DomainResult<()> {
        let client = self
            .included_client_audience
            .as_deref()
            .filter(|v| !v.is_empty());
        let custom = self
            .included_custom_audience
            .as_deref()
            .filter(|v| !v.is_empty());

        match (client, custom) {
            (None, None) => Err(DomainError::validation(
                "one of IncludedClientAudience or IncludedCustomAudience must be set",
            )),
            (Some(_), Some(_)) => Err(DomainError::Conflict {
                field: "included_client_audience".to_string(),
                other: "included_custom_audience".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceResolveMapper {}

impl ProtocolMapperKind for AudienceResolveMapper {
    fn protocol(&self) -> &str {
        OPENID_CONNECT
    }

    fn protocol_mapper(&self) -> &str {
        "oidc-audience-resolve-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn from_generic(_mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        Ok(Self {})
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptMapper {
    pub script: String,
    pub claim_name: String,
    pub claim_value_type: String,
    pub multivalued: bool,
    #[serde(flatten)]
    pub tokens: TokenClaims,
}

impl Default for ScriptMapper {
    fn default() -> Self {
        Self {
            script: String::new(),
            claim_name: String::new(),
            claim_value_type: default_claim_value_type(),
            multivalued: false,
            tokens: TokenClaims::default(),
        }
    }
}

impl ProtocolMapperKind for ScriptMapper {
    fn protocol(&self) -> &str {
        OPENID_CONNECT
    }

    fn protocol_mapper(&self) -> &str {
        "oidc-script-based-protocol-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        self.tokens
            .write(ConfigWriter::default())
            .set(SCRIPT, &self.script)
            .set(CLAIM_NAME, &self.claim_name)
            .set(CLAIM_VALUE_TYPE, &self.claim_value_type)
            .flag(MULTIVALUED, self.multivalued)
            .build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        let config = ConfigReader(&mapper.config);
        Ok(Self {
            script: config.string(SCRIPT),
            claim_name: config.string(CLAIM_NAME),
            claim_value_type: config.string(CLAIM_VALUE_TYPE),
            multivalued: config.flag(MULTIVALUED),
            tokens: TokenClaims::read(&config),
        })
    }

    fn validate(&self) -> DomainResult<()> {
        validate_claim_value_type(&self.claim_value_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSessionNoteMapper {
    pub claim_name: String,
    pub claim_value_type: String,
    pub session_note: String,
    pub add_to_id_token: bool,
    pub add_to_access_token: bool,
}

impl Default for UserSessionNoteMapper {
    fn default() -> Self {
        Self {
            claim_name: String::new(),
            claim_value_type: default_claim_value_type(),
            session_note: String::new(),
            add_to_id_token: false,
            add_to_access_token: false,
        }
    }
}

impl ProtocolMapperKind for UserSessionNoteMapper {
    fn protocol(&self) -> &str {
        OPENID_CONNECT
    }

    fn protocol_mapper(&self) -> &str {
        "oidc-usersessionmodel-note-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        ConfigWriter::default()
            .set(CLAIM_NAME, &self.claim_name)
            .set(CLAIM_VALUE_TYPE, &self.claim_value_type)
            .set(USER_SESSION_NOTE, &self.session_note)
            .flag(ID_TOKEN_CLAIM, self.add_to_id_token)
            .flag(ACCESS_TOKEN_CLAIM, self.add_to_access_token)
            .build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        let config = ConfigReader(&mapper.config);
        Ok(Self {
            claim_name: config.string(CLAIM_NAME),
            claim_value_type: config.string(CLAIM_VALUE_TYPE),
            session_note: config.string(USER_SESSION_NOTE),
            add_to_id_token: config.flag(ID_TOKEN_CLAIM),
            add_to_access_token: config.flag(ACCESS_TOKEN_CLAIM),
        })
    }

    fn validate(&self) -> DomainResult<()> {
        validate_claim_value_type(&self.claim_value_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRealmRoleMapper {
    pub claim_name: String,
    pub claim_value_type: String,
    pub multivalued: bool,
    pub realm_role_prefix: Option<String>,
    #[serde(flatten)]
    pub tokens: TokenClaims,
}

impl Default for UserRealmRoleMapper {
    fn default() -> Self {
        Self {
            claim_name: String::new(),
            claim_value_type: default_claim_value_type(),
            multivalued: false,
            realm_role_prefix: None,
            tokens: TokenClaims::default(),
        }
    }
}

impl ProtocolMapperKind for UserRealmRoleMapper {
    fn protocol(&self) -> &str {
        OPENID_CONNECT
    }

    fn protocol_mapper(&self) -> &str {
        "oidc-usermodel-realm-role-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        self.tokens
            .write(ConfigWriter::default())
            .set(CLAIM_NAME, &self.claim_name)
            .set(CLAIM_VALUE_TYPE, &self.claim_value_type)
            .flag(MULTIVALUED, self.multivalued)
            .set_optional(REALM_ROLE_PREFIX, self.realm_role_prefix.as_ref())
            .build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        let config = ConfigReader(&mapper.config);
        Ok(Self {
            claim_name: config.string(CLAIM_NAME),
            claim_value_type: config.string(CLAIM_VALUE_TYPE),
            multivalued: config.flag(MULTIVALUED),
            realm_role_prefix: config.optional(REALM_ROLE_PREFIX),
            tokens: TokenClaims::read(&config),
        })
    }

    fn validate(&self) -> DomainResult<()> {
        validate_claim_value_type(&self.claim_value_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserClientRoleMapper {
    pub claim_name: String,
    pub claim_value_type: String,
    pub multivalued: bool,
    pub client_id_for_role_mappings: Option<String>,
    pub client_role_prefix: Option<String>,
    #[serde(flatten)]
    pub tokens: TokenClaims,
}

impl Default for UserClientRoleMapper {
    fn default() -> Self {
        Self {
            claim_name: String::new(),
            claim_value_type: default_claim_value_type(),
            multivalued: false,
            client_id_for_role_mappings: None,
            client_role_prefix: None,
            tokens: TokenClaims::default(),
        }
    }
}

impl ProtocolMapperKind for UserClientRoleMapper {
    fn protocol(&self) -> &str {
        OPENID_CONNECT
    }

    fn protocol_mapper(&self) -> &str {
        "oidc-usermodel-client-role-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        self.tokens
            .write(ConfigWriter::default())
            .set(CLAIM_NAME, &self.claim_name)
            .set(CLAIM_VALUE_TYPE, &self.claim_value_type)
            .flag(MULTIVALUED, self.multivalued)
            .set_optional(CLIENT_ROLE_CLIENT_ID, self.client_id_for_role_mappings.as_ref())
            .set_optional(CLIENT_ROLE_PREFIX, self.client_role_prefix.as_ref())
            .build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        let config = ConfigReader(&mapper.config);
        Ok(Self {
            claim_name: config.string(CLAIM_NAME),
            claim_value_type: config.string(CLAIM_VALUE_TYPE),
            multivalued: config.flag(MULTIVALUED),
            client_id_for_role_mappings: config.optional(CLIENT_ROLE_CLIENT_ID),
            client_role_prefix: config.optional(CLIENT_ROLE_PREFIX),
            tokens: TokenClaims::read(&config),
        })
    }

    fn validate(&self) -> DomainResult<()> {
        validate_claim_value_type(&self.claim_value_type)
    }
}

// ---------------------------------------------------------------------------
// SAML mappers
// ---------------------------------------------------------------------------

/// Attribute naming shared by the SAML mappers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamlAttribute {
    pub friendly_name: Option<String>,
    pub saml_attribute_name: String,
    pub saml_attribute_name_format: String,
}

impl SamlAttribute {
    fn read(config: &ConfigReader<'_>) -> Self {
        Self {
            friendly_name: config.optional(FRIENDLY_NAME),
            saml_attribute_name: config.string(ATTRIBUTE_NAME),
            saml_attribute_name_format: config.string(ATTRIBUTE_NAME_FORMAT),
        }
    }

    fn write(&self, writer: ConfigWriter) -> ConfigWriter {
        writer
            .set_optional(FRIENDLY_NAME, self.friendly_name.as_ref())
            .set(ATTRIBUTE_NAME, &self.saml_attribute_name)
            .set(ATTRIBUTE_NAME_FORMAT, &self.saml_attribute_name_format)
    }

    fn validate(&self) -> DomainResult<()> {
        ensure_one_of(
            "saml_attribute_name_format",
            &self.saml_attribute_name_format,
            SAML_ATTRIBUTE_NAME_FORMATS,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamlUserAttributeMapper {
    pub user_attribute: String,
    #[serde(flatten)]
    pub attribute: SamlAttribute,
}

impl ProtocolMapperKind for SamlUserAttributeMapper {
    fn protocol(&self) -> &str {
        SAML
    }

    fn protocol_mapper(&self) -> &str {
        "saml-user-attribute-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        self.attribute
            .write(ConfigWriter::default())
            .set(USER_ATTRIBUTE, &self.user_attribute)
            .build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        let config = ConfigReader(&mapper.config);
        Ok(Self {
            user_attribute: config.string(USER_ATTRIBUTE),
            attribute: SamlAttribute::read(&config),
        })
    }

    fn validate(&self) -> DomainResult<()> {
        self.attribute.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamlUserPropertyMapper {
    pub user_property: String,
    #[serde(flatten)]
    pub attribute: SamlAttribute,
}

impl ProtocolMapperKind for SamlUserPropertyMapper {
    fn protocol(&self) -> &str {
        SAML
    }

    fn protocol_mapper(&self) -> &str {
        "saml-user-property-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        self.attribute
            .write(ConfigWriter::default())
            .set(USER_ATTRIBUTE, &self.user_property)
            .build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        let config = ConfigReader(&mapper.config);
        Ok(Self {
            user_property: config.string(USER_ATTRIBUTE),
            attribute: SamlAttribute::read(&config),
        })
    }

    fn validate(&self) -> DomainResult<()> {
        self.attribute.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamlScriptMapper {
    pub script: String,
    pub single_value_attribute: bool,
    #[serde(flatten)]
    pub attribute: SamlAttribute,
}

impl ProtocolMapperKind for SamlScriptMapper {
    fn protocol(&self) -> &str {
        SAML
    }

    fn protocol_mapper(&self) -> &str {
        "saml-javascript-mapper"
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        self.attribute
            .write(ConfigWriter::default())
            .set(SAML_SCRIPT, &self.script)
            .flag(SAML_SINGLE_VALUE, self.single_value_attribute)
            .build()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        let config = ConfigReader(&mapper.config);
        Ok(Self {
            script: config.string(SAML_SCRIPT),
            single_value_attribute: config.flag(SAML_SINGLE_VALUE),
            attribute: SamlAttribute::read(&config),
        })
    }

    fn validate(&self) -> DomainResult<()> {
        self.attribute.validate()
    }
}

// ---------------------------------------------------------------------------
// Generic mapper
// ---------------------------------------------------------------------------

/// Any mapper type, configured through a verbatim config map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericMapper {
    pub protocol: String,
    pub protocol_mapper: String,
    pub config: BTreeMap<String, String>,
}

impl ProtocolMapperKind for GenericMapper {
    fn protocol(&self) -> &str {
        &self.protocol
    }

    fn protocol_mapper(&self) -> &str {
        &self.protocol_mapper
    }

    fn to_config(&self) -> BTreeMap<String, String> {
        self.config.clone()
    }

    fn from_generic(mapper: &GenericProtocolMapper) -> DomainResult<Self> {
        Ok(Self {
            protocol: mapper.protocol.clone(),
            protocol_mapper: mapper.protocol_mapper.clone(),
            config: mapper.config.clone(),
        })
    }

    fn validate(&self) -> DomainResult<()> {
        ensure_one_of("protocol", &self.protocol, PROTOCOLS)?;
        if self.protocol_mapper.is_empty() {
            return Err(DomainError::validation("ProtocolMapper must be set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_requires_exactly_one_id() {
        let err = MapperParent::from_ids(None, Some("")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: one of ClientId or ClientScopeId must be set"
        );

        let err = MapperParent::from_ids(Some("c"), Some("s")).unwrap_err();
        assert_eq!(err.to_string(), "\"client_id\": conflicts with client_scope_id");

        assert_eq!(
            MapperParent::from_ids(Some("c"), None).unwrap(),
            MapperParent::Client("c".to_string())
        );
        assert_eq!(
            MapperParent::from_ids(Some(""), Some("s")).unwrap(),
            MapperParent::ClientScope("s".to_string())
        );
    }

    #[test]
    fn hardcoded_claim_config_keys() {
        let mapper = ProtocolMapper::new(
            "r1".to_string(),
            MapperParent::Client("c1".to_string()),
            "m1".to_string(),
            HardcodedClaimMapper {
                claim_name: "foo".to_string(),
                claim_value: "bar".to_string(),
                claim_value_type: "String".to_string(),
                tokens: TokenClaims {
                    add_to_id_token: true,
                    add_to_access_token: false,
                    add_to_userinfo: true,
                },
            },
        );

        let generic = mapper.to_generic();
        assert_eq!(generic.protocol, "openid-connect");
        assert_eq!(generic.protocol_mapper, "oidc-hardcoded-claim-mapper");
        assert_eq!(generic.config["claim.name"], "foo");
        assert_eq!(generic.config["claim.value"], "bar");
        assert_eq!(generic.config["jsonType.label"], "String");
        assert_eq!(generic.config["id.token.claim"], "true");
        assert_eq!(generic.config["access.token.claim"], "false");
        assert_eq!(generic.config["userinfo.token.claim"], "true");

        let back = ProtocolMapper::<HardcodedClaimMapper>::from_generic(
            "r1".to_string(),
            MapperParent::Client("c1".to_string()),
            &generic,
        )
        .unwrap();
        assert_eq!(back, mapper);
    }

    #[test]
    fn from_generic_rejects_another_mapper_type() {
        let generic = GenericProtocolMapper {
            id: Some("m-uuid".to_string()),
            name: "m1".to_string(),
            protocol: "openid-connect".to_string(),
            protocol_mapper: "oidc-hardcoded-claim-mapper".to_string(),
            config: BTreeMap::new(),
        };

        let err = ProtocolMapper::<FullNameMapper>::from_generic(
            "r1".to_string(),
            MapperParent::Client("c1".to_string()),
            &generic,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: protocol mapper m1 is a oidc-hardcoded-claim-mapper mapper, not a oidc-full-name-mapper"
        );

        let any = ProtocolMapper::<GenericMapper>::from_generic(
            "r1".to_string(),
            MapperParent::Client("c1".to_string()),
            &generic,
        )
        .unwrap();
        assert_eq!(any.kind.protocol_mapper, "oidc-hardcoded-claim-mapper");
    }

    #[test]
    fn claim_value_type_is_checked() {
        let kind = UserAttributeMapper {
            claim_value_type: "float".to_string(),
            ..Default::default()
        };
        assert_eq!(
            kind.validate().unwrap_err().to_string(),
            "expected claim_value_type to be one of [JSON String long int boolean], got float"
        );
    }

    #[test]
    fn audience_requires_exactly_one_target() {
        let none = AudienceMapper::default();
        assert_eq!(
            none.validate().unwrap_err().to_string(),
            "validation error: one of IncludedClientAudience or IncludedCustomAudience must be set"
        );

        let both = AudienceMapper {
            included_client_audience: Some("a".to_string()),
            included_custom_audience: Some("b".to_string()),
            ..Default::default()
        };
        assert!(matches!(both.validate(), Err(DomainError::Conflict { .. })));

        let client = AudienceMapper {
            included_client_audience: Some("a".to_string()),
            ..Default::default()
        };
        assert!(client.validate().is_ok());
        assert!(!client.to_config().contains_key("included.custom.audience"));
    }

    #[test]
    fn saml_attribute_name_format_is_checked() {
        let kind = SamlUserPropertyMapper {
            user_property: "email".to_string(),
            attribute: SamlAttribute {
                friendly_name: None,
                saml_attribute_name: "email".to_string(),
                saml_attribute_name_format: "Weird".to_string(),
            },
        };
        assert_eq!(
            kind.validate().unwrap_err().to_string(),
            "expected saml_attribute_name_format to be one of [Basic URI Reference Unspecified], got Weird"
        );
    }

    #[test]
    fn generic_mapper_passes_config_through() {
        let mut config = BTreeMap::new();
        config.insert("some.key".to_string(), "value".to_string());
        let kind = GenericMapper {
            protocol: "openid-connect".to_string(),
            protocol_mapper: "oidc-custom-mapper".to_string(),
            config: config.clone(),
        };
        assert!(kind.validate().is_ok());
        assert_eq!(kind.to_config(), config);

        let bad = GenericMapper {
            protocol: "cas".to_string(),
            ..kind
        };
        assert!(matches!(bad.validate(), Err(DomainError::InvalidValue { .. })));
    }

    #[test]
    fn kinds_deserialize_from_flat_attributes() {
        let kind: UserClientRoleMapper = serde_json::from_value(serde_json::json!({
            "claim_name": "roles",
            "claim_value_type": "String",
            "multivalued": true,
            "client_id_for_role_mappings": null,
            "client_role_prefix": "app_",
            "add_to_id_token": true,
            "add_to_access_token": true,
            "add_to_userinfo": false
        }))
        .unwrap();
        assert!(kind.multivalued);
        assert_eq!(kind.client_role_prefix.as_deref(), Some("app_"));
        assert!(kind.tokens.add_to_id_token);
        assert!(!kind.tokens.add_to_userinfo);
    }
}
