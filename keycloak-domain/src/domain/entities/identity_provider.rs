use super::unmask_secret;
use crate::domain::errors::{ensure_one_of, DomainError, DomainResult};
use crate::domain::values::quoted_bool;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SYNC_MODES: &[&str] = &["IMPORT", "LEGACY", "FORCE"];
pub const DEFAULT_FIRST_BROKER_LOGIN_FLOW: &str = "first broker login";

pub const SAML_SIGNATURE_ALGORITHMS: &[&str] = &["RSA_SHA1", "RSA_SHA256", "RSA_SHA512", "DSA_SHA1"];
pub const SAML_KEY_NAME_TRANSFORMERS: &[&str] = &["NONE", "KEY_ID", "CERT_SUBJECT"];
pub const SAML_PRINCIPAL_TYPES: &[&str] = &["SUBJECT", "ATTRIBUTE", "FRIENDLY_ATTRIBUTE"];

/// User-facing SAML NameID policy names and the URNs Keycloak stores.
pub const SAML_NAME_ID_FORMATS: &[(&str, &str)] = &[
    ("Persistent", "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent"),
    ("Transient", "urn:oasis:names:tc:SAML:2.0:nameid-format:transient"),
    ("Email", "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress"),
    ("Kerberos", "urn:oasis:names:tc:SAML:2.0:nameid-format:kerberos"),
    ("X.509 Subject Name", "urn:oasis:names:tc:SAML:1.1:nameid-format:X509SubjectName"),
    (
        "Windows Domain Qualified Name",
        "urn:oasis:names:tc:SAML:1.1:nameid-format:WindowsDomainQualifiedName",
    ),
    ("Unspecified", "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified"),
];

pub fn saml_name_id_format_names() -> Vec<&'static str> {
    SAML_NAME_ID_FORMATS.iter().map(|(name, _)| *name).collect()
}

/// Maps a NameID policy name such as `Persistent` to its URN.
pub fn saml_name_id_format_urn(name: &str) -> DomainResult<&'static str> {
    SAML_NAME_ID_FORMATS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, urn)| *urn)
        .ok_or_else(|| {
            DomainError::invalid_value("name_id_policy_format", &saml_name_id_format_names(), name)
        })
}

/// Maps a stored URN back to its policy name.
pub fn saml_name_id_format_name(urn: &str) -> Option<&'static str> {
    SAML_NAME_ID_FORMATS
        .iter()
        .find(|(_, known)| *known == urn)
        .map(|(name, _)| *name)
}

/// Domain entity representing an identity provider federated into a realm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityProvider {
    pub realm: String,
    pub alias: String,
    pub internal_id: Option<String>,
    /// `oidc`, `keycloak-oidc`, `google`, `microsoft` or `saml`.
    pub provider_id: String,
    pub display_name: Option<String>,
    pub enabled: bool,
    pub store_token: bool,
    pub add_read_token_role_on_create: bool,
    pub authenticate_by_default: bool,
    pub link_only: bool,
    pub trust_email: bool,
    pub first_broker_login_flow_alias: String,
    pub post_broker_login_flow_alias: Option<String>,
    pub config: IdentityProviderConfig,
}

/// Provider-specific configuration, discriminated by `provider_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IdentityProviderConfig {
    Oidc(OidcConfig),
    Google(GoogleConfig),
    Microsoft(MicrosoftConfig),
    Saml(SamlConfig),
}

/// Typed view over Keycloak's flat `config` map.
///
/// Typed fields are (de)serialized with their Keycloak key names; every key
/// not listed in `KNOWN_KEYS` lives in `extra_config` and is passed through
/// verbatim.
pub trait ProviderConfig: Serialize + DeserializeOwned + Default + Clone {
    const KNOWN_KEYS: &'static [&'static str];

    fn extra_config(&self) -> &BTreeMap<String, String>;

    fn extra_config_mut(&mut self) -> &mut BTreeMap<String, String>;

    fn validate(&self) -> DomainResult<()> {
        Ok(())
    }

    /// Keeps a known client secret when Keycloak echoes its mask back.
    fn restore_secret(&mut self, _known: &Self) {}
}

/// Settings shared by every identity provider config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonConfig {
    #[serde(with = "quoted_bool")]
    pub hide_on_login_page: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gui_order: Option<String>,
    pub sync_mode: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            hide_on_login_page: false,
            gui_order: None,
            sync_mode: "IMPORT".to_string(),
        }
    }
}

impl CommonConfig {
    const KEYS: [&'static str; 3] = ["hideOnLoginPage", "guiOrder", "syncMode"];

    fn validate(&self) -> DomainResult<()> {
        ensure_one_of("sync_mode", &self.sync_mode, SYNC_MODES)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OidcConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub client_id: String,
    pub client_secret: String,
    pub authorization_url: String,
    pub token_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logout_url: Option<String>,
    #[serde(with = "quoted_bool")]
    pub validate_signature: bool,
    #[serde(with = "quoted_bool")]
    pub use_jwks_url: bool,
    #[serde(with = "quoted_bool")]
    pub backchannel_supported: bool,
    #[serde(with = "quoted_bool")]
    pub disable_user_info: bool,
    #[serde(with = "quoted_bool")]
    pub login_hint: bool,
    #[serde(with = "quoted_bool")]
    pub ui_locales: bool,
    #[serde(with = "quoted_bool")]
    pub accepts_prompt_none_forward_from_client: bool,
    pub default_scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_auth_method: Option<String>,
    #[serde(skip)]
    pub extra_config: BTreeMap<String, String>,
}

impl ProviderConfig for OidcConfig {
    const KNOWN_KEYS: &'static [&'static str] = &[
        CommonConfig::KEYS[0],
        CommonConfig::KEYS[1],
        CommonConfig::KEYS[2],
        "clientId",
        "clientSecret",
        "authorizationUrl",
        "tokenUrl",
        "userInfoUrl",
        "jwksUrl",
        "issuer",
        "logoutUrl",
        "validateSignature",
        "useJwksUrl",
        "backchannelSupported",
        "disableUserInfo",
        "loginHint",
        "uiLocales",
        "acceptsPromptNoneForwardFromClient",
        "defaultScope",
        "clientAuthMethod",
    ];

    fn extra_config(&self) -> &BTreeMap<String, String> {
        &self.extra_config
    }

    fn extra_config_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.extra_config
    }

    fn validate(&self) -> DomainResult<()> {
        self.common.validate()?;
        if self.authorization_url.is_empty() || self.token_url.is_empty() {
            return Err(DomainError::validation(
                "authorization_url and token_url must be set",
            ));
        }
        Ok(())
    }

    fn restore_secret(&mut self, known: &Self) {
        unmask_secret(&mut self.client_secret, &known.client_secret);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub client_id: String,
    pub client_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_domain: Option<String>,
    #[serde(with = "quoted_bool")]
    pub user_ip: bool,
    #[serde(with = "quoted_bool")]
    pub offline_access: bool,
    #[serde(with = "quoted_bool")]
    pub disable_user_info: bool,
    #[serde(with = "quoted_bool")]
    pub accepts_prompt_none_forward_from_client: bool,
    pub default_scope: String,
    #[serde(skip)]
    pub extra_config: BTreeMap<String, String>,
}

impl ProviderConfig for GoogleConfig {
    const KNOWN_KEYS: &'static [&'static str] = &[
        CommonConfig::KEYS[0],
        CommonConfig::KEYS[1],
        CommonConfig::KEYS[2],
        "clientId",
        "clientSecret",
        "hostedDomain",
        "userIp",
        "offlineAccess",
        "disableUserInfo",
        "acceptsPromptNoneForwardFromClient",
        "defaultScope",
    ];

    fn extra_config(&self) -> &BTreeMap<String, String> {
        &self.extra_config
    }

    fn extra_config_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.extra_config
    }

    fn validate(&self) -> DomainResult<()> {
        self.common.validate()
    }

    fn restore_secret(&mut self, known: &Self) {
        unmask_secret(&mut self.client_secret, &known.client_secret);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MicrosoftConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub client_id: String,
    pub client_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(with = "quoted_bool")]
    pub accepts_prompt_none_forward_from_client: bool,
    pub default_scope: String,
    #[serde(skip)]
    pub extra_config: BTreeMap<String, String>,
}

impl ProviderConfig for MicrosoftConfig {
    const KNOWN_KEYS: &'static [&'static str] = &[
        CommonConfig::KEYS[0],
        CommonConfig::KEYS[1],
        CommonConfig::KEYS[2],
        "clientId",
        "clientSecret",
        "tenantId",
        "acceptsPromptNoneForwardFromClient",
        "defaultScope",
    ];

    fn extra_config(&self) -> &BTreeMap<String, String> {
        &self.extra_config
    }

    fn extra_config_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.extra_config
    }

    fn validate(&self) -> DomainResult<()> {
        self.common.validate()
    }

    fn restore_secret(&mut self, known: &Self) {
        unmask_secret(&mut self.client_secret, &known.client_secret);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SamlConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub entity_id: String,
    pub single_sign_on_service_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_logout_service_url: Option<String>,
    #[serde(with = "quoted_bool")]
    pub backchannel_supported: bool,
    #[serde(with = "quoted_bool")]
    pub validate_signature: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_certificate: Option<String>,
    /// URN form, see [`SAML_NAME_ID_FORMATS`].
    #[serde(rename = "nameIDPolicyFormat")]
    pub name_id_policy_format: String,
    #[serde(with = "quoted_bool")]
    pub post_binding_response: bool,
    #[serde(with = "quoted_bool")]
    pub post_binding_authn_request: bool,
    #[serde(with = "quoted_bool")]
    pub post_binding_logout: bool,
    #[serde(with = "quoted_bool")]
    pub want_authn_requests_signed: bool,
    #[serde(with = "quoted_bool")]
    pub want_assertions_signed: bool,
    #[serde(with = "quoted_bool")]
    pub want_assertions_encrypted: bool,
    #[serde(with = "quoted_bool")]
    pub force_authn: bool,
    #[serde(with = "quoted_bool")]
    pub login_hint: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    #[serde(
        rename = "xmlSigKeyInfoKeyNameTransformer",
        skip_serializing_if = "Option::is_none"
    )]
    pub xml_sign_key_info_key_name_transformer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_clock_skew: Option<String>,
    #[serde(skip)]
    pub extra_config: BTreeMap<String, String>,
}

impl ProviderConfig for SamlConfig {
    const KNOWN_KEYS: &'static [&'static str] = &[
        CommonConfig::KEYS[0],
        CommonConfig::KEYS[1],
        CommonConfig::KEYS[2],
        "entityId",
        "singleSignOnServiceUrl",
        "singleLogoutServiceUrl",
        "backchannelSupported",
        "validateSignature",
        "signingCertificate",
        "nameIDPolicyFormat",
        "postBindingResponse",
        "postBindingAuthnRequest",
        "postBindingLogout",
        "wantAuthnRequestsSigned",
        "wantAssertionsSigned",
        "wantAssertionsEncrypted",
        "forceAuthn",
        "loginHint",
        "signatureAlgorithm",
        "xmlSigKeyInfoKeyNameTransformer",
        "principalType",
        "principalAttribute",
        "allowedClockSkew",
    ];

    fn extra_config(&self) -> &BTreeMap<String, String> {
        &self.extra_config
    }

    fn extra_config_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.extra_config
    }

    fn validate(&self) -> DomainResult<()> {
        self.common.validate()?;

        if self.single_sign_on_service_url.is_empty() {
            return Err(DomainError::validation(
                "single_sign_on_service_url must be set",
            ));
        }
        if !self.name_id_policy_format.is_empty()
            && saml_name_id_format_name(&self.name_id_policy_format).is_none()
        {
            return Err(DomainError::invalid_value(
                "name_id_policy_format",
                &saml_name_id_format_names(),
                &self.name_id_policy_format,
            ));
        }
        if let Some(algorithm) = &self.signature_algorithm {
            ensure_one_of("signature_algorithm", algorithm, SAML_SIGNATURE_ALGORITHMS)?;
        }
        if let Some(transformer) = &self.xml_sign_key_info_key_name_transformer {
            ensure_one_of(
                "xml_sign_key_info_key_name_transformer",
                transformer,
                SAML_KEY_NAME_TRANSFORMERS,
            )?;
        }
        if let Some(principal_type) = &self.principal_type {
            ensure_one_of("principal_type", principal_type, SAML_PRINCIPAL_TYPES)?;
        }
        Ok(())
    }
}

/// Rejects extra_config keys that would shadow a typed attribute.
pub fn validate_extra_config(
    known_keys: &[&str],
    extra_config: &BTreeMap<String, String>,
) -> DomainResult<()> {
    match extra_config
        .keys()
        .find(|key| known_keys.contains(&key.as_str()))
    {
        Some(key) => Err(DomainError::validation(format!(
            "extra_config key \"{key}\" is not allowed, as it conflicts with a top-level schema attribute"
        ))),
        None => Ok(()),
    }
}

/// Flattens a typed config into Keycloak's `config` map, extra keys included.
pub fn config_to_map<C: ProviderConfig>(config: &C) -> DomainResult<BTreeMap<String, String>> {
    validate_extra_config(C::KNOWN_KEYS, config.extra_config())?;

    let value = serde_json::to_value(config)?;
    let mut map: BTreeMap<String, String> = config.extra_config().clone();
    if let serde_json::Value::Object(fields) = value {
        for (key, value) in fields {
            match value {
                serde_json::Value::String(s) => {
                    map.insert(key, s);
                }
                serde_json::Value::Null => {}
                other => {
                    map.insert(key, other.to_string());
                }
            }
        }
    }
    Ok(map)
}

/// Splits Keycloak's `config` map into typed fields and `extra_config`.
pub fn config_from_map<C: ProviderConfig>(map: &BTreeMap<String, String>) -> DomainResult<C> {
    let mut known = serde_json::Map::new();
    let mut extra = BTreeMap::new();
    for (key, value) in map {
        if C::KNOWN_KEYS.contains(&key.as_str()) {
            known.insert(key.clone(), serde_json::Value::String(value.clone()));
        } else {
            extra.insert(key.clone(), value.clone());
        }
    }

    let mut config: C = serde_json::from_value(serde_json::Value::Object(known))?;
    *config.extra_config_mut() = extra;
    Ok(config)
}

impl IdentityProviderConfig {
    /// Picks the config variant Keycloak uses for a provider id.
    pub fn from_map(provider_id: &str, map: &BTreeMap<String, String>) -> DomainResult<Self> {
        Ok(match provider_id {
            "google" => IdentityProviderConfig::Google(config_from_map(map)?),
            "microsoft" => IdentityProviderConfig::Microsoft(config_from_map(map)?),
            "saml" => IdentityProviderConfig::Saml(config_from_map(map)?),
            _ => IdentityProviderConfig::Oidc(config_from_map(map)?),
        })
    }

    pub fn to_map(&self) -> DomainResult<BTreeMap<String, String>> {
        match self {
            IdentityProviderConfig::Oidc(c) => config_to_map(c),
            IdentityProviderConfig::Google(c) => config_to_map(c),
            IdentityProviderConfig::Microsoft(c) => config_to_map(c),
            IdentityProviderConfig::Saml(c) => config_to_map(c),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        match self {
            IdentityProviderConfig::Oidc(c) => {
                validate_extra_config(OidcConfig::KNOWN_KEYS, &c.extra_config)?;
                c.validate()
            }
            IdentityProviderConfig::Google(c) => {
                validate_extra_config(GoogleConfig::KNOWN_KEYS, &c.extra_config)?;
                c.validate()
            }
            IdentityProviderConfig::Microsoft(c) => {
                validate_extra_config(MicrosoftConfig::KNOWN_KEYS, &c.extra_config)?;
                c.validate()
            }
            IdentityProviderConfig::Saml(c) => {
                validate_extra_config(SamlConfig::KNOWN_KEYS, &c.extra_config)?;
                c.validate()
            }
        }
    }

    pub fn restore_secret(&mut self, known: &IdentityProviderConfig) {
        match (self, known) {
            (IdentityProviderConfig::Oidc(c), IdentityProviderConfig::Oidc(k)) => c.restore_secret(k),
            (IdentityProviderConfig::Google(c), IdentityProviderConfig::Google(k)) => {
                c.restore_secret(k)
            }
            (IdentityProviderConfig::Microsoft(c), IdentityProviderConfig::Microsoft(k)) => {
                c.restore_secret(k)
            }
            _ => {}
        }
    }
}

impl IdentityProvider {
    pub fn new(
        realm: impl Into<String>,
        alias: impl Into<String>,
        provider_id: impl Into<String>,
        config: IdentityProviderConfig,
    ) -> Self {
        Self {
            realm: realm.into(),
            alias: alias.into(),
            internal_id: None,
            provider_id: provider_id.into(),
            display_name: None,
            enabled: true,
            store_token: true,
            add_read_token_role_on_create: false,
            authenticate_by_default: false,
            link_only: false,
            trust_email: false,
            first_broker_login_flow_alias: DEFAULT_FIRST_BROKER_LOGIN_FLOW.to_string(),
            post_broker_login_flow_alias: None,
            config,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.realm.is_empty() {
            return Err(DomainError::validation("realm must be set"));
        }
        if self.alias.is_empty() {
            return Err(DomainError::validation("alias must be set"));
        }

        let expected = match &self.config {
            IdentityProviderConfig::Oidc(_) => &["oidc", "keycloak-oidc"][..],
            IdentityProviderConfig::Google(_) => &["google"][..],
            IdentityProviderConfig::Microsoft(_) => &["microsoft"][..],
            IdentityProviderConfig::Saml(_) => &["saml"][..],
        };
        ensure_one_of("provider_id", &self.provider_id, expected)?;

        self.config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oidc() -> OidcConfig {
        OidcConfig {
            client_id: "example".to_string(),
            client_secret: "secret".to_string(),
            authorization_url: "https://idp.example.com/auth".to_string(),
            token_url: "https://idp.example.com/token".to_string(),
            validate_signature: true,
            default_scope: "openid".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn booleans_travel_as_strings() {
        let map = config_to_map(&oidc()).unwrap();
        assert_eq!(map["validateSignature"], "true");
        assert_eq!(map["hideOnLoginPage"], "false");
        assert_eq!(map["syncMode"], "IMPORT");
        assert!(!map.contains_key("jwksUrl"));
    }

    #[test]
    fn unknown_keys_land_in_extra_config() {
        let mut config = oidc();
        config.extra_config.insert("myCustomKey".to_string(), "x".to_string());
        let map = config_to_map(&config).unwrap();
        assert_eq!(map["myCustomKey"], "x");

        let back: OidcConfig = config_from_map(&map).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn extra_config_cannot_shadow_typed_keys() {
        let mut config = oidc();
        config
            .extra_config
            .insert("clientId".to_string(), "other".to_string());
        let err = config_to_map(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: extra_config key \"clientId\" is not allowed, as it conflicts with a top-level schema attribute"
        );
    }

    #[test]
    fn saml_name_id_formats() {
        assert_eq!(
            saml_name_id_format_urn("Email").unwrap(),
            "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress"
        );
        assert_eq!(
            saml_name_id_format_name("urn:oasis:names:tc:SAML:2.0:nameid-format:persistent"),
            Some("Persistent")
        );
        assert!(saml_name_id_format_urn("Whatever").is_err());
    }

    #[test]
    fn saml_signature_algorithm_is_checked() {
        let config = SamlConfig {
            single_sign_on_service_url: "https://idp.example.com/sso".to_string(),
            signature_algorithm: Some("RSA_MD5".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "expected signature_algorithm to be one of [RSA_SHA1 RSA_SHA256 RSA_SHA512 DSA_SHA1], got RSA_MD5"
        );
    }

    #[test]
    fn provider_id_selects_config_variant() {
        let mut map = BTreeMap::new();
        map.insert("hostedDomain".to_string(), "example.com".to_string());
        map.insert("offlineAccess".to_string(), "true".to_string());
        match IdentityProviderConfig::from_map("google", &map).unwrap() {
            IdentityProviderConfig::Google(google) => {
                assert_eq!(google.hosted_domain.as_deref(), Some("example.com"));
                assert!(google.offline_access);
                assert!(google.extra_config.is_empty());
            }
            other => panic!("unexpected config {other:?}"),
        }
    }

    #[test]
    fn masked_secret_keeps_known_value() {
        let known = IdentityProviderConfig::Oidc(oidc());
        let mut read = IdentityProviderConfig::Oidc(OidcConfig {
            client_secret: "**********".to_string(),
            ..oidc()
        });
        read.restore_secret(&known);
        assert_eq!(read, known);
    }
}
