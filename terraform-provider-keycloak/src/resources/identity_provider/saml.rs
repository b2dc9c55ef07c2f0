use super::{IdentityProviderBaseModel, IdentityProviderModel};
use crate::resources::non_empty;
use crate::schema::{Attribute, Schema};
use keycloak_domain::domain::{
    entities::{
        saml_name_id_format_name, saml_name_id_format_names, saml_name_id_format_urn,
        IdentityProvider, IdentityProviderConfig, SamlConfig, SAML_KEY_NAME_TRANSFORMERS,
        SAML_PRINCIPAL_TYPES, SAML_SIGNATURE_ALGORITHMS,
    },
    errors::DomainResult,
};
use serde::{Deserialize, Serialize};

const DEFAULT_NAME_ID_FORMAT: &str = "Persistent";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamlIdentityProviderModel {
    #[serde(flatten)]
    pub base: IdentityProviderBaseModel,
    pub entity_id: String,
    pub single_sign_on_service_url: String,
    pub single_logout_service_url: Option<String>,
    pub backchannel_supported: bool,
    pub validate_signature: bool,
    pub signing_certificate: Option<String>,
    /// Friendly name, e.g. `Email`; Keycloak stores the URN.
    pub name_id_policy_format: Option<String>,
    pub post_binding_response: bool,
    pub post_binding_authn_request: bool,
    pub post_binding_logout: bool,
    pub want_authn_requests_signed: bool,
    pub want_assertions_signed: bool,
    pub want_assertions_encrypted: bool,
    pub force_authn: bool,
    pub login_hint: bool,
    pub signature_algorithm: Option<String>,
    pub xml_sign_key_info_key_name_transformer: Option<String>,
    pub principal_type: Option<String>,
    pub principal_attribute: Option<String>,
    pub allowed_clock_skew: Option<String>,
}

impl IdentityProviderModel for SamlIdentityProviderModel {
    const TYPE_NAME: &'static str = "keycloak_saml_identity_provider";

    fn specific_schema() -> Schema {
        // Name-id format membership is checked when the config is built.
        Schema::new("A SAML 2.0 identity provider")
            .attribute("entity_id", Attribute::string().required())
            .attribute("single_sign_on_service_url", Attribute::string().required())
            .attribute("single_logout_service_url", Attribute::string())
            .attribute("backchannel_supported", Attribute::bool().default(false))
            .attribute("validate_signature", Attribute::bool().default(false))
            .attribute("signing_certificate", Attribute::string())
            .attribute(
                "name_id_policy_format",
                Attribute::string()
                    .default(DEFAULT_NAME_ID_FORMAT)
                    .describe(format!("One of: {}", saml_name_id_format_names().join(", "))),
            )
            .attribute("post_binding_response", Attribute::bool().default(false))
            .attribute("post_binding_authn_request", Attribute::bool().default(false))
            .attribute("post_binding_logout", Attribute::bool().default(false))
            .attribute("want_authn_requests_signed", Attribute::bool().default(false))
            .attribute("want_assertions_signed", Attribute::bool().default(false))
            .attribute("want_assertions_encrypted", Attribute::bool().default(false))
            .attribute("force_authn", Attribute::bool().default(false))
            .attribute("login_hint", Attribute::bool().default(false))
            .attribute(
                "signature_algorithm",
                Attribute::string().one_of(SAML_SIGNATURE_ALGORITHMS),
            )
            .attribute(
                "xml_sign_key_info_key_name_transformer",
                Attribute::string().one_of(SAML_KEY_NAME_TRANSFORMERS),
            )
            .attribute("principal_type", Attribute::string().one_of(SAML_PRINCIPAL_TYPES))
            .attribute("principal_attribute", Attribute::string())
            .attribute("allowed_clock_skew", Attribute::string())
    }

    fn base(&self) -> &IdentityProviderBaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut IdentityProviderBaseModel {
        &mut self.base
    }

    fn provider_id(&self) -> String {
        "saml".to_string()
    }

    fn to_config(&self) -> DomainResult<IdentityProviderConfig> {
        let name_id_format = non_empty(self.name_id_policy_format.clone())
            .unwrap_or_else(|| DEFAULT_NAME_ID_FORMAT.to_string());

        Ok(IdentityProviderConfig::Saml(SamlConfig {
            common: self.base.common_config(),
            entity_id: self.entity_id.clone(),
            single_sign_on_service_url: self.single_sign_on_service_url.clone(),
            single_logout_service_url: non_empty(self.single_logout_service_url.clone()),
            backchannel_supported: self.backchannel_supported,
            validate_signature: self.validate_signature,
            signing_certificate: non_empty(self.signing_certificate.clone()),
            name_id_policy_format: saml_name_id_format_urn(&name_id_format)?.to_string(),
            post_binding_response: self.post_binding_response,
            post_binding_authn_request: self.post_binding_authn_request,
            post_binding_logout: self.post_binding_logout,
            want_authn_requests_signed: self.want_authn_requests_signed,
            want_assertions_signed: self.want_assertions_signed,
            want_assertions_encrypted: self.want_assertions_encrypted,
            force_authn: self.force_authn,
            login_hint: self.login_hint,
            signature_algorithm: non_empty(self.signature_algorithm.clone()),
            xml_sign_key_info_key_name_transformer: non_empty(
                self.xml_sign_key_info_key_name_transformer.clone(),
            ),
            principal_type: non_empty(self.principal_type.clone()),
            principal_attribute: non_empty(self.principal_attribute.clone()),
            allowed_clock_skew: non_empty(self.allowed_clock_skew.clone()),
            extra_config: self.base.extra_config.clone(),
        }))
    }

    fn from_entity(idp: &IdentityProvider) -> Option<Self> {
        let IdentityProviderConfig::Saml(config) = &idp.config else {
            return None;
        };

        // Unknown URNs are kept verbatim so the next plan shows the drift.
        let name_id_policy_format = Some(
            saml_name_id_format_name(&config.name_id_policy_format)
                .map(str::to_string)
                .unwrap_or_else(|| config.name_id_policy_format.clone()),
        )
        .filter(|format| !format.is_empty());

        Some(Self {
            base: IdentityProviderBaseModel::from_entity(idp, &config.common, &config.extra_config),
            entity_id: config.entity_id.clone(),
            single_sign_on_service_url: config.single_sign_on_service_url.clone(),
            single_logout_service_url: config.single_logout_service_url.clone(),
            backchannel_supported: config.backchannel_supported,
            validate_signature: config.validate_signature,
            signing_certificate: config.signing_certificate.clone(),
            name_id_policy_format,
            post_binding_response: config.post_binding_response,
            post_binding_authn_request: config.post_binding_authn_request,
            post_binding_logout: config.post_binding_logout,
            want_authn_requests_signed: config.want_authn_requests_signed,
            want_assertions_signed: config.want_assertions_signed,
            want_assertions_encrypted: config.want_assertions_encrypted,
            force_authn: config.force_authn,
            login_hint: config.login_hint,
            signature_algorithm: config.signature_algorithm.clone(),
            xml_sign_key_info_key_name_transformer: config
                .xml_sign_key_info_key_name_transformer
                .clone(),
            principal_type: config.principal_type.clone(),
            principal_attribute: config.principal_attribute.clone(),
            allowed_clock_skew: config.allowed_clock_skew.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(format: &str) -> SamlIdentityProviderModel {
        SamlIdentityProviderModel {
            entity_id: "https://sp.example.com".to_string(),
            single_sign_on_service_url: "https://idp.example.com/sso".to_string(),
            name_id_policy_format: Some(format.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn name_id_format_is_stored_as_urn() {
        let IdentityProviderConfig::Saml(config) = model("Email").to_config().unwrap() else {
            panic!("expected a saml config");
        };
        assert_eq!(
            config.name_id_policy_format,
            "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress"
        );

        let idp = IdentityProvider::new("r1", "saml", "saml", IdentityProviderConfig::Saml(config));
        let read = SamlIdentityProviderModel::from_entity(&idp).unwrap();
        assert_eq!(read.name_id_policy_format.as_deref(), Some("Email"));
        assert_eq!(read.base.id.as_deref(), Some("saml"));
    }

    #[test]
    fn unknown_name_id_format_lists_the_choices() {
        let err = model("Whatever").to_config().unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "expected name_id_policy_format to be one of [{}], got Whatever",
                saml_name_id_format_names().join(" ")
            )
        );
    }
}
