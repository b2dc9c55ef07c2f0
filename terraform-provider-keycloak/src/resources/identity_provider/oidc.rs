use super::{IdentityProviderBaseModel, IdentityProviderModel};
use crate::resources::non_empty;
use crate::schema::{Attribute, Schema};
use keycloak_domain::domain::{
    entities::{IdentityProvider, IdentityProviderConfig, OidcConfig},
    errors::DomainResult,
};
use serde::{Deserialize, Serialize};

const PROVIDER_IDS: &[&str] = &["oidc", "keycloak-oidc"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OidcIdentityProviderModel {
    #[serde(flatten)]
    pub base: IdentityProviderBaseModel,
    pub provider_id: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub authorization_url: String,
    pub token_url: String,
    pub user_info_url: Option<String>,
    pub jwks_url: Option<String>,
    pub issuer: Option<String>,
    pub logout_url: Option<String>,
    pub validate_signature: bool,
    pub use_jwks_url: bool,
    pub backchannel_supported: bool,
    pub disable_user_info: bool,
    pub login_hint: bool,
    pub ui_locales: bool,
    pub accepts_prompt_none_forward_from_client: bool,
    pub default_scopes: Option<String>,
    pub client_auth_method: Option<String>,
}

impl IdentityProviderModel for OidcIdentityProviderModel {
    const TYPE_NAME: &'static str = "keycloak_oidc_identity_provider";

    fn specific_schema() -> Schema {
        Schema::new("A generic OpenID Connect identity provider")
            .attribute(
                "provider_id",
                Attribute::string().default("oidc").force_new().one_of(PROVIDER_IDS),
            )
            .attribute("client_id", Attribute::string().required())
            .attribute("client_secret", Attribute::string().required().sensitive())
            .attribute("authorization_url", Attribute::string().required())
            .attribute("token_url", Attribute::string().required())
            .attribute("user_info_url", Attribute::string())
            .attribute("jwks_url", Attribute::string())
            .attribute("issuer", Attribute::string())
            .attribute("logout_url", Attribute::string())
            .attribute("validate_signature", Attribute::bool().default(false))
            .attribute("use_jwks_url", Attribute::bool().default(true))
            .attribute("backchannel_supported", Attribute::bool().default(true))
            .attribute("disable_user_info", Attribute::bool().default(false))
            .attribute("login_hint", Attribute::bool().default(false))
            .attribute("ui_locales", Attribute::bool().default(false))
            .attribute(
                "accepts_prompt_none_forward_from_client",
                Attribute::bool().default(false),
            )
            .attribute("default_scopes", Attribute::string().default("openid"))
            .attribute("client_auth_method", Attribute::string())
    }

    fn base(&self) -> &IdentityProviderBaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut IdentityProviderBaseModel {
        &mut self.base
    }

    fn provider_id(&self) -> String {
        non_empty(self.provider_id.clone()).unwrap_or_else(|| "oidc".to_string())
    }

    fn to_config(&self) -> DomainResult<IdentityProviderConfig> {
        Ok(IdentityProviderConfig::Oidc(OidcConfig {
            common: self.base.common_config(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            authorization_url: self.authorization_url.clone(),
            token_url: self.token_url.clone(),
            user_info_url: non_empty(self.user_info_url.clone()),
            jwks_url: non_empty(self.jwks_url.clone()),
            issuer: non_empty(self.issuer.clone()),
            logout_url: non_empty(self.logout_url.clone()),
            validate_signature: self.validate_signature,
            use_jwks_url: self.use_jwks_url,
            backchannel_supported: self.backchannel_supported,
            disable_user_info: self.disable_user_info,
            login_hint: self.login_hint,
            ui_locales: self.ui_locales,
            accepts_prompt_none_forward_from_client: self.accepts_prompt_none_forward_from_client,
            default_scope: non_empty(self.default_scopes.clone())
                .unwrap_or_else(|| "openid".to_string()),
            client_auth_method: non_empty(self.client_auth_method.clone()),
            extra_config: self.base.extra_config.clone(),
        }))
    }

    fn from_entity(idp: &IdentityProvider) -> Option<Self> {
        let IdentityProviderConfig::Oidc(config) = &idp.config else {
            return None;
        };

        Some(Self {
            base: IdentityProviderBaseModel::from_entity(idp, &config.common, &config.extra_config),
            provider_id: Some(idp.provider_id.clone()),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            authorization_url: config.authorization_url.clone(),
            token_url: config.token_url.clone(),
            user_info_url: config.user_info_url.clone(),
            jwks_url: config.jwks_url.clone(),
            issuer: config.issuer.clone(),
            logout_url: config.logout_url.clone(),
            validate_signature: config.validate_signature,
            use_jwks_url: config.use_jwks_url,
            backchannel_supported: config.backchannel_supported,
            disable_user_info: config.disable_user_info,
            login_hint: config.login_hint,
            ui_locales: config.ui_locales,
            accepts_prompt_none_forward_from_client: config.accepts_prompt_none_forward_from_client,
            default_scopes: Some(config.default_scope.clone()),
            client_auth_method: config.client_auth_method.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Resource, ResourceData};
    use crate::resources::identity_provider::IdentityProviderResource;
    use serde_json::json;

    fn planned() -> OidcIdentityProviderModel {
        let data = ResourceData::new(
            json!({
                "realm": "r1",
                "alias": "corporate",
                "client_id": "kc",
                "client_secret": "s3cret",
                "authorization_url": "https://idp.example.com/auth",
                "token_url": "https://idp.example.com/token",
                "sync_mode": "FORCE",
                "extra_config": { "myCustomConfigKey": "value" }
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        data.decode().unwrap()
    }

    #[test]
    fn model_maps_onto_an_oidc_config() {
        let model = planned();
        let IdentityProviderConfig::Oidc(config) = model.to_config().unwrap() else {
            panic!("expected an oidc config");
        };
        assert_eq!(config.common.sync_mode, "FORCE");
        assert_eq!(config.default_scope, "openid");
        assert_eq!(config.extra_config["myCustomConfigKey"], "value");
        assert_eq!(model.provider_id(), "oidc");
    }

    #[test]
    fn extra_config_cannot_shadow_typed_keys() {
        let mut model = planned();
        model
            .base
            .extra_config
            .insert("clientId".to_string(), "other".to_string());

        let err = IdentityProviderResource::<OidcIdentityProviderModel>::new()
            .validate(&model)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: extra_config key \"clientId\" is not allowed, as it conflicts with a top-level schema attribute"
        );
    }
}
