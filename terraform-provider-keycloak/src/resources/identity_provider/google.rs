use super::{IdentityProviderBaseModel, IdentityProviderModel};
use crate::resources::non_empty;
use crate::schema::{Attribute, Schema};
use keycloak_domain::domain::{
    entities::{GoogleConfig, IdentityProvider, IdentityProviderConfig},
    errors::DomainResult,
};
use serde::{Deserialize, Serialize};

const DEFAULT_SCOPES: &str = "openid profile email";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleIdentityProviderModel {
    #[serde(flatten)]
    pub base: IdentityProviderBaseModel,
    pub client_id: String,
    pub client_secret: String,
    pub hosted_domain: Option<String>,
    pub use_user_ip_param: bool,
    pub request_refresh_token: bool,
    pub disable_user_info: bool,
    pub accepts_prompt_none_forward_from_client: bool,
    pub default_scopes: Option<String>,
}

impl IdentityProviderModel for GoogleIdentityProviderModel {
    const TYPE_NAME: &'static str = "keycloak_oidc_google_identity_provider";

    fn specific_schema() -> Schema {
        Schema::new("A Google identity provider")
            .attribute("alias", Attribute::string().default("google").force_new())
            .attribute("client_id", Attribute::string().required())
            .attribute("client_secret", Attribute::string().required().sensitive())
            .attribute("hosted_domain", Attribute::string())
            .attribute("use_user_ip_param", Attribute::bool().default(false))
            .attribute("request_refresh_token", Attribute::bool().default(false))
            .attribute("disable_user_info", Attribute::bool().default(false))
            .attribute(
                "accepts_prompt_none_forward_from_client",
                Attribute::bool().default(false),
            )
            .attribute("default_scopes", Attribute::string().default(DEFAULT_SCOPES))
    }

    fn base(&self) -> &IdentityProviderBaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut IdentityProviderBaseModel {
        &mut self.base
    }

    fn provider_id(&self) -> String {
        "google".to_string()
    }

    fn to_config(&self) -> DomainResult<IdentityProviderConfig> {
        Ok(IdentityProviderConfig::Google(GoogleConfig {
            common: self.base.common_config(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            hosted_domain: non_empty(self.hosted_domain.clone()),
            user_ip: self.use_user_ip_param,
            offline_access: self.request_refresh_token,
            disable_user_info: self.disable_user_info,
            accepts_prompt_none_forward_from_client: self.accepts_prompt_none_forward_from_client,
            default_scope: non_empty(self.default_scopes.clone())
                .unwrap_or_else(|| DEFAULT_SCOPES.to_string()),
            extra_config: self.base.extra_config.clone(),
        }))
    }

    fn from_entity(idp: &IdentityProvider) -> Option<Self> {
        let IdentityProviderConfig::Google(config) = &idp.config else {
            return None;
        };

        Some(Self {
            base: IdentityProviderBaseModel::from_entity(idp, &config.common, &config.extra_config),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            hosted_domain: config.hosted_domain.clone(),
            use_user_ip_param: config.user_ip,
            request_refresh_token: config.offline_access,
            disable_user_info: config.disable_user_info,
            accepts_prompt_none_forward_from_client: config.accepts_prompt_none_forward_from_client,
            default_scopes: Some(config.default_scope.clone()),
        })
    }
}
