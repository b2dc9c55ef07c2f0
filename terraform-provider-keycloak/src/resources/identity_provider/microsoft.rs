use super::{IdentityProviderBaseModel, IdentityProviderModel};
use crate::resources::non_empty;
use crate::schema::{Attribute, Schema};
use keycloak_domain::domain::{
    entities::{IdentityProvider, IdentityProviderConfig, MicrosoftConfig},
    errors::DomainResult,
};
use serde::{Deserialize, Serialize};

const DEFAULT_SCOPES: &str = "openid profile email";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicrosoftIdentityProviderModel {
    #[serde(flatten)]
    pub base: IdentityProviderBaseModel,
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: Option<String>,
    pub accepts_prompt_none_forward_from_client: bool,
    pub default_scopes: Option<String>,
}

impl IdentityProviderModel for MicrosoftIdentityProviderModel {
    const TYPE_NAME: &'static str = "keycloak_oidc_microsoft_identity_provider";

    fn specific_schema() -> Schema {
        Schema::new("A Microsoft identity provider")
            .attribute("alias", Attribute::string().default("microsoft").force_new())
            .attribute("client_id", Attribute::string().required())
            .attribute("client_secret", Attribute::string().required().sensitive())
            .attribute(
                "tenant_id",
                Attribute::string().describe("Restricts sign-in to one Azure AD tenant"),
            )
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
        "microsoft".to_string()
    }

    fn to_config(&self) -> DomainResult<IdentityProviderConfig> {
        Ok(IdentityProviderConfig::Microsoft(MicrosoftConfig {
            common: self.base.common_config(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            tenant_id: non_empty(self.tenant_id.clone()),
            accepts_prompt_none_forward_from_client: self.accepts_prompt_none_forward_from_client,
            default_scope: non_empty(self.default_scopes.clone())
                .unwrap_or_else(|| DEFAULT_SCOPES.to_string()),
            extra_config: self.base.extra_config.clone(),
        }))
    }

    fn from_entity(idp: &IdentityProvider) -> Option<Self> {
        let IdentityProviderConfig::Microsoft(config) = &idp.config else {
            return None;
        };

        Some(Self {
            base: IdentityProviderBaseModel::from_entity(idp, &config.common, &config.extra_config),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            tenant_id: config.tenant_id.clone(),
            accepts_prompt_none_forward_from_client: config.accepts_prompt_none_forward_from_client,
            default_scopes: Some(config.default_scope.clone()),
        })
    }
}
