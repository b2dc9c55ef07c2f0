use super::non_empty;
use crate::resource::Resource;
use crate::schema::{Attribute, AttributeType, Schema};
use crate::state::ProviderState;
use async_trait::async_trait;
use keycloak_domain::domain::{
    entities::{AccessType, OpenIdClient, ACCESS_TYPES},
    errors::DomainResult,
    values::parse_openid_client_import_id,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenIdClientModel {
    pub id: Option<String>,
    pub realm_id: String,
    pub client_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
    pub access_type: String,
    pub client_secret: Option<String>,
    pub standard_flow_enabled: bool,
    pub implicit_flow_enabled: bool,
    pub direct_access_grants_enabled: bool,
    pub service_accounts_enabled: bool,
    pub valid_redirect_uris: Vec<String>,
    pub web_origins: Vec<String>,
    pub root_url: Option<String>,
    pub base_url: Option<String>,
    pub admin_url: Option<String>,
    pub full_scope_allowed: bool,
}

impl OpenIdClientModel {
    fn to_entity(&self) -> DomainResult<OpenIdClient> {
        let mut client = OpenIdClient::new(
            self.realm_id.clone(),
            self.client_id.clone(),
            AccessType::parse(&self.access_type)?,
        );
        client.id = non_empty(self.id.clone());
        client.name = non_empty(self.name.clone());
        client.description = non_empty(self.description.clone());
        client.enabled = self.enabled;
        client.client_secret = non_empty(self.client_secret.clone());
        client.standard_flow_enabled = self.standard_flow_enabled;
        client.implicit_flow_enabled = self.implicit_flow_enabled;
        client.direct_access_grants_enabled = self.direct_access_grants_enabled;
        client.service_accounts_enabled = self.service_accounts_enabled;
        client.valid_redirect_uris = self.valid_redirect_uris.clone();
        client.web_origins = self.web_origins.clone();
        client.root_url = non_empty(self.root_url.clone());
        client.base_url = non_empty(self.base_url.clone());
        client.admin_url = non_empty(self.admin_url.clone());
        client.full_scope_allowed = self.full_scope_allowed;
        Ok(client)
    }

    fn from_entity(client: OpenIdClient) -> Self {
        Self {
            id: client.id,
            realm_id: client.realm_id,
            client_id: client.client_id,
            name: client.name,
            description: client.description,
            enabled: client.enabled,
            access_type: client.access_type.as_str().to_string(),
            client_secret: client.client_secret,
            standard_flow_enabled: client.standard_flow_enabled,
            implicit_flow_enabled: client.implicit_flow_enabled,
            direct_access_grants_enabled: client.direct_access_grants_enabled,
            service_accounts_enabled: client.service_accounts_enabled,
            valid_redirect_uris: client.valid_redirect_uris,
            web_origins: client.web_origins,
            root_url: client.root_url,
            base_url: client.base_url,
            admin_url: client.admin_url,
            full_scope_allowed: client.full_scope_allowed,
        }
    }
}

pub struct OpenIdClientResource;

#[async_trait]
impl Resource for OpenIdClientResource {
    type Model = OpenIdClientModel;

    fn type_name(&self) -> &'static str {
        "keycloak_openid_client"
    }

    fn schema(&self) -> Schema {
        Schema::resource("An OpenID Connect client")
            .attribute("realm_id", Attribute::string().required().force_new())
            .attribute("client_id", Attribute::string().required().force_new())
            .attribute("name", Attribute::string())
            .attribute("description", Attribute::string())
            .attribute("enabled", Attribute::bool().default(true))
            .attribute("access_type", Attribute::string().required().one_of(ACCESS_TYPES))
            .attribute(
                "client_secret",
                Attribute::string().optional_computed().sensitive(),
            )
            .attribute("standard_flow_enabled", Attribute::bool().default(false))
            .attribute("implicit_flow_enabled", Attribute::bool().default(false))
            .attribute("direct_access_grants_enabled", Attribute::bool().default(false))
            .attribute("service_accounts_enabled", Attribute::bool().default(false))
            .attribute("valid_redirect_uris", Attribute::set(AttributeType::String))
            .attribute("web_origins", Attribute::set(AttributeType::String))
            .attribute("root_url", Attribute::string())
            .attribute("base_url", Attribute::string())
            .attribute("admin_url", Attribute::string())
            .attribute("full_scope_allowed", Attribute::bool().default(true))
    }

    fn validate(&self, model: &OpenIdClientModel) -> DomainResult<()> {
        model.to_entity()?.validate()
    }

    async fn create(&self, state: &ProviderState, planned: OpenIdClientModel) -> DomainResult<OpenIdClientModel> {
        let client = state
            .client_service
            .create_openid_client(&planned.to_entity()?)
            .await?;
        Ok(OpenIdClientModel::from_entity(client))
    }

    async fn read(
        &self,
        state: &ProviderState,
        current: OpenIdClientModel,
    ) -> DomainResult<Option<OpenIdClientModel>> {
        let Some(id) = non_empty(current.id.clone()) else {
            return Ok(None);
        };
        let client = state
            .client_service
            .get_openid_client(&current.realm_id, &id)
            .await?;
        Ok(client.map(OpenIdClientModel::from_entity))
    }

    async fn update(
        &self,
        state: &ProviderState,
        prior: OpenIdClientModel,
        mut planned: OpenIdClientModel,
    ) -> DomainResult<OpenIdClientModel> {
        planned.id = prior.id;
        let client = state
            .client_service
            .update_openid_client(&planned.to_entity()?)
            .await?;
        Ok(OpenIdClientModel::from_entity(client))
    }

    async fn delete(&self, state: &ProviderState, current: OpenIdClientModel) -> DomainResult<()> {
        let Some(id) = non_empty(current.id) else {
            return Ok(());
        };
        state
            .client_service
            .delete_openid_client(&current.realm_id, &id)
            .await
    }

    fn import(&self, id: &str) -> DomainResult<OpenIdClientModel> {
        let (realm_id, id) = parse_openid_client_import_id(id)?;
        Ok(OpenIdClientModel {
            id: Some(id),
            realm_id,
            access_type: AccessType::default().as_str().to_string(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_type_is_checked_before_any_request() {
        let model = OpenIdClientModel {
            realm_id: "r1".to_string(),
            client_id: "c1".to_string(),
            access_type: "bearer".to_string(),
            ..Default::default()
        };
        assert!(OpenIdClientResource.validate(&model).is_err());

        let model = OpenIdClientModel {
            access_type: "BEARER-ONLY".to_string(),
            ..model
        };
        assert!(OpenIdClientResource.validate(&model).is_ok());
    }

    #[test]
    fn import_splits_realm_and_id() {
        let model = OpenIdClientResource.import("r1/3f0c").unwrap();
        assert_eq!(model.realm_id, "r1");
        assert_eq!(model.id.as_deref(), Some("3f0c"));
        assert_eq!(
            OpenIdClientResource.import("r1").unwrap_err().to_string(),
            "Invalid import. Supported import formats: {{realmId}}/{{openidClientId}}"
        );
    }
}
