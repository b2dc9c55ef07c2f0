//! Identity providers share one base schema and one CRUD implementation;
//! each provider flavour contributes its typed config block.

pub mod google;
pub mod microsoft;
pub mod oidc;
pub mod saml;

use super::non_empty;
use crate::resource::{DynamicResource, Resource};
use crate::schema::{merge_schemas, Attribute, AttributeType, Schema};
use crate::state::ProviderState;
use async_trait::async_trait;
use keycloak_domain::domain::{
    entities::{
        CommonConfig, IdentityProvider, IdentityProviderConfig, DEFAULT_FIRST_BROKER_LOGIN_FLOW,
        SYNC_MODES,
    },
    errors::{DomainError, DomainResult},
    values::parse_identity_provider_import_id,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::marker::PhantomData;

pub fn resources() -> Vec<Box<dyn DynamicResource>> {
    vec![
        Box::new(IdentityProviderResource::<oidc::OidcIdentityProviderModel>::new()),
        Box::new(IdentityProviderResource::<google::GoogleIdentityProviderModel>::new()),
        Box::new(IdentityProviderResource::<microsoft::MicrosoftIdentityProviderModel>::new()),
        Box::new(IdentityProviderResource::<saml::SamlIdentityProviderModel>::new()),
    ]
}

/// Attributes every identity provider resource carries.
pub fn identity_provider_base_schema() -> Schema {
    Schema::resource("")
        .attribute("realm", Attribute::string().required().force_new())
        .attribute("alias", Attribute::string().required().force_new())
        .attribute("internal_id", Attribute::string().computed())
        .attribute("display_name", Attribute::string())
        .attribute("enabled", Attribute::bool().default(true))
        .attribute("store_token", Attribute::bool().default(true))
        .attribute("add_read_token_role_on_create", Attribute::bool().default(false))
        .attribute("authenticate_by_default", Attribute::bool().default(false))
        .attribute("link_only", Attribute::bool().default(false))
        .attribute("trust_email", Attribute::bool().default(false))
        .attribute(
            "first_broker_login_flow_alias",
            Attribute::string().default(DEFAULT_FIRST_BROKER_LOGIN_FLOW),
        )
        .attribute("post_broker_login_flow_alias", Attribute::string())
        .attribute("hide_on_login_page", Attribute::bool().default(false))
        .attribute("gui_order", Attribute::string())
        .attribute("sync_mode", Attribute::string().default("IMPORT").one_of(SYNC_MODES))
        .attribute("extra_config", Attribute::map(AttributeType::String))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityProviderBaseModel {
    pub id: Option<String>,
    pub realm: String,
    pub alias: String,
    pub internal_id: Option<String>,
    pub display_name: Option<String>,
    pub enabled: bool,
    pub store_token: bool,
    pub add_read_token_role_on_create: bool,
    pub authenticate_by_default: bool,
    pub link_only: bool,
    pub trust_email: bool,
    pub first_broker_login_flow_alias: Option<String>,
    pub post_broker_login_flow_alias: Option<String>,
    pub hide_on_login_page: bool,
    pub gui_order: Option<String>,
    pub sync_mode: Option<String>,
    pub extra_config: BTreeMap<String, String>,
}

impl IdentityProviderBaseModel {
    fn common_config(&self) -> CommonConfig {
        CommonConfig {
            hide_on_login_page: self.hide_on_login_page,
            gui_order: non_empty(self.gui_order.clone()),
            sync_mode: non_empty(self.sync_mode.clone()).unwrap_or_else(|| "IMPORT".to_string()),
        }
    }

    /// Base attributes of a provider read back from Keycloak.
    pub fn from_entity(
        idp: &IdentityProvider,
        common: &CommonConfig,
        extra_config: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: Some(idp.alias.clone()),
            realm: idp.realm.clone(),
            alias: idp.alias.clone(),
            internal_id: idp.internal_id.clone(),
            display_name: idp.display_name.clone(),
            enabled: idp.enabled,
            store_token: idp.store_token,
            add_read_token_role_on_create: idp.add_read_token_role_on_create,
            authenticate_by_default: idp.authenticate_by_default,
            link_only: idp.link_only,
            trust_email: idp.trust_email,
            first_broker_login_flow_alias: Some(idp.first_broker_login_flow_alias.clone()),
            post_broker_login_flow_alias: idp.post_broker_login_flow_alias.clone(),
            hide_on_login_page: common.hide_on_login_page,
            gui_order: common.gui_order.clone(),
            sync_mode: Some(common.sync_mode.clone()),
            extra_config: extra_config.clone(),
        }
    }
}

/// One identity provider flavour: its schema, Keycloak provider id and
/// typed config.
pub trait IdentityProviderModel:
    Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static
{
    const TYPE_NAME: &'static str;

    /// Attributes on top of [`identity_provider_base_schema`], described.
    fn specific_schema() -> Schema;

    fn base(&self) -> &IdentityProviderBaseModel;

    fn base_mut(&mut self) -> &mut IdentityProviderBaseModel;

    fn provider_id(&self) -> String;

    fn to_config(&self) -> DomainResult<IdentityProviderConfig>;

    /// `None` when Keycloak holds a different kind of provider under the
    /// alias.
    fn from_entity(idp: &IdentityProvider) -> Option<Self>;
}

pub struct IdentityProviderResource<M> {
    model: PhantomData<fn() -> M>,
}

impl<M: IdentityProviderModel> IdentityProviderResource<M> {
    pub fn new() -> Self {
        Self { model: PhantomData }
    }

    fn to_entity(model: &M) -> DomainResult<IdentityProvider> {
        let base = model.base();
        let mut idp = IdentityProvider::new(
            base.realm.clone(),
            base.alias.clone(),
            model.provider_id(),
            model.to_config()?,
        );
        idp.internal_id = non_empty(base.internal_id.clone());
        idp.display_name = non_empty(base.display_name.clone());
        idp.enabled = base.enabled;
        idp.store_token = base.store_token;
        idp.add_read_token_role_on_create = base.add_read_token_role_on_create;
        idp.authenticate_by_default = base.authenticate_by_default;
        idp.link_only = base.link_only;
        idp.trust_email = base.trust_email;
        if let Some(flow) = non_empty(base.first_broker_login_flow_alias.clone()) {
            idp.first_broker_login_flow_alias = flow;
        }
        idp.post_broker_login_flow_alias = non_empty(base.post_broker_login_flow_alias.clone());
        Ok(idp)
    }

    fn from_entity(idp: IdentityProvider) -> DomainResult<M> {
        M::from_entity(&idp).ok_or_else(|| {
            DomainError::validation(format!(
                "identity provider {} is a {} provider, not a {}",
                idp.alias,
                idp.provider_id,
                M::TYPE_NAME
            ))
        })
    }
}

impl<M: IdentityProviderModel> Default for IdentityProviderResource<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: IdentityProviderModel> Resource for IdentityProviderResource<M> {
    type Model = M;

    fn type_name(&self) -> &'static str {
        M::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        merge_schemas(identity_provider_base_schema(), M::specific_schema())
    }

    fn validate(&self, model: &M) -> DomainResult<()> {
        Self::to_entity(model)?.validate()
    }

    async fn create(&self, state: &ProviderState, planned: M) -> DomainResult<M> {
        let planned = Self::to_entity(&planned)?;
        let mut idp = state
            .identity_provider_service
            .create_identity_provider(&planned)
            .await?;
        idp.config.restore_secret(&planned.config);
        Self::from_entity(idp)
    }

    async fn read(&self, state: &ProviderState, current: M) -> DomainResult<Option<M>> {
        let base = current.base();
        let alias = non_empty(base.id.clone()).unwrap_or_else(|| base.alias.clone());
        let Some(mut idp) = state
            .identity_provider_service
            .get_identity_provider(&base.realm, &alias)
            .await?
        else {
            return Ok(None);
        };

        // Imported state has no secret to restore.
        if let Ok(known) = Self::to_entity(&current) {
            idp.config.restore_secret(&known.config);
        }
        Self::from_entity(idp).map(Some)
    }

    async fn update(&self, state: &ProviderState, _prior: M, planned: M) -> DomainResult<M> {
        let planned = Self::to_entity(&planned)?;
        let mut idp = state
            .identity_provider_service
            .update_identity_provider(&planned)
            .await?;
        idp.config.restore_secret(&planned.config);
        Self::from_entity(idp)
    }

    async fn delete(&self, state: &ProviderState, current: M) -> DomainResult<()> {
        let base = current.base();
        state
            .identity_provider_service
            .delete_identity_provider(&base.realm, &base.alias)
            .await
    }

    fn import(&self, id: &str) -> DomainResult<M> {
        let (realm, alias) = parse_identity_provider_import_id(id)?;
        let mut model = M::default();
        let base = model.base_mut();
        base.id = Some(alias.clone());
        base.realm = realm;
        base.alias = alias;
        Ok(model)
    }
}
