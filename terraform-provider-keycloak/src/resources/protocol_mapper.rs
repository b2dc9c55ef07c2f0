//! Protocol mapper resources.
//!
//! Every mapper type shares the parent attributes and CRUD flow. A mapper
//! type only contributes its kind-specific attributes, which bind directly
//! onto the domain kind through serde.

use super::non_empty;
use crate::resource::{DynamicResource, Resource};
use crate::schema::{merge_schemas, Attribute, AttributeType, Schema};
use crate::state::ProviderState;
use async_trait::async_trait;
use keycloak_domain::domain::{
    entities::{
        AudienceMapper, AudienceResolveMapper, FullNameMapper, GenericMapper,
        GroupMembershipMapper, HardcodedClaimMapper, HardcodedRoleMapper, MapperParent,
        ProtocolMapper, ProtocolMapperKind, SamlScriptMapper, SamlUserAttributeMapper,
        SamlUserPropertyMapper, ScriptMapper, UserAttributeMapper, UserClientRoleMapper,
        UserPropertyMapper, UserRealmRoleMapper, UserSessionNoteMapper, CLAIM_VALUE_TYPES,
        PROTOCOLS, SAML_ATTRIBUTE_NAME_FORMATS,
    },
    errors::DomainResult,
    values::parse_protocol_mapper_import_id,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;

pub fn resources() -> Vec<Box<dyn DynamicResource>> {
    vec![
        mapper::<FullNameMapper>("keycloak_openid_full_name_protocol_mapper", full_name_schema),
        mapper::<GroupMembershipMapper>(
            "keycloak_openid_group_membership_protocol_mapper",
            group_membership_schema,
        ),
        mapper::<HardcodedClaimMapper>(
            "keycloak_openid_hardcoded_claim_protocol_mapper",
            hardcoded_claim_schema,
        ),
        mapper::<HardcodedRoleMapper>(
            "keycloak_openid_hardcoded_role_protocol_mapper",
            hardcoded_role_schema,
        ),
        mapper::<UserAttributeMapper>(
            "keycloak_openid_user_attribute_protocol_mapper",
            user_attribute_schema,
        ),
        mapper::<UserPropertyMapper>(
            "keycloak_openid_user_property_protocol_mapper",
            user_property_schema,
        ),
        mapper::<AudienceMapper>("keycloak_openid_audience_protocol_mapper", audience_schema),
        mapper::<AudienceResolveMapper>(
            "keycloak_openid_audience_resolve_protocol_mapper",
            audience_resolve_schema,
        ),
        mapper::<ScriptMapper>("keycloak_openid_script_protocol_mapper", script_schema),
        mapper::<UserSessionNoteMapper>(
            "keycloak_openid_user_session_note_protocol_mapper",
            user_session_note_schema,
        ),
        mapper::<UserRealmRoleMapper>(
            "keycloak_openid_user_realm_role_protocol_mapper",
            user_realm_role_schema,
        ),
        mapper::<UserClientRoleMapper>(
            "keycloak_openid_user_client_role_protocol_mapper",
            user_client_role_schema,
        ),
        mapper::<SamlUserAttributeMapper>(
            "keycloak_saml_user_attribute_protocol_mapper",
            saml_user_attribute_schema,
        ),
        mapper::<SamlUserPropertyMapper>(
            "keycloak_saml_user_property_protocol_mapper",
            saml_user_property_schema,
        ),
        mapper::<SamlScriptMapper>("keycloak_saml_script_protocol_mapper", saml_script_schema),
        mapper::<GenericMapper>("keycloak_generic_protocol_mapper", generic_schema),
    ]
}

fn mapper<K: MapperKind>(type_name: &'static str, schema: fn() -> Schema) -> Box<dyn DynamicResource> {
    Box::new(ProtocolMapperResource::<K>::new(type_name, schema))
}

/// A domain mapper kind that binds to resource attributes.
pub trait MapperKind:
    ProtocolMapperKind + Serialize + DeserializeOwned + Default + Send + Sync + 'static
{
}

impl<K> MapperKind for K where
    K: ProtocolMapperKind + Serialize + DeserializeOwned + Default + Send + Sync + 'static
{
}

/// Parent attributes shared by every mapper resource.
pub fn protocol_mapper_base_schema() -> Schema {
    Schema::resource("")
        .attribute("realm_id", Attribute::string().required().force_new())
        .attribute(
            "client_id",
            Attribute::string()
                .force_new()
                .conflicts_with(&["client_scope_id"])
                .describe("The mapper's client. Conflicts with client_scope_id."),
        )
        .attribute("client_scope_id", Attribute::string().force_new())
        .attribute("name", Attribute::string().required().force_new())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolMapperModel<K> {
    pub id: Option<String>,
    pub realm_id: String,
    pub client_id: Option<String>,
    pub client_scope_id: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub kind: K,
}

impl<K: MapperKind> ProtocolMapperModel<K> {
    fn parent(&self) -> DomainResult<MapperParent> {
        MapperParent::from_ids(self.client_id.as_deref(), self.client_scope_id.as_deref())
    }

    fn to_entity(&self) -> DomainResult<ProtocolMapper<K>> {
        let mut mapper = ProtocolMapper::new(
            self.realm_id.clone(),
            self.parent()?,
            self.name.clone(),
            self.kind.clone(),
        );
        mapper.id = non_empty(self.id.clone());
        Ok(mapper)
    }

    fn from_entity(mapper: ProtocolMapper<K>) -> Self {
        Self {
            id: mapper.id,
            client_id: mapper.parent.client_id().map(str::to_string),
            client_scope_id: mapper.parent.client_scope_id().map(str::to_string),
            realm_id: mapper.realm_id,
            name: mapper.name,
            kind: mapper.kind,
        }
    }
}

pub struct ProtocolMapperResource<K> {
    type_name: &'static str,
    specific_schema: fn() -> Schema,
    kind: PhantomData<fn() -> K>,
}

impl<K: MapperKind> ProtocolMapperResource<K> {
    pub fn new(type_name: &'static str, specific_schema: fn() -> Schema) -> Self {
        Self {
            type_name,
            specific_schema,
            kind: PhantomData,
        }
    }
}

#[async_trait]
impl<K: MapperKind> Resource for ProtocolMapperResource<K> {
    type Model = ProtocolMapperModel<K>;

    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn schema(&self) -> Schema {
        merge_schemas(protocol_mapper_base_schema(), (self.specific_schema)())
    }

    fn validate(&self, model: &ProtocolMapperModel<K>) -> DomainResult<()> {
        model.to_entity()?.validate()
    }

    async fn create(
        &self,
        state: &ProviderState,
        planned: ProtocolMapperModel<K>,
    ) -> DomainResult<ProtocolMapperModel<K>> {
        let mapper = state
            .protocol_mapper_service
            .create_protocol_mapper(&planned.to_entity()?)
            .await?;
        Ok(ProtocolMapperModel::from_entity(mapper))
    }

    async fn read(
        &self,
        state: &ProviderState,
        current: ProtocolMapperModel<K>,
    ) -> DomainResult<Option<ProtocolMapperModel<K>>> {
        let Some(id) = non_empty(current.id.clone()) else {
            return Ok(None);
        };
        let mapper = state
            .protocol_mapper_service
            .get_protocol_mapper::<K>(&current.realm_id, &current.parent()?, &id)
            .await?;
        Ok(mapper.map(ProtocolMapperModel::from_entity))
    }

    async fn update(
        &self,
        state: &ProviderState,
        prior: ProtocolMapperModel<K>,
        mut planned: ProtocolMapperModel<K>,
    ) -> DomainResult<ProtocolMapperModel<K>> {
        planned.id = prior.id;
        let mapper = state
            .protocol_mapper_service
            .update_protocol_mapper(&planned.to_entity()?)
            .await?;
        Ok(ProtocolMapperModel::from_entity(mapper))
    }

    async fn delete(&self, state: &ProviderState, current: ProtocolMapperModel<K>) -> DomainResult<()> {
        let Some(id) = non_empty(current.id.clone()) else {
            return Ok(());
        };
        state
            .protocol_mapper_service
            .delete_protocol_mapper(&current.realm_id, &current.parent()?, &id)
            .await
    }

    fn import(&self, id: &str) -> DomainResult<ProtocolMapperModel<K>> {
        let parsed = parse_protocol_mapper_import_id(id)?;
        Ok(ProtocolMapperModel {
            id: Some(parsed.mapper_id),
            client_id: parsed.parent.client_id().map(str::to_string),
            client_scope_id: parsed.parent.client_scope_id().map(str::to_string),
            realm_id: parsed.realm_id,
            ..Default::default()
        })
    }
}

fn claim_value_type() -> Attribute {
    Attribute::string().default("String").one_of(CLAIM_VALUE_TYPES)
}

fn with_tokens(schema: Schema) -> Schema {
    schema
        .attribute("add_to_id_token", Attribute::bool().default(true))
        .attribute("add_to_access_token", Attribute::bool().default(true))
        .attribute("add_to_userinfo", Attribute::bool().default(true))
}

fn with_saml_attribute(schema: Schema) -> Schema {
    schema
        .attribute("friendly_name", Attribute::string())
        .attribute("saml_attribute_name", Attribute::string().required())
        .attribute(
            "saml_attribute_name_format",
            Attribute::string()
                .required()
                .one_of(SAML_ATTRIBUTE_NAME_FORMATS),
        )
}

fn full_name_schema() -> Schema {
    with_tokens(Schema::new("Adds the user's full name to a token claim"))
}

fn group_membership_schema() -> Schema {
    with_tokens(
        Schema::new("Maps the user's group membership to a token claim")
            .attribute("claim_name", Attribute::string().required())
            .attribute("full_path", Attribute::bool().default(true)),
    )
}

fn hardcoded_claim_schema() -> Schema {
    with_tokens(
        Schema::new("Adds a fixed claim to tokens")
            .attribute("claim_name", Attribute::string().required())
            .attribute("claim_value", Attribute::string().required())
            .attribute("claim_value_type", claim_value_type()),
    )
}

fn hardcoded_role_schema() -> Schema {
    Schema::new("Grants a fixed role in tokens")
        .attribute("role_id", Attribute::string().required())
}

fn user_attribute_schema() -> Schema {
    with_tokens(
        Schema::new("Maps a user attribute to a token claim")
            .attribute("user_attribute", Attribute::string().required())
            .attribute("claim_name", Attribute::string().required())
            .attribute("claim_value_type", claim_value_type())
            .attribute("multivalued", Attribute::bool().default(false)),
    )
}

fn user_property_schema() -> Schema {
    with_tokens(
        Schema::new("Maps a built-in user property to a token claim")
            .attribute("user_property", Attribute::string().required())
            .attribute("claim_name", Attribute::string().required())
            .attribute("claim_value_type", claim_value_type()),
    )
}

fn audience_schema() -> Schema {
    Schema::new("Adds an audience to the aud claim")
        .attribute(
            "included_client_audience",
            Attribute::string().conflicts_with(&["included_custom_audience"]),
        )
        .attribute("included_custom_audience", Attribute::string())
        .attribute("add_to_id_token", Attribute::bool().default(true))
        .attribute("add_to_access_token", Attribute::bool().default(true))
}

fn audience_resolve_schema() -> Schema {
    Schema::new("Adds clients the user has roles in to the aud claim")
}

fn script_schema() -> Schema {
    with_tokens(
        Schema::new("Computes a token claim with a script")
            .attribute("script", Attribute::string().required())
            .attribute("claim_name", Attribute::string().required())
            .attribute("claim_value_type", claim_value_type())
            .attribute("multivalued", Attribute::bool().default(false)),
    )
}

fn user_session_note_schema() -> Schema {
    Schema::new("Maps a user session note to a token claim")
        .attribute("claim_name", Attribute::string().required())
        .attribute("claim_value_type", claim_value_type())
        .attribute("session_note", Attribute::string())
        .attribute("add_to_id_token", Attribute::bool().default(true))
        .attribute("add_to_access_token", Attribute::bool().default(true))
}

fn user_realm_role_schema() -> Schema {
    with_tokens(
        Schema::new("Maps the user's realm roles to a token claim")
            .attribute("claim_name", Attribute::string().required())
            .attribute("claim_value_type", claim_value_type())
            .attribute("multivalued", Attribute::bool().default(false))
            .attribute("realm_role_prefix", Attribute::string()),
    )
}

fn user_client_role_schema() -> Schema {
    with_tokens(
        Schema::new("Maps the user's client roles to a token claim")
            .attribute("claim_name", Attribute::string().required())
            .attribute("claim_value_type", claim_value_type())
            .attribute("multivalued", Attribute::bool().default(false))
            .attribute("client_id_for_role_mappings", Attribute::string())
            .attribute("client_role_prefix", Attribute::string()),
    )
}

fn saml_user_attribute_schema() -> Schema {
    with_saml_attribute(
        Schema::new("Maps a user attribute to a SAML attribute")
            .attribute("user_attribute", Attribute::string().required()),
    )
}

fn saml_user_property_schema() -> Schema {
    with_saml_attribute(
        Schema::new("Maps a built-in user property to a SAML attribute")
            .attribute("user_property", Attribute::string().required()),
    )
}

fn saml_script_schema() -> Schema {
    with_saml_attribute(
        Schema::new("Computes a SAML attribute with a script")
            .attribute("script", Attribute::string().required())
            .attribute("single_value_attribute", Attribute::bool().default(true)),
    )
}

fn generic_schema() -> Schema {
    Schema::new("Any protocol mapper, configured through its raw config map")
        .attribute(
            "protocol",
            Attribute::string().required().force_new().one_of(PROTOCOLS),
        )
        .attribute("protocol_mapper", Attribute::string().required().force_new())
        .attribute("config", Attribute::map(AttributeType::String).required())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceData;
    use serde_json::json;

    fn hardcoded_claim() -> ProtocolMapperResource<HardcodedClaimMapper> {
        ProtocolMapperResource::new(
            "keycloak_openid_hardcoded_claim_protocol_mapper",
            hardcoded_claim_schema,
        )
    }

    #[test]
    fn every_mapper_type_is_registered_once() {
        let resources = resources();
        assert_eq!(resources.len(), 16);
        for resource in &resources {
            let schema = resource.schema();
            assert!(schema.get("realm_id").unwrap().force_new, "{}", resource.type_name());
            assert!(schema.get("name").unwrap().required, "{}", resource.type_name());
        }
    }

    #[test]
    fn kind_attributes_are_flat() {
        let data = ResourceData::new(
            json!({
                "realm_id": "r1",
                "client_id": "c-uuid",
                "name": "m1",
                "claim_name": "foo",
                "claim_value": "bar",
                "claim_value_type": "String",
                "add_to_id_token": true,
                "add_to_access_token": false,
                "add_to_userinfo": true
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        let model: ProtocolMapperModel<HardcodedClaimMapper> = data.decode().unwrap();
        assert_eq!(model.kind.claim_name, "foo");
        assert!(!model.kind.tokens.add_to_access_token);

        let mapper = model.to_entity().unwrap();
        assert_eq!(mapper.parent, MapperParent::Client("c-uuid".to_string()));

        let encoded = ResourceData::encode(&model, &Resource::schema(&hardcoded_claim())).unwrap();
        assert_eq!(encoded.get("claim_value"), Some(&json!("bar")));
        assert_eq!(encoded.get("add_to_userinfo"), Some(&json!(true)));
    }

    #[test]
    fn parent_must_be_exactly_one_of_client_or_scope() {
        let model = ProtocolMapperModel {
            id: None,
            realm_id: "r1".to_string(),
            name: "m1".to_string(),
            client_id: Some("c".to_string()),
            client_scope_id: Some("s".to_string()),
            kind: HardcodedClaimMapper::default(),
        };
        assert_eq!(
            Resource::validate(&hardcoded_claim(), &model).unwrap_err().to_string(),
            "\"client_id\": conflicts with client_scope_id"
        );

        let model = ProtocolMapperModel {
            client_id: None,
            client_scope_id: None,
            ..model
        };
        assert_eq!(
            Resource::validate(&hardcoded_claim(), &model).unwrap_err().to_string(),
            "validation error: one of ClientId or ClientScopeId must be set"
        );
    }

    #[test]
    fn import_restores_the_parent() {
        let model = Resource::import(&hardcoded_claim(), "r1/client-scope/s-uuid/m-uuid").unwrap();
        assert_eq!(model.realm_id, "r1");
        assert_eq!(model.client_scope_id.as_deref(), Some("s-uuid"));
        assert_eq!(model.client_id, None);
        assert_eq!(model.id.as_deref(), Some("m-uuid"));
    }
}
