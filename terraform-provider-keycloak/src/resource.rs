//! The CRUD template shared by every managed resource.
//!
//! A [`Resource`] works on a typed model bound to its schema through serde.
//! [`DynamicResource`] erases the model type so the provider can hold every
//! resource in one registry and move raw attribute maps in and out.

use crate::error::ProviderResult;
use crate::schema::Schema;
use crate::state::ProviderState;
use async_trait::async_trait;
use keycloak_domain::domain::errors::DomainResult;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Attribute values of one resource instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    attributes: Map<String, Value>,
}

impl ResourceData {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self { attributes }
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).filter(|v| !v.is_null())
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn into_attributes(self) -> Map<String, Value> {
        self.attributes
    }

    /// Binds the attributes to a model. Null attributes, nested ones
    /// included, are treated as unset so the model's defaults apply.
    pub fn decode<M: DeserializeOwned>(&self) -> ProviderResult<M> {
        let attributes = strip_nulls(Value::Object(self.attributes.clone()));
        Ok(serde_json::from_value(attributes)?)
    }

    /// Serializes a model, keeping only attributes the schema declares.
    pub fn encode<M: Serialize>(model: &M, schema: &Schema) -> ProviderResult<Self> {
        let attributes = match serde_json::to_value(model)? {
            Value::Object(attributes) => attributes,
            _ => Map::new(),
        };

        let attributes = schema
            .attributes
            .keys()
            .map(|name| {
                let value = attributes.get(name).cloned().unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect();
        Ok(Self { attributes })
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(entries) => Value::Object(
            entries
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(name, value)| (name, strip_nulls(value)))
                .collect(),
        ),
        other => other,
    }
}

impl From<Map<String, Value>> for ResourceData {
    fn from(attributes: Map<String, Value>) -> Self {
        Self::new(attributes)
    }
}

/// A Keycloak object managed through create/read/update/delete.
///
/// `read` returns `None` when the object no longer exists, which removes it
/// from state. `import` only decodes the composite id; the provider reads the
/// object afterwards.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Model: Serialize + DeserializeOwned + Send + Sync;

    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Checks that need the whole model, run at plan time.
    fn validate(&self, _model: &Self::Model) -> DomainResult<()> {
        Ok(())
    }

    async fn create(&self, state: &ProviderState, planned: Self::Model) -> DomainResult<Self::Model>;

    async fn read(&self, state: &ProviderState, current: Self::Model) -> DomainResult<Option<Self::Model>>;

    async fn update(
        &self,
        state: &ProviderState,
        prior: Self::Model,
        planned: Self::Model,
    ) -> DomainResult<Self::Model>;

    async fn delete(&self, state: &ProviderState, current: Self::Model) -> DomainResult<()>;

    fn import(&self, id: &str) -> DomainResult<Self::Model>;
}

/// Object-safe view of a [`Resource`] over raw attribute maps.
#[async_trait]
pub trait DynamicResource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn validate(&self, data: &ResourceData) -> ProviderResult<()>;

    async fn create(&self, state: &ProviderState, planned: &ResourceData) -> ProviderResult<ResourceData>;

    async fn read(&self, state: &ProviderState, current: &ResourceData) -> ProviderResult<Option<ResourceData>>;

    async fn update(
        &self,
        state: &ProviderState,
        prior: &ResourceData,
        planned: &ResourceData,
    ) -> ProviderResult<ResourceData>;

    async fn delete(&self, state: &ProviderState, current: &ResourceData) -> ProviderResult<()>;

    fn import(&self, id: &str) -> ProviderResult<ResourceData>;
}

#[async_trait]
impl<R: Resource> DynamicResource for R {
    fn type_name(&self) -> &'static str {
        Resource::type_name(self)
    }

    fn schema(&self) -> Schema {
        Resource::schema(self)
    }

    fn validate(&self, data: &ResourceData) -> ProviderResult<()> {
        let model: R::Model = data.decode()?;
        Resource::validate(self, &model)?;
        Ok(())
    }

    async fn create(&self, state: &ProviderState, planned: &ResourceData) -> ProviderResult<ResourceData> {
        let model = Resource::create(self, state, planned.decode()?).await?;
        ResourceData::encode(&model, &Resource::schema(self))
    }

    async fn read(&self, state: &ProviderState, current: &ResourceData) -> ProviderResult<Option<ResourceData>> {
        match Resource::read(self, state, current.decode()?).await? {
            Some(model) => Ok(Some(ResourceData::encode(&model, &Resource::schema(self))?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        state: &ProviderState,
        prior: &ResourceData,
        planned: &ResourceData,
    ) -> ProviderResult<ResourceData> {
        let model = Resource::update(self, state, prior.decode()?, planned.decode()?).await?;
        ResourceData::encode(&model, &Resource::schema(self))
    }

    async fn delete(&self, state: &ProviderState, current: &ResourceData) -> ProviderResult<()> {
        Resource::delete(self, state, current.decode()?).await?;
        Ok(())
    }

    fn import(&self, id: &str) -> ProviderResult<ResourceData> {
        let model = Resource::import(self, id)?;
        ResourceData::encode(&model, &Resource::schema(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    #[serde(default)]
    struct Model {
        id: Option<String>,
        name: String,
        enabled: bool,
        internal: String,
    }

    #[test]
    fn null_attributes_fall_back_to_defaults() {
        let data = ResourceData::new(
            json!({ "id": null, "name": "r1", "enabled": null })
                .as_object()
                .cloned()
                .unwrap(),
        );
        let model: Model = data.decode().unwrap();
        assert_eq!(model, Model { name: "r1".to_string(), ..Default::default() });
        assert_eq!(data.id(), None);
    }

    #[test]
    fn encode_keeps_schema_attributes_only() {
        let schema = Schema::resource("test")
            .attribute("name", Attribute::string().required())
            .attribute("enabled", Attribute::bool());
        let model = Model {
            id: Some("r1".to_string()),
            name: "r1".to_string(),
            enabled: true,
            internal: "hidden".to_string(),
        };

        let data = ResourceData::encode(&model, &schema).unwrap();
        assert_eq!(data.id(), Some("r1"));
        assert_eq!(data.attributes().len(), 3);
        assert!(data.get("internal").is_none());
    }
}
