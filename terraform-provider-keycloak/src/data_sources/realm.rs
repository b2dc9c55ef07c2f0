use super::DataSource;
use crate::error::ProviderResult;
use crate::resource::ResourceData;
use crate::resources::realm::{realm_schema, RealmModel, TYPE_NAME};
use crate::schema::Schema;
use crate::state::ProviderState;
use async_trait::async_trait;
use keycloak_domain::domain::errors::DomainError;

pub struct RealmDataSource;

#[async_trait]
impl DataSource for RealmDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        realm_schema().as_data_source(&["realm"])
    }

    async fn read(&self, state: &ProviderState, config: &ResourceData) -> ProviderResult<ResourceData> {
        let name = config
            .get("realm")
            .and_then(|realm| realm.as_str())
            .unwrap_or_default();

        let realm = state
            .realm_service
            .get_realm(name)
            .await?
            .ok_or_else(|| DomainError::not_found("Realm", name))?;

        ResourceData::encode(&RealmModel::from_entity(realm, None), &self.schema())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_realm_name_is_an_input() {
        let schema = RealmDataSource.schema();
        assert!(schema.get("realm").unwrap().required);
        assert!(schema.get("enabled").unwrap().computed);
        assert!(schema.get("enabled").unwrap().default.is_none());
        assert!(!schema.get("realm").unwrap().force_new);
    }
}
