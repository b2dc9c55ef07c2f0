//! Read-only lookups of existing Keycloak objects.

pub mod realm;

use crate::error::ProviderResult;
use crate::resource::ResourceData;
use crate::schema::Schema;
use crate::state::ProviderState;
use async_trait::async_trait;

#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Looks the object up by the configured attributes. A missing object is
    /// an error, unlike a resource read.
    async fn read(&self, state: &ProviderState, config: &ResourceData) -> ProviderResult<ResourceData>;
}

pub fn all_data_sources() -> Vec<Box<dyn DataSource>> {
    vec![Box::new(realm::RealmDataSource)]
}
