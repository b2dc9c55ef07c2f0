use super::{found, tolerate_missing};
use crate::{
    application::ports::*,
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use std::sync::Arc;
use tracing::{info, instrument};

/// OpenID client management service
pub struct ClientManagementService {
    repository: Arc<dyn KeycloakRepository>,
}

impl ClientManagementService {
    pub fn new(repository: Arc<dyn KeycloakRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self), fields(realm = %realm_id, id = %id))]
    pub async fn get_openid_client(
        &self,
        realm_id: &str,
        id: &str,
    ) -> DomainResult<Option<OpenIdClient>> {
        found(self.repository.find_openid_client(realm_id, id).await)
    }

    #[instrument(skip(self, client), fields(realm = %client.realm_id, client_id = %client.client_id))]
    pub async fn create_openid_client(&self, client: &OpenIdClient) -> DomainResult<OpenIdClient> {
        client.validate()?;

        info!("Creating client '{}'", client.client_id);
        let id = self.repository.create_openid_client(client).await?;

        info!("Created client with ID '{}'", id);
        self.repository
            .find_openid_client(&client.realm_id, &id)
            .await
    }

    #[instrument(skip(self, client), fields(realm = %client.realm_id, client_id = %client.client_id))]
    pub async fn update_openid_client(&self, client: &OpenIdClient) -> DomainResult<OpenIdClient> {
        client.validate()?;
        let id = client
            .id
            .clone()
            .ok_or_else(|| DomainError::validation("client id must be set"))?;

        info!("Updating client '{}'", id);
        self.repository.update_openid_client(client).await?;
        self.repository
            .find_openid_client(&client.realm_id, &id)
            .await
    }

    #[instrument(skip(self), fields(realm = %realm_id, id = %id))]
    pub async fn delete_openid_client(&self, realm_id: &str, id: &str) -> DomainResult<()> {
        info!("Deleting client '{}'", id);
        tolerate_missing(self.repository.delete_openid_client(realm_id, id).await)
    }
}
