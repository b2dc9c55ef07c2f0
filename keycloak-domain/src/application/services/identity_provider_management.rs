use super::{found, tolerate_missing};
use crate::{
    application::ports::*,
    domain::{entities::*, errors::DomainResult},
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Identity provider management service
pub struct IdentityProviderManagementService {
    repository: Arc<dyn KeycloakRepository>,
}

impl IdentityProviderManagementService {
    pub fn new(repository: Arc<dyn KeycloakRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self), fields(realm = %realm, alias = %alias))]
    pub async fn get_identity_provider(
        &self,
        realm: &str,
        alias: &str,
    ) -> DomainResult<Option<IdentityProvider>> {
        found(self.repository.find_identity_provider(realm, alias).await)
    }

    #[instrument(skip(self, provider), fields(realm = %provider.realm, alias = %provider.alias, provider_id = %provider.provider_id))]
    pub async fn create_identity_provider(
        &self,
        provider: &IdentityProvider,
    ) -> DomainResult<IdentityProvider> {
        provider.validate()?;

        info!("Creating identity provider '{}'", provider.alias);
        self.repository.create_identity_provider(provider).await?;
        self.reload(provider).await
    }

    #[instrument(skip(self, provider), fields(realm = %provider.realm, alias = %provider.alias))]
    pub async fn update_identity_provider(
        &self,
        provider: &IdentityProvider,
    ) -> DomainResult<IdentityProvider> {
        provider.validate()?;

        info!("Updating identity provider '{}'", provider.alias);
        self.repository.update_identity_provider(provider).await?;
        self.reload(provider).await
    }

    #[instrument(skip(self), fields(realm = %realm, alias = %alias))]
    pub async fn delete_identity_provider(&self, realm: &str, alias: &str) -> DomainResult<()> {
        info!("Deleting identity provider '{}'", alias);
        tolerate_missing(self.repository.delete_identity_provider(realm, alias).await)
    }

    async fn reload(&self, desired: &IdentityProvider) -> DomainResult<IdentityProvider> {
        let mut stored = self
            .repository
            .find_identity_provider(&desired.realm, &desired.alias)
            .await?;
        stored.config.restore_secret(&desired.config);
        Ok(stored)
    }
}
