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

/// LDAP user federation management service
pub struct UserFederationManagementService {
    repository: Arc<dyn KeycloakRepository>,
}

impl UserFederationManagementService {
    pub fn new(repository: Arc<dyn KeycloakRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self), fields(realm = %realm_id, id = %id))]
    pub async fn get_ldap_user_federation(
        &self,
        realm_id: &str,
        id: &str,
    ) -> DomainResult<Option<LdapUserFederation>> {
        found(self.repository.find_ldap_user_federation(realm_id, id).await)
    }

    #[instrument(skip(self, federation), fields(realm = %federation.realm_id, name = %federation.name))]
    pub async fn create_ldap_user_federation(
        &self,
        federation: &LdapUserFederation,
    ) -> DomainResult<LdapUserFederation> {
        federation.validate()?;

        info!("Creating LDAP user federation '{}'", federation.name);
        let id = self
            .repository
            .create_ldap_user_federation(federation)
            .await?;

        info!("Created LDAP user federation with ID '{}'", id);
        self.reload(&id, federation).await
    }

    #[instrument(skip(self, federation), fields(realm = %federation.realm_id, name = %federation.name))]
    pub async fn update_ldap_user_federation(
        &self,
        federation: &LdapUserFederation,
    ) -> DomainResult<LdapUserFederation> {
        federation.validate()?;
        let id = federation
            .id
            .clone()
            .ok_or_else(|| DomainError::validation("ldap user federation id must be set"))?;

        info!("Updating LDAP user federation '{}'", id);
        self.repository
            .update_ldap_user_federation(federation)
            .await?;
        self.reload(&id, federation).await
    }

    #[instrument(skip(self), fields(realm = %realm_id, id = %id))]
    pub async fn delete_ldap_user_federation(&self, realm_id: &str, id: &str) -> DomainResult<()> {
        info!("Deleting LDAP user federation '{}'", id);
        tolerate_missing(
            self.repository
                .delete_ldap_user_federation(realm_id, id)
                .await,
        )
    }

    async fn reload(
        &self,
        id: &str,
        desired: &LdapUserFederation,
    ) -> DomainResult<LdapUserFederation> {
        let mut stored = self
            .repository
            .find_ldap_user_federation(&desired.realm_id, id)
            .await?;
        stored.restore_bind_credential(desired.bind_credential.as_deref());
        Ok(stored)
    }
}
