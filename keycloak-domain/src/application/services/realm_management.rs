use super::{found, tolerate_missing};
use crate::{
    application::ports::*,
    domain::{entities::*, errors::DomainResult},
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Realm management service implementing the realm resource lifecycle
pub struct RealmManagementService {
    repository: Arc<dyn KeycloakRepository>,
}

impl RealmManagementService {
    pub fn new(repository: Arc<dyn KeycloakRepository>) -> Self {
        Self { repository }
    }

    /// Get a realm by name; `None` when it does not exist
    #[instrument(skip(self), fields(realm = %realm_name))]
    pub async fn get_realm(&self, realm_name: &str) -> DomainResult<Option<Realm>> {
        let realm = found(self.repository.find_realm(realm_name).await)?;
        if realm.is_none() {
            debug!("Realm '{}' not found", realm_name);
        }
        Ok(realm)
    }

    /// Create a new realm and return it as stored by Keycloak
    #[instrument(skip(self, realm), fields(realm = %realm.realm))]
    pub async fn create_realm(&self, realm: &Realm) -> DomainResult<Realm> {
        realm.validate()?;

        info!("Creating realm '{}'", realm.realm);
        self.repository.create_realm(realm).await?;

        let created = self.reload(realm).await?;
        info!("Created realm '{}'", created.realm);
        Ok(created)
    }

    /// Update an existing realm
    #[instrument(skip(self, realm), fields(realm = %realm.realm))]
    pub async fn update_realm(&self, realm: &Realm) -> DomainResult<Realm> {
        realm.validate()?;

        info!("Updating realm '{}'", realm.realm);
        self.repository.update_realm(realm).await?;
        self.reload(realm).await
    }

    /// Delete a realm; missing realms are ignored
    #[instrument(skip(self), fields(realm = %realm_name))]
    pub async fn delete_realm(&self, realm_name: &str) -> DomainResult<()> {
        info!("Deleting realm '{}'", realm_name);
        tolerate_missing(self.repository.delete_realm(realm_name).await)
    }

    async fn reload(&self, desired: &Realm) -> DomainResult<Realm> {
        let mut stored = self.repository.find_realm(&desired.realm).await?;
        restore_smtp_password(&mut stored, desired);
        Ok(stored)
    }
}

/// Keycloak masks the SMTP password on read.
pub fn restore_smtp_password(stored: &mut Realm, known: &Realm) {
    let known_password = known
        .smtp_server
        .as_ref()
        .and_then(|smtp| smtp.auth.as_ref())
        .map(|auth| auth.password.as_str());

    if let (Some(auth), Some(password)) = (
        stored
            .smtp_server
            .as_mut()
            .and_then(|smtp| smtp.auth.as_mut()),
        known_password,
    ) {
        unmask_secret(&mut auth.password, password);
    }
}
