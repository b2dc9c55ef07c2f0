use keycloak_domain::{
    application::{
        ports::{AppConfig, KeycloakRepository},
        services::{
            ClientManagementService, IdentityProviderManagementService,
            ProtocolMapperManagementService, RealmManagementService,
            UserFederationManagementService,
        },
    },
    domain::errors::DomainResult,
    infrastructure::adapters::KeycloakRestAdapter,
};
use std::sync::Arc;
use tracing::info;

/// Domain services shared by every resource once the provider is configured.
#[derive(Clone)]
pub struct ProviderState {
    pub repository: Arc<dyn KeycloakRepository>,
    pub realm_service: Arc<RealmManagementService>,
    pub client_service: Arc<ClientManagementService>,
    pub identity_provider_service: Arc<IdentityProviderManagementService>,
    pub protocol_mapper_service: Arc<ProtocolMapperManagementService>,
    pub user_federation_service: Arc<UserFederationManagementService>,
}

impl ProviderState {
    pub fn new(repository: Arc<dyn KeycloakRepository>) -> Self {
        Self {
            realm_service: Arc::new(RealmManagementService::new(repository.clone())),
            client_service: Arc::new(ClientManagementService::new(repository.clone())),
            identity_provider_service: Arc::new(IdentityProviderManagementService::new(
                repository.clone(),
            )),
            protocol_mapper_service: Arc::new(ProtocolMapperManagementService::new(
                repository.clone(),
            )),
            user_federation_service: Arc::new(UserFederationManagementService::new(
                repository.clone(),
            )),
            repository,
        }
    }

    /// Acquires an admin token and wires the services to the REST adapter.
    pub async fn connect(config: &AppConfig) -> DomainResult<Self> {
        config.validate()?;

        info!(
            "Connecting to Keycloak at {} as {}",
            config.keycloak.server_url(),
            config.keycloak.username
        );
        let adapter = KeycloakRestAdapter::connect(&config.keycloak, &config.http).await?;

        Ok(Self::new(Arc::new(adapter)))
    }
}
