use crate::domain::{entities::*, errors::DomainResult};
use async_trait::async_trait;

/// Realm operations. Realms are keyed by name.
#[async_trait]
pub trait RealmRepository: Send + Sync {
    async fn create_realm(&self, realm: &Realm) -> DomainResult<()>;
    async fn find_realm(&self, realm: &str) -> DomainResult<Realm>;
    async fn update_realm(&self, realm: &Realm) -> DomainResult<()>;
    async fn delete_realm(&self, realm: &str) -> DomainResult<()>;
}

/// Identity provider operations, keyed by `(realm, alias)`.
#[async_trait]
pub trait IdentityProviderRepository: Send + Sync {
    async fn create_identity_provider(&self, provider: &IdentityProvider) -> DomainResult<()>;
    async fn find_identity_provider(
        &self,
        realm: &str,
        alias: &str,
    ) -> DomainResult<IdentityProvider>;
    async fn update_identity_provider(&self, provider: &IdentityProvider) -> DomainResult<()>;
    async fn delete_identity_provider(&self, realm: &str, alias: &str) -> DomainResult<()>;
}

/// OpenID client operations, keyed by `(realm, uuid)`.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Returns the uuid Keycloak assigned to the new client.
    async fn create_openid_client(&self, client: &OpenIdClient) -> DomainResult<String>;
    async fn find_openid_client(&self, realm: &str, id: &str) -> DomainResult<OpenIdClient>;
    async fn update_openid_client(&self, client: &OpenIdClient) -> DomainResult<()>;
    async fn delete_openid_client(&self, realm: &str, id: &str) -> DomainResult<()>;
}

/// Protocol mapper operations on a client or client scope.
#[async_trait]
pub trait ProtocolMapperRepository: Send + Sync {
    /// Returns the id Keycloak assigned to the new mapper.
    async fn create_protocol_mapper(
        &self,
        realm: &str,
        parent: &MapperParent,
        mapper: &GenericProtocolMapper,
    ) -> DomainResult<String>;
    async fn find_protocol_mapper(
        &self,
        realm: &str,
        parent: &MapperParent,
        id: &str,
    ) -> DomainResult<GenericProtocolMapper>;
    async fn list_protocol_mappers(
        &self,
        realm: &str,
        parent: &MapperParent,
    ) -> DomainResult<Vec<GenericProtocolMapper>>;
    async fn update_protocol_mapper(
        &self,
        realm: &str,
        parent: &MapperParent,
        mapper: &GenericProtocolMapper,
    ) -> DomainResult<()>;
    async fn delete_protocol_mapper(
        &self,
        realm: &str,
        parent: &MapperParent,
        id: &str,
    ) -> DomainResult<()>;
}

/// User federation components.
#[async_trait]
pub trait UserFederationRepository: Send + Sync {
    /// Returns the component id.
    async fn create_ldap_user_federation(
        &self,
        federation: &LdapUserFederation,
    ) -> DomainResult<String>;
    async fn find_ldap_user_federation(
        &self,
        realm: &str,
        id: &str,
    ) -> DomainResult<LdapUserFederation>;
    async fn update_ldap_user_federation(&self, federation: &LdapUserFederation)
        -> DomainResult<()>;
    async fn delete_ldap_user_federation(&self, realm: &str, id: &str) -> DomainResult<()>;
}

/// Repository port for every Keycloak object the provider manages.
///
/// `find_*` methods fail with an error for which
/// [`DomainError::is_not_found`](crate::domain::errors::DomainError::is_not_found)
/// holds when the object does not exist. `delete_*` methods succeed on
/// missing objects.
pub trait KeycloakRepository:
    RealmRepository
    + ClientRepository
    + IdentityProviderRepository
    + ProtocolMapperRepository
    + UserFederationRepository
{
}

impl<T> KeycloakRepository for T where
    T: RealmRepository
        + ClientRepository
        + IdentityProviderRepository
        + ProtocolMapperRepository
        + UserFederationRepository
{
}
