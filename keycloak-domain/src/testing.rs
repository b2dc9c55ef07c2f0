//! In-memory stand-in for the Keycloak admin API.
//!
//! Mirrors the server behaviours the provider depends on: 404s for missing
//! objects, 409s for duplicates, server-assigned ids and masked secrets on
//! read.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::application::ports::repository::*;
use crate::domain::{entities::*, errors::*};

#[derive(Default)]
struct State {
    realms: BTreeMap<String, Realm>,
    identity_providers: BTreeMap<(String, String), IdentityProvider>,
    /// realm -> client uuid -> client
    clients: BTreeMap<String, BTreeMap<String, OpenIdClient>>,
    /// realm -> client scope id -> name
    client_scopes: BTreeMap<String, BTreeMap<String, String>>,
    /// (realm, parent) -> mappers
    protocol_mappers: BTreeMap<(String, String), Vec<GenericProtocolMapper>>,
    /// (realm, id) -> component
    components: BTreeMap<(String, String), Component>,
    should_fail: bool,
}

/// Keycloak double implementing every repository port
#[derive(Default)]
pub struct InMemoryKeycloak {
    state: Mutex<State>,
}

impl InMemoryKeycloak {
    /// Starts with the `master` realm, like a fresh server.
    pub fn new() -> Self {
        let keycloak = Self::default();
        keycloak.seed_realm(Realm::new("master"));
        keycloak
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every following call fails with a 500 until reset.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.state().should_fail = should_fail;
    }

    pub fn seed_realm(&self, mut realm: Realm) {
        realm.id.get_or_insert_with(|| realm.realm.clone());
        self.state().realms.insert(realm.realm.clone(), realm);
    }

    /// Registers a bearer-only client and returns its generated uuid.
    pub fn seed_client(&self, realm: &str, client_id: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let mut client = OpenIdClient::new(realm, client_id, AccessType::BearerOnly);
        client.id = Some(id.clone());
        self.state()
            .clients
            .entry(realm.to_string())
            .or_default()
            .insert(id.clone(), client);
        id
    }

    /// Registers a client scope and returns its generated id.
    pub fn seed_client_scope(&self, realm: &str, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.state()
            .client_scopes
            .entry(realm.to_string())
            .or_default()
            .insert(id.clone(), name.to_string());
        id
    }

    pub fn realm_names(&self) -> Vec<String> {
        self.state().realms.keys().cloned().collect()
    }
}

impl State {
    fn check_should_fail(&self) -> DomainResult<()> {
        if self.should_fail {
            Err(RepositoryError::HttpFailure {
                status: 500,
                message: "in-memory keycloak failure enabled".to_string(),
            }
            .into())
        } else {
            Ok(())
        }
    }

    fn require_realm(&self, realm: &str) -> DomainResult<()> {
        if self.realms.contains_key(realm) {
            Ok(())
        } else {
            Err(DomainError::not_found("Realm", realm))
        }
    }

    fn require_parent(&self, realm: &str, parent: &MapperParent) -> DomainResult<()> {
        self.require_realm(realm)?;
        let exists = match parent {
            MapperParent::Client(id) => self
                .clients
                .get(realm)
                .is_some_and(|clients| clients.contains_key(id)),
            MapperParent::ClientScope(id) => self
                .client_scopes
                .get(realm)
                .is_some_and(|scopes| scopes.contains_key(id)),
        };
        if exists {
            Ok(())
        } else {
            Err(DomainError::not_found(parent.kind(), parent.id()))
        }
    }

    fn mappers(&mut self, realm: &str, parent: &MapperParent) -> &mut Vec<GenericProtocolMapper> {
        self.protocol_mappers
            .entry((realm.to_string(), parent.to_string()))
            .or_default()
    }
}

fn conflict(message: String) -> DomainError {
    RepositoryError::HttpFailure {
        status: 409,
        message,
    }
    .into()
}

fn mask_realm(mut realm: Realm) -> Realm {
    if let Some(auth) = realm
        .smtp_server
        .as_mut()
        .and_then(|smtp| smtp.auth.as_mut())
    {
        auth.password = SECRET_MASK.to_string();
    }
    realm
}

fn mask_identity_provider(provider: &IdentityProvider) -> DomainResult<IdentityProvider> {
    let mut config = provider.config.to_map()?;
    if let Some(secret) = config.get_mut("clientSecret") {
        *secret = SECRET_MASK.to_string();
    }
    Ok(IdentityProvider {
        config: IdentityProviderConfig::from_map(&provider.provider_id, &config)?,
        ..provider.clone()
    })
}

fn mask_component(mut component: Component) -> Component {
    if let Some(values) = component.config.get_mut("bindCredential") {
        *values = vec![SECRET_MASK.to_string()];
    }
    component
}

#[async_trait]
impl RealmRepository for InMemoryKeycloak {
    async fn create_realm(&self, realm: &Realm) -> DomainResult<()> {
        let mut state = self.state();
        state.check_should_fail()?;
        if state.realms.contains_key(&realm.realm) {
            return Err(conflict(format!("Conflict detected. See logs for details: realm {}", realm.realm)));
        }

        let mut stored = realm.clone();
        stored.id.get_or_insert_with(|| realm.realm.clone());
        state.realms.insert(realm.realm.clone(), stored);
        Ok(())
    }

    async fn find_realm(&self, realm: &str) -> DomainResult<Realm> {
        let state = self.state();
        state.check_should_fail()?;
        state
            .realms
            .get(realm)
            .cloned()
            .map(mask_realm)
            .ok_or_else(|| DomainError::not_found("Realm", realm))
    }

    async fn update_realm(&self, realm: &Realm) -> DomainResult<()> {
        let mut state = self.state();
        state.check_should_fail()?;
        let stored = state
            .realms
            .get_mut(&realm.realm)
            .ok_or_else(|| DomainError::not_found("Realm", &realm.realm))?;

        let id = stored.id.clone();
        *stored = realm.clone();
        stored.id = id;
        Ok(())
    }

    async fn delete_realm(&self, realm: &str) -> DomainResult<()> {
        let mut state = self.state();
        state.check_should_fail()?;
        state
            .realms
            .remove(realm)
            .ok_or_else(|| DomainError::not_found("Realm", realm))?;

        state.identity_providers.retain(|(r, _), _| r != realm);
        state.clients.remove(realm);
        state.client_scopes.remove(realm);
        state.protocol_mappers.retain(|(r, _), _| r != realm);
        state.components.retain(|(r, _), _| r != realm);
        Ok(())
    }
}

#[async_trait]
impl ClientRepository for InMemoryKeycloak {
    async fn create_openid_client(&self, client: &OpenIdClient) -> DomainResult<String> {
        let mut state = self.state();
        state.check_should_fail()?;
        state.require_realm(&client.realm_id)?;

        let clients = state.clients.entry(client.realm_id.clone()).or_default();
        if clients.values().any(|c| c.client_id == client.client_id) {
            return Err(conflict(format!(
                "Client {} already exists",
                client.client_id
            )));
        }

        let id = Uuid::new_v4().to_string();
        let mut stored = client.clone();
        stored.id = Some(id.clone());
        if stored.access_type == AccessType::Confidential && stored.client_secret.is_none() {
            stored.client_secret = Some(Uuid::new_v4().to_string());
        }
        clients.insert(id.clone(), stored);
        Ok(id)
    }

    async fn find_openid_client(&self, realm: &str, id: &str) -> DomainResult<OpenIdClient> {
        let state = self.state();
        state.check_should_fail()?;
        state
            .clients
            .get(realm)
            .and_then(|clients| clients.get(id))
            .cloned()
            .ok_or_else(|| DomainError::not_found("Client", id))
    }

    async fn update_openid_client(&self, client: &OpenIdClient) -> DomainResult<()> {
        let mut state = self.state();
        state.check_should_fail()?;
        let id = client.id.clone().unwrap_or_default();
        let stored = state
            .clients
            .get_mut(&client.realm_id)
            .and_then(|clients| clients.get_mut(&id))
            .ok_or_else(|| DomainError::not_found("Client", &id))?;

        let secret = stored.client_secret.clone();
        *stored = client.clone();
        if stored.client_secret.is_none() && stored.access_type == AccessType::Confidential {
            stored.client_secret = secret;
        }
        Ok(())
    }

    async fn delete_openid_client(&self, realm: &str, id: &str) -> DomainResult<()> {
        let mut state = self.state();
        state.check_should_fail()?;
        state
            .clients
            .get_mut(realm)
            .and_then(|clients| clients.remove(id))
            .ok_or_else(|| DomainError::not_found("Client", id))?;

        let parent = MapperParent::Client(id.to_string()).to_string();
        state
            .protocol_mappers
            .remove(&(realm.to_string(), parent));
        Ok(())
    }
}

#[async_trait]
impl IdentityProviderRepository for InMemoryKeycloak {
    async fn create_identity_provider(&self, provider: &IdentityProvider) -> DomainResult<()> {
        let mut state = self.state();
        state.check_should_fail()?;
        state.require_realm(&provider.realm)?;

        let key = (provider.realm.clone(), provider.alias.clone());
        if state.identity_providers.contains_key(&key) {
            return Err(conflict(format!(
                "Identity Provider {} already exists",
                provider.alias
            )));
        }

        let mut stored = provider.clone();
        stored.internal_id = Some(Uuid::new_v4().to_string());
        state.identity_providers.insert(key, stored);
        Ok(())
    }

    async fn find_identity_provider(
        &self,
        realm: &str,
        alias: &str,
    ) -> DomainResult<IdentityProvider> {
        let state = self.state();
        state.check_should_fail()?;
        let stored = state
            .identity_providers
            .get(&(realm.to_string(), alias.to_string()))
            .ok_or_else(|| DomainError::not_found("IdentityProvider", alias))?;
        mask_identity_provider(stored)
    }

    async fn update_identity_provider(&self, provider: &IdentityProvider) -> DomainResult<()> {
        let mut state = self.state();
        state.check_should_fail()?;
        let stored = state
            .identity_providers
            .get_mut(&(provider.realm.clone(), provider.alias.clone()))
            .ok_or_else(|| DomainError::not_found("IdentityProvider", &provider.alias))?;

        let internal_id = stored.internal_id.clone();
        *stored = provider.clone();
        stored.internal_id = internal_id;
        Ok(())
    }

    async fn delete_identity_provider(&self, realm: &str, alias: &str) -> DomainResult<()> {
        let mut state = self.state();
        state.check_should_fail()?;
        state
            .identity_providers
            .remove(&(realm.to_string(), alias.to_string()))
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("IdentityProvider", alias))
    }
}

#[async_trait]
impl ProtocolMapperRepository for InMemoryKeycloak {
    async fn create_protocol_mapper(
        &self,
        realm: &str,
        parent: &MapperParent,
        mapper: &GenericProtocolMapper,
    ) -> DomainResult<String> {
        let mut state = self.state();
        state.check_should_fail()?;
        state.require_parent(realm, parent)?;

        let mappers = state.mappers(realm, parent);
        if mappers.iter().any(|m| m.name == mapper.name) {
            return Err(conflict(format!(
                "Protocol mapper exists with same name: {}",
                mapper.name
            )));
        }

        let id = Uuid::new_v4().to_string();
        mappers.push(GenericProtocolMapper {
            id: Some(id.clone()),
            ..mapper.clone()
        });
        Ok(id)
    }

    async fn find_protocol_mapper(
        &self,
        realm: &str,
        parent: &MapperParent,
        id: &str,
    ) -> DomainResult<GenericProtocolMapper> {
        let mut state = self.state();
        state.check_should_fail()?;
        state.require_parent(realm, parent)?;
        state
            .mappers(realm, parent)
            .iter()
            .find(|m| m.id.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| DomainError::not_found("ProtocolMapper", id))
    }

    async fn list_protocol_mappers(
        &self,
        realm: &str,
        parent: &MapperParent,
    ) -> DomainResult<Vec<GenericProtocolMapper>> {
        let mut state = self.state();
        state.check_should_fail()?;
        state.require_parent(realm, parent)?;
        Ok(state.mappers(realm, parent).clone())
    }

    async fn update_protocol_mapper(
        &self,
        realm: &str,
        parent: &MapperParent,
        mapper: &GenericProtocolMapper,
    ) -> DomainResult<()> {
        let mut state = self.state();
        state.check_should_fail()?;
        state.require_parent(realm, parent)?;

        let id = mapper.id.clone().unwrap_or_default();
        let stored = state
            .mappers(realm, parent)
            .iter_mut()
            .find(|m| m.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| DomainError::not_found("ProtocolMapper", &id))?;
        *stored = mapper.clone();
        Ok(())
    }

    async fn delete_protocol_mapper(
        &self,
        realm: &str,
        parent: &MapperParent,
        id: &str,
    ) -> DomainResult<()> {
        let mut state = self.state();
        state.check_should_fail()?;
        state.require_parent(realm, parent)?;

        let mappers = state.mappers(realm, parent);
        let before = mappers.len();
        mappers.retain(|m| m.id.as_deref() != Some(id));
        if mappers.len() == before {
            return Err(DomainError::not_found("ProtocolMapper", id));
        }
        Ok(())
    }
}

#[async_trait]
impl UserFederationRepository for InMemoryKeycloak {
    async fn create_ldap_user_federation(
        &self,
        federation: &LdapUserFederation,
    ) -> DomainResult<String> {
        let mut state = self.state();
        state.check_should_fail()?;
        state.require_realm(&federation.realm_id)?;

        let id = Uuid::new_v4().to_string();
        let mut component = federation.to_component();
        component.id = Some(id.clone());
        state
            .components
            .insert((federation.realm_id.clone(), id.clone()), component);
        Ok(id)
    }

    async fn find_ldap_user_federation(
        &self,
        realm: &str,
        id: &str,
    ) -> DomainResult<LdapUserFederation> {
        let state = self.state();
        state.check_should_fail()?;
        let component = state
            .components
            .get(&(realm.to_string(), id.to_string()))
            .cloned()
            .ok_or_else(|| DomainError::not_found("LdapUserFederation", id))?;
        LdapUserFederation::from_component(realm, &mask_component(component))
    }

    async fn update_ldap_user_federation(
        &self,
        federation: &LdapUserFederation,
    ) -> DomainResult<()> {
        let mut state = self.state();
        state.check_should_fail()?;
        let id = federation.id.clone().unwrap_or_default();
        let stored = state
            .components
            .get_mut(&(federation.realm_id.clone(), id.clone()))
            .ok_or_else(|| DomainError::not_found("LdapUserFederation", &id))?;
        *stored = federation.to_component();
        Ok(())
    }

    async fn delete_ldap_user_federation(&self, realm: &str, id: &str) -> DomainResult<()> {
        let mut state = self.state();
        state.check_should_fail()?;
        state
            .components
            .remove(&(realm.to_string(), id.to_string()))
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("LdapUserFederation", id))
    }
}
