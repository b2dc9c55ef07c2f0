use async_trait::async_trait;
use keycloak::types::*;
use keycloak::{KeycloakAdmin, KeycloakAdminToken, KeycloakError, KeycloakTokenSupplier};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::ports::config::{HttpConfig, KeycloakConfig};
use crate::application::ports::repository::*;
use crate::domain::{entities::*, errors::*};

/// Keycloak REST API adapter implementing the repository ports
pub struct KeycloakRestAdapter<TS: KeycloakTokenSupplier> {
    admin: Arc<KeycloakAdmin<TS>>,
}

impl<TS: KeycloakTokenSupplier + Send + Sync> KeycloakRestAdapter<TS> {
    pub fn new(admin: KeycloakAdmin<TS>) -> Self {
        Self {
            admin: Arc::new(admin),
        }
    }
}

impl KeycloakRestAdapter<KeycloakAdminToken> {
    /// Builds the HTTP client and acquires an admin token with the password
    /// grant.
    pub async fn connect(keycloak: &KeycloakConfig, http: &HttpConfig) -> DomainResult<Self> {
        keycloak.validate()?;
        http.validate()?;

        let client = reqwest::Client::builder()
            .timeout(http.get_timeout())
            .connect_timeout(http.get_connect_timeout())
            .user_agent(http.user_agent.clone())
            .build()
            .map_err(|e| RepositoryError::ConnectionFailed {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        let url = keycloak.server_url();
        info!(url = %url, realm = %keycloak.realm, "Acquiring Keycloak admin token");

        let token = KeycloakAdminToken::acquire_custom_realm(
            &url,
            &keycloak.username,
            &keycloak.password,
            &keycloak.realm,
            &keycloak.client_id,
            "password",
            &client,
        )
        .await
        .map_err(|e| map_keycloak_error("admin token", &keycloak.username, e))?;

        Ok(Self::new(KeycloakAdmin::new(&url, token, client)))
    }
}

/// 404 becomes `NotFound`; other failures keep their HTTP status.
fn map_keycloak_error(entity_type: &str, identifier: &str, err: KeycloakError) -> DomainError {
    match err {
        KeycloakError::HttpFailure { status: 404, .. } => {
            DomainError::not_found(entity_type, identifier)
        }
        KeycloakError::HttpFailure { status, text, .. } => RepositoryError::HttpFailure {
            status,
            message: format!("{entity_type} {identifier}: {text}"),
        }
        .into(),
        other => RepositoryError::ConnectionFailed {
            message: format!("{entity_type} {identifier}: {other}"),
        }
        .into(),
    }
}

fn to_string_map<K: ToString, V: ToString>(
    map: impl IntoIterator<Item = (K, V)>,
) -> BTreeMap<String, String> {
    map.into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[async_trait]
impl<TS: KeycloakTokenSupplier + Send + Sync> RealmRepository for KeycloakRestAdapter<TS> {
    async fn create_realm(&self, realm: &Realm) -> DomainResult<()> {
        let mut keycloak_realm = convert_realm_to_keycloak(realm)?;
        // Keep the internal id equal to the name so components can use it as parentId.
        if keycloak_realm.id.is_none() {
            keycloak_realm.id = Some(realm.realm.clone().into());
        }

        self.admin
            .post(keycloak_realm)
            .await
            .map_err(|e| map_keycloak_error("Realm", &realm.realm, e))?;
        Ok(())
    }

    async fn find_realm(&self, realm: &str) -> DomainResult<Realm> {
        let keycloak_realm = self
            .admin
            .realm_get(realm)
            .await
            .map_err(|e| map_keycloak_error("Realm", realm, e))?;

        convert_realm_from_keycloak(keycloak_realm)
    }

    async fn update_realm(&self, realm: &Realm) -> DomainResult<()> {
        let keycloak_realm = convert_realm_to_keycloak(realm)?;

        self.admin
            .realm_put(&realm.realm, keycloak_realm)
            .await
            .map_err(|e| map_keycloak_error("Realm", &realm.realm, e))?;
        Ok(())
    }

    async fn delete_realm(&self, realm: &str) -> DomainResult<()> {
        self.admin
            .realm_delete(realm)
            .await
            .map_err(|e| map_keycloak_error("Realm", realm, e))?;
        Ok(())
    }
}

#[async_trait]
impl<TS: KeycloakTokenSupplier + Send + Sync> ClientRepository for KeycloakRestAdapter<TS> {
    async fn create_openid_client(&self, client: &OpenIdClient) -> DomainResult<String> {
        let keycloak_client = convert_client_to_keycloak(client);

        let response = self
            .admin
            .realm_clients_post(&client.realm_id, keycloak_client)
            .await
            .map_err(|e| map_keycloak_error("Client", &client.client_id, e))?;

        response
            .to_id()
            .map(|id| id.to_string())
            .ok_or_else(|| {
                RepositoryError::MissingIdentifier {
                    entity_type: "Client".to_string(),
                }
                .into()
            })
    }

    async fn find_openid_client(&self, realm: &str, id: &str) -> DomainResult<OpenIdClient> {
        let keycloak_client = self
            .admin
            .realm_clients_with_client_uuid_get(realm, id)
            .await
            .map_err(|e| map_keycloak_error("Client", id, e))?;

        Ok(convert_client_from_keycloak(realm, keycloak_client))
    }

    async fn update_openid_client(&self, client: &OpenIdClient) -> DomainResult<()> {
        let id = client
            .id
            .as_deref()
            .ok_or_else(|| DomainError::validation("client id must be set"))?;
        let keycloak_client = convert_client_to_keycloak(client);

        self.admin
            .realm_clients_with_client_uuid_put(&client.realm_id, id, keycloak_client)
            .await
            .map_err(|e| map_keycloak_error("Client", id, e))?;
        Ok(())
    }

    async fn delete_openid_client(&self, realm: &str, id: &str) -> DomainResult<()> {
        self.admin
            .realm_clients_with_client_uuid_delete(realm, id)
            .await
            .map_err(|e| map_keycloak_error("Client", id, e))?;
        Ok(())
    }
}

#[async_trait]
impl<TS: KeycloakTokenSupplier + Send + Sync> IdentityProviderRepository
    for KeycloakRestAdapter<TS>
{
    async fn create_identity_provider(&self, provider: &IdentityProvider) -> DomainResult<()> {
        let keycloak_provider = convert_identity_provider_to_keycloak(provider)?;

        self.admin
            .realm_identity_provider_instances_post(&provider.realm, keycloak_provider)
            .await
            .map_err(|e| map_keycloak_error("IdentityProvider", &provider.alias, e))?;
        Ok(())
    }

    async fn find_identity_provider(
        &self,
        realm: &str,
        alias: &str,
    ) -> DomainResult<IdentityProvider> {
        let keycloak_provider = self
            .admin
            .realm_identity_provider_instances_with_alias_get(realm, alias)
            .await
            .map_err(|e| map_keycloak_error("IdentityProvider", alias, e))?;

        convert_identity_provider_from_keycloak(realm, keycloak_provider)
    }

    async fn update_identity_provider(&self, provider: &IdentityProvider) -> DomainResult<()> {
        let keycloak_provider = convert_identity_provider_to_keycloak(provider)?;

        self.admin
            .realm_identity_provider_instances_with_alias_put(
                &provider.realm,
                &provider.alias,
                keycloak_provider,
            )
            .await
            .map_err(|e| map_keycloak_error("IdentityProvider", &provider.alias, e))?;
        Ok(())
    }

    async fn delete_identity_provider(&self, realm: &str, alias: &str) -> DomainResult<()> {
        self.admin
            .realm_identity_provider_instances_with_alias_delete(realm, alias)
            .await
            .map_err(|e| map_keycloak_error("IdentityProvider", alias, e))?;
        Ok(())
    }
}

#[async_trait]
impl<TS: KeycloakTokenSupplier + Send + Sync> ProtocolMapperRepository
    for KeycloakRestAdapter<TS>
{
    async fn create_protocol_mapper(
        &self,
        realm: &str,
        parent: &MapperParent,
        mapper: &GenericProtocolMapper,
    ) -> DomainResult<String> {
        let keycloak_mapper = convert_protocol_mapper_to_keycloak(mapper);

        let response = match parent {
            MapperParent::Client(client_id) => {
                self.admin
                    .realm_clients_with_client_uuid_protocol_mappers_models_post(
                        realm,
                        client_id,
                        keycloak_mapper,
                    )
                    .await
            }
            MapperParent::ClientScope(scope_id) => {
                self.admin
                    .realm_client_scopes_with_client_scope_id_protocol_mappers_models_post(
                        realm,
                        scope_id,
                        keycloak_mapper,
                    )
                    .await
            }
        }
        .map_err(|e| map_keycloak_error("ProtocolMapper", &mapper.name, e))?;

        let id = response
            .to_id()
            .map(|id| id.to_string())
            .ok_or_else(|| RepositoryError::MissingIdentifier {
                entity_type: "ProtocolMapper".to_string(),
            })?;

        debug!(parent = %parent, id = %id, "Protocol mapper created");
        Ok(id)
    }

    async fn find_protocol_mapper(
        &self,
        realm: &str,
        parent: &MapperParent,
        id: &str,
    ) -> DomainResult<GenericProtocolMapper> {
        let keycloak_mapper = match parent {
            MapperParent::Client(client_id) => {
                self.admin
                    .realm_clients_with_client_uuid_protocol_mappers_models_with_id_get(
                        realm, client_id, id,
                    )
                    .await
            }
            MapperParent::ClientScope(scope_id) => {
                self.admin
                    .realm_client_scopes_with_client_scope_id_protocol_mappers_models_with_id_get(
                        realm, scope_id, id,
                    )
                    .await
            }
        }
        .map_err(|e| map_keycloak_error("ProtocolMapper", id, e))?;

        Ok(convert_protocol_mapper_from_keycloak(keycloak_mapper))
    }

    async fn list_protocol_mappers(
        &self,
        realm: &str,
        parent: &MapperParent,
    ) -> DomainResult<Vec<GenericProtocolMapper>> {
        let keycloak_mappers = match parent {
            MapperParent::Client(client_id) => {
                self.admin
                    .realm_clients_with_client_uuid_protocol_mappers_models_get(realm, client_id)
                    .await
            }
            MapperParent::ClientScope(scope_id) => {
                self.admin
                    .realm_client_scopes_with_client_scope_id_protocol_mappers_models_get(
                        realm, scope_id,
                    )
                    .await
            }
        }
        .map_err(|e| map_keycloak_error(parent.kind(), parent.id(), e))?;

        Ok(keycloak_mappers
            .into_iter()
            .map(convert_protocol_mapper_from_keycloak)
            .collect())
    }

    async fn update_protocol_mapper(
        &self,
        realm: &str,
        parent: &MapperParent,
        mapper: &GenericProtocolMapper,
    ) -> DomainResult<()> {
        let id = mapper
            .id
            .as_deref()
            .ok_or_else(|| DomainError::validation("protocol mapper id must be set"))?;
        let keycloak_mapper = convert_protocol_mapper_to_keycloak(mapper);

        match parent {
            MapperParent::Client(client_id) => {
                self.admin
                    .realm_clients_with_client_uuid_protocol_mappers_models_with_id_put(
                        realm,
                        client_id,
                        id,
                        keycloak_mapper,
                    )
                    .await
            }
            MapperParent::ClientScope(scope_id) => {
                self.admin
                    .realm_client_scopes_with_client_scope_id_protocol_mappers_models_with_id_put(
                        realm,
                        scope_id,
                        id,
                        keycloak_mapper,
                    )
                    .await
            }
        }
        .map_err(|e| map_keycloak_error("ProtocolMapper", id, e))?;
        Ok(())
    }

    async fn delete_protocol_mapper(
        &self,
        realm: &str,
        parent: &MapperParent,
        id: &str,
    ) -> DomainResult<()> {
        match parent {
            MapperParent::Client(client_id) => {
                self.admin
                    .realm_clients_with_client_uuid_protocol_mappers_models_with_id_delete(
                        realm, client_id, id,
                    )
                    .await
            }
            MapperParent::ClientScope(scope_id) => {
                self.admin
                    .realm_client_scopes_with_client_scope_id_protocol_mappers_models_with_id_delete(
                        realm, scope_id, id,
                    )
                    .await
            }
        }
        .map_err(|e| map_keycloak_error("ProtocolMapper", id, e))?;
        Ok(())
    }
}

#[async_trait]
impl<TS: KeycloakTokenSupplier + Send + Sync> UserFederationRepository
    for KeycloakRestAdapter<TS>
{
    async fn create_ldap_user_federation(
        &self,
        federation: &LdapUserFederation,
    ) -> DomainResult<String> {
        let component = convert_component_to_keycloak(&federation.to_component());

        let response = self
            .admin
            .realm_components_post(&federation.realm_id, component)
            .await
            .map_err(|e| map_keycloak_error("LdapUserFederation", &federation.name, e))?;

        response
            .to_id()
            .map(|id| id.to_string())
            .ok_or_else(|| {
                RepositoryError::MissingIdentifier {
                    entity_type: "LdapUserFederation".to_string(),
                }
                .into()
            })
    }

    async fn find_ldap_user_federation(
        &self,
        realm: &str,
        id: &str,
    ) -> DomainResult<LdapUserFederation> {
        let component = self
            .admin
            .realm_components_with_id_get(realm, id)
            .await
            .map_err(|e| map_keycloak_error("LdapUserFederation", id, e))?;

        LdapUserFederation::from_component(realm, &convert_component_from_keycloak(component))
    }

    async fn update_ldap_user_federation(
        &self,
        federation: &LdapUserFederation,
    ) -> DomainResult<()> {
        let id = federation
            .id
            .as_deref()
            .ok_or_else(|| DomainError::validation("ldap user federation id must be set"))?;
        let component = convert_component_to_keycloak(&federation.to_component());

        self.admin
            .realm_components_with_id_put(&federation.realm_id, id, component)
            .await
            .map_err(|e| map_keycloak_error("LdapUserFederation", id, e))?;
        Ok(())
    }

    async fn delete_ldap_user_federation(&self, realm: &str, id: &str) -> DomainResult<()> {
        self.admin
            .realm_components_with_id_delete(realm, id)
            .await
            .map_err(|e| map_keycloak_error("LdapUserFederation", id, e))?;
        Ok(())
    }
}

fn convert_realm_from_keycloak(keycloak_realm: RealmRepresentation) -> DomainResult<Realm> {
    let realm_name = keycloak_realm
        .realm
        .map(|r| r.to_string())
        .ok_or_else(|| DomainError::Serialization {
            message: "realm representation without a name".to_string(),
        })?;

    let smtp_server = match keycloak_realm.smtp_server {
        Some(map) => SmtpServer::from_config_map(&to_string_map(map))?,
        None => None,
    };

    let internationalization = if keycloak_realm.internationalization_enabled.unwrap_or(false) {
        Some(Internationalization {
            supported_locales: keycloak_realm
                .supported_locales
                .map(|locales| locales.iter().map(|l| l.to_string()).collect())
                .unwrap_or_default(),
            default_locale: keycloak_realm
                .default_locale
                .map(|l| l.to_string())
                .unwrap_or_default(),
        })
    } else {
        None
    };

    let security_headers = keycloak_realm
        .browser_security_headers
        .map(|headers| BrowserSecurityHeaders::from_map(&to_string_map(headers)));

    let ssl_required = match keycloak_realm.ssl_required {
        Some(ssl) => Some(SslRequired::parse(&ssl.to_string())?),
        None => None,
    };

    Ok(Realm {
        id: keycloak_realm.id.map(|id| id.to_string()),
        realm: realm_name,
        enabled: keycloak_realm.enabled.unwrap_or(true),
        display_name: keycloak_realm.display_name.map(|d| d.to_string()),
        display_name_html: keycloak_realm.display_name_html.map(|d| d.to_string()),
        registration_allowed: keycloak_realm.registration_allowed.unwrap_or(false),
        registration_email_as_username: keycloak_realm
            .registration_email_as_username
            .unwrap_or(false),
        edit_username_allowed: keycloak_realm.edit_username_allowed.unwrap_or(false),
        reset_password_allowed: keycloak_realm.reset_password_allowed.unwrap_or(false),
        remember_me: keycloak_realm.remember_me.unwrap_or(false),
        verify_email: keycloak_realm.verify_email.unwrap_or(false),
        login_with_email_allowed: keycloak_realm.login_with_email_allowed.unwrap_or(true),
        duplicate_emails_allowed: keycloak_realm.duplicate_emails_allowed.unwrap_or(false),
        ssl_required,
        login_theme: keycloak_realm.login_theme.map(|t| t.to_string()),
        account_theme: keycloak_realm.account_theme.map(|t| t.to_string()),
        admin_theme: keycloak_realm.admin_theme.map(|t| t.to_string()),
        email_theme: keycloak_realm.email_theme.map(|t| t.to_string()),
        refresh_token_max_reuse: keycloak_realm.refresh_token_max_reuse,
        lifespans: RealmLifespans {
            sso_session_idle_timeout: keycloak_realm.sso_session_idle_timeout,
            sso_session_max_lifespan: keycloak_realm.sso_session_max_lifespan,
            offline_session_idle_timeout: keycloak_realm.offline_session_idle_timeout,
            offline_session_max_lifespan: keycloak_realm.offline_session_max_lifespan,
            access_token_lifespan: keycloak_realm.access_token_lifespan,
            access_token_lifespan_for_implicit_flow: keycloak_realm
                .access_token_lifespan_for_implicit_flow,
            access_code_lifespan: keycloak_realm.access_code_lifespan,
            access_code_lifespan_login: keycloak_realm.access_code_lifespan_login,
            access_code_lifespan_user_action: keycloak_realm.access_code_lifespan_user_action,
            action_token_generated_by_user_lifespan: keycloak_realm
                .action_token_generated_by_user_lifespan,
            action_token_generated_by_admin_lifespan: keycloak_realm
                .action_token_generated_by_admin_lifespan,
        },
        smtp_server,
        internationalization,
        security_headers,
        password_policy: keycloak_realm.password_policy.map(|p| p.to_string()),
        flows: RealmFlowBindings {
            browser_flow: keycloak_realm.browser_flow.map(|f| f.to_string()),
            registration_flow: keycloak_realm.registration_flow.map(|f| f.to_string()),
            direct_grant_flow: keycloak_realm.direct_grant_flow.map(|f| f.to_string()),
            reset_credentials_flow: keycloak_realm.reset_credentials_flow.map(|f| f.to_string()),
            client_authentication_flow: keycloak_realm
                .client_authentication_flow
                .map(|f| f.to_string()),
            docker_authentication_flow: keycloak_realm
                .docker_authentication_flow
                .map(|f| f.to_string()),
        },
        attributes: keycloak_realm
            .attributes
            .map(to_string_map)
            .unwrap_or_default(),
    })
}

fn convert_realm_to_keycloak(realm: &Realm) -> DomainResult<RealmRepresentation> {
    let smtp_server = match &realm.smtp_server {
        Some(smtp) => Some(
            smtp.to_config_map()?
                .into_iter()
                .map(|(k, v)| (k, v.into()))
                .collect(),
        ),
        None => None,
    };

    let lifespans = &realm.lifespans;
    let flows = &realm.flows;
    let opt = |value: &Option<String>| value.as_ref().map(|v| v.clone().into());

    Ok(RealmRepresentation {
        id: opt(&realm.id),
        realm: Some(realm.realm.clone().into()),
        enabled: Some(realm.enabled),
        display_name: opt(&realm.display_name),
        display_name_html: opt(&realm.display_name_html),
        registration_allowed: Some(realm.registration_allowed),
        registration_email_as_username: Some(realm.registration_email_as_username),
        edit_username_allowed: Some(realm.edit_username_allowed),
        reset_password_allowed: Some(realm.reset_password_allowed),
        remember_me: Some(realm.remember_me),
        verify_email: Some(realm.verify_email),
        login_with_email_allowed: Some(realm.login_with_email_allowed),
        duplicate_emails_allowed: Some(realm.duplicate_emails_allowed),
        ssl_required: realm.ssl_required.map(|ssl| ssl.as_str().to_string().into()),
        login_theme: opt(&realm.login_theme),
        account_theme: opt(&realm.account_theme),
        admin_theme: opt(&realm.admin_theme),
        email_theme: opt(&realm.email_theme),
        refresh_token_max_reuse: realm.refresh_token_max_reuse,
        sso_session_idle_timeout: lifespans.sso_session_idle_timeout,
        sso_session_max_lifespan: lifespans.sso_session_max_lifespan,
        offline_session_idle_timeout: lifespans.offline_session_idle_timeout,
        offline_session_max_lifespan: lifespans.offline_session_max_lifespan,
        access_token_lifespan: lifespans.access_token_lifespan,
        access_token_lifespan_for_implicit_flow: lifespans.access_token_lifespan_for_implicit_flow,
        access_code_lifespan: lifespans.access_code_lifespan,
        access_code_lifespan_login: lifespans.access_code_lifespan_login,
        access_code_lifespan_user_action: lifespans.access_code_lifespan_user_action,
        action_token_generated_by_user_lifespan: lifespans.action_token_generated_by_user_lifespan,
        action_token_generated_by_admin_lifespan: lifespans
            .action_token_generated_by_admin_lifespan,
        smtp_server,
        internationalization_enabled: Some(realm.internationalization.is_some()),
        supported_locales: realm.internationalization.as_ref().map(|i18n| {
            i18n.supported_locales
                .iter()
                .map(|l| l.clone().into())
                .collect()
        }),
        default_locale: realm
            .internationalization
            .as_ref()
            .map(|i18n| i18n.default_locale.clone().into()),
        browser_security_headers: realm.security_headers.as_ref().map(|headers| {
            headers
                .to_map()
                .into_iter()
                .map(|(k, v)| (k, v.into()))
                .collect()
        }),
        password_policy: opt(&realm.password_policy),
        browser_flow: opt(&flows.browser_flow),
        registration_flow: opt(&flows.registration_flow),
        direct_grant_flow: opt(&flows.direct_grant_flow),
        reset_credentials_flow: opt(&flows.reset_credentials_flow),
        client_authentication_flow: opt(&flows.client_authentication_flow),
        docker_authentication_flow: opt(&flows.docker_authentication_flow),
        attributes: if realm.attributes.is_empty() {
            None
        } else {
            Some(
                realm
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone().into()))
                    .collect(),
            )
        },
        ..Default::default()
    })
}

fn convert_client_from_keycloak(realm: &str, keycloak_client: ClientRepresentation) -> OpenIdClient {
    let strings = |values: Option<TypeVec<TypeString>>| -> Vec<String> {
        values
            .map(|values| values.iter().map(|v| v.to_string()).collect())
            .unwrap_or_default()
    };

    OpenIdClient {
        id: keycloak_client.id.map(|id| id.to_string()),
        realm_id: realm.to_string(),
        client_id: keycloak_client
            .client_id
            .map(|c| c.to_string())
            .unwrap_or_default(),
        name: keycloak_client.name.map(|n| n.to_string()),
        description: keycloak_client.description.map(|d| d.to_string()),
        enabled: keycloak_client.enabled.unwrap_or(true),
        access_type: AccessType::from_flags(
            keycloak_client.public_client.unwrap_or(false),
            keycloak_client.bearer_only.unwrap_or(false),
        ),
        client_secret: keycloak_client.secret.map(|s| s.to_string()),
        standard_flow_enabled: keycloak_client.standard_flow_enabled.unwrap_or(false),
        implicit_flow_enabled: keycloak_client.implicit_flow_enabled.unwrap_or(false),
        direct_access_grants_enabled: keycloak_client
            .direct_access_grants_enabled
            .unwrap_or(false),
        service_accounts_enabled: keycloak_client.service_accounts_enabled.unwrap_or(false),
        valid_redirect_uris: strings(keycloak_client.redirect_uris),
        web_origins: strings(keycloak_client.web_origins),
        root_url: keycloak_client.root_url.map(|u| u.to_string()),
        base_url: keycloak_client.base_url.map(|u| u.to_string()),
        admin_url: keycloak_client.admin_url.map(|u| u.to_string()),
        full_scope_allowed: keycloak_client.full_scope_allowed.unwrap_or(true),
    }
}

fn convert_client_to_keycloak(client: &OpenIdClient) -> ClientRepresentation {
    let opt = |value: &Option<String>| value.as_ref().map(|v| v.clone().into());
    let list = |values: &[String]| Some(values.iter().map(|v| v.clone().into()).collect());

    ClientRepresentation {
        id: opt(&client.id),
        client_id: Some(client.client_id.clone().into()),
        name: opt(&client.name),
        description: opt(&client.description),
        enabled: Some(client.enabled),
        protocol: Some(OPENID_CONNECT.to_string().into()),
        public_client: Some(client.access_type.public_client()),
        bearer_only: Some(client.access_type.bearer_only()),
        secret: opt(&client.client_secret),
        standard_flow_enabled: Some(client.standard_flow_enabled),
        implicit_flow_enabled: Some(client.implicit_flow_enabled),
        direct_access_grants_enabled: Some(client.direct_access_grants_enabled),
        service_accounts_enabled: Some(client.service_accounts_enabled),
        redirect_uris: list(&client.valid_redirect_uris),
        web_origins: list(&client.web_origins),
        root_url: opt(&client.root_url),
        base_url: opt(&client.base_url),
        admin_url: opt(&client.admin_url),
        full_scope_allowed: Some(client.full_scope_allowed),
        ..Default::default()
    }
}

fn convert_identity_provider_from_keycloak(
    realm: &str,
    keycloak_provider: IdentityProviderRepresentation,
) -> DomainResult<IdentityProvider> {
    let alias = keycloak_provider
        .alias
        .map(|a| a.to_string())
        .ok_or_else(|| DomainError::Serialization {
            message: "identity provider representation without an alias".to_string(),
        })?;
    let provider_id = keycloak_provider
        .provider_id
        .map(|p| p.to_string())
        .unwrap_or_else(|| "oidc".to_string());

    let config_map = keycloak_provider
        .config
        .map(to_string_map)
        .unwrap_or_default();

    Ok(IdentityProvider {
        realm: realm.to_string(),
        alias,
        internal_id: keycloak_provider.internal_id.map(|id| id.to_string()),
        config: IdentityProviderConfig::from_map(&provider_id, &config_map)?,
        provider_id,
        display_name: keycloak_provider.display_name.map(|d| d.to_string()),
        enabled: keycloak_provider.enabled.unwrap_or(true),
        store_token: keycloak_provider.store_token.unwrap_or(false),
        add_read_token_role_on_create: keycloak_provider
            .add_read_token_role_on_create
            .unwrap_or(false),
        authenticate_by_default: keycloak_provider.authenticate_by_default.unwrap_or(false),
        link_only: keycloak_provider.link_only.unwrap_or(false),
        trust_email: keycloak_provider.trust_email.unwrap_or(false),
        first_broker_login_flow_alias: keycloak_provider
            .first_broker_login_flow_alias
            .map(|f| f.to_string())
            .unwrap_or_default(),
        post_broker_login_flow_alias: keycloak_provider
            .post_broker_login_flow_alias
            .map(|p| p.to_string())
            .filter(|p| !p.is_empty()),
    })
}

fn convert_identity_provider_to_keycloak(
    provider: &IdentityProvider,
) -> DomainResult<IdentityProviderRepresentation> {
    let config = provider
        .config
        .to_map()?
        .into_iter()
        .map(|(k, v)| (k, v.into()))
        .collect();

    Ok(IdentityProviderRepresentation {
        alias: Some(provider.alias.clone().into()),
        internal_id: provider.internal_id.as_ref().map(|id| id.clone().into()),
        provider_id: Some(provider.provider_id.clone().into()),
        display_name: provider.display_name.as_ref().map(|d| d.clone().into()),
        enabled: Some(provider.enabled),
        store_token: Some(provider.store_token),
        add_read_token_role_on_create: Some(provider.add_read_token_role_on_create),
        authenticate_by_default: Some(provider.authenticate_by_default),
        link_only: Some(provider.link_only),
        trust_email: Some(provider.trust_email),
        first_broker_login_flow_alias: Some(provider.first_broker_login_flow_alias.clone().into()),
        post_broker_login_flow_alias: Some(
            provider
                .post_broker_login_flow_alias
                .clone()
                .unwrap_or_default()
                .into(),
        ),
        config: Some(config),
        ..Default::default()
    })
}

fn convert_protocol_mapper_from_keycloak(
    keycloak_mapper: ProtocolMapperRepresentation,
) -> GenericProtocolMapper {
    GenericProtocolMapper {
        id: keycloak_mapper.id.map(|id| id.to_string()),
        name: keycloak_mapper
            .name
            .map(|n| n.to_string())
            .unwrap_or_default(),
        protocol: keycloak_mapper
            .protocol
            .map(|p| p.to_string())
            .unwrap_or_default(),
        protocol_mapper: keycloak_mapper
            .protocol_mapper
            .map(|pm| pm.to_string())
            .unwrap_or_default(),
        config: keycloak_mapper
            .config
            .map(to_string_map)
            .unwrap_or_default(),
    }
}

fn convert_protocol_mapper_to_keycloak(
    mapper: &GenericProtocolMapper,
) -> ProtocolMapperRepresentation {
    ProtocolMapperRepresentation {
        id: mapper.id.as_ref().map(|id| id.clone().into()),
        name: Some(mapper.name.clone().into()),
        protocol: Some(mapper.protocol.clone().into()),
        protocol_mapper: Some(mapper.protocol_mapper.clone().into()),
        config: Some(
            mapper
                .config
                .iter()
                .map(|(k, v)| (k.clone(), v.clone().into()))
                .collect(),
        ),
        ..Default::default()
    }
}

fn convert_component_from_keycloak(component: ComponentRepresentation) -> Component {
    Component {
        id: component.id.map(|id| id.to_string()),
        name: component.name.map(|n| n.to_string()).unwrap_or_default(),
        provider_id: component
            .provider_id
            .map(|p| p.to_string())
            .unwrap_or_default(),
        provider_type: component
            .provider_type
            .map(|p| p.to_string())
            .unwrap_or_default(),
        parent_id: component
            .parent_id
            .map(|p| p.to_string())
            .unwrap_or_default(),
        config: component
            .config
            .map(|config| {
                config
                    .into_iter()
                    .map(|(k, values)| {
                        (
                            k.to_string(),
                            values.iter().map(|v| v.to_string()).collect(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn convert_component_to_keycloak(component: &Component) -> ComponentRepresentation {
    ComponentRepresentation {
        id: component.id.as_ref().map(|id| id.clone().into()),
        name: Some(component.name.clone().into()),
        provider_id: Some(component.provider_id.clone().into()),
        provider_type: Some(component.provider_type.clone().into()),
        parent_id: Some(component.parent_id.clone().into()),
        config: Some(
            component
                .config
                .iter()
                .map(|(k, values)| {
                    (
                        k.clone(),
                        values.iter().map(|v| v.clone().into()).collect(),
                    )
                })
                .collect(),
        ),
        ..Default::default()
    }
}
