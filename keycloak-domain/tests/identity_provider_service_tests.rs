use keycloak_domain::{
    application::services::IdentityProviderManagementService,
    domain::entities::{
        GoogleConfig, IdentityProvider, IdentityProviderConfig, OidcConfig, SamlConfig,
    },
    testing::InMemoryKeycloak,
    IdentityProviderRepository,
};
use std::sync::Arc;

fn setup() -> (Arc<InMemoryKeycloak>, IdentityProviderManagementService) {
    let keycloak = Arc::new(InMemoryKeycloak::new());
    let service = IdentityProviderManagementService::new(keycloak.clone());
    (keycloak, service)
}

fn oidc_provider(alias: &str) -> IdentityProvider {
    IdentityProvider::new(
        "master",
        alias,
        "oidc",
        IdentityProviderConfig::Oidc(OidcConfig {
            client_id: "example".to_string(),
            client_secret: "s3cret".to_string(),
            authorization_url: "https://idp.example.com/auth".to_string(),
            token_url: "https://idp.example.com/token".to_string(),
            default_scope: "openid".to_string(),
            ..Default::default()
        }),
    )
}

#[tokio::test]
async fn test_create_oidc_provider_keeps_secret_and_extra_config() {
    let (keycloak, service) = setup();
    let mut provider = oidc_provider("corp");
    if let IdentityProviderConfig::Oidc(config) = &mut provider.config {
        config
            .extra_config
            .insert("prompt".to_string(), "login".to_string());
    }

    let created = service.create_identity_provider(&provider).await.unwrap();
    assert!(created.internal_id.is_some());
    match &created.config {
        IdentityProviderConfig::Oidc(config) => {
            assert_eq!(config.client_secret, "s3cret");
            assert_eq!(config.extra_config["prompt"], "login");
        }
        other => panic!("unexpected config {other:?}"),
    }

    let raw = keycloak
        .find_identity_provider("master", "corp")
        .await
        .unwrap();
    match raw.config {
        IdentityProviderConfig::Oidc(config) => assert_eq!(config.client_secret, "**********"),
        other => panic!("unexpected config {other:?}"),
    }
}

#[tokio::test]
async fn test_extra_config_collision_is_rejected() {
    let (_, service) = setup();
    let mut provider = oidc_provider("corp");
    if let IdentityProviderConfig::Oidc(config) = &mut provider.config {
        config
            .extra_config
            .insert("tokenUrl".to_string(), "https://other".to_string());
    }

    let err = service.create_identity_provider(&provider).await.unwrap_err();
    assert!(err.to_string().starts_with("validation error: "));
    assert!(service
        .get_identity_provider("master", "corp")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_provider_id_must_match_config() {
    let (_, service) = setup();
    let mut provider = oidc_provider("corp");
    provider.provider_id = "google".to_string();

    let err = service.create_identity_provider(&provider).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "expected provider_id to be one of [oidc keycloak-oidc], got google"
    );
}

#[tokio::test]
async fn test_update_google_provider() {
    let (_, service) = setup();
    let provider = IdentityProvider::new(
        "master",
        "google",
        "google",
        IdentityProviderConfig::Google(GoogleConfig {
            client_id: "gid".to_string(),
            client_secret: "gsecret".to_string(),
            default_scope: "openid profile email".to_string(),
            ..Default::default()
        }),
    );
    let mut created = service.create_identity_provider(&provider).await.unwrap();

    created.trust_email = true;
    if let IdentityProviderConfig::Google(config) = &mut created.config {
        config.hosted_domain = Some("example.com".to_string());
    }
    let updated = service.update_identity_provider(&created).await.unwrap();
    assert!(updated.trust_email);
    assert_eq!(updated.internal_id, created.internal_id);
    match updated.config {
        IdentityProviderConfig::Google(config) => {
            assert_eq!(config.hosted_domain.as_deref(), Some("example.com"));
            assert_eq!(config.client_secret, "gsecret");
        }
        other => panic!("unexpected config {other:?}"),
    }
}

#[tokio::test]
async fn test_saml_provider_requires_sso_url() {
    let (_, service) = setup();
    let provider = IdentityProvider::new(
        "master",
        "saml",
        "saml",
        IdentityProviderConfig::Saml(SamlConfig::default()),
    );
    let err = service.create_identity_provider(&provider).await.unwrap_err();
    assert!(err.to_string().starts_with("validation error: "));
}

#[tokio::test]
async fn test_provider_in_missing_realm_fails() {
    let (_, service) = setup();
    let mut provider = oidc_provider("corp");
    provider.realm = "missing".to_string();

    let err = service.create_identity_provider(&provider).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_provider_is_idempotent() {
    let (_, service) = setup();
    service
        .create_identity_provider(&oidc_provider("corp"))
        .await
        .unwrap();

    service.delete_identity_provider("master", "corp").await.unwrap();
    service.delete_identity_provider("master", "corp").await.unwrap();
}
