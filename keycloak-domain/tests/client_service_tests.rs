use keycloak_domain::{
    application::services::{ClientManagementService, RealmManagementService},
    domain::{
        entities::{AccessType, OpenIdClient, Realm},
        errors::DomainError,
    },
    testing::InMemoryKeycloak,
    ClientRepository,
};
use std::sync::Arc;

async fn setup() -> (Arc<InMemoryKeycloak>, ClientManagementService) {
    let keycloak = Arc::new(InMemoryKeycloak::new());
    RealmManagementService::new(keycloak.clone())
        .create_realm(&Realm::new("r1"))
        .await
        .unwrap();
    let service = ClientManagementService::new(keycloak.clone());
    (keycloak, service)
}

#[tokio::test]
async fn test_bearer_only_client_round_trip() {
    let (_, service) = setup().await;

    let client = OpenIdClient::new("r1", "c1", AccessType::BearerOnly);
    let created = service.create_openid_client(&client).await.unwrap();

    let id = created.id.clone().unwrap();
    assert_eq!(created.access_type, AccessType::BearerOnly);
    assert!(created.client_secret.is_none());

    let read = service.get_openid_client("r1", &id).await.unwrap().unwrap();
    assert_eq!(read, created);
}

#[tokio::test]
async fn test_confidential_client_gets_generated_secret() {
    let (_, service) = setup().await;

    let mut client = OpenIdClient::new("r1", "web", AccessType::Confidential);
    client.standard_flow_enabled = true;
    client.valid_redirect_uris = vec!["https://app.example.com/*".to_string()];

    let created = service.create_openid_client(&client).await.unwrap();
    assert!(created.client_secret.is_some());

    let mut changed = created.clone();
    changed.client_secret = None;
    changed.description = Some("web frontend".to_string());
    let updated = service.update_openid_client(&changed).await.unwrap();
    assert_eq!(updated.client_secret, created.client_secret);
    assert_eq!(updated.description.as_deref(), Some("web frontend"));
}

#[tokio::test]
async fn test_duplicate_client_id_conflicts() {
    let (_, service) = setup().await;
    let client = OpenIdClient::new("r1", "c1", AccessType::Public);
    service.create_openid_client(&client).await.unwrap();

    let err = service.create_openid_client(&client).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::ExternalService {
            status: Some(409),
            ..
        }
    ));
}

#[tokio::test]
async fn test_invalid_client_never_reaches_keycloak() {
    let (keycloak, service) = setup().await;

    let mut client = OpenIdClient::new("r1", "c1", AccessType::Public);
    client.client_secret = Some("shh".to_string());
    let err = service.create_openid_client(&client).await.unwrap_err();
    assert!(err.to_string().starts_with("validation error: "));

    keycloak.set_should_fail(false);
    let missing = keycloak.find_openid_client("r1", "c1").await.unwrap_err();
    assert!(missing.is_not_found());
}

#[tokio::test]
async fn test_client_in_missing_realm() {
    let (_, service) = setup().await;
    let client = OpenIdClient::new("nope", "c1", AccessType::BearerOnly);

    let err = service.create_openid_client(&client).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_client_is_idempotent() {
    let (_, service) = setup().await;
    let created = service
        .create_openid_client(&OpenIdClient::new("r1", "c1", AccessType::BearerOnly))
        .await
        .unwrap();
    let id = created.id.unwrap();

    service.delete_openid_client("r1", &id).await.unwrap();
    service.delete_openid_client("r1", &id).await.unwrap();
    assert!(service.get_openid_client("r1", &id).await.unwrap().is_none());
}
