use keycloak_domain::{
    application::services::RealmManagementService,
    domain::{
        entities::{Internationalization, Realm, SmtpAuth, SmtpServer, SslRequired},
        errors::DomainError,
    },
    testing::InMemoryKeycloak,
    RealmRepository,
};
use std::sync::Arc;

fn setup() -> (Arc<InMemoryKeycloak>, RealmManagementService) {
    let keycloak = Arc::new(InMemoryKeycloak::new());
    let service = RealmManagementService::new(keycloak.clone());
    (keycloak, service)
}

fn smtp_realm(name: &str) -> Realm {
    let mut realm = Realm::new(name);
    realm.smtp_server = Some(SmtpServer {
        host: "smtp.example.com".to_string(),
        from: "noreply@example.com".to_string(),
        starttls: true,
        auth: Some(SmtpAuth {
            username: "mailer".to_string(),
            password: "hunter2".to_string(),
        }),
        ..Default::default()
    });
    realm
}

#[tokio::test]
async fn test_create_and_read_realm() {
    let (_, service) = setup();

    let mut realm = Realm::new("r1");
    realm.display_name = Some("Realm One".to_string());
    realm.ssl_required = Some(SslRequired::External);
    realm.lifespans.access_token_lifespan = Some(300);

    let created = service.create_realm(&realm).await.unwrap();
    assert_eq!(created.id.as_deref(), Some("r1"));
    assert_eq!(created.display_name.as_deref(), Some("Realm One"));
    assert_eq!(created.lifespans.access_token_lifespan, Some(300));

    let read = service.get_realm("r1").await.unwrap().unwrap();
    assert_eq!(read, created);
}

#[tokio::test]
async fn test_get_missing_realm_returns_none() {
    let (_, service) = setup();
    assert!(service.get_realm("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_duplicate_realm_fails() {
    let (_, service) = setup();
    service.create_realm(&Realm::new("r1")).await.unwrap();

    let err = service.create_realm(&Realm::new("r1")).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::ExternalService {
            status: Some(409),
            ..
        }
    ));
}

#[tokio::test]
async fn test_smtp_password_survives_masking() {
    let (keycloak, service) = setup();

    let created = service.create_realm(&smtp_realm("mail")).await.unwrap();
    let auth = created.smtp_server.unwrap().auth.unwrap();
    assert_eq!(auth.password, "hunter2");

    let raw = keycloak.find_realm("mail").await.unwrap();
    assert_eq!(
        raw.smtp_server.unwrap().auth.unwrap().password,
        "**********"
    );
}

#[tokio::test]
async fn test_update_realm() {
    let (_, service) = setup();
    let mut realm = service.create_realm(&Realm::new("r1")).await.unwrap();

    realm.registration_allowed = true;
    realm.internationalization = Some(Internationalization {
        supported_locales: vec!["en".to_string(), "de".to_string()],
        default_locale: "en".to_string(),
    });
    let updated = service.update_realm(&realm).await.unwrap();
    assert!(updated.registration_allowed);
    assert_eq!(updated.id.as_deref(), Some("r1"));
}

#[tokio::test]
async fn test_invalid_default_locale_is_rejected_before_any_request() {
    let (keycloak, service) = setup();
    let mut realm = Realm::new("r1");
    realm.internationalization = Some(Internationalization {
        supported_locales: vec!["en".to_string()],
        default_locale: "fr".to_string(),
    });

    let err = service.create_realm(&realm).await.unwrap_err();
    assert!(err.to_string().starts_with("validation error: "));
    assert!(!keycloak.realm_names().contains(&"r1".to_string()));
}

#[tokio::test]
async fn test_delete_realm_is_idempotent() {
    let (_, service) = setup();
    service.create_realm(&Realm::new("r1")).await.unwrap();

    service.delete_realm("r1").await.unwrap();
    service.delete_realm("r1").await.unwrap();
    assert!(service.get_realm("r1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_server_errors_are_not_swallowed() {
    let (keycloak, service) = setup();
    keycloak.set_should_fail(true);

    let err = service.get_realm("master").await.unwrap_err();
    assert!(!err.is_not_found());
    assert!(service.delete_realm("master").await.is_err());
}
