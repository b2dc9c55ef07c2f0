use keycloak_domain::{
    application::services::ProtocolMapperManagementService,
    domain::{
        entities::{
            AudienceMapper, GroupMembershipMapper, HardcodedClaimMapper, MapperParent,
            ProtocolMapper, SamlAttribute, SamlUserPropertyMapper, TokenClaims,
        },
        errors::DomainError,
        values::{parse_protocol_mapper_import_id, protocol_mapper_import_id},
    },
    testing::InMemoryKeycloak,
};
use std::sync::Arc;

struct Fixture {
    service: ProtocolMapperManagementService,
    client: MapperParent,
    scope: MapperParent,
}

fn setup() -> Fixture {
    let keycloak = Arc::new(InMemoryKeycloak::new());
    let client = MapperParent::Client(keycloak.seed_client("master", "c1"));
    let scope = MapperParent::ClientScope(keycloak.seed_client_scope("master", "profile"));
    Fixture {
        service: ProtocolMapperManagementService::new(keycloak),
        client,
        scope,
    }
}

fn hardcoded(parent: &MapperParent, name: &str) -> ProtocolMapper<HardcodedClaimMapper> {
    ProtocolMapper::new(
        "master".to_string(),
        parent.clone(),
        name.to_string(),
        HardcodedClaimMapper {
            claim_name: "foo".to_string(),
            claim_value: "bar".to_string(),
            tokens: TokenClaims {
                add_to_id_token: true,
                add_to_access_token: true,
                add_to_userinfo: true,
            },
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_create_mapper_on_client() {
    let fixture = setup();

    let created = fixture
        .service
        .create_protocol_mapper(&hardcoded(&fixture.client, "m1"))
        .await
        .unwrap();
    let id = created.id.clone().unwrap();
    assert_eq!(created.kind.claim_value_type, "String");
    assert!(created.kind.tokens.add_to_userinfo);

    let read = fixture
        .service
        .get_protocol_mapper::<HardcodedClaimMapper>("master", &fixture.client, &id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(read, created);
}

#[tokio::test]
async fn test_duplicate_name_on_same_client_is_rejected() {
    let fixture = setup();
    fixture
        .service
        .create_protocol_mapper(&hardcoded(&fixture.client, "m1"))
        .await
        .unwrap();

    let err = fixture
        .service
        .create_protocol_mapper(&hardcoded(&fixture.client, "m1"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "validation error: a protocol mapper with name m1 already exists for this client"
    );

    // Same name under a different parent is fine.
    fixture
        .service
        .create_protocol_mapper(&hardcoded(&fixture.scope, "m1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_keeps_own_name() {
    let fixture = setup();
    let mut mapper = fixture
        .service
        .create_protocol_mapper(&hardcoded(&fixture.client, "m1"))
        .await
        .unwrap();

    mapper.kind.claim_value = "baz".to_string();
    let updated = fixture.service.update_protocol_mapper(&mapper).await.unwrap();
    assert_eq!(updated.kind.claim_value, "baz");
    assert_eq!(updated.id, mapper.id);
}

#[tokio::test]
async fn test_rename_onto_sibling_is_rejected() {
    let fixture = setup();
    fixture
        .service
        .create_protocol_mapper(&hardcoded(&fixture.client, "m1"))
        .await
        .unwrap();
    let mut second = fixture
        .service
        .create_protocol_mapper(&hardcoded(&fixture.client, "m2"))
        .await
        .unwrap();

    second.name = "m1".to_string();
    let err = fixture
        .service
        .update_protocol_mapper(&second)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
}

#[tokio::test]
async fn test_invalid_claim_value_type() {
    let fixture = setup();
    let mut mapper = hardcoded(&fixture.client, "m1");
    mapper.kind.claim_value_type = "float".to_string();

    let err = fixture
        .service
        .create_protocol_mapper(&mapper)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "expected claim_value_type to be one of [JSON String long int boolean], got float"
    );
}

#[tokio::test]
async fn test_audience_mapper_exclusivity() {
    let fixture = setup();
    let mapper = |kind: AudienceMapper| {
        ProtocolMapper::new(
            "master".to_string(),
            fixture.client.clone(),
            "audience".to_string(),
            kind,
        )
    };

    let err = fixture
        .service
        .create_protocol_mapper(&mapper(AudienceMapper::default()))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "validation error: one of IncludedClientAudience or IncludedCustomAudience must be set"
    );

    let err = fixture
        .service
        .create_protocol_mapper(&mapper(AudienceMapper {
            included_client_audience: Some("c1".to_string()),
            included_custom_audience: Some("custom".to_string()),
            ..Default::default()
        }))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict { .. }));

    let created = fixture
        .service
        .create_protocol_mapper(&mapper(AudienceMapper {
            included_custom_audience: Some("custom".to_string()),
            add_to_access_token: true,
            ..Default::default()
        }))
        .await
        .unwrap();
    assert_eq!(created.kind.included_client_audience, None);
}

#[tokio::test]
async fn test_mapper_on_missing_client_is_not_found() {
    let fixture = setup();
    let parent = MapperParent::Client("does-not-exist".to_string());

    let err = fixture
        .service
        .create_protocol_mapper(&hardcoded(&parent, "m1"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let missing = fixture
        .service
        .get_protocol_mapper::<HardcodedClaimMapper>("master", &parent, "x")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_saml_mapper_on_client_scope() {
    let fixture = setup();
    let mapper = ProtocolMapper::new(
        "master".to_string(),
        fixture.scope.clone(),
        "email".to_string(),
        SamlUserPropertyMapper {
            user_property: "email".to_string(),
            attribute: SamlAttribute {
                friendly_name: Some("Email".to_string()),
                saml_attribute_name: "email".to_string(),
                saml_attribute_name_format: "Basic".to_string(),
            },
        },
    );

    let created = fixture.service.create_protocol_mapper(&mapper).await.unwrap();
    assert_eq!(created.kind, mapper.kind);
    assert_eq!(created.to_generic().protocol, "saml");
}

#[tokio::test]
async fn test_import_id_locates_mapper() {
    let fixture = setup();
    let mapper = ProtocolMapper::new(
        "master".to_string(),
        fixture.client.clone(),
        "groups".to_string(),
        GroupMembershipMapper {
            claim_name: "groups".to_string(),
            full_path: true,
            ..Default::default()
        },
    );
    let created = fixture.service.create_protocol_mapper(&mapper).await.unwrap();
    let id = created.id.clone().unwrap();

    let import_id = protocol_mapper_import_id("master", &fixture.client, &id);
    let parsed = parse_protocol_mapper_import_id(&import_id).unwrap();
    assert_eq!(parsed.parent, fixture.client);

    let imported = fixture
        .service
        .get_protocol_mapper::<GroupMembershipMapper>(
            &parsed.realm_id,
            &parsed.parent,
            &parsed.mapper_id,
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(imported, created);
}

#[tokio::test]
async fn test_delete_mapper_is_idempotent() {
    let fixture = setup();
    let created = fixture
        .service
        .create_protocol_mapper(&hardcoded(&fixture.client, "m1"))
        .await
        .unwrap();
    let id = created.id.unwrap();

    fixture
        .service
        .delete_protocol_mapper("master", &fixture.client, &id)
        .await
        .unwrap();
    fixture
        .service
        .delete_protocol_mapper("master", &fixture.client, &id)
        .await
        .unwrap();
}
