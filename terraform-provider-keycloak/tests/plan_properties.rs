use proptest::prelude::*;
use serde_json::{json, Map, Value};
use terraform_provider_keycloak::resource::DynamicResource;
use terraform_provider_keycloak::resources::{protocol_mapper, realm::realm_schema};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

proptest! {
    /// Property: respelling a lifespan never shows up as a change
    #[test]
    fn respelled_lifespans_keep_prior_state(minutes in 1i64..100_000) {
        let schema = realm_schema();
        let prior = object(json!({
            "id": "r1",
            "realm": "r1",
            "access_token_lifespan": format!("{}s", minutes * 60),
        }));
        let mut proposed = object(json!({
            "realm": "r1",
            "access_token_lifespan": format!("{minutes}m"),
        }));

        prop_assert!(schema.requires_replace(&prior, &proposed).is_empty());
        schema.carry_forward(&prior, &mut proposed);
        prop_assert_eq!(&proposed["access_token_lifespan"], &prior["access_token_lifespan"]);
        prop_assert_eq!(&proposed["id"], &json!("r1"));
    }

    /// Property: renaming a realm always forces replacement
    #[test]
    fn realm_renames_force_replacement(old in "[a-z][a-z0-9-]{0,20}", new in "[a-z][a-z0-9-]{0,20}") {
        prop_assume!(old != new);
        let schema = realm_schema();
        let prior = object(json!({ "realm": old }));
        let proposed = object(json!({ "realm": new }));

        prop_assert_eq!(schema.requires_replace(&prior, &proposed), vec!["realm".to_string()]);
    }

    /// Property: setting both mapper parents is rejected for every mapper type
    #[test]
    fn both_parents_conflict(client in "[a-f0-9]{8}", scope in "[a-f0-9]{8}") {
        for resource in protocol_mapper::resources() {
            let schema = resource.schema();
            let values = object(json!({ "client_id": client, "client_scope_id": scope }));
            let conflicts: Vec<_> = schema
                .validate(&values)
                .into_iter()
                .filter(|d| d.summary == "\"client_id\": conflicts with client_scope_id")
                .collect();
            prop_assert_eq!(conflicts.len(), 1, "{}", resource.type_name());
        }
    }
}
