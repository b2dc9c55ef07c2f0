use keycloak_domain::domain::{
    entities::{LdapUserFederation, SmtpServer},
    values::{
        durations_equivalent, format_duration_seconds, parse_duration_seconds,
        parse_identity_provider_import_id, quoted_bool,
    },
};
use proptest::prelude::*;

/// Property-based tests for the value codecs shared by the resources

mod duration_properties {
    use super::*;

    proptest! {
        /// Property: formatting then parsing gives back the same number of seconds
        #[test]
        fn formatted_durations_parse_back(seconds in -10_000_000i64..10_000_000) {
            let formatted = format_duration_seconds(seconds);
            prop_assert_eq!(parse_duration_seconds(&formatted).unwrap(), seconds);
        }

        /// Property: minutes and seconds spellings of the same span are equivalent
        #[test]
        fn unit_spellings_are_equivalent(minutes in 0i64..100_000) {
            let in_minutes = format!("{minutes}m");
            let in_seconds = format!("{}s", minutes * 60);
            prop_assert!(durations_equivalent(&in_minutes, &in_seconds));
        }

        /// Property: a number without a unit is never a valid duration
        #[test]
        fn bare_numbers_are_rejected(n in 1u32..1_000_000) {
            let err = parse_duration_seconds(&n.to_string()).unwrap_err();
            prop_assert!(err.to_string().starts_with("validation error: "));
        }
    }
}

mod quoted_bool_properties {
    use super::*;

    proptest! {
        /// Property: string form of a bool parses back to the same bool
        #[test]
        fn string_form_parses_back(value in any::<bool>()) {
            prop_assert_eq!(quoted_bool::parse(&quoted_bool::to_string(value)), Some(value));
        }

        /// Property: SMTP flags survive the Keycloak config map
        #[test]
        fn smtp_flags_survive_config_map(starttls in any::<bool>(), ssl in any::<bool>()) {
            let smtp = SmtpServer {
                host: "smtp.example.com".to_string(),
                from: "noreply@example.com".to_string(),
                starttls,
                ssl,
                ..Default::default()
            };
            let map = smtp.to_config_map().unwrap();
            prop_assert_eq!(map["starttls"].as_str(), if starttls { "true" } else { "false" });
            let back = SmtpServer::from_config_map(&map).unwrap().unwrap();
            prop_assert_eq!(back, smtp);
        }
    }
}

mod entity_properties {
    use super::*;

    proptest! {
        /// Property: any alias without a slash imports to itself
        #[test]
        fn identity_provider_import_ids(realm in "[a-z0-9-]{1,20}", alias in "[a-zA-Z0-9_-]{1,20}") {
            let (r, a) = parse_identity_provider_import_id(&format!("{realm}/{alias}")).unwrap();
            prop_assert_eq!(r, realm);
            prop_assert_eq!(a, alias);
        }

        /// Property: filters not wrapped in parentheses are rejected
        #[test]
        fn unwrapped_search_filters_fail(filter in "[a-z=]{1,20}") {
            let federation = LdapUserFederation {
                realm_id: "r1".to_string(),
                name: "ldap".to_string(),
                custom_user_search_filter: Some(filter),
                ..Default::default()
            };
            prop_assert!(federation.validate().is_err());
        }
    }
}
