//! Serde adapter for booleans that Keycloak stores as strings.
//!
//! Identity-provider config and the realm SMTP settings are flat
//! `string -> string` maps on the Keycloak side, so a flag travels as
//! `"true"` / `"false"`. Use it per field:
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use keycloak_domain::domain::values::quoted_bool;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Config {
//!     #[serde(with = "quoted_bool", default)]
//!     hide_on_login_page: bool,
//! }
//!
//! let json = serde_json::to_string(&Config { hide_on_login_page: true }).unwrap();
//! assert_eq!(json, r#"{"hide_on_login_page":"true"}"#);
//! ```
//!
//! Reads accept `"true"`, `"false"`, the empty string (false) and native JSON
//! booleans.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(if *value { "true" } else { "false" })
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(QuotedBoolVisitor)
}

/// Parses the string form; `None` for anything that is not a boolean.
pub fn parse(value: &str) -> Option<bool> {
    match value.trim() {
        "" => Some(false),
        v if v.eq_ignore_ascii_case("true") => Some(true),
        v if v.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

pub fn to_string(value: bool) -> String {
    value.to_string()
}

struct QuotedBoolVisitor;

impl<'de> Visitor<'de> for QuotedBoolVisitor {
    type Value = bool;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a boolean or one of the strings \"true\", \"false\", \"\"")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
        Ok(value)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<bool, E> {
        parse(value).ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
        Ok(false)
    }

    fn visit_none<E: de::Error>(self) -> Result<bool, E> {
        Ok(false)
    }
}

/// Same encoding for `Option<bool>`; `None` is left out by the caller via
/// `skip_serializing_if`.
pub mod option {
    use super::QuotedBoolVisitor;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => super::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OptionVisitor;

        impl<'de> Visitor<'de> for OptionVisitor {
            type Value = Option<bool>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an optional quoted boolean")
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
            where
                D2: Deserializer<'de>,
            {
                deserializer.deserialize_any(QuotedBoolVisitor).map(Some)
            }
        }

        deserializer.deserialize_option(OptionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Flags {
        #[serde(with = "super", default)]
        enabled: bool,
        #[serde(
            with = "super::option",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        optional: Option<bool>,
    }

    #[test]
    fn writes_strings() {
        let json = serde_json::to_value(Flags {
            enabled: false,
            optional: Some(true),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"enabled": "false", "optional": "true"}));
    }

    #[test]
    fn reads_strings_empty_and_native_bools() {
        let flags: Flags = serde_json::from_str(r#"{"enabled":"true"}"#).unwrap();
        assert!(flags.enabled);
        assert_eq!(flags.optional, None);

        let flags: Flags = serde_json::from_str(r#"{"enabled":"","optional":false}"#).unwrap();
        assert!(!flags.enabled);
        assert_eq!(flags.optional, Some(false));

        let flags: Flags = serde_json::from_str(r#"{"enabled":true}"#).unwrap();
        assert!(flags.enabled);
    }

    #[test]
    fn rejects_non_boolean_strings() {
        assert!(serde_json::from_str::<Flags>(r#"{"enabled":"yes"}"#).is_err());
    }
}
