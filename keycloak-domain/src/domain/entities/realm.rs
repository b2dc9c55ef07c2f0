use crate::domain::errors::{ensure_one_of, DomainError, DomainResult};
use crate::domain::values::quoted_bool;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Domain entity representing a Keycloak realm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Realm {
    /// Internal id assigned by Keycloak; the realm name is the public key.
    pub id: Option<String>,
    pub realm: String,
    pub enabled: bool,
    pub display_name: Option<String>,
    pub display_name_html: Option<String>,

    // Login settings
    pub registration_allowed: bool,
    pub registration_email_as_username: bool,
    pub edit_username_allowed: bool,
    pub reset_password_allowed: bool,
    pub remember_me: bool,
    pub verify_email: bool,
    pub login_with_email_allowed: bool,
    pub duplicate_emails_allowed: bool,
    pub ssl_required: Option<SslRequired>,

    pub login_theme: Option<String>,
    pub account_theme: Option<String>,
    pub admin_theme: Option<String>,
    pub email_theme: Option<String>,

    pub refresh_token_max_reuse: Option<i32>,
    pub lifespans: RealmLifespans,

    pub smtp_server: Option<SmtpServer>,
    pub internationalization: Option<Internationalization>,
    pub security_headers: Option<BrowserSecurityHeaders>,
    pub password_policy: Option<String>,
    pub flows: RealmFlowBindings,
    pub attributes: BTreeMap<String, String>,
}

/// Token and session lifespans, all in seconds. `None` leaves Keycloak's
/// value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmLifespans {
    pub sso_session_idle_timeout: Option<i32>,
    pub sso_session_max_lifespan: Option<i32>,
    pub offline_session_idle_timeout: Option<i32>,
    pub offline_session_max_lifespan: Option<i32>,
    pub access_token_lifespan: Option<i32>,
    pub access_token_lifespan_for_implicit_flow: Option<i32>,
    pub access_code_lifespan: Option<i32>,
    pub access_code_lifespan_login: Option<i32>,
    pub access_code_lifespan_user_action: Option<i32>,
    pub action_token_generated_by_user_lifespan: Option<i32>,
    pub action_token_generated_by_admin_lifespan: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpServer {
    pub host: String,
    pub port: Option<String>,
    pub from: String,
    pub from_display_name: Option<String>,
    pub reply_to: Option<String>,
    pub reply_to_display_name: Option<String>,
    pub envelope_from: Option<String>,
    pub starttls: bool,
    pub ssl: bool,
    pub auth: Option<SmtpAuth>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Internationalization {
    pub supported_locales: Vec<String>,
    pub default_locale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSecurityHeaders {
    pub content_security_policy: String,
    pub content_security_policy_report_only: String,
    pub x_content_type_options: String,
    pub x_frame_options: String,
    pub x_robots_tag: String,
    pub x_xss_protection: String,
    pub strict_transport_security: String,
}

impl BrowserSecurityHeaders {
    /// Header name -> value, keyed the way Keycloak's
    /// `browserSecurityHeaders` map expects.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        [
            ("contentSecurityPolicy", &self.content_security_policy),
            (
                "contentSecurityPolicyReportOnly",
                &self.content_security_policy_report_only,
            ),
            ("xContentTypeOptions", &self.x_content_type_options),
            ("xFrameOptions", &self.x_frame_options),
            ("xRobotsTag", &self.x_robots_tag),
            ("xXSSProtection", &self.x_xss_protection),
            ("strictTransportSecurity", &self.strict_transport_security),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
    }

    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).cloned().unwrap_or_default();
        Self {
            content_security_policy: get("contentSecurityPolicy"),
            content_security_policy_report_only: get("contentSecurityPolicyReportOnly"),
            x_content_type_options: get("xContentTypeOptions"),
            x_frame_options: get("xFrameOptions"),
            x_robots_tag: get("xRobotsTag"),
            x_xss_protection: get("xXSSProtection"),
            strict_transport_security: get("strictTransportSecurity"),
        }
    }
}

/// Authentication flow aliases bound to the realm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmFlowBindings {
    pub browser_flow: Option<String>,
    pub registration_flow: Option<String>,
    pub direct_grant_flow: Option<String>,
    pub reset_credentials_flow: Option<String>,
    pub client_authentication_flow: Option<String>,
    pub docker_authentication_flow: Option<String>,
}

/// SSL requirement levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SslRequired {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "external")]
    #[default]
    External,
    #[serde(rename = "none")]
    None,
}

impl SslRequired {
    pub const VALUES: &'static [&'static str] = &["none", "external", "all"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SslRequired::All => "all",
            SslRequired::External => "external",
            SslRequired::None => "none",
        }
    }

    pub fn parse(value: &str) -> DomainResult<Self> {
        match value {
            "all" => Ok(SslRequired::All),
            "external" => Ok(SslRequired::External),
            "none" => Ok(SslRequired::None),
            other => Err(DomainError::invalid_value("ssl_required", Self::VALUES, other)),
        }
    }
}

impl Realm {
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            enabled: true,
            ..Default::default()
        }
    }

    /// Validate realm settings before they are sent to Keycloak
    pub fn validate(&self) -> DomainResult<()> {
        if self.realm.is_empty() {
            return Err(DomainError::validation("realm name must not be empty"));
        }

        if let Some(smtp) = &self.smtp_server {
            smtp.validate()?;
        }

        if let Some(i18n) = &self.internationalization {
            i18n.validate()?;
        }

        if let Some(ssl) = &self.ssl_required {
            ensure_one_of("ssl_required", ssl.as_str(), SslRequired::VALUES)?;
        }

        Ok(())
    }

    /// Check if realm is the master realm
    pub fn is_master_realm(&self) -> bool {
        self.realm == "master"
    }
}

/// Keycloak's `smtpServer` map. Flags travel as quoted booleans.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SmtpServerWire {
    host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<String>,
    from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    envelope_from: Option<String>,
    #[serde(with = "quoted_bool")]
    starttls: bool,
    #[serde(with = "quoted_bool")]
    ssl: bool,
    #[serde(with = "quoted_bool")]
    auth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
}

impl SmtpServer {
    pub fn to_config_map(&self) -> DomainResult<BTreeMap<String, String>> {
        let wire = SmtpServerWire {
            host: self.host.clone(),
            port: self.port.clone(),
            from: self.from.clone(),
            from_display_name: self.from_display_name.clone(),
            reply_to: self.reply_to.clone(),
            reply_to_display_name: self.reply_to_display_name.clone(),
            envelope_from: self.envelope_from.clone(),
            starttls: self.starttls,
            ssl: self.ssl,
            auth: self.auth.is_some(),
            user: self.auth.as_ref().map(|auth| auth.username.clone()),
            password: self.auth.as_ref().map(|auth| auth.password.clone()),
        };
        Ok(serde_json::from_value(serde_json::to_value(wire)?)?)
    }

    /// `None` when Keycloak has no SMTP server configured.
    pub fn from_config_map(map: &BTreeMap<String, String>) -> DomainResult<Option<Self>> {
        if map.get("host").map_or(true, |host| host.is_empty()) {
            return Ok(None);
        }

        let wire: SmtpServerWire = serde_json::from_value(serde_json::to_value(map)?)?;
        let auth = wire.auth.then(|| SmtpAuth {
            username: wire.user.clone().unwrap_or_default(),
            password: wire.password.clone().unwrap_or_default(),
        });

        Ok(Some(SmtpServer {
            host: wire.host,
            port: wire.port,
            from: wire.from,
            from_display_name: wire.from_display_name,
            reply_to: wire.reply_to,
            reply_to_display_name: wire.reply_to_display_name,
            envelope_from: wire.envelope_from,
            starttls: wire.starttls,
            ssl: wire.ssl,
            auth,
        }))
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.host.is_empty() {
            return Err(DomainError::validation("smtp_server.host must be set"));
        }
        if self.from.is_empty() {
            return Err(DomainError::validation("smtp_server.from must be set"));
        }
        if let Some(auth) = &self.auth {
            if auth.username.is_empty() || auth.password.is_empty() {
                return Err(DomainError::validation(
                    "smtp_server.auth requires both username and password",
                ));
            }
        }
        Ok(())
    }
}

impl Internationalization {
    pub fn validate(&self) -> DomainResult<()> {
        if !self.supported_locales.contains(&self.default_locale) {
            return Err(DomainError::validation(format!(
                "the default_locale {} must be one of the supported_locales",
                self.default_locale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_realm_is_enabled() {
        let realm = Realm::new("r1");
        assert!(realm.enabled);
        assert!(realm.validate().is_ok());
        assert!(!realm.is_master_realm());
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = Realm::new("").validate().unwrap_err();
        assert_eq!(err.to_string(), "validation error: realm name must not be empty");
    }

    #[test]
    fn smtp_auth_needs_both_credentials() {
        let realm = Realm {
            smtp_server: Some(SmtpServer {
                host: "mail.example.com".to_string(),
                from: "noreply@example.com".to_string(),
                auth: Some(SmtpAuth {
                    username: "mailer".to_string(),
                    password: String::new(),
                }),
                ..Default::default()
            }),
            ..Realm::new("r1")
        };
        assert!(matches!(realm.validate(), Err(DomainError::Validation { .. })));
    }

    #[test]
    fn default_locale_must_be_supported() {
        let mut realm = Realm::new("r1");
        realm.internationalization = Some(Internationalization {
            supported_locales: vec!["en".to_string(), "de".to_string()],
            default_locale: "fr".to_string(),
        });
        assert_eq!(
            realm.validate().unwrap_err().to_string(),
            "validation error: the default_locale fr must be one of the supported_locales"
        );
    }

    #[test]
    fn security_headers_map_round_trip() {
        let headers = BrowserSecurityHeaders {
            x_frame_options: "DENY".to_string(),
            x_robots_tag: "none".to_string(),
            ..Default::default()
        };
        let map = headers.to_map();
        assert_eq!(map["xFrameOptions"], "DENY");
        assert_eq!(BrowserSecurityHeaders::from_map(&map), headers);
    }

    #[test]
    fn smtp_server_uses_quoted_flags() {
        let smtp = SmtpServer {
            host: "mail.example.com".to_string(),
            port: Some("587".to_string()),
            from: "noreply@example.com".to_string(),
            starttls: true,
            auth: Some(SmtpAuth {
                username: "mailer".to_string(),
                password: "secret".to_string(),
            }),
            ..Default::default()
        };

        let map = smtp.to_config_map().unwrap();
        assert_eq!(map["starttls"], "true");
        assert_eq!(map["ssl"], "false");
        assert_eq!(map["auth"], "true");
        assert_eq!(map["user"], "mailer");
        assert!(!map.contains_key("replyTo"));

        assert_eq!(SmtpServer::from_config_map(&map).unwrap(), Some(smtp));
        assert_eq!(SmtpServer::from_config_map(&BTreeMap::new()).unwrap(), None);
    }

    #[test]
    fn ssl_required_parsing() {
        assert_eq!(SslRequired::parse("all").unwrap(), SslRequired::All);
        assert_eq!(
            SslRequired::parse("some").unwrap_err().to_string(),
            "expected ssl_required to be one of [none external all], got some"
        );
    }
}
