use super::{duration_from_seconds, non_empty, seconds_from_duration};
use crate::resource::Resource;
use crate::schema::{Attribute, AttributeType, DiffSuppress, Schema};
use crate::state::ProviderState;
use async_trait::async_trait;
use keycloak_domain::application::services::restore_smtp_password;
use keycloak_domain::domain::{
    entities::{
        BrowserSecurityHeaders, Internationalization, Realm, RealmFlowBindings, RealmLifespans,
        SmtpAuth, SmtpServer, SslRequired,
    },
    errors::DomainResult,
    values::parse_realm_import_id,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TYPE_NAME: &str = "keycloak_realm";

/// Lifespan attributes, configured as duration strings.
const LIFESPANS: &[&str] = &[
    "sso_session_idle_timeout",
    "sso_session_max_lifespan",
    "offline_session_idle_timeout",
    "offline_session_max_lifespan",
    "access_token_lifespan",
    "access_token_lifespan_for_implicit_flow",
    "access_code_lifespan",
    "access_code_lifespan_login",
    "access_code_lifespan_user_action",
    "action_token_generated_by_user_lifespan",
    "action_token_generated_by_admin_lifespan",
];

const FLOWS: &[&str] = &[
    "browser_flow",
    "registration_flow",
    "direct_grant_flow",
    "reset_credentials_flow",
    "client_authentication_flow",
    "docker_authentication_flow",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealmModel {
    pub id: Option<String>,
    pub realm: String,
    pub internal_id: Option<String>,
    pub enabled: bool,
    pub display_name: Option<String>,
    pub display_name_html: Option<String>,

    pub registration_allowed: bool,
    pub registration_email_as_username: bool,
    pub edit_username_allowed: bool,
    pub reset_password_allowed: bool,
    pub remember_me: bool,
    pub verify_email: bool,
    pub login_with_email_allowed: bool,
    pub duplicate_emails_allowed: bool,
    pub ssl_required: Option<String>,

    pub login_theme: Option<String>,
    pub account_theme: Option<String>,
    pub admin_theme: Option<String>,
    pub email_theme: Option<String>,

    pub refresh_token_max_reuse: Option<i32>,
    pub sso_session_idle_timeout: Option<String>,
    pub sso_session_max_lifespan: Option<String>,
    pub offline_session_idle_timeout: Option<String>,
    pub offline_session_max_lifespan: Option<String>,
    pub access_token_lifespan: Option<String>,
    pub access_token_lifespan_for_implicit_flow: Option<String>,
    pub access_code_lifespan: Option<String>,
    pub access_code_lifespan_login: Option<String>,
    pub access_code_lifespan_user_action: Option<String>,
    pub action_token_generated_by_user_lifespan: Option<String>,
    pub action_token_generated_by_admin_lifespan: Option<String>,

    pub smtp_server: Option<SmtpServerModel>,
    pub internationalization: Option<InternationalizationModel>,
    pub security_defenses: Option<SecurityDefensesModel>,
    pub password_policy: Option<String>,

    pub browser_flow: Option<String>,
    pub registration_flow: Option<String>,
    pub direct_grant_flow: Option<String>,
    pub reset_credentials_flow: Option<String>,
    pub client_authentication_flow: Option<String>,
    pub docker_authentication_flow: Option<String>,

    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpServerModel {
    pub host: String,
    pub port: Option<String>,
    pub from: String,
    pub from_display_name: Option<String>,
    pub reply_to: Option<String>,
    pub reply_to_display_name: Option<String>,
    pub envelope_from: Option<String>,
    pub starttls: bool,
    pub ssl: bool,
    pub auth: Option<SmtpAuthModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpAuthModel {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternationalizationModel {
    pub supported_locales: Vec<String>,
    pub default_locale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityDefensesModel {
    pub headers: Option<HeadersModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadersModel {
    pub x_frame_options: String,
    pub content_security_policy: String,
    pub content_security_policy_report_only: String,
    pub x_content_type_options: String,
    pub x_robots_tag: String,
    pub x_xss_protection: String,
    pub strict_transport_security: String,
}

pub fn realm_schema() -> Schema {
    let mut schema = Schema::resource("A Keycloak realm")
        .attribute("realm", Attribute::string().required().force_new())
        .attribute("internal_id", Attribute::string().computed())
        .attribute("enabled", Attribute::bool().default(true))
        .attribute("display_name", Attribute::string())
        .attribute("display_name_html", Attribute::string())
        .attribute("registration_allowed", Attribute::bool().default(false))
        .attribute("registration_email_as_username", Attribute::bool().default(false))
        .attribute("edit_username_allowed", Attribute::bool().default(false))
        .attribute("reset_password_allowed", Attribute::bool().default(false))
        .attribute("remember_me", Attribute::bool().default(false))
        .attribute("verify_email", Attribute::bool().default(false))
        .attribute("login_with_email_allowed", Attribute::bool().default(true))
        .attribute("duplicate_emails_allowed", Attribute::bool().default(false))
        .attribute(
            "ssl_required",
            Attribute::string()
                .optional_computed()
                .one_of(SslRequired::VALUES)
                .diff_suppress(DiffSuppress::CaseInsensitive),
        )
        .attribute("login_theme", Attribute::string())
        .attribute("account_theme", Attribute::string())
        .attribute("admin_theme", Attribute::string())
        .attribute("email_theme", Attribute::string())
        .attribute("refresh_token_max_reuse", Attribute::int().optional_computed())
        .attribute("smtp_server", Attribute::object(smtp_server_schema()))
        .attribute(
            "internationalization",
            Attribute::object(
                Schema::new("")
                    .attribute(
                        "supported_locales",
                        Attribute::set(AttributeType::String).required(),
                    )
                    .attribute("default_locale", Attribute::string().required()),
            ),
        )
        .attribute(
            "security_defenses",
            Attribute::object(
                Schema::new("").attribute("headers", Attribute::object(headers_schema())),
            ),
        )
        .attribute("password_policy", Attribute::string())
        .attribute("attributes", Attribute::map(AttributeType::String));

    for name in LIFESPANS {
        schema = schema.attribute(name, Attribute::duration().optional_computed());
    }
    for name in FLOWS {
        schema = schema.attribute(name, Attribute::string().optional_computed());
    }
    schema
}

fn smtp_server_schema() -> Schema {
    Schema::new("")
        .attribute("host", Attribute::string().required())
        .attribute("port", Attribute::string())
        .attribute("from", Attribute::string().required())
        .attribute("from_display_name", Attribute::string())
        .attribute("reply_to", Attribute::string())
        .attribute("reply_to_display_name", Attribute::string())
        .attribute("envelope_from", Attribute::string())
        .attribute("starttls", Attribute::bool().default(false))
        .attribute("ssl", Attribute::bool().default(false))
        .attribute(
            "auth",
            Attribute::object(
                Schema::new("")
                    .attribute("username", Attribute::string().required())
                    .attribute("password", Attribute::string().required().sensitive()),
            ),
        )
}

fn headers_schema() -> Schema {
    Schema::new("")
        .attribute("x_frame_options", Attribute::string().default("SAMEORIGIN"))
        .attribute(
            "content_security_policy",
            Attribute::string().default("frame-src 'self'; frame-ancestors 'self'; object-src 'none';"),
        )
        .attribute("content_security_policy_report_only", Attribute::string().default(""))
        .attribute("x_content_type_options", Attribute::string().default("nosniff"))
        .attribute("x_robots_tag", Attribute::string().default("none"))
        .attribute("x_xss_protection", Attribute::string().default("1; mode=block"))
        .attribute(
            "strict_transport_security",
            Attribute::string().default("max-age=31536000; includeSubDomains"),
        )
}

impl RealmModel {
    pub fn to_entity(&self) -> DomainResult<Realm> {
        let ssl_required = non_empty(self.ssl_required.clone())
            .map(|ssl| SslRequired::parse(&ssl.to_lowercase()))
            .transpose()?;

        let lifespan = |field: &str, value: &Option<String>| seconds_from_duration(field, value.as_deref());

        Ok(Realm {
            id: self.internal_id.clone(),
            realm: self.realm.clone(),
            enabled: self.enabled,
            display_name: self.display_name.clone(),
            display_name_html: self.display_name_html.clone(),
            registration_allowed: self.registration_allowed,
            registration_email_as_username: self.registration_email_as_username,
            edit_username_allowed: self.edit_username_allowed,
            reset_password_allowed: self.reset_password_allowed,
            remember_me: self.remember_me,
            verify_email: self.verify_email,
            login_with_email_allowed: self.login_with_email_allowed,
            duplicate_emails_allowed: self.duplicate_emails_allowed,
            ssl_required,
            login_theme: non_empty(self.login_theme.clone()),
            account_theme: non_empty(self.account_theme.clone()),
            admin_theme: non_empty(self.admin_theme.clone()),
            email_theme: non_empty(self.email_theme.clone()),
            refresh_token_max_reuse: self.refresh_token_max_reuse,
            lifespans: RealmLifespans {
                sso_session_idle_timeout: lifespan("sso_session_idle_timeout", &self.sso_session_idle_timeout)?,
                sso_session_max_lifespan: lifespan("sso_session_max_lifespan", &self.sso_session_max_lifespan)?,
                offline_session_idle_timeout: lifespan(
                    "offline_session_idle_timeout",
                    &self.offline_session_idle_timeout,
                )?,
                offline_session_max_lifespan: lifespan(
                    "offline_session_max_lifespan",
                    &self.offline_session_max_lifespan,
                )?,
                access_token_lifespan: lifespan("access_token_lifespan", &self.access_token_lifespan)?,
                access_token_lifespan_for_implicit_flow: lifespan(
                    "access_token_lifespan_for_implicit_flow",
                    &self.access_token_lifespan_for_implicit_flow,
                )?,
                access_code_lifespan: lifespan("access_code_lifespan", &self.access_code_lifespan)?,
                access_code_lifespan_login: lifespan(
                    "access_code_lifespan_login",
                    &self.access_code_lifespan_login,
                )?,
                access_code_lifespan_user_action: lifespan(
                    "access_code_lifespan_user_action",
                    &self.access_code_lifespan_user_action,
                )?,
                action_token_generated_by_user_lifespan: lifespan(
                    "action_token_generated_by_user_lifespan",
                    &self.action_token_generated_by_user_lifespan,
                )?,
                action_token_generated_by_admin_lifespan: lifespan(
                    "action_token_generated_by_admin_lifespan",
                    &self.action_token_generated_by_admin_lifespan,
                )?,
            },
            smtp_server: self.smtp_server.as_ref().map(|smtp| SmtpServer {
                host: smtp.host.clone(),
                port: non_empty(smtp.port.clone()),
                from: smtp.from.clone(),
                from_display_name: non_empty(smtp.from_display_name.clone()),
                reply_to: non_empty(smtp.reply_to.clone()),
                reply_to_display_name: non_empty(smtp.reply_to_display_name.clone()),
                envelope_from: non_empty(smtp.envelope_from.clone()),
                starttls: smtp.starttls,
                ssl: smtp.ssl,
                auth: smtp.auth.as_ref().map(|auth| SmtpAuth {
                    username: auth.username.clone(),
                    password: auth.password.clone(),
                }),
            }),
            internationalization: self.internationalization.as_ref().map(|i18n| {
                Internationalization {
                    supported_locales: i18n.supported_locales.clone(),
                    default_locale: i18n.default_locale.clone(),
                }
            }),
            security_headers: self
                .security_defenses
                .as_ref()
                .and_then(|defenses| defenses.headers.as_ref())
                .map(|headers| BrowserSecurityHeaders {
                    content_security_policy: headers.content_security_policy.clone(),
                    content_security_policy_report_only: headers
                        .content_security_policy_report_only
                        .clone(),
                    x_content_type_options: headers.x_content_type_options.clone(),
                    x_frame_options: headers.x_frame_options.clone(),
                    x_robots_tag: headers.x_robots_tag.clone(),
                    x_xss_protection: headers.x_xss_protection.clone(),
                    strict_transport_security: headers.strict_transport_security.clone(),
                }),
            password_policy: non_empty(self.password_policy.clone()),
            flows: RealmFlowBindings {
                browser_flow: non_empty(self.browser_flow.clone()),
                registration_flow: non_empty(self.registration_flow.clone()),
                direct_grant_flow: non_empty(self.direct_grant_flow.clone()),
                reset_credentials_flow: non_empty(self.reset_credentials_flow.clone()),
                client_authentication_flow: non_empty(self.client_authentication_flow.clone()),
                docker_authentication_flow: non_empty(self.docker_authentication_flow.clone()),
            },
            attributes: self.attributes.clone(),
        })
    }

    /// State for a realm read back from Keycloak. `known` is the prior or
    /// planned state, used to keep duration spellings and to leave
    /// unmanaged blocks out of state.
    pub fn from_entity(realm: Realm, known: Option<&RealmModel>) -> Self {
        let lifespans = &realm.lifespans;
        let duration = |seconds: Option<i32>, pick: fn(&RealmModel) -> &Option<String>| {
            duration_from_seconds(seconds, known.and_then(|k| pick(k).as_ref()))
        };

        // Keycloak always reports security headers; only track them when
        // they are managed here, or on import.
        let track_headers = known.map_or(true, |k| k.security_defenses.is_some());

        RealmModel {
            id: Some(realm.realm.clone()),
            internal_id: realm.id.clone(),
            enabled: realm.enabled,
            display_name: realm.display_name.clone(),
            display_name_html: realm.display_name_html.clone(),
            registration_allowed: realm.registration_allowed,
            registration_email_as_username: realm.registration_email_as_username,
            edit_username_allowed: realm.edit_username_allowed,
            reset_password_allowed: realm.reset_password_allowed,
            remember_me: realm.remember_me,
            verify_email: realm.verify_email,
            login_with_email_allowed: realm.login_with_email_allowed,
            duplicate_emails_allowed: realm.duplicate_emails_allowed,
            ssl_required: realm.ssl_required.map(|ssl| ssl.as_str().to_string()),
            login_theme: realm.login_theme.clone(),
            account_theme: realm.account_theme.clone(),
            admin_theme: realm.admin_theme.clone(),
            email_theme: realm.email_theme.clone(),
            refresh_token_max_reuse: realm.refresh_token_max_reuse,
            sso_session_idle_timeout: duration(lifespans.sso_session_idle_timeout, |k| {
                &k.sso_session_idle_timeout
            }),
            sso_session_max_lifespan: duration(lifespans.sso_session_max_lifespan, |k| {
                &k.sso_session_max_lifespan
            }),
            offline_session_idle_timeout: duration(lifespans.offline_session_idle_timeout, |k| {
                &k.offline_session_idle_timeout
            }),
            offline_session_max_lifespan: duration(lifespans.offline_session_max_lifespan, |k| {
                &k.offline_session_max_lifespan
            }),
            access_token_lifespan: duration(lifespans.access_token_lifespan, |k| {
                &k.access_token_lifespan
            }),
            access_token_lifespan_for_implicit_flow: duration(
                lifespans.access_token_lifespan_for_implicit_flow,
                |k| &k.access_token_lifespan_for_implicit_flow,
            ),
            access_code_lifespan: duration(lifespans.access_code_lifespan, |k| {
                &k.access_code_lifespan
            }),
            access_code_lifespan_login: duration(lifespans.access_code_lifespan_login, |k| {
                &k.access_code_lifespan_login
            }),
            access_code_lifespan_user_action: duration(
                lifespans.access_code_lifespan_user_action,
                |k| &k.access_code_lifespan_user_action,
            ),
            action_token_generated_by_user_lifespan: duration(
                lifespans.action_token_generated_by_user_lifespan,
                |k| &k.action_token_generated_by_user_lifespan,
            ),
            action_token_generated_by_admin_lifespan: duration(
                lifespans.action_token_generated_by_admin_lifespan,
                |k| &k.action_token_generated_by_admin_lifespan,
            ),
            smtp_server: realm.smtp_server.as_ref().map(|smtp| SmtpServerModel {
                host: smtp.host.clone(),
                port: smtp.port.clone(),
                from: smtp.from.clone(),
                from_display_name: smtp.from_display_name.clone(),
                reply_to: smtp.reply_to.clone(),
                reply_to_display_name: smtp.reply_to_display_name.clone(),
                envelope_from: smtp.envelope_from.clone(),
                starttls: smtp.starttls,
                ssl: smtp.ssl,
                auth: smtp.auth.as_ref().map(|auth| SmtpAuthModel {
                    username: auth.username.clone(),
                    password: auth.password.clone(),
                }),
            }),
            internationalization: realm.internationalization.as_ref().map(|i18n| {
                InternationalizationModel {
                    supported_locales: i18n.supported_locales.clone(),
                    default_locale: i18n.default_locale.clone(),
                }
            }),
            security_defenses: realm
                .security_headers
                .as_ref()
                .filter(|_| track_headers)
                .map(|headers| SecurityDefensesModel {
                    headers: Some(HeadersModel {
                        x_frame_options: headers.x_frame_options.clone(),
                        content_security_policy: headers.content_security_policy.clone(),
                        content_security_policy_report_only: headers
                            .content_security_policy_report_only
                            .clone(),
                        x_content_type_options: headers.x_content_type_options.clone(),
                        x_robots_tag: headers.x_robots_tag.clone(),
                        x_xss_protection: headers.x_xss_protection.clone(),
                        strict_transport_security: headers.strict_transport_security.clone(),
                    }),
                }),
            password_policy: realm.password_policy.clone(),
            browser_flow: realm.flows.browser_flow.clone(),
            registration_flow: realm.flows.registration_flow.clone(),
            direct_grant_flow: realm.flows.direct_grant_flow.clone(),
            reset_credentials_flow: realm.flows.reset_credentials_flow.clone(),
            client_authentication_flow: realm.flows.client_authentication_flow.clone(),
            docker_authentication_flow: realm.flows.docker_authentication_flow.clone(),
            attributes: realm.attributes.clone(),
            realm: realm.realm,
        }
    }
}

pub struct RealmResource;

#[async_trait]
impl Resource for RealmResource {
    type Model = RealmModel;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        realm_schema()
    }

    fn validate(&self, model: &RealmModel) -> DomainResult<()> {
        model.to_entity()?.validate()
    }

    async fn create(&self, state: &ProviderState, planned: RealmModel) -> DomainResult<RealmModel> {
        let entity = planned.to_entity()?;
        let mut realm = state.realm_service.create_realm(&entity).await?;
        restore_smtp_password(&mut realm, &entity);
        Ok(RealmModel::from_entity(realm, Some(&planned)))
    }

    async fn read(&self, state: &ProviderState, current: RealmModel) -> DomainResult<Option<RealmModel>> {
        let name = current.id.clone().unwrap_or_else(|| current.realm.clone());
        let Some(mut realm) = state.realm_service.get_realm(&name).await? else {
            return Ok(None);
        };

        restore_smtp_password(&mut realm, &current.to_entity()?);
        Ok(Some(RealmModel::from_entity(realm, Some(&current))))
    }

    async fn update(
        &self,
        state: &ProviderState,
        _prior: RealmModel,
        planned: RealmModel,
    ) -> DomainResult<RealmModel> {
        let entity = planned.to_entity()?;
        let mut realm = state.realm_service.update_realm(&entity).await?;
        restore_smtp_password(&mut realm, &entity);
        Ok(RealmModel::from_entity(realm, Some(&planned)))
    }

    async fn delete(&self, state: &ProviderState, current: RealmModel) -> DomainResult<()> {
        state.realm_service.delete_realm(&current.realm).await
    }

    fn import(&self, id: &str) -> DomainResult<RealmModel> {
        let realm = parse_realm_import_id(id)?;
        Ok(RealmModel {
            id: Some(realm.clone()),
            realm,
            // Imported realms track whatever headers Keycloak reports.
            security_defenses: Some(SecurityDefensesModel::default()),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifespans_round_trip_through_seconds() {
        let model = RealmModel {
            realm: "r1".to_string(),
            enabled: true,
            access_token_lifespan: Some("1h30m".to_string()),
            sso_session_idle_timeout: Some("30m".to_string()),
            offline_session_idle_timeout: Some("0".to_string()),
            ..Default::default()
        };

        let realm = model.to_entity().unwrap();
        assert_eq!(realm.lifespans.access_token_lifespan, Some(5_400));
        assert_eq!(realm.lifespans.sso_session_idle_timeout, Some(1_800));
        assert_eq!(realm.lifespans.offline_session_idle_timeout, None);

        let read = RealmModel::from_entity(realm, None);
        assert_eq!(read.access_token_lifespan.as_deref(), Some("1h30m"));
        assert_eq!(read.sso_session_idle_timeout.as_deref(), Some("30m"));
        assert_eq!(read.id.as_deref(), Some("r1"));
    }

    #[test]
    fn invalid_ssl_required_is_rejected() {
        let model = RealmModel {
            realm: "r1".to_string(),
            ssl_required: Some("sometimes".to_string()),
            ..Default::default()
        };
        assert_eq!(
            model.to_entity().unwrap_err().to_string(),
            "expected ssl_required to be one of [none external all], got sometimes"
        );
    }

    #[test]
    fn unmanaged_security_headers_stay_out_of_state() {
        let mut realm = Realm::new("r1");
        realm.security_headers = Some(BrowserSecurityHeaders::default());

        let known = RealmModel {
            realm: "r1".to_string(),
            ..Default::default()
        };
        assert!(RealmModel::from_entity(realm.clone(), Some(&known)).security_defenses.is_none());
        assert!(RealmModel::from_entity(realm, None).security_defenses.is_some());
    }

    #[test]
    fn import_uses_the_realm_name() {
        let model = RealmResource.import("r1").unwrap();
        assert_eq!(model.realm, "r1");
        assert!(RealmResource.import("r1/extra").is_err());
    }

    #[test]
    fn imported_realms_track_security_headers() {
        let mut realm = Realm::new("r1");
        realm.security_headers = Some(BrowserSecurityHeaders::default());

        let seed = RealmResource.import("r1").unwrap();
        assert!(RealmModel::from_entity(realm, Some(&seed)).security_defenses.is_some());
    }
}
