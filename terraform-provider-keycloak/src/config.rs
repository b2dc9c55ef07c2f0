use keycloak_domain::application::ports::AppConfig;
use serde::{Deserialize, Serialize};

/// Attributes of the `provider "keycloak"` block. Anything set here wins
/// over the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub url: Option<String>,
    pub realm: Option<String>,
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub base_path: Option<String>,
    /// Seconds.
    pub client_timeout: Option<u64>,
}

impl ProviderConfig {
    pub fn merge_into(self, mut config: AppConfig) -> AppConfig {
        fn set(target: &mut String, value: Option<String>) {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                *target = value;
            }
        }

        set(&mut config.keycloak.url, self.url);
        set(&mut config.keycloak.realm, self.realm);
        set(&mut config.keycloak.client_id, self.client_id);
        set(&mut config.keycloak.username, self.username);
        set(&mut config.keycloak.password, self.password);
        set(&mut config.keycloak.base_path, self.base_path);
        if let Some(timeout) = self.client_timeout {
            config.http.timeout_seconds = timeout;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_block_overrides_environment() {
        let env = AppConfig::from_lookup(|key| match key {
            "KEYCLOAK_URL" => Some("http://env:8080".to_string()),
            "KEYCLOAK_USER" => Some("env-admin".to_string()),
            "KEYCLOAK_PASSWORD" => Some("env-pass".to_string()),
            _ => None,
        })
        .unwrap();

        let merged = ProviderConfig {
            url: Some("https://block:8443".to_string()),
            client_timeout: Some(30),
            username: Some(String::new()),
            ..Default::default()
        }
        .merge_into(env);

        assert_eq!(merged.keycloak.url, "https://block:8443");
        assert_eq!(merged.keycloak.username, "env-admin");
        assert_eq!(merged.keycloak.realm, "master");
        assert_eq!(merged.http.timeout_seconds, 30);
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn missing_values_name_the_key() {
        let merged = ProviderConfig {
            url: Some("http://localhost:8080".to_string()),
            ..Default::default()
        }
        .merge_into(AppConfig::from_lookup(|_| None).unwrap());

        let err = merged.validate().unwrap_err();
        assert!(err.to_string().contains("KEYCLOAK_USER"), "{err}");
    }
}
