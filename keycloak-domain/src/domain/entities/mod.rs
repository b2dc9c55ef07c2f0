pub mod identity_provider;
pub mod ldap_user_federation;
pub mod openid_client;
pub mod protocol_mapper;
pub mod realm;

pub use identity_provider::*;
pub use ldap_user_federation::*;
pub use openid_client::*;
pub use protocol_mapper::*;
pub use realm::*;

/// Value Keycloak returns in place of stored secrets.
pub const SECRET_MASK: &str = "**********";

/// Replaces a masked secret read back from Keycloak with the known value.
pub fn unmask_secret(value: &mut String, known: &str) {
    if value == SECRET_MASK && !known.is_empty() {
        *value = known.to_string();
    }
}
