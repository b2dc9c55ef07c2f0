//! Terraform provider for Keycloak.
//!
//! The binary speaks a line-delimited JSON protocol on stdin/stdout (see
//! [`protocol`]) and maps each request onto a [`resource::Resource`] or
//! [`data_sources::DataSource`]. All Keycloak access goes through the
//! services of the `keycloak-domain` crate.

pub mod config;
pub mod data_sources;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod state;

pub use config::ProviderConfig;
pub use error::{ProviderError, ProviderResult};
pub use provider::KeycloakProvider;
pub use state::ProviderState;
