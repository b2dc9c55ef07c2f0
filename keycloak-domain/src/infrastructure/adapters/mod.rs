pub mod env_config;
pub mod keycloak_rest;

pub use env_config::*;
pub use keycloak_rest::*;
