/*!
# Keycloak Domain

Domain layer of the Keycloak Terraform provider, laid out with hexagonal
architecture principles.

This crate provides:
- Domain models for the managed Keycloak objects (realms, OpenID clients,
  identity providers, LDAP user federation, protocol mappers)
- Value codecs shared by those models (duration strings, string-encoded
  booleans, import identifiers)
- Port definitions for the Keycloak admin API and configuration
- Application services implementing the create/read/update/delete use cases
- Infrastructure adapters backed by the `keycloak` admin client

## Architecture

```text
┌─────────────────────────────────────────────────────────────┐
│                    Primary Adapter                          │
├─────────────────────────────────────────────────────────────┤
│        Terraform provider (resources and data sources)      │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│                Application Layer                            │
├─────────────────────────────────────────────────────────────┤
│  • RealmManagementService     • ClientManagementService     │
│  • IdentityProviderManagementService                        │
│  • UserFederationManagementService                          │
│  • ProtocolMapperManagementService                          │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│                 Domain Layer (Ports)                        │
├─────────────────────────────────────────────────────────────┤
│  • KeycloakRepository         • ConfigurationPort           │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│              Infrastructure Layer (Adapters)                │
├─────────────────────────────────────────────────────────────┤
│  • KeycloakRestAdapter        • EnvConfigurationAdapter     │
└─────────────────────────────────────────────────────────────┘
```

## Features

- `testing`: Enable the in-memory Keycloak used by test suites

## Usage

```rust,ignore
use keycloak_domain::{
    application::ports::AppConfig,
    application::services::RealmManagementService,
    domain::entities::Realm,
    infrastructure::adapters::KeycloakRestAdapter,
};

let config = AppConfig::from_env()?;
let adapter = KeycloakRestAdapter::connect(&config.keycloak, &config.http).await?;
let realms = RealmManagementService::new(Arc::new(adapter));

let realm = realms.create_realm(&Realm::new("my-realm")).await?;
```
*/

pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(feature = "testing")]
pub mod testing;

// Re-export commonly used types
pub use application::ports::*;
pub use application::services::*;
pub use domain::entities::*;
pub use domain::errors::*;
