pub mod client_management;
pub mod identity_provider_management;
pub mod protocol_mapper_management;
pub mod realm_management;
pub mod user_federation_management;

pub use client_management::*;
pub use identity_provider_management::*;
pub use protocol_mapper_management::*;
pub use realm_management::*;
pub use user_federation_management::*;

use crate::domain::errors::DomainResult;

/// Turns a not-found lookup into `Ok(None)`.
pub(crate) fn found<T>(result: DomainResult<T>) -> DomainResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Deleting something that is already gone counts as success.
pub(crate) fn tolerate_missing(result: DomainResult<()>) -> DomainResult<()> {
    match result {
        Err(err) if err.is_not_found() => Ok(()),
        other => other,
    }
}
