//! Value codecs shared by several entities: Keycloak duration fields,
//! string-encoded booleans and composite import identifiers.

pub mod duration;
pub mod import_id;
pub mod quoted_bool;

pub use duration::*;
pub use import_id::*;
