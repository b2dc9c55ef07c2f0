use super::{found, tolerate_missing};
use crate::{
    application::ports::*,
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Protocol mapper management service, generic over the mapper kind
pub struct ProtocolMapperManagementService {
    repository: Arc<dyn KeycloakRepository>,
}

impl ProtocolMapperManagementService {
    pub fn new(repository: Arc<dyn KeycloakRepository>) -> Self {
        Self { repository }
    }

    /// Kind-specific checks plus name uniqueness on the parent.
    ///
    /// Mappers are unique by name per client or client scope; the mapper
    /// being validated may keep its own name.
    #[instrument(skip(self, mapper), fields(realm = %mapper.realm_id, parent = %mapper.parent, name = %mapper.name))]
    pub async fn validate_protocol_mapper<K: ProtocolMapperKind>(
        &self,
        mapper: &ProtocolMapper<K>,
    ) -> DomainResult<()> {
        mapper.validate()?;

        let existing = self
            .repository
            .list_protocol_mappers(&mapper.realm_id, &mapper.parent)
            .await?;

        let duplicate = existing
            .iter()
            .any(|other| other.name == mapper.name && other.id != mapper.id);
        if duplicate {
            return Err(DomainError::validation(format!(
                "a protocol mapper with name {} already exists for this client",
                mapper.name
            )));
        }

        debug!("Protocol mapper '{}' is valid", mapper.name);
        Ok(())
    }

    #[instrument(skip(self), fields(realm = %realm_id, parent = %parent, id = %id))]
    pub async fn get_protocol_mapper<K: ProtocolMapperKind>(
        &self,
        realm_id: &str,
        parent: &MapperParent,
        id: &str,
    ) -> DomainResult<Option<ProtocolMapper<K>>> {
        let generic = found(
            self.repository
                .find_protocol_mapper(realm_id, parent, id)
                .await,
        )?;

        generic
            .map(|generic| {
                ProtocolMapper::from_generic(realm_id.to_string(), parent.clone(), &generic)
            })
            .transpose()
    }

    #[instrument(skip(self, mapper), fields(realm = %mapper.realm_id, parent = %mapper.parent, name = %mapper.name))]
    pub async fn create_protocol_mapper<K: ProtocolMapperKind>(
        &self,
        mapper: &ProtocolMapper<K>,
    ) -> DomainResult<ProtocolMapper<K>> {
        self.validate_protocol_mapper(mapper).await?;

        info!(
            "Creating protocol mapper '{}' ({})",
            mapper.name,
            mapper.kind.protocol_mapper()
        );
        let id = self
            .repository
            .create_protocol_mapper(&mapper.realm_id, &mapper.parent, &mapper.to_generic())
            .await?;

        info!("Created protocol mapper with ID '{}'", id);
        self.reload(mapper, &id).await
    }

    #[instrument(skip(self, mapper), fields(realm = %mapper.realm_id, parent = %mapper.parent, name = %mapper.name))]
    pub async fn update_protocol_mapper<K: ProtocolMapperKind>(
        &self,
        mapper: &ProtocolMapper<K>,
    ) -> DomainResult<ProtocolMapper<K>> {
        let id = mapper
            .id
            .clone()
            .ok_or_else(|| DomainError::validation("protocol mapper id must be set"))?;
        self.validate_protocol_mapper(mapper).await?;

        info!("Updating protocol mapper '{}'", id);
        self.repository
            .update_protocol_mapper(&mapper.realm_id, &mapper.parent, &mapper.to_generic())
            .await?;
        self.reload(mapper, &id).await
    }

    #[instrument(skip(self), fields(realm = %realm_id, parent = %parent, id = %id))]
    pub async fn delete_protocol_mapper(
        &self,
        realm_id: &str,
        parent: &MapperParent,
        id: &str,
    ) -> DomainResult<()> {
        info!("Deleting protocol mapper '{}'", id);
        tolerate_missing(
            self.repository
                .delete_protocol_mapper(realm_id, parent, id)
                .await,
        )
    }

    async fn reload<K: ProtocolMapperKind>(
        &self,
        mapper: &ProtocolMapper<K>,
        id: &str,
    ) -> DomainResult<ProtocolMapper<K>> {
        let generic = self
            .repository
            .find_protocol_mapper(&mapper.realm_id, &mapper.parent, id)
            .await?;
        ProtocolMapper::from_generic(mapper.realm_id.clone(), mapper.parent.clone(), &generic)
    }
}
