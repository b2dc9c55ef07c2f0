//! Request dispatch for the provider plugin.
//!
//! Each line on stdin is one [`RpcRequest`]; [`KeycloakProvider::handle_request`]
//! answers it with one serialized [`RpcResponse`]. Failures of a resource
//! operation are reported as diagnostics inside a successful response; only
//! malformed envelopes and unknown methods produce protocol errors.

use crate::config::ProviderConfig;
use crate::data_sources::{all_data_sources, DataSource};
use crate::error::{ProviderError, ProviderResult};
use crate::protocol::{
    object_param, string_param, RpcRequest, RpcResponse, INTERNAL_ERROR, METHOD_NOT_FOUND,
    PARSE_ERROR,
};
use crate::resource::{DynamicResource, ResourceData};
use crate::resources::all_resources;
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::state::ProviderState;
use keycloak_domain::{
    application::ports::KeycloakRepository, infrastructure::adapters::EnvConfigurationAdapter,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub fn provider_schema() -> Schema {
    Schema::new("Manages Keycloak through its admin REST API")
        .attribute(
            "url",
            Attribute::string().describe("Base URL of the Keycloak server, falls back to KEYCLOAK_URL"),
        )
        .attribute("realm", Attribute::string().describe("Realm used to log in, defaults to master"))
        .attribute("client_id", Attribute::string())
        .attribute("username", Attribute::string())
        .attribute("password", Attribute::string().sensitive())
        .attribute(
            "base_path",
            Attribute::string().describe("Path prefix, e.g. /auth for legacy distributions"),
        )
        .attribute(
            "client_timeout",
            Attribute::int().describe("Request timeout in seconds"),
        )
}

pub struct KeycloakProvider {
    state: RwLock<Option<Arc<ProviderState>>>,
    repository: Option<Arc<dyn KeycloakRepository>>,
    resources: BTreeMap<&'static str, Box<dyn DynamicResource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
}

impl Default for KeycloakProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl KeycloakProvider {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(None),
            repository: None,
            resources: all_resources()
                .into_iter()
                .map(|resource| (resource.type_name(), resource))
                .collect(),
            data_sources: all_data_sources()
                .into_iter()
                .map(|data_source| (data_source.type_name(), data_source))
                .collect(),
        }
    }

    /// Provider bound to an existing repository. It is usable without a
    /// `ConfigureProvider` call, and configuring it never opens a connection.
    pub fn with_repository(repository: Arc<dyn KeycloakRepository>) -> Self {
        let state = ProviderState::new(repository.clone());
        Self {
            state: RwLock::new(Some(Arc::new(state))),
            repository: Some(repository),
            ..Self::new()
        }
    }

    pub fn resource_types(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    pub async fn handle_request(&self, line: &str) -> String {
        let response = match serde_json::from_str::<RpcRequest>(line) {
            Ok(request) => self.dispatch(request).await,
            Err(err) => {
                warn!("Unparseable request: {}", err);
                RpcResponse::error(0, PARSE_ERROR, format!("Parse error: {err}"))
            }
        };

        serde_json::to_string(&response).unwrap_or_else(|err| {
            format!(
                r#"{{"id":{},"error":{{"code":{},"message":"{}"}}}}"#,
                response.id,
                INTERNAL_ERROR,
                err.to_string().replace('"', "'")
            )
        })
    }

    async fn dispatch(&self, request: RpcRequest) -> RpcResponse {
        let RpcRequest { id, method, params } = request;
        debug!("Handling {}", method);

        let result = match method.as_str() {
            "GetProviderSchema" => Ok(self.get_provider_schema()),
            "ConfigureProvider" => self.configure(&params).await,
            "ValidateResourceConfig" => self.validate_resource_config(&params),
            "PlanResourceChange" => self.plan_resource_change(&params),
            "ApplyResourceChange" => self.apply_resource_change(&params).await,
            "ReadResource" => self.read_resource(&params).await,
            "ImportResourceState" => self.import_resource_state(&params).await,
            "ReadDataSource" => self.read_data_source(&params).await,
            "StopProvider" => Ok(json!({})),
            other => {
                return RpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {other}"))
            }
        };

        let result = result.unwrap_or_else(|err| {
            warn!("{} failed: {}", method, err);
            json!({ "diagnostics": err.into_diagnostics() })
        });
        RpcResponse::success(id, result)
    }

    fn get_provider_schema(&self) -> Value {
        let resource_schemas: Map<String, Value> = self
            .resources
            .iter()
            .map(|(name, resource)| (name.to_string(), json!(resource.schema())))
            .collect();
        let data_source_schemas: Map<String, Value> = self
            .data_sources
            .iter()
            .map(|(name, data_source)| (name.to_string(), json!(data_source.schema())))
            .collect();

        json!({
            "provider": provider_schema(),
            "resource_schemas": resource_schemas,
            "data_source_schemas": data_source_schemas,
            "diagnostics": [],
        })
    }

    async fn configure(&self, params: &Value) -> ProviderResult<Value> {
        let values = object_param(params, "config").unwrap_or_default();
        let diagnostics = provider_schema().validate(&values);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(json!({ "diagnostics": diagnostics }));
        }

        let state = match &self.repository {
            Some(repository) => ProviderState::new(repository.clone()),
            None => {
                let block: ProviderConfig = ResourceData::new(values).decode()?;
                let config = block.merge_into(EnvConfigurationAdapter::new()?.into_inner());
                ProviderState::connect(&config).await?
            }
        };

        *self.state.write().await = Some(Arc::new(state));
        info!("Provider configured");
        Ok(json!({ "diagnostics": [] }))
    }

    async fn state(&self) -> ProviderResult<Arc<ProviderState>> {
        self.state
            .read()
            .await
            .clone()
            .ok_or(ProviderError::NotConfigured)
    }

    fn resource(&self, type_name: &str) -> ProviderResult<&dyn DynamicResource> {
        self.resources
            .get(type_name)
            .map(|resource| resource.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    /// Defaults, schema checks, then the resource's own checks. The latter
    /// only run on a configuration the schema accepts.
    fn check_config(
        &self,
        resource: &dyn DynamicResource,
        values: &mut Map<String, Value>,
    ) -> Vec<Diagnostic> {
        let schema = resource.schema();
        schema.apply_defaults(values);

        let diagnostics = schema.validate(values);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return diagnostics;
        }

        match resource.validate(&ResourceData::new(values.clone())) {
            Ok(()) => diagnostics,
            Err(err) => diagnostics.into_iter().chain(err.into_diagnostics()).collect(),
        }
    }

    fn validate_resource_config(&self, params: &Value) -> ProviderResult<Value> {
        let resource = self.resource(string_param(params, "type_name"))?;
        let mut values = object_param(params, "config").unwrap_or_default();

        let diagnostics = self.check_config(resource, &mut values);
        Ok(json!({ "diagnostics": diagnostics }))
    }

    fn plan_resource_change(&self, params: &Value) -> ProviderResult<Value> {
        let resource = self.resource(string_param(params, "type_name"))?;
        let prior = object_param(params, "prior_state");

        let Some(mut proposed) = object_param(params, "proposed_new_state") else {
            return Ok(json!({
                "planned_state": null,
                "requires_replace": [],
                "diagnostics": [],
            }));
        };

        let diagnostics = self.check_config(resource, &mut proposed);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(json!({ "diagnostics": diagnostics }));
        }

        let schema = resource.schema();
        let requires_replace = match &prior {
            Some(prior) => {
                let replace = schema.requires_replace(prior, &proposed);
                if replace.is_empty() {
                    schema.carry_forward(prior, &mut proposed);
                }
                replace
            }
            None => Vec::new(),
        };

        Ok(json!({
            "planned_state": proposed,
            "requires_replace": requires_replace,
            "diagnostics": diagnostics,
        }))
    }

    async fn apply_resource_change(&self, params: &Value) -> ProviderResult<Value> {
        let type_name = string_param(params, "type_name");
        let resource = self.resource(type_name)?;
        let state = self.state().await?;

        let prior = object_param(params, "prior_state").map(ResourceData::new);
        let planned = object_param(params, "planned_state").map(ResourceData::new);

        let new_state = match (prior, planned) {
            (Some(prior), None) => {
                info!("Destroying {} '{}'", type_name, prior.id().unwrap_or_default());
                resource.delete(&state, &prior).await?;
                None
            }
            (None, Some(planned)) => {
                info!("Creating {}", type_name);
                Some(resource.create(&state, &planned).await?)
            }
            (Some(prior), Some(planned)) => {
                info!("Updating {} '{}'", type_name, prior.id().unwrap_or_default());
                Some(resource.update(&state, &prior, &planned).await?)
            }
            (None, None) => None,
        };

        Ok(json!({
            "new_state": new_state.map(ResourceData::into_attributes),
            "diagnostics": [],
        }))
    }

    async fn read_resource(&self, params: &Value) -> ProviderResult<Value> {
        let type_name = string_param(params, "type_name");
        let resource = self.resource(type_name)?;
        let state = self.state().await?;

        let Some(current) = object_param(params, "current_state") else {
            return Ok(json!({ "new_state": null, "diagnostics": [] }));
        };

        let new_state = resource.read(&state, &ResourceData::new(current)).await?;
        if new_state.is_none() {
            warn!("{} no longer exists, removing it from state", type_name);
        }

        Ok(json!({
            "new_state": new_state.map(ResourceData::into_attributes),
            "diagnostics": [],
        }))
    }

    async fn import_resource_state(&self, params: &Value) -> ProviderResult<Value> {
        let type_name = string_param(params, "type_name");
        let resource = self.resource(type_name)?;
        let state = self.state().await?;
        let id = string_param(params, "id");

        let seed = resource.import(id)?;
        let imported = resource
            .read(&state, &seed)
            .await?
            .ok_or_else(|| ProviderError::ImportNotFound(id.to_string()))?;

        info!("Imported {} '{}'", type_name, id);
        Ok(json!({
            "imported_resources": [{
                "type_name": type_name,
                "state": imported.into_attributes(),
            }],
            "diagnostics": [],
        }))
    }

    async fn read_data_source(&self, params: &Value) -> ProviderResult<Value> {
        let type_name = string_param(params, "type_name");
        let data_source = self
            .data_sources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownDataSource(type_name.to_string()))?;
        let state = self.state().await?;

        let config = ResourceData::new(object_param(params, "config").unwrap_or_default());
        let found = data_source.read(&state, &config).await?;

        Ok(json!({
            "state": found.into_attributes(),
            "diagnostics": [],
        }))
    }
}
