//! Registry of the resource schemas served by a service provider.
//!
//! The registry is assembled once at start-up with [`SchemaRegistryBuilder`] and
//! is read-only afterwards; share it by reference or `Arc`.

use super::resource_schema::{ResourceSchema, SchemaExtension};
use crate::data::{ScimData, ScimValue};
use crate::error::{BuildError, BuildResult};
use crate::value_objects::SchemaUri;
use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Sealed set of resource schemas, addressable by schema URI and by endpoint.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<Arc<ResourceSchema>>,
    by_uri: HashMap<SchemaUri, usize>,
    by_endpoint: HashMap<String, usize>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// All registered schemas, in registration order.
    pub fn schemas(&self) -> impl Iterator<Item = &Arc<ResourceSchema>> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Schema by its base URI (case-insensitive).
    pub fn get(&self, uri: &str) -> Option<&Arc<ResourceSchema>> {
        let uri = SchemaUri::lookup(uri)?;
        self.by_uri.get(&uri).map(|&index| &self.schemas[index])
    }

    /// Schema serving `endpoint`, e.g. `/Users` (case-insensitive).
    pub fn by_endpoint(&self, endpoint: &str) -> Option<&Arc<ResourceSchema>> {
        self.by_endpoint
            .get(&endpoint.to_lowercase())
            .map(|&index| &self.schemas[index])
    }

    /// Schema whose base URI is listed in the data's `schemas` attribute.
    pub fn for_data(&self, data: &ScimData) -> Option<&Arc<ResourceSchema>> {
        let Some(ScimValue::List(items)) = data.get_raw("schemas") else {
            return None;
        };
        items
            .iter()
            .filter_map(ScimValue::as_str)
            .find_map(|uri| self.get(uri))
    }

    /// Every extension used by the registered schemas, once each.
    pub fn extensions(&self) -> Vec<&SchemaExtension> {
        let mut seen = Vec::<&SchemaUri>::new();
        let mut extensions = Vec::new();
        for schema in &self.schemas {
            for (extension, _) in schema.extensions() {
                if !seen.contains(&extension.schema()) {
                    seen.push(extension.schema());
                    extensions.push(extension);
                }
            }
        }
        extensions
    }

    /// `/Schemas` listing: all base schemas and extensions.
    pub fn to_schemas_json(&self) -> Vec<Value> {
        self.schemas
            .iter()
            .map(|schema| schema.to_schema_json())
            .chain(
                self.extensions()
                    .into_iter()
                    .map(SchemaExtension::to_schema_json),
            )
            .collect()
    }

    /// `/ResourceTypes` listing.
    pub fn to_resource_types_json(&self) -> Vec<Value> {
        self.schemas
            .iter()
            .map(|schema| schema.to_resource_type_json())
            .collect()
    }
}

/// Builder for [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    registry: SchemaRegistry,
}

impl SchemaRegistryBuilder {
    /// Add a schema; a URI or endpoint that is already present is rejected.
    pub fn register(mut self, schema: ResourceSchema) -> BuildResult<Self> {
        if self.registry.by_uri.contains_key(schema.schema()) {
            return Err(BuildError::DuplicateSchema {
                uri: schema.schema().to_string(),
            });
        }
        let endpoint = schema.endpoint().to_lowercase();
        if self.registry.by_endpoint.contains_key(&endpoint) {
            return Err(BuildError::DuplicateEndpoint {
                endpoint: schema.endpoint().to_string(),
            });
        }

        debug!(
            "Registering schema '{}' at endpoint '{}'",
            schema.schema(),
            schema.endpoint()
        );
        let index = self.registry.schemas.len();
        self.registry.by_uri.insert(schema.schema().clone(), index);
        self.registry.by_endpoint.insert(endpoint, index);
        self.registry.schemas.push(Arc::new(schema));
        Ok(self)
    }

    /// Seal the registry.
    pub fn build(self) -> SchemaRegistry {
        info!(
            "Schema registry sealed with {} resource schema(s)",
            self.registry.schemas.len()
        );
        self.registry
    }
}
