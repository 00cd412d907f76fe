//! Schema definitions and validation for SCIM resources.
//!
//! This module provides the attribute model and validation engine implementing
//! RFC 7643 schemas with direction-aware presence rules.
//!
//! # Key Types
//!
//! - [`Attribute`] - Typed attribute definition with its characteristics
//! - [`ResourceSchema`] - Base schema, common attributes and extensions of a resource type
//! - [`SchemaRegistry`] - Sealed registry of resource schemas
//! - [`AttrValuePresenceConfig`] - Direction and `attributes`/`excludedAttributes` lists
//!
//! # Examples
//!
//! ```rust
//! use scim_core::data::ScimData;
//! use scim_core::schema::{AttrValuePresenceConfig, Attribute, ResourceSchema, SchemaRegistry};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = ResourceSchema::builder("urn:example:mod:2.0:Device", "Device", "/Devices")
//!     .with_attribute(Attribute::string("serial").required().build()?)
//!     .build()?;
//! let registry = SchemaRegistry::builder().register(schema)?.build();
//!
//! let device = registry.by_endpoint("/Devices").unwrap();
//! let data = ScimData::try_from(json!({"schemas": ["urn:example:mod:2.0:Device"]}))?;
//! let config = AttrValuePresenceConfig::request().including(device.required_attr_reps());
//!
//! assert_eq!(device.validate(&data, &config).error_codes_at("serial"), vec![6]);
//! # Ok(())
//! # }
//! ```

pub mod attribute;
pub mod presence;
pub mod registry;
pub mod resource_schema;
pub mod types;


// Re-export the main types for convenience
pub use attribute::{Attribute, AttributeBuilder, AttributeKind, Attrs};
pub use presence::AttrValuePresenceConfig;
pub use registry::{SchemaRegistry, SchemaRegistryBuilder};
pub use resource_schema::{ResourceSchema, SchemaExtension, RESOURCE_TYPE_URI, SCHEMA_URI};
pub use types::{
    AttributeIssuer, AttributeType, DataDirection, DataInclusivity, Mutability, Returned,
    Uniqueness,
};
