//! SCIM 2.0 validation, filter and PATCH path engine.
//!
//! Provides the protocol-independent core of a SCIM service provider: schema
//! definitions with typed attributes, validation of resource payloads, the
//! filter query language, and PATCH request validation.
//!
//! # Core Components
//!
//! - [`ResourceSchema`] - Resource schemas, extensions, validation and projection
//! - [`ScimData`] - Case-insensitive resource container
//! - [`Filter`] - Filter expressions, parsed through an [`OperatorRegistry`]
//! - [`PatchRequest`] - PATCH request parsing and validation
//! - [`QueryParameters`] - List query parameters and sorting
//! - [`ValidationIssues`] - Located errors and warnings collected during validation
//!
//! # Quick Start
//!
//! ```rust
//! use scim_core::data::ScimData;
//! use scim_core::schema::{AttrValuePresenceConfig, Attribute, ResourceSchema};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = ResourceSchema::builder("urn:example:quickstart:2.0:User", "User", "/Users")
//!     .with_attribute(Attribute::string("userName").required().build()?)
//!     .with_attribute(Attribute::boolean("active").build()?)
//!     .build()?;
//!
//! let data = ScimData::try_from(json!({
//!     "schemas": ["urn:example:quickstart:2.0:User"],
//!     "active": "yes"
//! }))?;
//!
//! let config = AttrValuePresenceConfig::request().including(schema.required_attr_reps());
//! let issues = schema.validate(&data, &config);
//! assert_eq!(issues.error_codes_at("userName"), vec![6]);
//! assert_eq!(issues.error_codes_at("active"), vec![1]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod issues;
pub mod patch;
pub mod query;
pub mod schema;
pub mod value_objects;

// Re-export commonly used types for convenience
pub use config::ServiceConfig;
pub use data::{ScimData, ScimValue};
pub use error::{
    BuildError, BuildResult, ErrorResponse, ScimError, ScimResult, ValidationError,
    ValidationResult, ValidationWarning,
};
pub use filter::{Filter, OperatorRegistry};
pub use issues::{Location, ValidationIssues};
pub use patch::{PatchOperation, PatchPath, PatchRequest};
pub use query::{QueryParameters, Sorter};
pub use schema::{Attribute, ResourceSchema, SchemaExtension, SchemaRegistry};
pub use value_objects::{AttrName, AttrRef, SchemaUri};
