//! PATCH request support: path expressions and operation validation.
//!
//! # Examples
//!
//! ```rust
//! use scim_core::config::ServiceConfig;
//! use scim_core::data::ScimData;
//! use scim_core::filter::OperatorRegistry;
//! use scim_core::patch::{PATCH_OP_URI, PatchOpKind, PatchRequest};
//! use scim_core::schema::{Attribute, ResourceSchema};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = ResourceSchema::builder("urn:example:patch:2.0:Group", "Group", "/Groups")
//!     .with_attribute(Attribute::string("displayName").build()?)
//!     .build()?;
//!
//! let body = ScimData::try_from(json!({
//!     "schemas": [PATCH_OP_URI],
//!     "Operations": [{"op": "replace", "path": "displayName", "value": "Admins"}]
//! }))?;
//! let request = PatchRequest::parse(
//!     &body,
//!     &schema,
//!     &ServiceConfig::default(),
//!     OperatorRegistry::defaults(),
//! )
//! .map_err(|issues| issues.to_json().to_string())?;
//!
//! assert_eq!(request.operations()[0].op(), PatchOpKind::Replace);
//! # Ok(())
//! # }
//! ```

mod operation;
mod path;

pub use operation::{PATCH_OP_URI, PatchOpKind, PatchOperation, PatchRequest};
pub use path::PatchPath;
