//! Value objects for the identifiers used throughout the crate.
//!
//! Each value object enforces its invariants at construction time and compares
//! case-insensitively, following SCIM's case-insensitive attribute and schema
//! names:
//!
//! - [`AttrName`]: attribute name
//! - [`SchemaUri`]: registered schema URI
//! - [`AttrRep`], [`BoundedAttrRep`], [`AttrRef`]: attribute references
mod attr_name;
mod attr_rep;
mod schema_uri;

pub use attr_name::AttrName;
pub use attr_rep::{AttrRef, AttrRep, BoundedAttrRep};
pub use schema_uri::SchemaUri;
