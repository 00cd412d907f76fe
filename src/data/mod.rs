//! Structured container for SCIM resource data.
//!
//! [`ScimData`] is what payloads are converted to before validation, and what
//! filters are evaluated against. Keys are case-insensitive and may be plain
//! attribute paths, URN-qualified paths, extension URIs, or any of the
//! attribute reference value objects (see [`IntoDataKey`]).
mod container;
mod value;

pub use container::{DataKey, IntoDataKey, ScimData};
pub use value::ScimValue;
