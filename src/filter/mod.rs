//! SCIM filter expressions (RFC 7644 §3.4.2.2).
//!
//! Filters are parsed into a [`Filter`] tree with operators resolved through an
//! [`OperatorRegistry`], and evaluated against [`ScimData`](crate::data::ScimData)
//! with the governing [`ResourceSchema`](crate::schema::ResourceSchema) deciding
//! how values are compared.
//!
//! # Examples
//!
//! ```rust
//! use scim_core::data::ScimData;
//! use scim_core::filter::{Filter, OperatorRegistry};
//! use scim_core::schema::{Attribute, ResourceSchema};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = ResourceSchema::builder("urn:example:filter:2.0:User", "User", "/Users")
//!     .with_attribute(Attribute::string("userName").build()?)
//!     .with_attribute(
//!         Attribute::complex("emails")
//!             .multi_valued()
//!             .with_sub_attribute(Attribute::string("type").build()?)
//!             .with_sub_attribute(Attribute::string("value").build()?)
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let user = ScimData::try_from(json!({
//!     "userName": "bjensen",
//!     "emails": [{"type": "work", "value": "bjensen@example.com"}]
//! }))?;
//!
//! let filter = Filter::parse(
//!     r#"userName Eq "BJensen" and emails[type eq "work"]"#,
//!     OperatorRegistry::defaults(),
//! )
//! .map_err(|issues| issues.to_json().to_string())?;
//!
//! assert!(filter.evaluate(&user, &schema));
//! assert_eq!(
//!     filter.to_string(),
//!     r#"userName eq "BJensen" and emails[type eq "work"]"#
//! );
//! # Ok(())
//! # }
//! ```

mod ast;
pub(crate) mod evaluate;
mod lexer;
mod operator;
mod parser;

pub use ast::{AttributeFilter, Comparison, Filter, Literal};
pub use operator::{
    BinaryOperator, OperatorRegistry, OperatorRegistryBuilder, RESERVED_KEYWORDS, UnaryOperator,
    compare,
};

pub(crate) use lexer::{Encoded, check_brackets};
