//! Attribute characteristic enums as defined in RFC 7643 §7.
//!
//! These are the pieces of attribute metadata that drive validation: how an
//! attribute may change, when it is returned, who issues its value, and how
//! unique it must be.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Data type names used in schema representations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AttributeType {
    String,
    Boolean,
    Decimal,
    Integer,
    DateTime,
    /// Base64 encoded binary data
    Binary,
    /// External, URI or SCIM resource reference
    Reference,
    /// Attribute with sub-attributes
    Complex,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::DateTime => "dateTime",
            Self::Binary => "binary",
            Self::Reference => "reference",
            Self::Complex => "complex",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute mutability characteristics.
///
/// Defines whether and how an attribute can be modified.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Mutability {
    /// Read-only attribute (managed by server)
    ReadOnly,
    /// Read-write attribute (can be modified by clients)
    #[default]
    ReadWrite,
    /// Immutable attribute (set once, never modified)
    Immutable,
    /// Write-only attribute (passwords, etc.)
    WriteOnly,
}

impl Mutability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOnly => "readOnly",
            Self::ReadWrite => "readWrite",
            Self::Immutable => "immutable",
            Self::WriteOnly => "writeOnly",
        }
    }
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When an attribute is returned in responses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Returned {
    /// Always returned, regardless of `attributes` / `excludedAttributes`
    Always,
    /// Never returned (passwords, etc.)
    Never,
    /// Returned unless excluded
    #[default]
    Default,
    /// Returned only when explicitly requested
    Request,
}

impl Returned {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::Default => "default",
            Self::Request => "request",
        }
    }
}

/// Attribute uniqueness constraints.
///
/// Defines the scope of uniqueness for attribute values.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Uniqueness {
    /// No uniqueness constraint
    #[default]
    None,
    /// Unique within the server
    Server,
    /// Globally unique
    Global,
}

impl Uniqueness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Server => "server",
            Self::Global => "global",
        }
    }
}

/// Who issues the value of an attribute.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AttributeIssuer {
    #[default]
    Client,
    /// Values are assigned by the service provider and must not be sent by clients
    ServiceProvider,
}

/// Whether data flows into the service or out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataDirection {
    Request,
    Response,
}

/// Explicit inclusion override for a single attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataInclusivity {
    Include,
    Exclude,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Mutability::ReadOnly).unwrap(), "\"readOnly\"");
        assert_eq!(serde_json::to_string(&Returned::Request).unwrap(), "\"request\"");
        assert_eq!(
            serde_json::to_string(&AttributeIssuer::ServiceProvider).unwrap(),
            "\"serviceProvider\""
        );
        assert_eq!(
            serde_json::from_str::<AttributeType>("\"dateTime\"").unwrap(),
            AttributeType::DateTime
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Mutability::default(), Mutability::ReadWrite);
        assert_eq!(Returned::default(), Returned::Default);
        assert_eq!(Uniqueness::default(), Uniqueness::None);
        assert_eq!(AttributeIssuer::default(), AttributeIssuer::Client);
    }
}
