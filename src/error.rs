//! Error types for SCIM validation, filtering and PATCH processing.
//!
//! Errors are split by how they are meant to be handled:
//!
//! - [`ValidationError`] / [`ValidationWarning`] describe problems with *data*
//!   (payloads, filter strings, PATCH paths). They are never raised on their own;
//!   they are collected into [`ValidationIssues`](crate::issues::ValidationIssues)
//!   at the location they refer to.
//! - [`BuildError`] describes a broken static configuration (schemas, attributes,
//!   operator registrations). These happen at start-up and are not recoverable.
//! - [`ScimError`] is the top-level error returned by fallible library calls,
//!   including programmer misuse.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema URI of the SCIM error message.
pub const ERROR_MESSAGE_URI: &str = "urn:ietf:params:scim:api:messages:2.0:Error";

/// Protocol-level error classification (the `scimType` of an error response).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScimType {
    InvalidFilter,
    TooMany,
    Uniqueness,
    Mutability,
    InvalidSyntax,
    InvalidPath,
    NoTarget,
    InvalidValue,
    InvalidVers,
    Sensitive,
}

impl ScimType {
    /// The wire representation of the classification.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFilter => "invalidFilter",
            Self::TooMany => "tooMany",
            Self::Uniqueness => "uniqueness",
            Self::Mutability => "mutability",
            Self::InvalidSyntax => "invalidSyntax",
            Self::InvalidPath => "invalidPath",
            Self::NoTarget => "noTarget",
            Self::InvalidValue => "invalidValue",
            Self::InvalidVers => "invalidVers",
            Self::Sensitive => "sensitive",
        }
    }
}

impl fmt::Display for ScimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors attached to a location in the validated data.
///
/// Every variant has a stable numeric [`code`](ValidationError::code) that can be
/// used to filter or pop errors from
/// [`ValidationIssues`](crate::issues::ValidationIssues).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    // Value errors (1-99)
    /// Value has the wrong kind
    #[error("bad type, expecting '{expected}' but got '{provided}'")]
    BadType { expected: String, provided: String },

    /// Value is not correctly encoded
    #[error("bad encoding, expecting '{expected}'")]
    BadEncoding { expected: String },

    /// Value has the right kind but wrong syntax
    #[error("bad value syntax: {details}")]
    BadValueSyntax { details: String },

    /// Value is not one of the restricted canonical values
    #[error("must be one of {expected:?}, but got '{provided}'")]
    MustBeOneOf {
        expected: Vec<String>,
        provided: String,
    },

    /// More than one element of a multi-valued attribute is primary
    #[error("multiple primary values set")]
    MultiplePrimaryValues,

    /// Required value is missing
    #[error("missing")]
    MissingValue,

    /// Value is issued by the service provider and must not be provided by client
    #[error("must not be provided")]
    MustNotBeProvided,

    /// Value must not be returned to the client
    #[error("must not be returned")]
    MustNotBeReturned,

    /// Container value cannot hold the requested key
    #[error("can not set '{key}': {details}")]
    TypeConflict { key: String, details: String },

    /// Schema URI is not registered
    #[error("unknown schema '{uri}'")]
    UnknownSchema { uri: String },

    /// Base schema URI used as a data key
    #[error("base schema '{uri}' can not be used as a key")]
    BaseSchemaKey { uri: String },

    /// Extension data present but the extension is not declared in `schemas`
    #[error("extension '{uri}' is missing in 'schemas'")]
    MissingSchemaExtension { uri: String },

    /// Base schema not declared in `schemas`
    #[error("base schema '{uri}' is missing in 'schemas'")]
    MissingBaseSchema { uri: String },

    /// SCIM reference points to a resource type that is not allowed
    #[error("reference must point to one of {allowed:?}")]
    BadScimReference { allowed: Vec<String> },

    /// Two mutually exclusive values were provided
    #[error("can not be used together with '{other}'")]
    CannotBeUsedTogether { other: String },

    /// Feature is disabled by the service configuration
    #[error("{feature} is not supported")]
    NotSupported { feature: String },

    /// Value of a `uniqueness` attribute is already taken. Raised by hosts,
    /// which own the data needed for the check.
    #[error("value of '{attribute}' is not unique")]
    NotUnique { attribute: String },

    /// Free-form error raised by custom validators
    #[error("{message}")]
    Custom { message: String },

    // Filter errors (100-199)
    /// Bracket has no counterpart
    #[error("bracket '{bracket}' is not opened or closed in expression '{expression}'")]
    BracketNotOpenedOrClosed { bracket: char, expression: String },

    /// Expression or grouped sub-expression is empty
    #[error("empty expression")]
    EmptyExpression,

    /// Operator token is not registered
    #[error("unknown {operator_type} operator '{operator}' in expression '{expression}'")]
    UnknownOperator {
        operator_type: String,
        operator: String,
        expression: String,
    },

    /// Operator lacks an operand
    #[error("missing operand for operator '{operator}' in expression '{expression}'")]
    MissingOperand { operator: String, expression: String },

    /// Complex group references something other than its own sub-attribute
    #[error("complex attribute '{attribute}' can only filter its own sub-attributes, got '{expression}'")]
    ComplexSubAttribute {
        attribute: String,
        expression: String,
    },

    /// Literal value cannot be parsed
    #[error("bad operand '{operand}'")]
    BadOperand { operand: String },

    /// Operand type does not fit operator or attribute
    #[error("operator '{operator}' is not compatible with operand of type '{operand_type}'")]
    NonCompatibleOperand {
        operator: String,
        operand_type: String,
    },

    /// Attribute path is syntactically invalid
    #[error("bad attribute name '{attribute}'")]
    BadAttributeName { attribute: String },

    /// Tokens that do not form a valid expression
    #[error("unknown expression '{expression}'")]
    UnknownExpression { expression: String },

    // Path errors (200-299)
    /// PATCH path is not well formed
    #[error("bad path '{path}': {details}")]
    BadPatchPath { path: String, details: String },

    /// PATCH path does not point to a known attribute
    #[error("unknown target '{path}'")]
    UnknownTarget { path: String },

    // Modification errors (300-399)
    /// Attribute can not be modified
    #[error("attribute with '{mutability}' mutability can not be modified")]
    CannotModify { mutability: String },

    /// Required single-valued attribute can not be removed
    #[error("required attribute can not be removed")]
    CannotRemoveRequired,

    /// Operation requires a path
    #[error("path is required for this operation")]
    MissingPath,
}

impl ValidationError {
    /// Stable numeric code of the error.
    pub fn code(&self) -> u16 {
        match self {
            Self::BadType { .. } => 1,
            Self::BadEncoding { .. } => 2,
            Self::BadValueSyntax { .. } => 3,
            Self::MustBeOneOf { .. } => 4,
            Self::MultiplePrimaryValues => 5,
            Self::MissingValue => 6,
            Self::MustNotBeProvided => 7,
            Self::MustNotBeReturned => 8,
            Self::TypeConflict { .. } => 9,
            Self::UnknownSchema { .. } => 10,
            Self::BaseSchemaKey { .. } => 11,
            Self::MissingSchemaExtension { .. } => 12,
            Self::MissingBaseSchema { .. } => 13,
            Self::BadScimReference { .. } => 14,
            Self::CannotBeUsedTogether { .. } => 15,
            Self::NotSupported { .. } => 16,
            Self::NotUnique { .. } => 17,
            Self::Custom { .. } => 99,
            Self::BracketNotOpenedOrClosed { .. } => 100,
            Self::EmptyExpression => 101,
            Self::UnknownOperator { .. } => 102,
            Self::MissingOperand { .. } => 103,
            Self::ComplexSubAttribute { .. } => 104,
            Self::BadOperand { .. } => 105,
            Self::NonCompatibleOperand { .. } => 106,
            Self::BadAttributeName { .. } => 107,
            Self::UnknownExpression { .. } => 108,
            Self::BadPatchPath { .. } => 200,
            Self::UnknownTarget { .. } => 201,
            Self::CannotModify { .. } => 300,
            Self::CannotRemoveRequired => 301,
            Self::MissingPath => 302,
        }
    }

    /// Protocol classification used when rendering an error response.
    pub fn scim_type(&self) -> Option<ScimType> {
        match self.code() {
            16 => None,
            17 => Some(ScimType::Uniqueness),
            100..=199 => Some(ScimType::InvalidFilter),
            200..=299 => Some(ScimType::InvalidPath),
            300 => Some(ScimType::Mutability),
            302 => Some(ScimType::NoTarget),
            _ => Some(ScimType::InvalidValue),
        }
    }

    /// HTTP status code associated with the error.
    pub fn status(&self) -> u16 {
        match self.scim_type() {
            None => 501,
            Some(ScimType::Uniqueness) => 409,
            Some(_) => 400,
        }
    }

    /// Create a bad type error
    pub fn bad_type(expected: impl Into<String>, provided: impl Into<String>) -> Self {
        Self::BadType {
            expected: expected.into(),
            provided: provided.into(),
        }
    }

    /// Create a bad value syntax error
    pub fn bad_syntax(details: impl Into<String>) -> Self {
        Self::BadValueSyntax {
            details: details.into(),
        }
    }

    /// Create a custom validation error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    pub fn bad_patch_path(path: impl Into<String>, details: impl Into<String>) -> Self {
        Self::BadPatchPath {
            path: path.into(),
            details: details.into(),
        }
    }
}

/// Validation warnings: issues worth reporting that do not invalidate data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationWarning {
    /// Value is not one of the advisory canonical values
    #[error("should be one of {expected:?}, but got '{provided}'")]
    NotCanonical {
        expected: Vec<String>,
        provided: String,
    },

    /// Free-form warning raised by custom validators
    #[error("{message}")]
    Custom { message: String },
}

impl ValidationWarning {
    /// Stable numeric code of the warning.
    pub fn code(&self) -> u16 {
        match self {
            Self::NotCanonical { .. } => 1,
            Self::Custom { .. } => 99,
        }
    }

    /// Create a custom warning
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}

/// Errors in static configuration: schemas, attributes and operator registrations.
///
/// These are programming errors and should surface during application start-up.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// Schema URI was referenced before being registered
    #[error("unknown schema '{uri}'")]
    UnknownSchema { uri: String },

    /// Schema URI registered twice with different extension flags
    #[error("schema '{uri}' is already registered with a different extension flag")]
    ConflictingSchema { uri: String },

    /// Same resource schema registered twice
    #[error("schema '{uri}' is already registered")]
    DuplicateSchema { uri: String },

    /// Same endpoint served by two resource schemas
    #[error("endpoint '{endpoint}' is already registered")]
    DuplicateEndpoint { endpoint: String },

    /// Operator token registered twice or clashing with a logical keyword
    #[error("operator '{operator}' is already registered")]
    DuplicateOperator { operator: String },

    /// Attribute or schema URI does not match the expected grammar
    #[error("invalid name '{name}'")]
    InvalidName { name: String },

    /// Two attributes with the same name in one attribute set
    #[error("attribute '{name}' is defined more than once")]
    DuplicateAttribute { name: String },

    /// Complex attribute nested inside a complex attribute
    #[error("complex attribute '{attribute}' can not have complex sub-attribute '{sub_attribute}'")]
    NestedComplexAttribute {
        attribute: String,
        sub_attribute: String,
    },

    /// Any other invalid configuration
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Top-level error for fallible library calls.
#[derive(Debug, thiserror::Error)]
pub enum ScimError {
    /// Single validation failure
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Static configuration failure
    #[error("Configuration error: {0}")]
    Build(#[from] BuildError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The call itself is invalid, independent of the data
    #[error("Invalid usage: {message}")]
    InvalidUsage { message: String },
}

impl ScimError {
    /// Create an invalid usage error
    pub fn invalid_usage(message: impl Into<String>) -> Self {
        Self::InvalidUsage {
            message: message.into(),
        }
    }
}

/// Protocol error body rendered from a validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub schemas: Vec<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scim_type: Option<ScimType>,
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(status: u16, scim_type: Option<ScimType>, detail: impl Into<String>) -> Self {
        Self {
            schemas: vec![ERROR_MESSAGE_URI.to_string()],
            status: status.to_string(),
            scim_type,
            detail: detail.into(),
        }
    }
}

// Result type aliases for convenience
pub type ScimResult<T> = Result<T, ScimError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type BuildResult<T> = Result<T, BuildError>;
