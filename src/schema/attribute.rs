//! Attribute definitions and per-attribute validation.
//!
//! An [`Attribute`] is a typed, named field of a resource schema. It knows how to
//! check a value's kind, canonical values and sub-attributes ([`Attribute::validate`]),
//! and whether a value may or must be present in a given direction
//! ([`Attribute::validate_presence`]).
//!
//! Attributes are created with [`AttributeBuilder`]:
//!
//! ```rust
//! use scim_core::schema::{Attribute, Mutability};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let emails = Attribute::complex("emails")
//!         .multi_valued()
//!         .with_sub_attribute(Attribute::string("value").build()?)
//!         .with_sub_attribute(
//!             Attribute::string("type")
//!                 .with_canonical_values(["work", "home", "other"], false)
//!                 .build()?,
//!         )
//!         .with_sub_attribute(Attribute::boolean("primary").build()?)
//!         .build()?;
//!
//!     assert!(emails.is_complex());
//!     assert_eq!(emails.mutability(), Mutability::ReadWrite);
//!     Ok(())
//! }
//! ```

use super::types::{
    AttributeIssuer, AttributeType, DataDirection, DataInclusivity, Mutability, Returned,
    Uniqueness,
};
use crate::data::{ScimData, ScimValue};
use crate::error::{BuildError, BuildResult, ValidationError, ValidationWarning};
use crate::issues::{Location, ValidationIssues};
use crate::value_objects::AttrName;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::DateTime;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::{Arc, LazyLock};

static ABSOLUTE_URI_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:\S+$").expect("valid URI regex"));

/// Custom validation hook, run on values that passed the kind check.
pub type AttributeValidator = Arc<dyn Fn(&ScimValue) -> ValidationIssues + Send + Sync>;

/// Custom value conversion hook used by (de)serialization.
pub type ValueConverter = Arc<dyn Fn(ScimValue) -> ScimValue + Send + Sync>;

/// The closed set of attribute kinds.
#[derive(Debug, Clone)]
pub enum AttributeKind {
    String,
    Boolean,
    Integer,
    Decimal,
    DateTime,
    Binary,
    /// Reference to a resource outside the service provider
    ExternalReference,
    /// Reference to a URI, e.g. a schema
    UriReference,
    /// Reference to a SCIM resource of one of `resource_types`
    ScimReference { resource_types: Vec<String> },
    Complex { sub_attributes: Attrs },
}

impl AttributeKind {
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Self::String => AttributeType::String,
            Self::Boolean => AttributeType::Boolean,
            Self::Integer => AttributeType::Integer,
            Self::Decimal => AttributeType::Decimal,
            Self::DateTime => AttributeType::DateTime,
            Self::Binary => AttributeType::Binary,
            Self::ExternalReference | Self::UriReference | Self::ScimReference { .. } => {
                AttributeType::Reference
            }
            Self::Complex { .. } => AttributeType::Complex,
        }
    }

    /// Whether values of this kind are strings on the wire.
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            Self::String
                | Self::Binary
                | Self::ExternalReference
                | Self::UriReference
                | Self::ScimReference { .. }
        )
    }

    fn reference_types(&self) -> Option<Vec<String>> {
        match self {
            Self::ExternalReference => Some(vec!["external".to_string()]),
            Self::UriReference => Some(vec!["uri".to_string()]),
            Self::ScimReference { resource_types } => Some(resource_types.clone()),
            _ => None,
        }
    }
}

/// A typed attribute definition.
#[derive(Clone)]
pub struct Attribute {
    name: AttrName,
    kind: AttributeKind,
    description: String,
    required: bool,
    multi_valued: bool,
    case_exact: bool,
    mutability: Mutability,
    returned: Returned,
    uniqueness: Uniqueness,
    issuer: AttributeIssuer,
    canonical_values: Vec<String>,
    restrict_canonical_values: bool,
    validators: Vec<AttributeValidator>,
    serializer: Option<ValueConverter>,
    deserializer: Option<ValueConverter>,
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("multi_valued", &self.multi_valued)
            .field("case_exact", &self.case_exact)
            .field("mutability", &self.mutability)
            .field("returned", &self.returned)
            .field("uniqueness", &self.uniqueness)
            .field("issuer", &self.issuer)
            .field("canonical_values", &self.canonical_values)
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl Attribute {
    pub fn builder(name: impl Into<String>, kind: AttributeKind) -> AttributeBuilder {
        AttributeBuilder::new(name, kind)
    }

    pub fn string(name: impl Into<String>) -> AttributeBuilder {
        AttributeBuilder::new(name, AttributeKind::String)
    }

    pub fn boolean(name: impl Into<String>) -> AttributeBuilder {
        AttributeBuilder::new(name, AttributeKind::Boolean)
    }

    pub fn integer(name: impl Into<String>) -> AttributeBuilder {
        AttributeBuilder::new(name, AttributeKind::Integer)
    }

    pub fn decimal(name: impl Into<String>) -> AttributeBuilder {
        AttributeBuilder::new(name, AttributeKind::Decimal)
    }

    pub fn date_time(name: impl Into<String>) -> AttributeBuilder {
        AttributeBuilder::new(name, AttributeKind::DateTime)
    }

    pub fn binary(name: impl Into<String>) -> AttributeBuilder {
        AttributeBuilder::new(name, AttributeKind::Binary)
    }

    pub fn external_reference(name: impl Into<String>) -> AttributeBuilder {
        AttributeBuilder::new(name, AttributeKind::ExternalReference)
    }

    pub fn uri_reference(name: impl Into<String>) -> AttributeBuilder {
        AttributeBuilder::new(name, AttributeKind::UriReference)
    }

    pub fn scim_reference<I, S>(name: impl Into<String>, resource_types: I) -> AttributeBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeBuilder::new(
            name,
            AttributeKind::ScimReference {
                resource_types: resource_types.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn complex(name: impl Into<String>) -> AttributeBuilder {
        AttributeBuilder::new(
            name,
            AttributeKind::Complex {
                sub_attributes: Attrs::default(),
            },
        )
    }

    pub fn name(&self) -> &AttrName {
        &self.name
    }

    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.kind.attribute_type()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn multi_valued(&self) -> bool {
        self.multi_valued
    }

    pub fn case_exact(&self) -> bool {
        self.case_exact
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    pub fn returned(&self) -> Returned {
        self.returned
    }

    pub fn uniqueness(&self) -> Uniqueness {
        self.uniqueness
    }

    pub fn issuer(&self) -> AttributeIssuer {
        self.issuer
    }

    pub fn canonical_values(&self) -> &[String] {
        &self.canonical_values
    }

    pub fn restrict_canonical_values(&self) -> bool {
        self.restrict_canonical_values
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.kind, AttributeKind::Complex { .. })
    }

    /// Sub-attributes of a complex attribute.
    pub fn sub_attributes(&self) -> Option<&Attrs> {
        match &self.kind {
            AttributeKind::Complex { sub_attributes } => Some(sub_attributes),
            _ => None,
        }
    }

    /// Check `value` against the attribute's kind, canonical values and sub-attributes.
    ///
    /// A null value is not checked; absence is the business of
    /// [`validate_presence`](Self::validate_presence). A value of the wrong kind
    /// halts validation at the root location, and custom validators only run when
    /// nothing halted.
    pub fn validate(&self, value: &ScimValue) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        if value.is_null() {
            return issues;
        }

        if self.multi_valued {
            let ScimValue::List(items) = value else {
                issues.add_error(
                    ValidationError::bad_type("list", value.type_name()),
                    false,
                    Location::root(),
                );
                return issues;
            };
            for (index, item) in items.iter().enumerate() {
                if !item.is_null() {
                    issues.merge(self.validate_single(item), index);
                }
            }
            if self.is_complex() && Self::primary_count(items) > 1 {
                issues.add_error(ValidationError::MultiplePrimaryValues, true, Location::root());
            }
        } else {
            issues = self.validate_single(value);
        }

        if issues.can_proceed() {
            for validator in &self.validators {
                issues.merge(validator(value), Location::root());
            }
        }
        issues
    }

    fn primary_count(items: &[ScimValue]) -> usize {
        items
            .iter()
            .filter_map(ScimValue::as_complex)
            .filter(|data| matches!(data.get_raw("primary"), Some(ScimValue::Boolean(true))))
            .count()
    }

    fn validate_single(&self, value: &ScimValue) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        if let Err(error) = self.check_kind(value) {
            issues.add_error(error, false, Location::root());
            return issues;
        }

        match (&self.kind, value) {
            (AttributeKind::Binary, ScimValue::String(s)) if BASE64.decode(s).is_err() => {
                issues.add_error(
                    ValidationError::BadEncoding {
                        expected: "base64".to_string(),
                    },
                    false,
                    Location::root(),
                );
            }
            (AttributeKind::ExternalReference, ScimValue::String(s))
                if !ABSOLUTE_URI_REGEX.is_match(s) =>
            {
                issues.add_error(
                    ValidationError::bad_syntax(format!("'{}' is not an absolute URI", s)),
                    false,
                    Location::root(),
                );
            }
            (AttributeKind::UriReference, ScimValue::String(s))
                if s.is_empty() || s.chars().any(char::is_whitespace) =>
            {
                issues.add_error(
                    ValidationError::bad_syntax(format!("'{}' is not a URI", s)),
                    false,
                    Location::root(),
                );
            }
            (AttributeKind::ScimReference { resource_types }, ScimValue::String(s)) => {
                if !Self::references_resource_type(s, resource_types) {
                    issues.add_error(
                        ValidationError::BadScimReference {
                            allowed: resource_types.clone(),
                        },
                        true,
                        Location::root(),
                    );
                }
            }
            (AttributeKind::Complex { sub_attributes }, ScimValue::Complex(data)) => {
                for sub_attribute in sub_attributes.iter() {
                    if let Some(sub_value) = data.get_raw(sub_attribute.name().as_str()) {
                        issues.merge(
                            sub_attribute.validate(sub_value),
                            sub_attribute.name().as_str(),
                        );
                    }
                }
            }
            _ => {}
        }

        if let ScimValue::String(s) = value {
            self.check_canonical(s, &mut issues);
        }
        issues
    }

    /// Strict kind check. Integers are accepted where decimals are expected and
    /// RFC 3339 strings where date-times are expected.
    fn check_kind(&self, value: &ScimValue) -> Result<(), ValidationError> {
        let expected = self.attribute_type();
        let kind_matches = match (&self.kind, value) {
            (AttributeKind::Boolean, ScimValue::Boolean(_)) => true,
            (AttributeKind::Integer, ScimValue::Integer(_)) => true,
            (AttributeKind::Decimal, ScimValue::Integer(_) | ScimValue::Decimal(_)) => true,
            (AttributeKind::DateTime, ScimValue::DateTime(_)) => true,
            (AttributeKind::DateTime, ScimValue::String(s)) => {
                if DateTime::parse_from_rfc3339(s).is_err() {
                    return Err(ValidationError::bad_syntax(format!(
                        "'{}' is not a valid RFC 3339 date-time",
                        s
                    )));
                }
                true
            }
            (AttributeKind::Complex { .. }, ScimValue::Complex(_)) => true,
            (kind, ScimValue::String(_)) => kind.is_string_like(),
            _ => false,
        };
        if kind_matches {
            Ok(())
        } else {
            Err(ValidationError::bad_type(expected.as_str(), value.type_name()))
        }
    }

    /// Whether one of the reference's path segments names an allowed resource type,
    /// either singular (`User`) or as its endpoint (`Users`).
    fn references_resource_type(reference: &str, resource_types: &[String]) -> bool {
        if reference.is_empty() || reference.chars().any(char::is_whitespace) {
            return false;
        }
        if resource_types.is_empty() {
            return true;
        }
        reference.split('/').any(|segment| {
            resource_types.iter().any(|resource_type| {
                segment.eq_ignore_ascii_case(resource_type)
                    || segment.eq_ignore_ascii_case(&format!("{}s", resource_type))
            })
        })
    }

    fn check_canonical(&self, value: &str, issues: &mut ValidationIssues) {
        if self.canonical_values.is_empty() {
            return;
        }
        let matches = self.canonical_values.iter().any(|canonical| {
            if self.case_exact {
                canonical == value
            } else {
                canonical.to_lowercase() == value.to_lowercase()
            }
        });
        if matches {
            return;
        }
        if self.restrict_canonical_values {
            issues.add_error(
                ValidationError::MustBeOneOf {
                    expected: self.canonical_values.clone(),
                    provided: value.to_string(),
                },
                false,
                Location::root(),
            );
        } else {
            issues.add_warning(
                ValidationWarning::NotCanonical {
                    expected: self.canonical_values.clone(),
                    provided: value.to_string(),
                },
                Location::root(),
            );
        }
    }

    /// Direction-aware presence check.
    ///
    /// - A present value in a request is rejected (non-fatal) when the service
    ///   provider issues it, unless `ignore_issuer` is set.
    /// - A present value in a response is rejected when it is never returned, or
    ///   when it was excluded and is not always returned.
    /// - An absent value is missing (fatal) when the attribute is required, would
    ///   not be issued by the service provider in a request, and was either
    ///   explicitly included or is always returned in a response.
    pub fn validate_presence(
        &self,
        value: &ScimValue,
        direction: DataDirection,
        inclusivity: Option<DataInclusivity>,
        ignore_issuer: bool,
    ) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let service_issued_request = direction == DataDirection::Request
            && self.issuer == AttributeIssuer::ServiceProvider
            && !ignore_issuer;

        if value.is_present() {
            if service_issued_request {
                issues.add_error(ValidationError::MustNotBeProvided, true, Location::root());
            } else if direction == DataDirection::Response
                && (self.returned == Returned::Never
                    || (self.returned != Returned::Always
                        && inclusivity == Some(DataInclusivity::Exclude)))
            {
                issues.add_error(ValidationError::MustNotBeReturned, false, Location::root());
            }
            return issues;
        }

        let requested = inclusivity == Some(DataInclusivity::Include)
            || (direction == DataDirection::Response && self.returned == Returned::Always);
        if self.required && !service_issued_request && requested {
            issues.add_error(ValidationError::MissingValue, false, Location::root());
        }
        issues
    }

    /// Coerce an inbound value: RFC 3339 strings become date-times, integers become
    /// decimals where decimals are expected, and unknown sub-attributes are dropped.
    pub fn deserialize(&self, value: ScimValue) -> ScimValue {
        let value = match value {
            ScimValue::List(items) if self.multi_valued => ScimValue::List(
                items
                    .into_iter()
                    .map(|item| self.deserialize_single(item))
                    .collect(),
            ),
            value => self.deserialize_single(value),
        };
        match &self.deserializer {
            Some(deserializer) => deserializer(value),
            None => value,
        }
    }

    fn deserialize_single(&self, value: ScimValue) -> ScimValue {
        match (&self.kind, value) {
            (AttributeKind::DateTime, ScimValue::String(s)) => {
                match DateTime::parse_from_rfc3339(&s) {
                    Ok(date_time) => ScimValue::DateTime(date_time),
                    Err(_) => ScimValue::String(s),
                }
            }
            (AttributeKind::Decimal, ScimValue::Integer(i)) => ScimValue::Decimal(i as f64),
            (AttributeKind::Complex { sub_attributes }, ScimValue::Complex(data)) => {
                ScimValue::Complex(sub_attributes.convert(&data, Attribute::deserialize))
            }
            (_, value) => value,
        }
    }

    /// Render an outbound value: date-times become RFC 3339 strings.
    pub fn serialize(&self, value: ScimValue) -> ScimValue {
        let value = match value {
            ScimValue::List(items) if self.multi_valued => ScimValue::List(
                items
                    .into_iter()
                    .map(|item| self.serialize_single(item))
                    .collect(),
            ),
            value => self.serialize_single(value),
        };
        match &self.serializer {
            Some(serializer) => serializer(value),
            None => value,
        }
    }

    fn serialize_single(&self, value: ScimValue) -> ScimValue {
        match (&self.kind, value) {
            (_, ScimValue::DateTime(date_time)) => match ScimValue::DateTime(date_time).to_json() {
                Value::String(s) => ScimValue::String(s),
                other => ScimValue::from_json(other),
            },
            (AttributeKind::Complex { sub_attributes }, ScimValue::Complex(data)) => {
                ScimValue::Complex(sub_attributes.convert(&data, Attribute::serialize))
            }
            (_, value) => value,
        }
    }

    /// RFC 7643 §7 representation of the attribute.
    pub fn to_schema_json(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("name".to_string(), json!(self.name.as_str()));
        schema.insert("type".to_string(), json!(self.attribute_type()));
        schema.insert("multiValued".to_string(), json!(self.multi_valued));
        schema.insert("description".to_string(), json!(self.description));
        schema.insert("required".to_string(), json!(self.required));
        if self.kind.is_string_like() {
            schema.insert("caseExact".to_string(), json!(self.case_exact));
        }
        if !self.canonical_values.is_empty() {
            schema.insert("canonicalValues".to_string(), json!(self.canonical_values));
        }
        schema.insert("mutability".to_string(), json!(self.mutability));
        schema.insert("returned".to_string(), json!(self.returned));
        schema.insert("uniqueness".to_string(), json!(self.uniqueness));
        if let Some(reference_types) = self.kind.reference_types() {
            schema.insert("referenceTypes".to_string(), json!(reference_types));
        }
        if let Some(sub_attributes) = self.sub_attributes() {
            schema.insert(
                "subAttributes".to_string(),
                Value::Array(sub_attributes.iter().map(Attribute::to_schema_json).collect()),
            );
        }
        Value::Object(schema)
    }
}

/// Builder for [`Attribute`].
pub struct AttributeBuilder {
    name: String,
    kind: AttributeKind,
    sub_attributes: Vec<Attribute>,
    description: String,
    required: bool,
    multi_valued: bool,
    case_exact: bool,
    mutability: Mutability,
    returned: Returned,
    uniqueness: Uniqueness,
    issuer: AttributeIssuer,
    canonical_values: Vec<String>,
    restrict_canonical_values: bool,
    validators: Vec<AttributeValidator>,
    serializer: Option<ValueConverter>,
    deserializer: Option<ValueConverter>,
}

impl AttributeBuilder {
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            sub_attributes: Vec::new(),
            description: String::new(),
            required: false,
            multi_valued: false,
            case_exact: false,
            mutability: Mutability::default(),
            returned: Returned::default(),
            uniqueness: Uniqueness::default(),
            issuer: AttributeIssuer::default(),
            canonical_values: Vec::new(),
            restrict_canonical_values: false,
            validators: Vec::new(),
            serializer: None,
            deserializer: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multi_valued(mut self) -> Self {
        self.multi_valued = true;
        self
    }

    pub fn case_exact(mut self) -> Self {
        self.case_exact = true;
        self
    }

    pub fn with_mutability(mut self, mutability: Mutability) -> Self {
        self.mutability = mutability;
        self
    }

    pub fn with_returned(mut self, returned: Returned) -> Self {
        self.returned = returned;
        self
    }

    pub fn with_uniqueness(mut self, uniqueness: Uniqueness) -> Self {
        self.uniqueness = uniqueness;
        self
    }

    pub fn with_issuer(mut self, issuer: AttributeIssuer) -> Self {
        self.issuer = issuer;
        self
    }

    /// Canonical values; a mismatch is an error when `restrict` is set and a
    /// warning otherwise.
    pub fn with_canonical_values<I, S>(mut self, values: I, restrict: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.canonical_values = values.into_iter().map(Into::into).collect();
        self.restrict_canonical_values = restrict;
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&ScimValue) -> ValidationIssues + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn with_serializer<F>(mut self, serializer: F) -> Self
    where
        F: Fn(ScimValue) -> ScimValue + Send + Sync + 'static,
    {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    pub fn with_deserializer<F>(mut self, deserializer: F) -> Self
    where
        F: Fn(ScimValue) -> ScimValue + Send + Sync + 'static,
    {
        self.deserializer = Some(Arc::new(deserializer));
        self
    }

    pub fn with_sub_attribute(mut self, sub_attribute: Attribute) -> Self {
        self.sub_attributes.push(sub_attribute);
        self
    }

    pub fn with_sub_attributes(
        mut self,
        sub_attributes: impl IntoIterator<Item = Attribute>,
    ) -> Self {
        self.sub_attributes.extend(sub_attributes);
        self
    }

    /// Build the attribute.
    ///
    /// Fails on an invalid name, on sub-attributes of a non-complex attribute, on
    /// a complex sub-attribute, and on duplicate sub-attribute names.
    pub fn build(self) -> BuildResult<Attribute> {
        let name = AttrName::new(self.name.as_str()).map_err(|_| BuildError::InvalidName {
            name: self.name.clone(),
        })?;

        let kind = match self.kind {
            AttributeKind::Complex { .. } => {
                let mut sub_attributes = Attrs::default();
                for sub_attribute in self.sub_attributes {
                    if sub_attribute.is_complex() {
                        return Err(BuildError::NestedComplexAttribute {
                            attribute: name.to_string(),
                            sub_attribute: sub_attribute.name().to_string(),
                        });
                    }
                    sub_attributes.insert(sub_attribute)?;
                }
                AttributeKind::Complex { sub_attributes }
            }
            kind if !self.sub_attributes.is_empty() => {
                return Err(BuildError::InvalidConfiguration {
                    message: format!(
                        "'{}' of type '{}' can not have sub-attributes",
                        name,
                        kind.attribute_type()
                    ),
                });
            }
            kind => kind,
        };

        Ok(Attribute {
            name,
            kind,
            description: self.description,
            required: self.required,
            multi_valued: self.multi_valued,
            case_exact: self.case_exact,
            mutability: self.mutability,
            returned: self.returned,
            uniqueness: self.uniqueness,
            issuer: self.issuer,
            canonical_values: self.canonical_values,
            restrict_canonical_values: self.restrict_canonical_values,
            validators: self.validators,
            serializer: self.serializer,
            deserializer: self.deserializer,
        })
    }
}

/// Ordered attribute set with case-insensitive lookup.
#[derive(Debug, Clone, Default)]
pub struct Attrs {
    attrs: IndexMap<String, Attribute>,
}

impl Attrs {
    /// Build a set, rejecting duplicate names.
    pub fn new(attrs: impl IntoIterator<Item = Attribute>) -> BuildResult<Self> {
        let mut set = Self::default();
        for attr in attrs {
            set.insert(attr)?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, attr: Attribute) -> BuildResult<()> {
        let key = attr.name().lower().to_string();
        if self.attrs.contains_key(&key) {
            return Err(BuildError::DuplicateAttribute {
                name: attr.name().to_string(),
            });
        }
        self.attrs.insert(key, attr);
        Ok(())
    }

    pub fn get(&self, name: &AttrName) -> Option<&Attribute> {
        self.attrs.get(name.lower())
    }

    /// Case-insensitive lookup by plain text.
    pub fn get_by_name(&self, name: &str) -> Option<&Attribute> {
        self.attrs.get(&name.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.values()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Convert every known attribute of `data` with `convert`, keyed by the
    /// attribute's declared name. Unknown keys are dropped.
    pub(crate) fn convert(
        &self,
        data: &ScimData,
        convert: impl Fn(&Attribute, ScimValue) -> ScimValue,
    ) -> ScimData {
        let mut converted = ScimData::new();
        for attr in self.iter() {
            if let Some(value) = data.get_raw(attr.name().as_str()) {
                converted.insert_raw(attr.name().as_str(), convert(attr, value.clone()));
            }
        }
        converted
    }
}
