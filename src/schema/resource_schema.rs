//! Resource schemas, schema extensions, and whole-resource validation.
//!
//! A [`ResourceSchema`] groups the common attributes (`schemas`, `id`,
//! `externalId`, `meta`), the resource's own attributes, and any number of
//! [`SchemaExtension`]s. Validation walks every attribute of the base schema and
//! of each extension in three passes: presence, type, and per-element
//! sub-attribute presence. Extension attributes are reported under
//! `[extension uri, attribute]` locations.

use super::attribute::{Attribute, Attrs};
use super::presence::AttrValuePresenceConfig;
use super::types::{AttributeIssuer, DataInclusivity, Mutability, Returned, Uniqueness};
use crate::data::{ScimData, ScimValue};
use crate::error::{BuildError, BuildResult, ValidationError};
use crate::issues::{Location, ValidationIssues};
use crate::value_objects::{AttrRef, BoundedAttrRep, SchemaUri};
use log::{debug, trace};
use serde_json::{Value, json};

/// Schema URI of schema representations.
pub const SCHEMA_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:Schema";

/// Schema URI of resource type representations.
pub const RESOURCE_TYPE_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:ResourceType";

const COMMON_ATTRIBUTE_NAMES: [&str; 4] = ["schemas", "id", "externalId", "meta"];

fn common_attributes() -> BuildResult<Vec<Attribute>> {
    Ok(vec![
        Attribute::uri_reference("schemas")
            .with_description("Schema URIs the resource conforms to")
            .required()
            .multi_valued()
            .with_returned(Returned::Always)
            .build()?,
        Attribute::string("id")
            .with_description("Unique identifier assigned by the service provider")
            .required()
            .case_exact()
            .with_mutability(Mutability::ReadOnly)
            .with_returned(Returned::Always)
            .with_uniqueness(Uniqueness::Server)
            .with_issuer(AttributeIssuer::ServiceProvider)
            .build()?,
        Attribute::string("externalId")
            .with_description("Identifier assigned by the provisioning client")
            .case_exact()
            .build()?,
        Attribute::complex("meta")
            .with_description("Resource metadata")
            .with_mutability(Mutability::ReadOnly)
            .with_issuer(AttributeIssuer::ServiceProvider)
            .with_sub_attribute(
                Attribute::string("resourceType")
                    .case_exact()
                    .with_mutability(Mutability::ReadOnly)
                    .build()?,
            )
            .with_sub_attribute(
                Attribute::date_time("created")
                    .with_mutability(Mutability::ReadOnly)
                    .build()?,
            )
            .with_sub_attribute(
                Attribute::date_time("lastModified")
                    .with_mutability(Mutability::ReadOnly)
                    .build()?,
            )
            .with_sub_attribute(
                Attribute::uri_reference("location")
                    .case_exact()
                    .with_mutability(Mutability::ReadOnly)
                    .build()?,
            )
            .with_sub_attribute(
                Attribute::string("version")
                    .case_exact()
                    .with_mutability(Mutability::ReadOnly)
                    .build()?,
            )
            .build()?,
    ])
}

/// A schema extension: a named attribute set stored under its URI in resource data.
#[derive(Debug, Clone)]
pub struct SchemaExtension {
    schema: SchemaUri,
    name: String,
    description: String,
    attrs: Attrs,
}

impl SchemaExtension {
    pub fn builder(uri: impl Into<String>, name: impl Into<String>) -> SchemaExtensionBuilder {
        SchemaExtensionBuilder {
            uri: uri.into(),
            name: name.into(),
            description: String::new(),
            attrs: Vec::new(),
        }
    }

    pub fn schema(&self) -> &SchemaUri {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn attributes(&self) -> &Attrs {
        &self.attrs
    }

    /// RFC 7643 §7 schema representation.
    pub fn to_schema_json(&self) -> Value {
        schema_json(&self.schema, &self.name, &self.description, self.attrs.iter())
    }
}

/// Builder for [`SchemaExtension`].
pub struct SchemaExtensionBuilder {
    uri: String,
    name: String,
    description: String,
    attrs: Vec<Attribute>,
}

impl SchemaExtensionBuilder {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attrs.push(attribute);
        self
    }

    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attrs.extend(attributes);
        self
    }

    /// Register the extension URI and build the extension.
    pub fn build(self) -> BuildResult<SchemaExtension> {
        let schema = SchemaUri::register(&self.uri, true)?;
        trace!("Built schema extension '{}'", schema);
        Ok(SchemaExtension {
            schema,
            name: self.name,
            description: self.description,
            attrs: Attrs::new(self.attrs)?,
        })
    }
}

#[derive(Debug, Clone)]
struct ExtensionEntry {
    extension: SchemaExtension,
    required: bool,
}

/// A resource type's schema: base attributes plus extensions.
///
/// ```rust
/// use scim_core::data::ScimData;
/// use scim_core::schema::{AttrValuePresenceConfig, Attribute, ResourceSchema};
/// use serde_json::json;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let schema = ResourceSchema::builder("urn:example:doc:2.0:Widget", "Widget", "/Widgets")
///         .with_attribute(Attribute::string("label").required().build()?)
///         .build()?;
///
///     let data = ScimData::try_from(json!({
///         "schemas": ["urn:example:doc:2.0:Widget"],
///         "label": 42
///     }))?;
///     let issues = schema.validate(&data, &AttrValuePresenceConfig::request());
///     assert_eq!(issues.error_codes_at("label"), vec![1]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    schema: SchemaUri,
    name: String,
    endpoint: String,
    description: String,
    attrs: Attrs,
    extensions: Vec<ExtensionEntry>,
}

impl ResourceSchema {
    pub fn builder(
        uri: impl Into<String>,
        name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> ResourceSchemaBuilder {
        ResourceSchemaBuilder {
            uri: uri.into(),
            name: name.into(),
            endpoint: endpoint.into(),
            description: String::new(),
            attrs: Vec::new(),
            extensions: Vec::new(),
        }
    }

    pub fn schema(&self) -> &SchemaUri {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Base attributes, common attributes first.
    pub fn attributes(&self) -> &Attrs {
        &self.attrs
    }

    /// Extensions with their `required` flag.
    pub fn extensions(&self) -> impl Iterator<Item = (&SchemaExtension, bool)> {
        self.extensions
            .iter()
            .map(|entry| (&entry.extension, entry.required))
    }

    pub fn extension(&self, uri: &SchemaUri) -> Option<&SchemaExtension> {
        self.extensions
            .iter()
            .map(|entry| &entry.extension)
            .find(|extension| extension.schema() == uri)
    }

    /// All schema URIs of the resource, base first.
    pub fn schema_uris(&self) -> Vec<SchemaUri> {
        std::iter::once(self.schema.clone())
            .chain(self.extensions.iter().map(|entry| entry.extension.schema.clone()))
            .collect()
    }

    /// Attribute set of the base schema or one of the extensions.
    pub fn attrs_for(&self, uri: &SchemaUri) -> Option<&Attrs> {
        if *uri == self.schema {
            Some(&self.attrs)
        } else {
            self.extension(uri).map(SchemaExtension::attributes)
        }
    }

    fn all_attrs(&self) -> impl Iterator<Item = (&SchemaUri, &Attrs)> {
        std::iter::once((&self.schema, &self.attrs)).chain(
            self.extensions
                .iter()
                .map(|entry| (&entry.extension.schema, &entry.extension.attrs)),
        )
    }

    /// Bind a user-supplied reference to this schema.
    ///
    /// Unbounded references are looked up in the base schema first, then in each
    /// extension. Returns `None` when no attribute (or sub-attribute) matches.
    pub fn resolve(&self, reference: &AttrRef) -> Option<BoundedAttrRep> {
        match reference {
            AttrRef::Bounded(rep) => self.attribute(rep).map(|_| rep.clone()),
            AttrRef::Unbounded(rep) => self.all_attrs().find_map(|(schema, _)| {
                let bounded = BoundedAttrRep::bind(schema.clone(), rep.clone());
                self.attribute(&bounded).map(|_| bounded)
            }),
        }
    }

    /// The attribute or sub-attribute `rep` points to.
    pub fn attribute(&self, rep: &BoundedAttrRep) -> Option<&Attribute> {
        let attribute = self.attrs_for(rep.schema())?.get(rep.attr())?;
        match rep.sub_attr() {
            Some(sub_attr) => attribute.sub_attributes()?.get(sub_attr),
            None => Some(attribute),
        }
    }

    /// Every attribute and sub-attribute reference of the schema.
    pub fn attr_reps(&self) -> Vec<BoundedAttrRep> {
        let mut reps = Vec::new();
        for (schema, attrs) in self.all_attrs() {
            for attribute in attrs.iter() {
                let rep = BoundedAttrRep::new(schema.clone(), attribute.name().clone(), None);
                if let Some(sub_attributes) = attribute.sub_attributes() {
                    for sub_attribute in sub_attributes.iter() {
                        reps.push(rep.child(sub_attribute.name().clone()));
                    }
                }
                reps.push(rep);
            }
        }
        reps
    }

    /// References of required attributes and required sub-attributes.
    ///
    /// Used as an inclusion list when validating resource creation, so that
    /// required values are reported missing in requests.
    pub fn required_attr_reps(&self) -> Vec<AttrRef> {
        let mut reps = Vec::new();
        for (schema, attrs) in self.all_attrs() {
            for attribute in attrs.iter() {
                let rep = BoundedAttrRep::new(schema.clone(), attribute.name().clone(), None);
                if let Some(sub_attributes) = attribute.sub_attributes() {
                    for sub_attribute in sub_attributes.iter().filter(|sub| sub.required()) {
                        reps.push(AttrRef::Bounded(rep.child(sub_attribute.name().clone())));
                    }
                }
                if attribute.required() {
                    reps.push(AttrRef::Bounded(rep));
                }
            }
        }
        reps
    }

    /// Location of an attribute in data: `[attr]` for the base schema and
    /// `[uri, attr]` for extensions.
    fn location_of(schema: &SchemaUri, attribute: &Attribute) -> Location {
        if schema.is_extension() {
            Location::from([schema.as_str(), attribute.name().as_str()])
        } else {
            Location::from(attribute.name().as_str())
        }
    }

    /// Validate a complete resource.
    ///
    /// Checks presence, types and sub-attribute presence of every attribute,
    /// required extensions, and the `schemas` attribute. Never modifies `data`.
    pub fn validate(&self, data: &ScimData, config: &AttrValuePresenceConfig) -> ValidationIssues {
        let mut issues = self.validate_attributes(data, config, true);
        self.validate_schemas_attribute(data, &mut issues);
        debug!(
            "Validated '{}' resource: {} error(s), {} warning(s)",
            self.name,
            issues.errors().count(),
            issues.warnings().count()
        );
        issues
    }

    /// Validate a partial resource body, as sent in PATCH operations without a path.
    ///
    /// Required attributes, required extensions and `schemas` are not checked.
    pub fn validate_partial(&self, data: &ScimData) -> ValidationIssues {
        self.validate_attributes(data, &AttrValuePresenceConfig::request(), false)
    }

    fn validate_attributes(
        &self,
        data: &ScimData,
        config: &AttrValuePresenceConfig,
        check_required_extensions: bool,
    ) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        let empty = ScimData::new();

        for (schema, attrs) in self.all_attrs() {
            let container = if schema.is_extension() {
                match data.get_raw(schema.as_str()) {
                    Some(ScimValue::Complex(container)) => container,
                    None | Some(ScimValue::Null) => &empty,
                    Some(other) => {
                        issues.add_error(
                            ValidationError::bad_type("complex", other.type_name()),
                            false,
                            schema.as_str(),
                        );
                        continue;
                    }
                }
            } else {
                data
            };

            let required_extension = self
                .extensions
                .iter()
                .any(|entry| entry.required && entry.extension.schema == *schema);
            if check_required_extensions && required_extension && container.is_empty() {
                issues.add_error(ValidationError::MissingValue, false, schema.as_str());
                continue;
            }

            for attribute in attrs.iter() {
                let rep = BoundedAttrRep::new(schema.clone(), attribute.name().clone(), None);
                let location = Self::location_of(schema, attribute);
                let value = container
                    .get_raw(attribute.name().as_str())
                    .unwrap_or(&ScimValue::Null);
                self.validate_attribute(attribute, &rep, value, &location, config, &mut issues);
            }
        }
        issues
    }

    fn validate_attribute(
        &self,
        attribute: &Attribute,
        rep: &BoundedAttrRep,
        value: &ScimValue,
        location: &Location,
        config: &AttrValuePresenceConfig,
        issues: &mut ValidationIssues,
    ) {
        issues.merge(
            attribute.validate_presence(
                value,
                config.direction(),
                config.inclusivity(rep),
                config.ignores_issuer(rep),
            ),
            location,
        );
        if !issues.can_proceed_at(&[location.clone()]) || value.is_null() {
            return;
        }

        issues.merge(attribute.validate(value), location);
        if !issues.can_proceed_at(&[location.clone()]) {
            return;
        }

        let Some(sub_attributes) = attribute.sub_attributes() else {
            return;
        };
        let elements: Vec<(Location, &ScimValue)> = match value {
            ScimValue::List(items) if attribute.multi_valued() => items
                .iter()
                .enumerate()
                .map(|(index, item)| (location.child(index), item))
                .collect(),
            value => vec![(location.clone(), value)],
        };
        for (element_location, element) in elements {
            let Some(element_data) = element.as_complex() else {
                continue;
            };
            if !issues.can_proceed_at(&[element_location.clone()]) {
                continue;
            }
            for sub_attribute in sub_attributes.iter() {
                let sub_rep = rep.child(sub_attribute.name().clone());
                let sub_value = element_data
                    .get_raw(sub_attribute.name().as_str())
                    .unwrap_or(&ScimValue::Null);
                issues.merge(
                    sub_attribute.validate_presence(
                        sub_value,
                        config.direction(),
                        config.inclusivity(&sub_rep),
                        config.ignores_issuer(&sub_rep),
                    ),
                    element_location.child(sub_attribute.name().as_str()),
                );
            }
        }
    }

    fn validate_schemas_attribute(&self, data: &ScimData, issues: &mut ValidationIssues) {
        let location = Location::from("schemas");
        if !issues.can_proceed_at(&[location.clone()]) {
            return;
        }
        let Some(ScimValue::List(items)) = data.get_raw("schemas") else {
            return;
        };
        let declared: Vec<&str> = items.iter().filter_map(ScimValue::as_str).collect();
        let is_declared = |uri: &SchemaUri| {
            declared
                .iter()
                .any(|value| value.to_lowercase() == uri.lower())
        };

        if !is_declared(&self.schema) {
            issues.add_error(
                ValidationError::MissingBaseSchema {
                    uri: self.schema.to_string(),
                },
                true,
                &location,
            );
        }

        let known = self.schema_uris();
        for (index, item) in items.iter().enumerate() {
            let Some(value) = item.as_str() else {
                continue;
            };
            let lower = value.to_lowercase();
            if !known.iter().any(|uri| uri.lower() == lower) {
                issues.add_error(
                    ValidationError::UnknownSchema {
                        uri: value.to_string(),
                    },
                    true,
                    location.child(index),
                );
            }
        }

        for entry in &self.extensions {
            let uri = &entry.extension.schema;
            let has_data = data
                .get_raw(uri.as_str())
                .is_some_and(ScimValue::is_present);
            if has_data && !is_declared(uri) {
                issues.add_error(
                    ValidationError::MissingSchemaExtension {
                        uri: uri.to_string(),
                    },
                    true,
                    &location,
                );
            }
        }
    }

    /// Drop what must not be returned: `returned=never` attributes,
    /// `returned=request` attributes that were not requested, and attributes the
    /// inclusion list does not allow unless they are always returned.
    pub fn project(&self, data: &ScimData, config: &AttrValuePresenceConfig) -> ScimData {
        let mut projected = ScimData::new();
        for (schema, attrs) in self.all_attrs() {
            let container = if schema.is_extension() {
                match data.get_raw(schema.as_str()) {
                    Some(ScimValue::Complex(container)) => container,
                    _ => continue,
                }
            } else {
                data
            };

            let mut kept = ScimData::new();
            for attribute in attrs.iter() {
                let Some(value) = container.get_raw(attribute.name().as_str()) else {
                    continue;
                };
                let rep = BoundedAttrRep::new(schema.clone(), attribute.name().clone(), None);
                if let Some(value) = Self::project_attribute(attribute, &rep, value, config) {
                    kept.insert_raw(attribute.name().as_str(), value);
                }
            }

            if !schema.is_extension() {
                for (key, value) in &kept {
                    projected.insert_raw(key.as_str(), value.clone());
                }
            } else if !kept.is_empty() {
                projected.insert_raw(schema.as_str(), kept);
            }
        }
        projected
    }

    fn returns(
        attribute: &Attribute,
        rep: &BoundedAttrRep,
        config: &AttrValuePresenceConfig,
    ) -> bool {
        match attribute.returned() {
            Returned::Never => false,
            Returned::Always => true,
            Returned::Request => config.inclusivity(rep) == Some(DataInclusivity::Include),
            Returned::Default => config.allowed(rep),
        }
    }

    fn project_attribute(
        attribute: &Attribute,
        rep: &BoundedAttrRep,
        value: &ScimValue,
        config: &AttrValuePresenceConfig,
    ) -> Option<ScimValue> {
        if !Self::returns(attribute, rep, config) {
            return None;
        }
        if attribute.returned() == Returned::Always {
            return Some(value.clone());
        }
        let Some(sub_attributes) = attribute.sub_attributes() else {
            return Some(value.clone());
        };

        let project_element = |element: &ScimData| {
            let mut kept = ScimData::new();
            for sub_attribute in sub_attributes.iter() {
                let Some(sub_value) = element.get_raw(sub_attribute.name().as_str()) else {
                    continue;
                };
                let sub_rep = rep.child(sub_attribute.name().clone());
                if Self::returns(sub_attribute, &sub_rep, config) {
                    kept.insert_raw(sub_attribute.name().as_str(), sub_value.clone());
                }
            }
            kept
        };

        match value {
            ScimValue::Complex(element) => {
                let kept = project_element(element);
                (!kept.is_empty()).then_some(ScimValue::Complex(kept))
            }
            ScimValue::List(items) => {
                let kept: Vec<ScimValue> = items
                    .iter()
                    .map(|item| match item {
                        ScimValue::Complex(element) => ScimValue::Complex(project_element(element)),
                        other => other.clone(),
                    })
                    .filter(ScimValue::is_present)
                    .collect();
                (!kept.is_empty()).then_some(ScimValue::List(kept))
            }
            other => Some(other.clone()),
        }
    }

    /// Coerce inbound data. Known attributes are converted and keyed with their
    /// declared names; unknown attributes are dropped.
    pub fn deserialize(&self, data: &ScimData) -> ScimData {
        self.convert(data, Attribute::deserialize)
    }

    /// Render outbound data as JSON.
    pub fn serialize(&self, data: &ScimData) -> Value {
        self.convert(data, Attribute::serialize).to_plain()
    }

    fn convert(
        &self,
        data: &ScimData,
        convert: fn(&Attribute, ScimValue) -> ScimValue,
    ) -> ScimData {
        let mut converted = self.attrs.convert(data, convert);
        for entry in &self.extensions {
            let extension = &entry.extension;
            if let Some(ScimValue::Complex(container)) = data.get_raw(extension.schema.as_str()) {
                converted.insert_raw(
                    extension.schema.as_str(),
                    extension.attrs.convert(container, convert),
                );
            }
        }
        converted
    }

    /// RFC 7643 §7 schema representation of the base schema, without the
    /// common attributes.
    pub fn to_schema_json(&self) -> Value {
        let own = self.attrs.iter().filter(|attribute| {
            !COMMON_ATTRIBUTE_NAMES
                .iter()
                .any(|common| attribute.name().matches(common))
        });
        schema_json(&self.schema, &self.name, &self.description, own)
    }

    /// RFC 7643 §6 resource type representation.
    pub fn to_resource_type_json(&self) -> Value {
        let extensions: Vec<Value> = self
            .extensions
            .iter()
            .map(|entry| json!({"schema": entry.extension.schema, "required": entry.required}))
            .collect();
        json!({
            "schemas": [RESOURCE_TYPE_URI],
            "id": self.name,
            "name": self.name,
            "endpoint": self.endpoint,
            "description": self.description,
            "schema": self.schema,
            "schemaExtensions": extensions,
            "meta": {
                "resourceType": "ResourceType",
                "location": format!("/ResourceTypes/{}", self.name),
            },
        })
    }
}

fn schema_json<'a>(
    schema: &SchemaUri,
    name: &str,
    description: &str,
    attributes: impl Iterator<Item = &'a Attribute>,
) -> Value {
    json!({
        "schemas": [SCHEMA_URI],
        "id": schema,
        "name": name,
        "description": description,
        "attributes": attributes.map(Attribute::to_schema_json).collect::<Vec<_>>(),
        "meta": {
            "resourceType": "Schema",
            "location": format!("/Schemas/{}", schema),
        },
    })
}

/// Builder for [`ResourceSchema`].
pub struct ResourceSchemaBuilder {
    uri: String,
    name: String,
    endpoint: String,
    description: String,
    attrs: Vec<Attribute>,
    extensions: Vec<ExtensionEntry>,
}

impl ResourceSchemaBuilder {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attrs.push(attribute);
        self
    }

    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attrs.extend(attributes);
        self
    }

    pub fn with_extension(mut self, extension: SchemaExtension, required: bool) -> Self {
        self.extensions.push(ExtensionEntry {
            extension,
            required,
        });
        self
    }

    /// Register the base schema URI and build the schema.
    ///
    /// Fails when an attribute clashes with a common attribute or another
    /// attribute, or when an extension is added twice.
    pub fn build(self) -> BuildResult<ResourceSchema> {
        let schema = SchemaUri::register(&self.uri, false)?;
        let attrs = Attrs::new(common_attributes()?.into_iter().chain(self.attrs))?;

        for (index, entry) in self.extensions.iter().enumerate() {
            let duplicate = self.extensions[..index]
                .iter()
                .any(|other| other.extension.schema == entry.extension.schema);
            if duplicate {
                return Err(BuildError::DuplicateSchema {
                    uri: entry.extension.schema.to_string(),
                });
            }
        }

        debug!(
            "Built resource schema '{}' ({}) with {} attribute(s) and {} extension(s)",
            self.name,
            schema,
            attrs.len(),
            self.extensions.len()
        );
        Ok(ResourceSchema {
            schema,
            name: self.name,
            endpoint: self.endpoint,
            description: self.description,
            attrs,
            extensions: self.extensions,
        })
    }
}
