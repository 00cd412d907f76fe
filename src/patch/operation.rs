//! PATCH operations and request validation (RFC 7644 §3.5.2).
//!
//! Schema validation alone does not enforce update-time mutability, so every
//! operation additionally rejects values for read-only attributes and
//! sub-attributes.

use super::PatchPath;
use crate::config::ServiceConfig;
use crate::data::{ScimData, ScimValue};
use crate::error::ValidationError;
use crate::filter::OperatorRegistry;
use crate::issues::{Location, ValidationIssues};
use crate::schema::{Attribute, Mutability, ResourceSchema};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Schema URI of PATCH request messages.
pub const PATCH_OP_URI: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// Kind of a PATCH operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOpKind {
    Add,
    Replace,
    Remove,
}

impl PatchOpKind {
    pub const ALL: [PatchOpKind; 3] = [Self::Add, Self::Replace, Self::Remove];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Replace => "replace",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for PatchOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatchOpKind {
    type Err = ValidationError;

    /// Case-insensitive, as some clients send `Add` or `REPLACE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::MustBeOneOf {
                expected: Self::ALL.iter().map(|kind| kind.as_str().to_string()).collect(),
                provided: s.to_string(),
            })
    }
}

/// A single PATCH operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOperation {
    op: PatchOpKind,
    path: Option<PatchPath>,
    value: Option<ScimValue>,
}

impl PatchOperation {
    pub fn new(op: PatchOpKind, path: Option<PatchPath>, value: Option<ScimValue>) -> Self {
        Self { op, path, value }
    }

    pub fn op(&self) -> PatchOpKind {
        self.op
    }

    pub fn path(&self) -> Option<&PatchPath> {
        self.path.as_ref()
    }

    pub fn value(&self) -> Option<&ScimValue> {
        self.value.as_ref()
    }

    /// Validate the operation against `schema`.
    ///
    /// Issues are located relative to the operation: `path` for target
    /// problems, `value` (and below) for value problems.
    pub fn validate(&self, schema: &ResourceSchema) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        match (&self.path, self.op) {
            (None, PatchOpKind::Remove) => {
                issues.add_error(ValidationError::MissingPath, false, "path");
            }
            (None, _) => self.validate_resource_value(schema, &mut issues),
            (Some(path), _) => self.validate_with_path(path, schema, &mut issues),
        }
        issues
    }

    /// The value, unless absent or null.
    fn present_value(&self, issues: &mut ValidationIssues) -> Option<&ScimValue> {
        let value = self.value.as_ref().filter(|value| !value.is_null());
        if value.is_none() {
            issues.add_error(ValidationError::MissingValue, false, "value");
        }
        value
    }

    /// `add` / `replace` without a path: the value is a partial resource body.
    fn validate_resource_value(&self, schema: &ResourceSchema, issues: &mut ValidationIssues) {
        let Some(value) = self.present_value(issues) else {
            return;
        };
        let Some(data) = value.as_complex() else {
            issues.add_error(
                ValidationError::bad_type("complex", value.type_name()),
                false,
                "value",
            );
            return;
        };

        issues.merge(schema.validate_partial(data), "value");

        for uri in schema.schema_uris() {
            let Some(attrs) = schema.attrs_for(&uri) else {
                continue;
            };
            let (container, location) = if uri.is_extension() {
                match data.get_raw(uri.as_str()).and_then(ScimValue::as_complex) {
                    Some(container) => (container, Location::from(["value", uri.as_str()])),
                    None => continue,
                }
            } else {
                (data, Location::from("value"))
            };
            for attribute in attrs.iter() {
                if let Some(value) = container.get_raw(attribute.name().as_str()) {
                    check_read_only(
                        attribute,
                        value,
                        location.child(attribute.name().as_str()),
                        issues,
                    );
                }
            }
        }
    }

    fn validate_with_path(
        &self,
        path: &PatchPath,
        schema: &ResourceSchema,
        issues: &mut ValidationIssues,
    ) {
        let target = path.target();
        let Some((rep, attribute)) = schema
            .resolve(&target)
            .and_then(|rep| schema.attribute(&rep).map(|attribute| (rep, attribute)))
        else {
            issues.add_error(
                ValidationError::UnknownTarget {
                    path: path.to_string(),
                },
                false,
                "path",
            );
            return;
        };

        let parent = rep
            .is_sub_attr()
            .then(|| schema.attribute(&rep.parent()))
            .flatten();
        if [Some(attribute), parent]
            .into_iter()
            .flatten()
            .any(|attribute| attribute.mutability() == Mutability::ReadOnly)
        {
            issues.add_error(
                ValidationError::CannotModify {
                    mutability: Mutability::ReadOnly.to_string(),
                },
                false,
                "path",
            );
            return;
        }

        match self.op {
            PatchOpKind::Remove => {
                if attribute.required() && !attribute.multi_valued() {
                    issues.add_error(ValidationError::CannotRemoveRequired, false, "path");
                }
            }
            PatchOpKind::Add | PatchOpKind::Replace => {
                let Some(value) = self.present_value(issues) else {
                    return;
                };
                let value = if path.has_filter() && path.sub_attr().is_none() {
                    ScimValue::List(vec![value.clone()])
                } else {
                    value.clone()
                };
                issues.merge(attribute.validate(&value), "value");
                check_read_only(attribute, &value, Location::from("value"), issues);
            }
        }
    }
}

/// Report read-only attributes and sub-attributes that have a value.
fn check_read_only(
    attribute: &Attribute,
    value: &ScimValue,
    location: Location,
    issues: &mut ValidationIssues,
) {
    if !value.is_present() {
        return;
    }
    if attribute.mutability() == Mutability::ReadOnly {
        issues.add_error(
            ValidationError::CannotModify {
                mutability: Mutability::ReadOnly.to_string(),
            },
            false,
            location,
        );
        return;
    }
    let Some(sub_attributes) = attribute.sub_attributes() else {
        return;
    };
    let elements: Vec<(Location, &ScimData)> = match value {
        ScimValue::List(items) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.as_complex().map(|data| (location.child(i), data)))
            .collect(),
        ScimValue::Complex(data) => vec![(location.clone(), data)],
        _ => Vec::new(),
    };
    for (location, element) in elements {
        for sub_attribute in sub_attributes.iter() {
            if let Some(value) = element.get_raw(sub_attribute.name().as_str()) {
                check_read_only(
                    sub_attribute,
                    value,
                    location.child(sub_attribute.name().as_str()),
                    issues,
                );
            }
        }
    }
}

/// A validated PATCH request body.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchRequest {
    operations: Vec<PatchOperation>,
    warnings: ValidationIssues,
}

impl PatchRequest {
    /// Parse and validate a PATCH request body.
    ///
    /// Checks the `schemas` message URI, the `Operations` list, and every
    /// operation's `op`, `path` and `value`, reporting issues under
    /// `["Operations", index, ...]`. Fails with
    /// [`ValidationError::NotSupported`] when PATCH is disabled in `config`.
    pub fn parse(
        body: &ScimData,
        schema: &ResourceSchema,
        config: &ServiceConfig,
        operators: &OperatorRegistry,
    ) -> Result<PatchRequest, ValidationIssues> {
        let mut issues = ValidationIssues::new();
        if !config.patch.supported {
            issues.add_error(
                ValidationError::NotSupported {
                    feature: "PATCH".to_string(),
                },
                false,
                Location::root(),
            );
            return Err(issues);
        }

        check_message_schema(body, &mut issues);

        let mut operations = Vec::new();
        match body.get_raw("Operations") {
            None | Some(ScimValue::Null) => {
                issues.add_error(ValidationError::MissingValue, false, "Operations");
            }
            Some(ScimValue::List(items)) if items.is_empty() => {
                issues.add_error(ValidationError::MissingValue, false, "Operations");
            }
            Some(ScimValue::List(items)) => {
                for (index, item) in items.iter().enumerate() {
                    let location = Location::from(["Operations"]).child(index);
                    let Some(data) = item.as_complex() else {
                        issues.add_error(
                            ValidationError::bad_type("complex", item.type_name()),
                            false,
                            location,
                        );
                        continue;
                    };
                    let parsed = parse_operation(data, operators, &location, &mut issues);
                    if let Some(operation) = parsed {
                        issues.merge(operation.validate(schema), location);
                        operations.push(operation);
                    }
                }
            }
            Some(other) => {
                issues.add_error(
                    ValidationError::bad_type("list", other.type_name()),
                    false,
                    "Operations",
                );
            }
        }

        debug!(
            "Validated PATCH request for '{}': {} operation(s), {} error(s)",
            schema.name(),
            operations.len(),
            issues.errors().count()
        );
        if issues.has_errors() {
            Err(issues)
        } else {
            Ok(PatchRequest {
                operations,
                warnings: issues,
            })
        }
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }

    /// Warnings collected while validating the request.
    pub fn warnings(&self) -> &ValidationIssues {
        &self.warnings
    }
}

fn check_message_schema(body: &ScimData, issues: &mut ValidationIssues) {
    match body.get_raw("schemas") {
        None | Some(ScimValue::Null) => {
            issues.add_error(ValidationError::MissingValue, false, "schemas");
        }
        Some(ScimValue::List(uris)) => {
            let listed = uris
                .iter()
                .filter_map(ScimValue::as_str)
                .any(|uri| uri.eq_ignore_ascii_case(PATCH_OP_URI));
            if !listed {
                issues.add_error(
                    ValidationError::MustBeOneOf {
                        expected: vec![PATCH_OP_URI.to_string()],
                        provided: ScimValue::List(uris.clone()).to_json().to_string(),
                    },
                    false,
                    "schemas",
                );
            }
        }
        Some(other) => {
            issues.add_error(
                ValidationError::bad_type("list", other.type_name()),
                false,
                "schemas",
            );
        }
    }
}

fn parse_operation(
    data: &ScimData,
    operators: &OperatorRegistry,
    location: &Location,
    issues: &mut ValidationIssues,
) -> Option<PatchOperation> {
    let op = match data.get_raw("op") {
        Some(ScimValue::String(op)) => match op.parse::<PatchOpKind>() {
            Ok(kind) => Some(kind),
            Err(error) => {
                issues.add_error(error, false, location.child("op"));
                None
            }
        },
        None | Some(ScimValue::Null) => {
            issues.add_error(ValidationError::MissingValue, false, location.child("op"));
            None
        }
        Some(other) => {
            issues.add_error(
                ValidationError::bad_type("string", other.type_name()),
                false,
                location.child("op"),
            );
            None
        }
    };

    let path = match data.get_raw("path") {
        None | Some(ScimValue::Null) => Ok(None),
        Some(ScimValue::String(path)) => match PatchPath::parse(path, operators) {
            Ok(path) => Ok(Some(path)),
            Err(path_issues) => {
                issues.merge(path_issues, location.child("path"));
                Err(())
            }
        },
        Some(other) => {
            issues.add_error(
                ValidationError::bad_type("string", other.type_name()),
                false,
                location.child("path"),
            );
            Err(())
        }
    };

    Some(PatchOperation::new(op?, path.ok()?, data.get_raw("value").cloned()))
}
