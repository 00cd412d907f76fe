//! Filter evaluation against resource data, and static checks against a schema.

use super::ast::{AttributeFilter, Comparison, Filter, Literal};
use crate::data::{ScimData, ScimValue};
use crate::error::{BuildResult, ValidationError};
use crate::issues::{Location, ValidationIssues};
use crate::schema::{Attribute, AttributeType, ResourceSchema};
use crate::value_objects::{AttrName, AttrRef};
use chrono::DateTime;

/// What attribute paths of a (sub-)expression are resolved against.
#[derive(Clone, Copy)]
enum Scope<'a> {
    /// Top-level expression: paths resolve through the resource schema.
    Resource(&'a ResourceSchema),
    /// Inside `attr[...]`: paths name sub-attributes of `attr`.
    Element(&'a Attribute),
}

impl<'a> Scope<'a> {
    fn attribute(&self, attr: &AttrRef) -> Option<&'a Attribute> {
        match self {
            Scope::Resource(schema) => {
                let rep = schema.resolve(attr)?;
                schema.attribute(&rep)
            }
            Scope::Element(parent) => {
                if attr.is_sub_attr() || attr.schema().is_some() {
                    return None;
                }
                parent.sub_attributes()?.get(attr.attr())
            }
        }
    }

    fn value(&self, data: &ScimData, attr: &AttrRef) -> Option<ScimValue> {
        match self {
            Scope::Resource(schema) => data.get(&schema.resolve(attr)?),
            Scope::Element(_) => data.get_raw(attr.attr().as_str()).cloned(),
        }
    }
}

/// Complex wrapper around a simple multi-valued attribute, exposing each
/// element as the `value` sub-attribute.
pub(crate) fn value_wrapper(attribute: &Attribute) -> BuildResult<Attribute> {
    let mut value = Attribute::builder("value", attribute.kind().clone());
    if attribute.case_exact() {
        value = value.case_exact();
    }
    Attribute::complex(attribute.name().as_str())
        .multi_valued()
        .with_sub_attribute(value.build()?)
        .build()
}

/// Whether any of `elements` of `attribute` satisfies `filter`, whose paths
/// name sub-attributes of `attribute`. Simple values are matched through a
/// `value` wrapper.
pub(crate) fn matches_elements(
    filter: &Filter,
    elements: &[ScimValue],
    attribute: &Attribute,
) -> bool {
    if attribute.is_complex() {
        return elements
            .iter()
            .filter_map(ScimValue::as_complex)
            .any(|element| filter.matches(element, Scope::Element(attribute)));
    }
    let Ok(wrapper) = value_wrapper(attribute) else {
        return false;
    };
    elements.iter().filter(|element| !element.is_null()).any(|element| {
        let mut wrapped = ScimData::new();
        wrapped.insert_raw("value", element.clone());
        filter.matches(&wrapped, Scope::Element(&wrapper))
    })
}

/// Reference to the `value` sub-attribute of a complex attribute reference.
fn value_of(attr: &AttrRef) -> Option<AttrRef> {
    AttrName::new("value").ok().map(|name| attr.child(name))
}

/// Coerce a value for comparison: date-time strings of date-time attributes are
/// parsed, strings of case-insensitive attributes are lower-cased.
pub(crate) fn comparable(attribute: &Attribute, value: &ScimValue) -> ScimValue {
    match (attribute.attribute_type(), value) {
        (AttributeType::DateTime, ScimValue::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(ScimValue::DateTime)
            .unwrap_or_else(|_| value.clone()),
        (AttributeType::String | AttributeType::Reference, ScimValue::String(s))
            if !attribute.case_exact() =>
        {
            ScimValue::String(s.to_lowercase())
        }
        _ => value.clone(),
    }
}

/// Elements a comparison is applied to. Absent values and empty lists are
/// compared once, as `Null`.
fn elements(value: Option<ScimValue>) -> Vec<ScimValue> {
    match value {
        Some(ScimValue::List(items)) if !items.is_empty() => items,
        Some(ScimValue::List(_)) | None => vec![ScimValue::Null],
        Some(value) => vec![value],
    }
}

fn literal_fits(attribute_type: AttributeType, literal: &Literal) -> bool {
    match (attribute_type, literal) {
        (_, Literal::Null) => true,
        (AttributeType::Boolean, Literal::Boolean(_)) => true,
        (AttributeType::Integer, Literal::Integer(_)) => true,
        (AttributeType::Decimal, Literal::Integer(_) | Literal::Decimal { .. }) => true,
        (AttributeType::DateTime, Literal::String(s)) => DateTime::parse_from_rfc3339(s).is_ok(),
        (
            AttributeType::String | AttributeType::Reference | AttributeType::Binary,
            Literal::String(_),
        ) => true,
        _ => false,
    }
}

impl Filter {
    /// Whether `data`, a resource described by `schema`, matches the filter.
    ///
    /// Unknown attributes never match. Multi-valued attributes match when any
    /// element does; a complex attribute without a sub-attribute is compared
    /// through its `value` sub-attribute.
    pub fn evaluate(&self, data: &ScimData, schema: &ResourceSchema) -> bool {
        self.matches(data, Scope::Resource(schema))
    }

    fn matches(&self, data: &ScimData, scope: Scope<'_>) -> bool {
        match self {
            Filter::And(left, right) => left.matches(data, scope) && right.matches(data, scope),
            Filter::Or(left, right) => left.matches(data, scope) || right.matches(data, scope),
            Filter::Not(inner) => !inner.matches(data, scope),
            Filter::Group(inner) => inner.matches(data, scope),
            Filter::Attribute(filter) => filter.matches(data, scope),
            Filter::Complex { attr, filter } => {
                let Some(attribute) = scope.attribute(attr) else {
                    return false;
                };
                let values = match scope.value(data, attr) {
                    Some(ScimValue::List(items)) => items,
                    Some(value) => vec![value],
                    None => return false,
                };
                matches_elements(filter, &values, attribute)
            }
        }
    }

    /// Check operator and operand compatibility with the attributes the filter
    /// refers to, reporting [`ValidationError::NonCompatibleOperand`] at the root
    /// location. Unknown attributes are not reported.
    pub fn check(&self, schema: &ResourceSchema) -> ValidationIssues {
        let mut issues = ValidationIssues::new();
        self.check_in(Scope::Resource(schema), &mut issues);
        issues
    }

    fn check_in(&self, scope: Scope<'_>, issues: &mut ValidationIssues) {
        match self {
            Filter::And(left, right) | Filter::Or(left, right) => {
                left.check_in(scope, issues);
                right.check_in(scope, issues);
            }
            Filter::Not(inner) | Filter::Group(inner) => inner.check_in(scope, issues),
            Filter::Attribute(filter) => filter.check(scope, issues),
            Filter::Complex { attr, filter } => {
                let Some(attribute) = scope.attribute(attr) else {
                    return;
                };
                if attribute.is_complex() {
                    filter.check_in(Scope::Element(attribute), issues);
                } else if let Ok(wrapper) = value_wrapper(attribute) {
                    filter.check_in(Scope::Element(&wrapper), issues);
                }
            }
        }
    }
}

impl AttributeFilter {
    /// The attribute compared by this expression, with the value to compare.
    fn target<'a>(
        &self,
        data: &ScimData,
        scope: Scope<'a>,
    ) -> Option<(&'a Attribute, Option<ScimValue>)> {
        let attribute = scope.attribute(self.attr())?;
        if attribute.is_complex() && !self.comparison().is_unary() {
            let value_attr = value_of(self.attr())?;
            return Some((scope.attribute(&value_attr)?, scope.value(data, &value_attr)));
        }
        Some((attribute, scope.value(data, self.attr())))
    }

    fn matches(&self, data: &ScimData, scope: Scope<'_>) -> bool {
        let Some((attribute, value)) = self.target(data, scope) else {
            return false;
        };
        let values = elements(value);
        match self.comparison() {
            Comparison::Unary(operator) => values.iter().any(|value| operator.evaluate(value)),
            Comparison::Binary(operator, literal) => {
                let operand = comparable(attribute, &literal.to_value());
                values
                    .iter()
                    .any(|value| operator.evaluate(&comparable(attribute, value), &operand))
            }
        }
    }

    fn check(&self, scope: Scope<'_>, issues: &mut ValidationIssues) {
        let Comparison::Binary(operator, literal) = self.comparison() else {
            return;
        };
        let Some(mut attribute) = scope.attribute(self.attr()) else {
            return;
        };
        if attribute.is_complex() {
            match value_of(self.attr()).and_then(|value_attr| scope.attribute(&value_attr)) {
                Some(value_attribute) => attribute = value_attribute,
                None => return,
            }
        }

        let attribute_type = attribute.attribute_type();
        let operand_type = if !operator.supports_attribute(attribute_type) {
            attribute_type.as_str()
        } else if !literal_fits(attribute_type, literal) {
            literal.type_name()
        } else {
            return;
        };
        issues.add_error(
            ValidationError::NonCompatibleOperand {
                operator: operator.token().to_lowercase(),
                operand_type: operand_type.to_string(),
            },
            false,
            Location::root(),
        );
    }
}
