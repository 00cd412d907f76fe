//! List query parameters (RFC 7644 §3.4.2) and result sorting.
//!
//! [`QueryParameters::parse`] turns raw query-string pairs into typed values,
//! reporting problems under the name of the offending parameter:
//!
//! ```rust
//! use scim_core::config::ServiceConfig;
//! use scim_core::filter::OperatorRegistry;
//! use scim_core::query::{QueryParameters, SortOrder};
//!
//! let params = QueryParameters::parse(
//!     [("filter", r#"userName sw "j""#), ("sortOrder", "descending"), ("count", "-5")],
//!     &ServiceConfig::default(),
//!     OperatorRegistry::defaults(),
//! )
//! .unwrap();
//! assert_eq!(params.sort_order, SortOrder::Descending);
//! assert_eq!(params.count, Some(0));
//! assert_eq!(params.start_index, 1);
//! ```

use crate::config::ServiceConfig;
use crate::data::{ScimData, ScimValue};
use crate::error::ValidationError;
use crate::filter::evaluate::comparable;
use crate::filter::{Filter, OperatorRegistry, compare};
use crate::issues::{Location, ValidationIssues};
use crate::schema::{AttrValuePresenceConfig, ResourceSchema};
use crate::value_objects::AttrRef;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A comma-separated list of attribute paths, as sent in `attributes` and
/// `excludedAttributes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeList(Vec<AttrRef>);

impl AttributeList {
    pub fn new(attrs: Vec<AttrRef>) -> Self {
        Self(attrs)
    }

    /// Parse a comma-separated list. Blank entries are skipped; every invalid
    /// entry is reported at its index.
    pub fn parse(input: &str) -> Result<AttributeList, ValidationIssues> {
        let mut issues = ValidationIssues::new();
        let mut attrs = Vec::new();
        for (index, entry) in input
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .enumerate()
        {
            match AttrRef::parse(entry) {
                Ok(attr) => attrs.push(attr),
                Err(error) => issues.add_error(error, false, index),
            }
        }
        if issues.has_errors() {
            Err(issues)
        } else {
            Ok(Self(attrs))
        }
    }

    pub fn attrs(&self) -> &[AttrRef] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for AttributeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, attr) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", attr)?;
        }
        Ok(())
    }
}

impl FromStr for AttributeList {
    type Err = ValidationIssues;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Direction of sorting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Ascending, Self::Descending]
            .into_iter()
            .find(|order| order.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::MustBeOneOf {
                expected: vec!["ascending".to_string(), "descending".to_string()],
                provided: s.to_string(),
            })
    }
}

/// Typed list query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameters {
    pub attributes: Option<AttributeList>,
    pub excluded_attributes: Option<AttributeList>,
    pub filter: Option<Filter>,
    pub sort_by: Option<AttrRef>,
    pub sort_order: SortOrder,
    /// 1-based index of the first result
    pub start_index: usize,
    /// Page size, capped at `filter.maxResults`
    pub count: Option<usize>,
}

impl Default for QueryParameters {
    fn default() -> Self {
        Self {
            attributes: None,
            excluded_attributes: None,
            filter: None,
            sort_by: None,
            sort_order: SortOrder::Ascending,
            start_index: 1,
            count: None,
        }
    }
}

impl QueryParameters {
    /// Parse query-string pairs. Parameter names match case-insensitively and
    /// unknown parameters are ignored.
    ///
    /// - `attributes` and `excludedAttributes` can not be used together.
    /// - `filter` and `sortBy` fail with [`ValidationError::NotSupported`] when the
    ///   capability is disabled in `config`.
    /// - `startIndex` below 1 becomes 1; negative `count` becomes 0, and `count`
    ///   never exceeds `filter.maxResults`.
    pub fn parse<'a>(
        params: impl IntoIterator<Item = (&'a str, &'a str)>,
        config: &ServiceConfig,
        operators: &OperatorRegistry,
    ) -> Result<QueryParameters, ValidationIssues> {
        let mut issues = ValidationIssues::new();
        let mut query = QueryParameters::default();

        for (name, value) in params {
            match name.to_ascii_lowercase().as_str() {
                "attributes" => {
                    query.attributes = parse_attribute_list(value, "attributes", &mut issues);
                }
                "excludedattributes" => {
                    query.excluded_attributes =
                        parse_attribute_list(value, "excludedAttributes", &mut issues);
                }
                "filter" if !config.filter.supported => {
                    issues.add_error(not_supported("filtering"), false, "filter");
                }
                "filter" => match Filter::parse(value, operators) {
                    Ok(filter) => query.filter = Some(filter),
                    Err(filter_issues) => issues.merge(filter_issues, "filter"),
                },
                "sortby" if !config.sort.supported => {
                    issues.add_error(not_supported("sorting"), false, "sortBy");
                }
                "sortby" => match AttrRef::parse(value.trim()) {
                    Ok(attr) => query.sort_by = Some(attr),
                    Err(error) => issues.add_error(error, false, "sortBy"),
                },
                "sortorder" => match value.trim().parse() {
                    Ok(order) => query.sort_order = order,
                    Err(error) => issues.add_error(error, false, "sortOrder"),
                },
                "startindex" => {
                    if let Some(start_index) = parse_integer(value, "startIndex", &mut issues) {
                        query.start_index = usize::try_from(start_index.max(1)).unwrap_or(1);
                    }
                }
                "count" => {
                    if let Some(count) = parse_integer(value, "count", &mut issues) {
                        let count = usize::try_from(count.max(0)).unwrap_or(0);
                        query.count = Some(count.min(config.filter.max_results));
                    }
                }
                _ => {}
            }
        }

        if query.attributes.is_some() && query.excluded_attributes.is_some() {
            issues.add_error(
                ValidationError::CannotBeUsedTogether {
                    other: "excludedAttributes".to_string(),
                },
                false,
                "attributes",
            );
        }

        if issues.has_errors() {
            debug!("Rejected query parameters: {}", issues.to_json());
            return Err(issues);
        }
        Ok(query)
    }

    /// Presence configuration for projecting response resources.
    pub fn presence_config(&self) -> AttrValuePresenceConfig {
        let config = AttrValuePresenceConfig::response();
        match (&self.attributes, &self.excluded_attributes) {
            (Some(attrs), _) => config.including(attrs.attrs().to_vec()),
            (None, Some(attrs)) => config.excluding(attrs.attrs().to_vec()),
            (None, None) => config,
        }
    }

    /// The page of `items` selected by `startIndex` and `count`.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.start_index.saturating_sub(1))
            .take(self.count.unwrap_or(usize::MAX))
            .collect()
    }

    /// Sorter for `sortBy` / `sortOrder`, if sorting was requested.
    pub fn sorter(&self) -> Option<Sorter> {
        self.sort_by
            .clone()
            .map(|attr| Sorter::new(attr, self.sort_order))
    }
}

fn not_supported(feature: &str) -> ValidationError {
    ValidationError::NotSupported {
        feature: feature.to_string(),
    }
}

fn parse_attribute_list(
    value: &str,
    name: &str,
    issues: &mut ValidationIssues,
) -> Option<AttributeList> {
    match AttributeList::parse(value) {
        Ok(attrs) => Some(attrs),
        Err(list_issues) => {
            issues.merge(list_issues, name);
            None
        }
    }
}

fn parse_integer(value: &str, name: &str, issues: &mut ValidationIssues) -> Option<i64> {
    match value.trim().parse::<i64>() {
        Ok(number) => Some(number),
        Err(_) => {
            issues.add_error(
                ValidationError::bad_type("integer", "string"),
                false,
                Location::from(name),
            );
            None
        }
    }
}

/// Sorts resources by one attribute (RFC 7644 §3.4.2.3).
///
/// Values are compared by type, and strings of case-insensitive attributes
/// ignoring case. A multi-valued attribute sorts by its primary element, or its
/// first element when none is primary; a complex attribute sorts by its `value`
/// sub-attribute. Resources without a value go last in ascending order and
/// first in descending order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sorter {
    attr: AttrRef,
    order: SortOrder,
}

impl Sorter {
    pub fn new(attr: AttrRef, order: SortOrder) -> Self {
        Self { attr, order }
    }

    pub fn attr(&self) -> &AttrRef {
        &self.attr
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Sort `items`, all described by `schema`. The sort is stable, and an
    /// attribute `schema` does not know leaves the order unchanged.
    pub fn sort(&self, items: Vec<ScimData>, schema: &ResourceSchema) -> Vec<ScimData> {
        let mut keyed: Vec<(Option<ScimValue>, ScimData)> = items
            .into_iter()
            .map(|data| (self.sort_value(&data, schema), data))
            .collect();
        keyed.sort_by(|(left, _), (right, _)| self.compare_keys(left.as_ref(), right.as_ref()));
        keyed.into_iter().map(|(_, data)| data).collect()
    }

    fn compare_keys(&self, left: Option<&ScimValue>, right: Option<&ScimValue>) -> Ordering {
        let ordering = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(left), Some(right)) => compare(left, right).unwrap_or(Ordering::Equal),
        };
        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }

    fn sort_value(&self, data: &ScimData, schema: &ResourceSchema) -> Option<ScimValue> {
        let rep = schema.resolve(&self.attr)?;
        let top = rep.parent();
        let top_attribute = schema.attribute(&top)?;
        let sub_name = match rep.sub_attr() {
            Some(sub_attr) => Some(sub_attr.as_str()),
            None if top_attribute.is_complex() => Some("value"),
            None => None,
        };

        let value = data.get(&top).filter(ScimValue::is_present)?;
        let element = match value {
            ScimValue::List(items) => primary_or_first(&items)?.clone(),
            value => value,
        };
        let (value, attribute) = match sub_name {
            Some(name) => (
                element.as_complex()?.get_raw(name)?.clone(),
                top_attribute.sub_attributes()?.get_by_name(name)?,
            ),
            None => (element, top_attribute),
        };
        value.is_present().then(|| comparable(attribute, &value))
    }
}

fn primary_or_first(items: &[ScimValue]) -> Option<&ScimValue> {
    items
        .iter()
        .find(|item| {
            item.as_complex()
                .and_then(|data| data.get_raw("primary"))
                .and_then(ScimValue::as_bool)
                == Some(true)
        })
        .or_else(|| items.first())
}
