//! PATCH path expressions (RFC 7644 §3.5.2).
//!
//! ```text
//! path = attrPath [ "[" valFilter "]" ] [ "." subAttr ]
//! ```

use crate::data::ScimValue;
use crate::error::{ScimError, ScimResult, ValidationError, ValidationResult};
use crate::filter::{Encoded, Filter, OperatorRegistry, check_brackets, evaluate};
use crate::issues::{Location, ValidationIssues};
use crate::schema::ResourceSchema;
use crate::value_objects::{AttrName, AttrRef};
use log::debug;
use std::fmt;
use std::str::FromStr;

/// A parsed PATCH path: the target attribute, an optional selection filter on
/// its elements, and an optional sub-attribute of the selected elements.
///
/// ```rust
/// use scim_core::patch::PatchPath;
///
/// let path: PatchPath = r#"members[value eq "123"].displayName"#.parse().unwrap();
/// assert_eq!(path.attr().to_string(), "members");
/// assert_eq!(path.sub_attr().map(|sub| sub.as_str()), Some("displayName"));
/// assert_eq!(path.to_string(), r#"members[value eq "123"].displayName"#);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PatchPath {
    attr: AttrRef,
    filter: Option<Filter>,
    sub_attr: Option<AttrName>,
}

impl PatchPath {
    /// Assemble a path from its parts.
    ///
    /// `attr` must name a top-level attribute, and `filter`, when given, must be
    /// a complex filter on that same attribute.
    pub fn new(
        attr: AttrRef,
        filter: Option<Filter>,
        sub_attr: Option<AttrName>,
    ) -> ValidationResult<Self> {
        let path = render(&attr, filter.as_ref(), sub_attr.as_ref());
        if attr.is_sub_attr() {
            return Err(ValidationError::bad_patch_path(
                path,
                "attribute must not be a sub-attribute reference",
            ));
        }
        if let Some(filter) = &filter {
            match filter {
                Filter::Complex { attr: target, .. } if *target == attr => {}
                _ => {
                    return Err(ValidationError::bad_patch_path(
                        path,
                        format!("selection filter must be a complex filter on '{}'", attr),
                    ));
                }
            }
        }
        Ok(Self {
            attr,
            filter,
            sub_attr,
        })
    }

    /// Parse a path, resolving filter operators through `operators`.
    ///
    /// Every problem is reported as [`ValidationError::BadPatchPath`] at the root
    /// location, with the underlying error as details.
    pub fn parse(input: &str, operators: &OperatorRegistry) -> Result<PatchPath, ValidationIssues> {
        let fail = |errors: Vec<ValidationError>| {
            let mut issues = ValidationIssues::new();
            for error in errors {
                issues.add_error(
                    ValidationError::bad_patch_path(input, error.to_string()),
                    false,
                    Location::root(),
                );
            }
            debug!("Rejected PATCH path '{}'", input);
            issues
        };

        let (encoded, unterminated) = Encoded::new(input);
        check_brackets(&encoded, input).map_err(|error| fail(vec![error]))?;
        if let Some(operand) = unterminated {
            return Err(fail(vec![ValidationError::BadOperand { operand }]));
        }

        let text = encoded.text();
        let Some(open) = text.find('[') else {
            let attr = AttrRef::parse(input).map_err(|error| fail(vec![error]))?;
            let sub_attr = attr.sub_attr().cloned();
            return PatchPath::new(attr.parent(), None, sub_attr).map_err(|error| fail(vec![error]));
        };

        let close = closing_bracket(text, open).ok_or_else(|| {
            fail(vec![ValidationError::BracketNotOpenedOrClosed {
                bracket: '[',
                expression: input.to_string(),
            }])
        })?;
        let sub_attr = match &text[close + 1..] {
            "" => None,
            rest => match rest.strip_prefix('.') {
                Some(name) => Some(
                    AttrName::new(encoded.decode(name)).map_err(|error| fail(vec![error]))?,
                ),
                None => {
                    return Err(fail(vec![ValidationError::UnknownExpression {
                        expression: encoded.decode(rest),
                    }]));
                }
            },
        };

        let attr =
            AttrRef::parse(&encoded.decode(&text[..open])).map_err(|error| fail(vec![error]))?;
        let filter = Filter::parse(&encoded.decode(&text[..=close]), operators)
            .map_err(|issues| fail(issues.errors().map(|(_, error)| error.clone()).collect()))?;
        PatchPath::new(attr, Some(filter), sub_attr).map_err(|error| fail(vec![error]))
    }

    /// The top-level attribute the path points into.
    pub fn attr(&self) -> &AttrRef {
        &self.attr
    }

    /// The selection filter, a [`Filter::Complex`] on [`attr`](Self::attr).
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn sub_attr(&self) -> Option<&AttrName> {
        self.sub_attr.as_ref()
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// The attribute or sub-attribute the path modifies.
    pub fn target(&self) -> AttrRef {
        match &self.sub_attr {
            Some(sub_attr) => self.attr.child(sub_attr.clone()),
            None => self.attr.clone(),
        }
    }

    /// Whether one element of the path's attribute is selected by the filter.
    ///
    /// Elements of simple multi-valued attributes are matched as `value`, so
    /// `emails[value ew "@example.com"]` and `roles[value eq "admin"]` work
    /// alike. Fails with [`ScimError::InvalidUsage`] on paths without a filter.
    pub fn filter_matches(&self, value: &ScimValue, schema: &ResourceSchema) -> ScimResult<bool> {
        let Some(Filter::Complex { filter, .. }) = &self.filter else {
            return Err(ScimError::invalid_usage(format!(
                "path '{}' has no selection filter",
                self
            )));
        };
        let attribute = schema
            .resolve(&self.attr)
            .and_then(|rep| schema.attribute(&rep))
            .ok_or_else(|| ValidationError::UnknownTarget {
                path: self.to_string(),
            })?;
        Ok(evaluate::matches_elements(
            filter,
            std::slice::from_ref(value),
            attribute,
        ))
    }
}

/// Byte offset of the `]` closing the `[` at `open`.
fn closing_bracket(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in text[open..].char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn render(attr: &AttrRef, filter: Option<&Filter>, sub_attr: Option<&AttrName>) -> String {
    let mut path = match filter {
        Some(filter) => filter.to_string(),
        None => attr.to_string(),
    };
    if let Some(sub_attr) = sub_attr {
        path.push('.');
        path.push_str(sub_attr.as_str());
    }
    path
}

impl fmt::Display for PatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.attr, self.filter.as_ref(), self.sub_attr.as_ref()))
    }
}

impl FromStr for PatchPath {
    type Err = ValidationIssues;

    /// Parse with the built-in filter operators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatchPath::parse(s, OperatorRegistry::defaults())
    }
}
