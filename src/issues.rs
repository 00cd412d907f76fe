//! Location-addressed accumulator for validation errors and warnings.
//!
//! Validation in this crate never stops at the first problem. Every check reports
//! into a [`ValidationIssues`] value at the [`Location`] the problem refers to
//! (for example `emails.1.value`), and child results are merged into their parent
//! under a location prefix.
//!
//! An error may be marked as *halting*: further checks below that location are
//! pointless (a value of the wrong type has no sub-attributes worth checking),
//! while checks of sibling locations carry on.
//!
//! ```rust
//! use scim_core::error::ValidationError;
//! use scim_core::issues::{Location, ValidationIssues};
//!
//! let mut issues = ValidationIssues::new();
//! issues.add_error(ValidationError::MissingValue, false, ["name"]);
//!
//! assert!(!issues.can_proceed_at(&[Location::from(["name", "givenName"])]));
//! assert!(issues.can_proceed_at(&[Location::from(["userName"])]));
//! ```

use crate::error::{ErrorResponse, ValidationError, ValidationWarning};
use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// One step of a [`Location`]: an attribute name or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocationPart {
    Name(String),
    Index(usize),
}

impl fmt::Display for LocationPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for LocationPart {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for LocationPart {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl From<&String> for LocationPart {
    fn from(value: &String) -> Self {
        Self::Name(value.clone())
    }
}

impl From<usize> for LocationPart {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

/// Hierarchical position inside validated data. The empty location is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location(Vec<LocationPart>);

impl Location {
    /// The root location.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(parts: Vec<LocationPart>) -> Self {
        Self(parts)
    }

    pub fn parts(&self) -> &[LocationPart] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Location extended by one more step.
    pub fn child(&self, part: impl Into<LocationPart>) -> Self {
        let mut parts = self.0.clone();
        parts.push(part.into());
        Self(parts)
    }

    /// Location formed by appending `other` to this one.
    pub fn join(&self, other: &Location) -> Self {
        let mut parts = self.0.clone();
        parts.extend(other.0.iter().cloned());
        Self(parts)
    }

    pub fn starts_with(&self, prefix: &Location) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Location relative to `prefix`, if this location lies below it.
    pub fn strip_prefix(&self, prefix: &Location) -> Option<Location> {
        self.0
            .strip_prefix(prefix.0.as_slice())
            .map(|rest| Location(rest.to_vec()))
    }

    /// All prefixes of this location, from the root to the location itself.
    fn prefixes(&self) -> impl Iterator<Item = &[LocationPart]> {
        (0..=self.0.len()).map(move |len| &self.0[..len])
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join("."))
    }
}

impl From<Vec<LocationPart>> for Location {
    fn from(value: Vec<LocationPart>) -> Self {
        Self(value)
    }
}

impl From<&Location> for Location {
    fn from(value: &Location) -> Self {
        value.clone()
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Self(vec![LocationPart::from(value)])
    }
}

impl From<String> for Location {
    fn from(value: String) -> Self {
        Self(vec![LocationPart::from(value)])
    }
}

impl From<usize> for Location {
    fn from(value: usize) -> Self {
        Self(vec![LocationPart::from(value)])
    }
}

impl<T, const N: usize> From<[T; N]> for Location
where
    T: Into<LocationPart>,
{
    fn from(value: [T; N]) -> Self {
        Self(value.into_iter().map(Into::into).collect())
    }
}

/// Errors and warnings collected during one validation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationIssues {
    errors: IndexMap<Location, Vec<ValidationError>>,
    warnings: IndexMap<Location, Vec<ValidationWarning>>,
    stop_proceeding: HashMap<Location, HashSet<u16>>,
}

impl ValidationIssues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error at `location`.
    ///
    /// With `proceed == false` the exact location is marked as halting, which makes
    /// [`can_proceed_at`](Self::can_proceed_at) false for it and all of its descendants.
    pub fn add_error(
        &mut self,
        error: ValidationError,
        proceed: bool,
        location: impl Into<Location>,
    ) {
        let location = location.into();
        if !proceed {
            self.stop_proceeding
                .entry(location.clone())
                .or_default()
                .insert(error.code());
        }
        self.errors.entry(location).or_default().push(error);
    }

    /// Record a warning at `location`.
    pub fn add_warning(&mut self, warning: ValidationWarning, location: impl Into<Location>) {
        self.warnings
            .entry(location.into())
            .or_default()
            .push(warning);
    }

    /// Merge issues of a nested validation, prefixing their locations with `location`.
    pub fn merge(&mut self, other: ValidationIssues, location: impl Into<Location>) {
        let prefix = location.into();
        for (location, errors) in other.errors {
            self.errors
                .entry(prefix.join(&location))
                .or_default()
                .extend(errors);
        }
        for (location, warnings) in other.warnings {
            self.warnings
                .entry(prefix.join(&location))
                .or_default()
                .extend(warnings);
        }
        for (location, codes) in other.stop_proceeding {
            self.stop_proceeding
                .entry(prefix.join(&location))
                .or_default()
                .extend(codes);
        }
    }

    /// Copy of the issues matching the given codes at or below `location`.
    ///
    /// When both code filters are `None`, all errors and warnings match. When only
    /// one of them is given, the other kind is left out. Locations in the result are
    /// relative to `location`.
    pub fn get(
        &self,
        error_codes: Option<&[u16]>,
        warning_codes: Option<&[u16]>,
        location: Option<&Location>,
    ) -> ValidationIssues {
        let (error_filter, warning_filter) = Self::code_filters(error_codes, warning_codes);
        let root = Location::root();
        let prefix = location.unwrap_or(&root);
        let mut selected = ValidationIssues::new();

        for (loc, errors) in &self.errors {
            let Some(relative) = loc.strip_prefix(prefix) else {
                continue;
            };
            let matching: Vec<ValidationError> = errors
                .iter()
                .filter(|error| error_filter.matches(error.code()))
                .cloned()
                .collect();
            if matching.is_empty() {
                continue;
            }
            if let Some(codes) = self.stop_proceeding.get(loc) {
                let halted: HashSet<u16> = matching
                    .iter()
                    .map(ValidationError::code)
                    .filter(|code| codes.contains(code))
                    .collect();
                if !halted.is_empty() {
                    selected.stop_proceeding.insert(relative.clone(), halted);
                }
            }
            selected.errors.insert(relative, matching);
        }

        for (loc, warnings) in &self.warnings {
            let Some(relative) = loc.strip_prefix(prefix) else {
                continue;
            };
            let matching: Vec<ValidationWarning> = warnings
                .iter()
                .filter(|warning| warning_filter.matches(warning.code()))
                .cloned()
                .collect();
            if !matching.is_empty() {
                selected.warnings.insert(relative, matching);
            }
        }
        selected
    }

    /// Like [`get`](Self::get), but removes the matched issues from `self`.
    pub fn pop(
        &mut self,
        error_codes: Option<&[u16]>,
        warning_codes: Option<&[u16]>,
        location: Option<&Location>,
    ) -> ValidationIssues {
        let popped = self.get(error_codes, warning_codes, location);
        let (error_filter, warning_filter) = Self::code_filters(error_codes, warning_codes);
        let root = Location::root();
        let prefix = location.unwrap_or(&root);

        for (loc, errors) in self.errors.iter_mut() {
            if !loc.starts_with(prefix) {
                continue;
            }
            let removed: HashSet<u16> = errors
                .iter()
                .map(ValidationError::code)
                .filter(|code| error_filter.matches(*code))
                .collect();
            errors.retain(|error| !error_filter.matches(error.code()));
            if let Some(codes) = self.stop_proceeding.get_mut(loc) {
                codes.retain(|code| !removed.contains(code));
            }
        }
        self.errors.retain(|_, errors| !errors.is_empty());
        self.stop_proceeding.retain(|_, codes| !codes.is_empty());

        for (loc, warnings) in self.warnings.iter_mut() {
            if loc.starts_with(prefix) {
                warnings.retain(|warning| !warning_filter.matches(warning.code()));
            }
        }
        self.warnings.retain(|_, warnings| !warnings.is_empty());
        popped
    }

    fn code_filters<'a>(
        error_codes: Option<&'a [u16]>,
        warning_codes: Option<&'a [u16]>,
    ) -> (CodeFilter<'a>, CodeFilter<'a>) {
        match (error_codes, warning_codes) {
            (None, None) => (CodeFilter::All, CodeFilter::All),
            (errors, warnings) => (
                errors.map_or(CodeFilter::Nothing, CodeFilter::Only),
                warnings.map_or(CodeFilter::Nothing, CodeFilter::Only),
            ),
        }
    }

    /// Whether no location at all has been marked as halting.
    pub fn can_proceed(&self) -> bool {
        self.stop_proceeding.is_empty()
    }

    /// Whether checks may continue at every one of `locations`.
    ///
    /// A location is blocked if it, or any of its ancestors (including the root),
    /// was marked as halting.
    pub fn can_proceed_at(&self, locations: &[Location]) -> bool {
        locations.iter().all(|location| {
            location.prefixes().all(|prefix| {
                !self
                    .stop_proceeding
                    .contains_key(&Location(prefix.to_vec()))
            })
        })
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether there are errors at, or below, any of `locations`.
    pub fn has_errors_at(&self, locations: &[Location]) -> bool {
        self.errors
            .keys()
            .any(|loc| locations.iter().any(|location| loc.starts_with(location)))
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// All errors with their locations, in insertion order.
    pub fn errors(&self) -> impl Iterator<Item = (&Location, &ValidationError)> {
        self.errors
            .iter()
            .flat_map(|(location, errors)| errors.iter().map(move |error| (location, error)))
    }

    /// All warnings with their locations, in insertion order.
    pub fn warnings(&self) -> impl Iterator<Item = (&Location, &ValidationWarning)> {
        self.warnings.iter().flat_map(|(location, warnings)| {
            warnings.iter().map(move |warning| (location, warning))
        })
    }

    /// Errors recorded at exactly `location`.
    pub fn errors_at(&self, location: impl Into<Location>) -> &[ValidationError] {
        self.errors
            .get(&location.into())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Warnings recorded at exactly `location`.
    pub fn warnings_at(&self, location: impl Into<Location>) -> &[ValidationWarning] {
        self.warnings
            .get(&location.into())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Codes of the errors recorded at exactly `location`.
    pub fn error_codes_at(&self, location: impl Into<Location>) -> Vec<u16> {
        self.errors_at(location)
            .iter()
            .map(ValidationError::code)
            .collect()
    }

    /// Nested JSON rendering, e.g. `{"emails": {"0": {"_errors": [...]}}}`.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        for (location, errors) in &self.errors {
            let rendered = errors
                .iter()
                .map(|error| json!({"code": error.code(), "error": error.to_string()}))
                .collect();
            insert_rendered(&mut root, location.parts(), "_errors", rendered);
        }
        for (location, warnings) in &self.warnings {
            let rendered = warnings
                .iter()
                .map(|warning| json!({"code": warning.code(), "warning": warning.to_string()}))
                .collect();
            insert_rendered(&mut root, location.parts(), "_warnings", rendered);
        }
        Value::Object(root)
    }

    /// Protocol error body describing the first recorded error, if any.
    pub fn to_error_response(&self) -> Option<ErrorResponse> {
        let (location, error) = self.errors().next()?;
        let detail = if location.is_root() {
            error.to_string()
        } else {
            format!("{}: {}", location, error)
        };
        Some(ErrorResponse::new(error.status(), error.scim_type(), detail))
    }
}

fn insert_rendered(
    node: &mut Map<String, Value>,
    parts: &[LocationPart],
    key: &str,
    items: Vec<Value>,
) {
    match parts.split_first() {
        None => match node
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(list) => list.extend(items),
            other => *other = Value::Array(items),
        },
        Some((first, rest)) => {
            let child = node
                .entry(first.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = child {
                insert_rendered(map, rest, key, items);
            } else {
                let mut map = Map::new();
                insert_rendered(&mut map, rest, key, items);
                *child = Value::Object(map);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum CodeFilter<'a> {
    All,
    Nothing,
    Only(&'a [u16]),
}

impl CodeFilter<'_> {
    fn matches(&self, code: u16) -> bool {
        match self {
            Self::All => true,
            Self::Nothing => false,
            Self::Only(codes) => codes.contains(&code),
        }
    }
}
