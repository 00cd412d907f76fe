//! AttrName value object for attribute identifiers.

use crate::error::{ValidationError, ValidationResult};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

/// Grammar of attribute names: an ASCII letter followed by ASCII letters, digits,
/// `_`, `$` or `-`, or the literal `$ref`.
static ATTR_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\$ref|[a-zA-Z][a-zA-Z0-9_$-]*)$").expect("valid attribute name regex")
});

/// A validated, case-insensitive attribute name.
///
/// The original text is kept for display; equality and hashing use the
/// lower-cased form, so `userName` and `USERNAME` are the same attribute.
///
/// ```rust
/// use scim_core::value_objects::AttrName;
///
/// let name = AttrName::new("userName").unwrap();
/// assert_eq!(name, AttrName::new("USERNAME").unwrap());
/// assert_eq!(name.to_string(), "userName");
/// assert!(AttrName::new("1st").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct AttrName {
    original: String,
    lower: String,
}

impl AttrName {
    /// Create a new AttrName, rejecting text outside the attribute name grammar.
    pub fn new(value: impl Into<String>) -> ValidationResult<Self> {
        let original = value.into();
        if !Self::is_valid(&original) {
            return Err(ValidationError::BadAttributeName {
                attribute: original,
            });
        }
        let lower = original.to_lowercase();
        Ok(Self { original, lower })
    }

    /// Whether `value` matches the attribute name grammar.
    pub fn is_valid(value: &str) -> bool {
        ATTR_NAME_REGEX.is_match(value)
    }

    /// The name as originally written.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// The lower-cased form used for comparisons.
    pub fn lower(&self) -> &str {
        &self.lower
    }

    /// Case-insensitive comparison against plain text.
    pub fn matches(&self, other: &str) -> bool {
        self.lower == other.to_lowercase()
    }
}

impl PartialEq for AttrName {
    fn eq(&self, other: &Self) -> bool {
        self.lower == other.lower
    }
}

impl Eq for AttrName {}

impl Hash for AttrName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lower.hash(state);
    }
}

impl fmt::Display for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Serialize for AttrName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.original.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AttrName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<&str> for AttrName {
    type Error = ValidationError;

    fn try_from(value: &str) -> ValidationResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for AttrName {
    type Error = ValidationError;

    fn try_from(value: String) -> ValidationResult<Self> {
        Self::new(value)
    }
}
