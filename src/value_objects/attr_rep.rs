//! Attribute references as written in filters, PATCH paths and data keys.
//!
//! - [`AttrRep`] is `attr` or `attr.sub`, not bound to any schema.
//! - [`BoundedAttrRep`] additionally names the schema the attribute belongs to,
//!   written as `urn:...:User:attr.sub`.
//! - [`AttrRef`] is either of the two, as found in user-supplied text.
//!
//! All of them compare case-insensitively on every component.

use super::{AttrName, SchemaUri};
use crate::error::{ValidationError, ValidationResult};
use std::fmt;

/// Unbounded attribute reference, `attr` or `attr.sub`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrRep {
    attr: AttrName,
    sub_attr: Option<AttrName>,
}

impl AttrRep {
    pub fn new(attr: AttrName, sub_attr: Option<AttrName>) -> Self {
        Self { attr, sub_attr }
    }

    /// Parse `attr` or `attr.sub`.
    pub fn parse(value: &str) -> ValidationResult<Self> {
        let bad_name = || ValidationError::BadAttributeName {
            attribute: value.to_string(),
        };
        let mut parts = value.split('.');
        let attr = parts.next().ok_or_else(bad_name)?;
        let sub_attr = parts.next();
        if parts.next().is_some() {
            return Err(bad_name());
        }
        let attr = AttrName::new(attr).map_err(|_| bad_name())?;
        let sub_attr = sub_attr
            .map(AttrName::new)
            .transpose()
            .map_err(|_| bad_name())?;
        Ok(Self { attr, sub_attr })
    }

    pub fn attr(&self) -> &AttrName {
        &self.attr
    }

    pub fn sub_attr(&self) -> Option<&AttrName> {
        self.sub_attr.as_ref()
    }

    pub fn is_sub_attr(&self) -> bool {
        self.sub_attr.is_some()
    }

    /// Reference to the top-level attribute only.
    pub fn parent(&self) -> AttrRep {
        Self::new(self.attr.clone(), None)
    }

    /// Reference to `sub_attr` of this reference's top-level attribute.
    pub fn child(&self, sub_attr: AttrName) -> AttrRep {
        Self::new(self.attr.clone(), Some(sub_attr))
    }
}

impl fmt::Display for AttrRep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_attr {
            Some(sub_attr) => write!(f, "{}.{}", self.attr, sub_attr),
            None => write!(f, "{}", self.attr),
        }
    }
}

/// Attribute reference bound to a known schema.
///
/// ```rust
/// use scim_core::value_objects::{BoundedAttrRep, SchemaUri};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     SchemaUri::register("urn:example:bounded:2.0:Device", false)?;
///
///     let rep = BoundedAttrRep::parse("urn:example:bounded:2.0:Device:owner.display")?;
///     assert_eq!(rep.schema().as_str(), "urn:example:bounded:2.0:Device");
///     assert_eq!(rep.attr().as_str(), "owner");
///     assert_eq!(rep.to_string(), "urn:example:bounded:2.0:Device:owner.display");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundedAttrRep {
    schema: SchemaUri,
    rep: AttrRep,
}

impl BoundedAttrRep {
    pub fn new(schema: SchemaUri, attr: AttrName, sub_attr: Option<AttrName>) -> Self {
        Self {
            schema,
            rep: AttrRep::new(attr, sub_attr),
        }
    }

    /// Bind an unbounded reference to `schema`.
    pub fn bind(schema: SchemaUri, rep: AttrRep) -> Self {
        Self { schema, rep }
    }

    /// Parse `urn:...:attr[.sub]`, splitting at the last `:`.
    ///
    /// The part before the split must be a registered schema.
    pub fn parse(value: &str) -> ValidationResult<Self> {
        let (uri, path) = value
            .rsplit_once(':')
            .ok_or_else(|| ValidationError::BadAttributeName {
                attribute: value.to_string(),
            })?;
        let schema = SchemaUri::new(uri)?;
        let rep = AttrRep::parse(path).map_err(|_| ValidationError::BadAttributeName {
            attribute: value.to_string(),
        })?;
        Ok(Self { schema, rep })
    }

    pub fn schema(&self) -> &SchemaUri {
        &self.schema
    }

    /// Whether the bound schema is an extension.
    pub fn is_extension(&self) -> bool {
        self.schema.is_extension()
    }

    pub fn attr(&self) -> &AttrName {
        self.rep.attr()
    }

    pub fn sub_attr(&self) -> Option<&AttrName> {
        self.rep.sub_attr()
    }

    pub fn is_sub_attr(&self) -> bool {
        self.rep.is_sub_attr()
    }

    pub fn parent(&self) -> BoundedAttrRep {
        Self::bind(self.schema.clone(), self.rep.parent())
    }

    pub fn child(&self, sub_attr: AttrName) -> BoundedAttrRep {
        Self::bind(self.schema.clone(), self.rep.child(sub_attr))
    }

    /// The reference without its schema.
    pub fn unbounded(&self) -> &AttrRep {
        &self.rep
    }
}

impl fmt::Display for BoundedAttrRep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.schema, self.rep)
    }
}

/// Attribute reference as written in filter and path text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrRef {
    Unbounded(AttrRep),
    Bounded(BoundedAttrRep),
}

impl AttrRef {
    /// Parse either form; text containing `:` is treated as bounded.
    pub fn parse(value: &str) -> ValidationResult<Self> {
        if value.contains(':') {
            BoundedAttrRep::parse(value).map(Self::Bounded)
        } else {
            AttrRep::parse(value).map(Self::Unbounded)
        }
    }

    pub fn attr(&self) -> &AttrName {
        match self {
            Self::Unbounded(rep) => rep.attr(),
            Self::Bounded(rep) => rep.attr(),
        }
    }

    pub fn sub_attr(&self) -> Option<&AttrName> {
        match self {
            Self::Unbounded(rep) => rep.sub_attr(),
            Self::Bounded(rep) => rep.sub_attr(),
        }
    }

    pub fn is_sub_attr(&self) -> bool {
        self.sub_attr().is_some()
    }

    /// The schema, for bounded references.
    pub fn schema(&self) -> Option<&SchemaUri> {
        match self {
            Self::Unbounded(_) => None,
            Self::Bounded(rep) => Some(rep.schema()),
        }
    }

    pub fn unbounded(&self) -> &AttrRep {
        match self {
            Self::Unbounded(rep) => rep,
            Self::Bounded(rep) => rep.unbounded(),
        }
    }

    /// Same reference pointing at `sub_attr` of its top-level attribute.
    pub fn child(&self, sub_attr: AttrName) -> AttrRef {
        match self {
            Self::Unbounded(rep) => Self::Unbounded(rep.child(sub_attr)),
            Self::Bounded(rep) => Self::Bounded(rep.child(sub_attr)),
        }
    }

    pub fn parent(&self) -> AttrRef {
        match self {
            Self::Unbounded(rep) => Self::Unbounded(rep.parent()),
            Self::Bounded(rep) => Self::Bounded(rep.parent()),
        }
    }
}

impl fmt::Display for AttrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded(rep) => rep.fmt(f),
            Self::Bounded(rep) => rep.fmt(f),
        }
    }
}

impl From<AttrRep> for AttrRef {
    fn from(value: AttrRep) -> Self {
        Self::Unbounded(value)
    }
}

impl From<BoundedAttrRep> for AttrRef {
    fn from(value: BoundedAttrRep) -> Self {
        Self::Bounded(value)
    }
}
