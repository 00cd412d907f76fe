//! Presence configuration: direction plus `attributes` / `excludedAttributes` lists.

use super::types::{DataDirection, DataInclusivity};
use crate::value_objects::{AttrRef, BoundedAttrRep};

/// How presence is checked during schema validation and response projection.
///
/// Carries the data direction, an optional inclusion or exclusion list, and the
/// attributes for which the issuer is ignored (for example when the service
/// provider validates data it has generated itself).
///
/// ```rust
/// use scim_core::schema::AttrValuePresenceConfig;
/// use scim_core::value_objects::AttrRef;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = AttrValuePresenceConfig::response()
///         .including(vec![AttrRef::parse("userName")?, AttrRef::parse("name.givenName")?]);
///     assert!(config.is_filtered());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AttrValuePresenceConfig {
    direction: DataDirection,
    attr_reps: Vec<AttrRef>,
    include: Option<bool>,
    ignore_issuer: Vec<AttrRef>,
}

impl AttrValuePresenceConfig {
    pub fn new(direction: DataDirection) -> Self {
        Self {
            direction,
            attr_reps: Vec::new(),
            include: None,
            ignore_issuer: Vec::new(),
        }
    }

    pub fn request() -> Self {
        Self::new(DataDirection::Request)
    }

    pub fn response() -> Self {
        Self::new(DataDirection::Response)
    }

    /// Only the listed attributes are requested.
    pub fn including(mut self, attr_reps: Vec<AttrRef>) -> Self {
        self.attr_reps = attr_reps;
        self.include = Some(true);
        self
    }

    /// The listed attributes are not requested.
    pub fn excluding(mut self, attr_reps: Vec<AttrRef>) -> Self {
        self.attr_reps = attr_reps;
        self.include = Some(false);
        self
    }

    /// Skip the issuer rule for the listed attributes and their sub-attributes.
    pub fn ignoring_issuer(mut self, attr_reps: Vec<AttrRef>) -> Self {
        self.ignore_issuer = attr_reps;
        self
    }

    pub fn direction(&self) -> DataDirection {
        self.direction
    }

    pub fn attr_reps(&self) -> &[AttrRef] {
        &self.attr_reps
    }

    /// `Some(true)` for an inclusion list, `Some(false)` for an exclusion list.
    pub fn include(&self) -> Option<bool> {
        self.include
    }

    pub fn is_filtered(&self) -> bool {
        self.include.is_some()
    }

    fn listed(&self, rep: &BoundedAttrRep) -> bool {
        self.attr_reps.iter().any(|listed| refers_to(listed, rep))
    }

    /// Whether the inclusion list allows `rep`.
    ///
    /// Checked in order:
    /// 1. `rep` is listed: the list's polarity.
    /// 2. `rep` is a sub-attribute, a sibling is listed and the parent is not:
    ///    not allowed for an inclusion list.
    /// 3. The parent of `rep` is listed: the list's polarity.
    /// 4. A sub-attribute of `rep` is listed and the list is an inclusion list: allowed.
    /// 5. Otherwise the negation of the list's polarity.
    ///
    /// Without any list everything is allowed.
    pub fn allowed(&self, rep: &BoundedAttrRep) -> bool {
        let Some(include) = self.include else {
            return true;
        };

        if self.listed(rep) {
            return include;
        }

        if rep.is_sub_attr() {
            let parent = rep.parent();
            let parent_listed = self.listed(&parent);
            let sibling_listed = self.attr_reps.iter().any(|listed| {
                listed.is_sub_attr()
                    && refers_to(&listed.parent(), &parent)
                    && !refers_to(listed, rep)
            });
            if sibling_listed && !parent_listed && include {
                return false;
            }
            if parent_listed {
                return include;
            }
        } else if include {
            let child_listed = self
                .attr_reps
                .iter()
                .any(|listed| listed.is_sub_attr() && refers_to(&listed.parent(), rep));
            if child_listed {
                return true;
            }
        }
        !include
    }

    /// Explicit inclusion override for `rep`.
    ///
    /// `Include` when an inclusion list names `rep` or its parent, `Exclude` when
    /// `rep` is not allowed, and `None` otherwise.
    pub fn inclusivity(&self, rep: &BoundedAttrRep) -> Option<DataInclusivity> {
        let requested = self.listed(rep) || (rep.is_sub_attr() && self.listed(&rep.parent()));
        if self.include == Some(true) && requested {
            return Some(DataInclusivity::Include);
        }
        if !self.allowed(rep) {
            return Some(DataInclusivity::Exclude);
        }
        None
    }

    /// Whether the issuer rule is skipped for `rep`.
    pub fn ignores_issuer(&self, rep: &BoundedAttrRep) -> bool {
        self.ignore_issuer.iter().any(|ignored| {
            refers_to(ignored, rep) || (rep.is_sub_attr() && refers_to(ignored, &rep.parent()))
        })
    }
}

/// Whether a user-supplied reference names `rep`. Unbounded references match
/// regardless of schema.
fn refers_to(reference: &AttrRef, rep: &BoundedAttrRep) -> bool {
    match reference {
        AttrRef::Bounded(bounded) => bounded == rep,
        AttrRef::Unbounded(unbounded) => unbounded == rep.unbounded(),
    }
}
