//! SchemaUri value object and the process-wide catalog of known schemas.
//!
//! A [`SchemaUri`] can only exist for a URI that was registered first, either
//! directly with [`SchemaUri::register`] or by building a
//! [`ResourceSchema`](crate::schema::ResourceSchema) or
//! [`SchemaExtension`](crate::schema::SchemaExtension). The catalog is
//! append-only: entries are added at start-up and never removed.

use crate::error::{BuildError, BuildResult, ValidationError, ValidationResult};
use log::{debug, trace};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{LazyLock, PoisonError, RwLock};

#[derive(Debug, Clone)]
struct CatalogEntry {
    original: String,
    is_extension: bool,
}

/// Known schema URIs keyed by their lower-cased form.
static SCHEMA_CATALOG: LazyLock<RwLock<HashMap<String, CatalogEntry>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// A known, case-insensitive SCIM schema URI.
///
/// Displays with the casing it was registered with. Equality and hashing use
/// the lower-cased form.
///
/// ```rust
/// use scim_core::value_objects::SchemaUri;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     SchemaUri::register("urn:example:doc:2.0:Device", false)?;
///
///     let uri = SchemaUri::new("URN:EXAMPLE:DOC:2.0:DEVICE")?;
///     assert_eq!(uri.as_str(), "urn:example:doc:2.0:Device");
///     assert!(!uri.is_extension());
///
///     assert!(SchemaUri::new("urn:example:doc:2.0:Unknown").is_err());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SchemaUri {
    original: String,
    lower: String,
    is_extension: bool,
}

impl SchemaUri {
    /// Register a schema URI in the catalog.
    ///
    /// Registering the same URI again with the same extension flag is a no-op.
    /// Registering it with a different flag fails with
    /// [`BuildError::ConflictingSchema`].
    pub fn register(uri: &str, is_extension: bool) -> BuildResult<SchemaUri> {
        Self::validate_format(uri)?;
        let lower = uri.to_lowercase();

        let mut catalog = SCHEMA_CATALOG
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match catalog.get(&lower) {
            Some(entry) if entry.is_extension != is_extension => {
                return Err(BuildError::ConflictingSchema {
                    uri: uri.to_string(),
                });
            }
            Some(entry) => {
                trace!("Schema URI '{}' already registered", entry.original);
                return Ok(Self::from_entry(lower, entry));
            }
            None => {}
        }

        debug!(
            "Registering schema URI '{}' (extension: {})",
            uri, is_extension
        );
        let entry = CatalogEntry {
            original: uri.to_string(),
            is_extension,
        };
        let schema_uri = Self::from_entry(lower.clone(), &entry);
        catalog.insert(lower, entry);
        Ok(schema_uri)
    }

    /// Look up a registered schema URI.
    pub fn new(uri: &str) -> ValidationResult<SchemaUri> {
        Self::lookup(uri).ok_or_else(|| ValidationError::UnknownSchema {
            uri: uri.to_string(),
        })
    }

    /// Look up a registered schema URI, returning `None` if it is unknown.
    pub fn lookup(uri: &str) -> Option<SchemaUri> {
        let lower = uri.to_lowercase();
        let catalog = SCHEMA_CATALOG
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        catalog
            .get(&lower)
            .map(|entry| Self::from_entry(lower.clone(), entry))
    }

    /// Whether `uri` is registered.
    pub fn is_known(uri: &str) -> bool {
        Self::lookup(uri).is_some()
    }

    fn from_entry(lower: String, entry: &CatalogEntry) -> SchemaUri {
        SchemaUri {
            original: entry.original.clone(),
            lower,
            is_extension: entry.is_extension,
        }
    }

    fn validate_format(uri: &str) -> BuildResult<()> {
        let valid = !uri.is_empty()
            && uri.contains(':')
            && !uri.ends_with(':')
            && !uri.chars().any(char::is_whitespace);
        if valid {
            Ok(())
        } else {
            Err(BuildError::InvalidName {
                name: uri.to_string(),
            })
        }
    }

    /// The URI with its registered casing.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// The lower-cased form used for comparisons.
    pub fn lower(&self) -> &str {
        &self.lower
    }

    /// Whether the URI identifies a schema extension rather than a base schema.
    pub fn is_extension(&self) -> bool {
        self.is_extension
    }
}

impl PartialEq for SchemaUri {
    fn eq(&self, other: &Self) -> bool {
        self.lower == other.lower
    }
}

impl Eq for SchemaUri {}

impl Hash for SchemaUri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lower.hash(state);
    }
}

impl fmt::Display for SchemaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Serialize for SchemaUri {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.original.serialize(serializer)
    }
}

impl TryFrom<&str> for SchemaUri {
    type Error = ValidationError;

    fn try_from(value: &str) -> ValidationResult<Self> {
        Self::new(value)
    }
}
