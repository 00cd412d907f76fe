//! Case-insensitive, schema-aware nested data container.

use super::ScimValue;
use crate::error::{ValidationError, ValidationResult};
use crate::value_objects::{AttrName, AttrRef, AttrRep, BoundedAttrRep, SchemaUri};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Resolved key of a [`ScimData`] lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataKey {
    /// The namespace container of a schema extension.
    Namespace(SchemaUri),
    /// An attribute or sub-attribute, inside an extension namespace when
    /// `namespace` is set.
    Attr {
        namespace: Option<SchemaUri>,
        attr: AttrName,
        sub_attr: Option<AttrName>,
    },
}

impl DataKey {
    fn from_bounded(rep: &BoundedAttrRep) -> Self {
        Self::Attr {
            namespace: rep.is_extension().then(|| rep.schema().clone()),
            attr: rep.attr().clone(),
            sub_attr: rep.sub_attr().cloned(),
        }
    }

    fn from_unbounded(rep: &AttrRep) -> Self {
        Self::Attr {
            namespace: None,
            attr: rep.attr().clone(),
            sub_attr: rep.sub_attr().cloned(),
        }
    }

    fn from_schema(uri: &SchemaUri) -> ValidationResult<Self> {
        if uri.is_extension() {
            Ok(Self::Namespace(uri.clone()))
        } else {
            Err(ValidationError::BaseSchemaKey {
                uri: uri.to_string(),
            })
        }
    }
}

/// Anything that can address a value in a [`ScimData`] container.
///
/// String keys are resolved in this order:
///
/// 1. a known schema URI addresses an extension namespace (base schemas are
///    rejected with [`ValidationError::BaseSchemaKey`]),
/// 2. text containing `:` is split at the last `:` into a known schema URI and
///    an attribute path,
/// 3. anything else is parsed as `attr` or `attr.sub`.
pub trait IntoDataKey {
    fn into_data_key(self) -> ValidationResult<DataKey>;
}

impl IntoDataKey for DataKey {
    fn into_data_key(self) -> ValidationResult<DataKey> {
        Ok(self)
    }
}

impl IntoDataKey for &str {
    fn into_data_key(self) -> ValidationResult<DataKey> {
        if let Some(uri) = SchemaUri::lookup(self) {
            return DataKey::from_schema(&uri);
        }
        if self.contains(':') {
            return BoundedAttrRep::parse(self).map(|rep| DataKey::from_bounded(&rep));
        }
        AttrRep::parse(self).map(|rep| DataKey::from_unbounded(&rep))
    }
}

impl IntoDataKey for &String {
    fn into_data_key(self) -> ValidationResult<DataKey> {
        self.as_str().into_data_key()
    }
}

impl IntoDataKey for String {
    fn into_data_key(self) -> ValidationResult<DataKey> {
        self.as_str().into_data_key()
    }
}

impl IntoDataKey for &AttrName {
    fn into_data_key(self) -> ValidationResult<DataKey> {
        Ok(DataKey::Attr {
            namespace: None,
            attr: self.clone(),
            sub_attr: None,
        })
    }
}

impl IntoDataKey for &AttrRep {
    fn into_data_key(self) -> ValidationResult<DataKey> {
        Ok(DataKey::from_unbounded(self))
    }
}

impl IntoDataKey for &BoundedAttrRep {
    fn into_data_key(self) -> ValidationResult<DataKey> {
        Ok(DataKey::from_bounded(self))
    }
}

impl IntoDataKey for &AttrRef {
    fn into_data_key(self) -> ValidationResult<DataKey> {
        match self {
            AttrRef::Unbounded(rep) => rep.into_data_key(),
            AttrRef::Bounded(rep) => rep.into_data_key(),
        }
    }
}

impl IntoDataKey for &SchemaUri {
    fn into_data_key(self) -> ValidationResult<DataKey> {
        DataKey::from_schema(self)
    }
}

/// Ordered container of SCIM values with case-insensitive keys.
///
/// Keys keep the casing they were last written with. Writing a key that differs
/// from an existing one only by case replaces the old entry in place.
///
/// Extension attributes live in a nested container stored under the extension's
/// schema URI, exactly as in SCIM payloads.
///
/// ```rust
/// use scim_core::data::{ScimData, ScimValue};
/// use serde_json::json;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut data = ScimData::new();
///     data.set("userName", "bjensen")?;
///     data.set("name.givenName", "Barbara")?;
///
///     assert_eq!(data.get("USERNAME"), Some(ScimValue::from("bjensen")));
///     assert_eq!(
///         data.to_plain(),
///         json!({"userName": "bjensen", "name": {"givenName": "Barbara"}})
///     );
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScimData {
    entries: IndexMap<String, ScimValue>,
    lower_index: HashMap<String, String>,
}

impl ScimData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys with their stored casing, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ScimValue)> {
        self.entries.iter()
    }

    /// Case-insensitive lookup of a single top-level key, without path resolution.
    pub fn get_raw(&self, key: &str) -> Option<&ScimValue> {
        self.lower_index
            .get(&key.to_lowercase())
            .and_then(|original| self.entries.get(original))
    }

    pub fn get_raw_mut(&mut self, key: &str) -> Option<&mut ScimValue> {
        match self.lower_index.get(&key.to_lowercase()) {
            Some(original) => self.entries.get_mut(original),
            None => None,
        }
    }

    /// Insert a single top-level key, without path resolution.
    ///
    /// A key differing only by case replaces the old entry at its position and
    /// takes the new casing.
    pub fn insert_raw(&mut self, key: impl Into<String>, value: impl Into<ScimValue>) {
        let key = key.into();
        let value = value.into();
        let lower = key.to_lowercase();
        match self.lower_index.get(&lower) {
            Some(original) if *original == key => {
                self.entries.insert(key, value);
            }
            Some(original) => {
                let index = self.entries.get_index_of(original);
                self.entries.shift_remove(original);
                match index {
                    Some(index) => {
                        self.entries.shift_insert(index, key.clone(), value);
                    }
                    None => {
                        self.entries.insert(key.clone(), value);
                    }
                }
                self.lower_index.insert(lower, key);
            }
            None => {
                self.entries.insert(key.clone(), value);
                self.lower_index.insert(lower, key);
            }
        }
    }

    /// Remove a single top-level key, without path resolution.
    pub fn remove_raw(&mut self, key: &str) -> Option<ScimValue> {
        let original = self.lower_index.remove(&key.to_lowercase())?;
        self.entries.shift_remove(&original)
    }

    pub fn contains_key(&self, key: impl IntoDataKey) -> bool {
        self.get(key).is_some_and(|value| !value.is_null())
    }

    /// Value at `key`, or `None` when it is absent or the key does not resolve.
    ///
    /// For `attr.sub` where `attr` holds a list, the result is a list with the
    /// sub-attribute of every element; elements lacking it yield `Null`.
    pub fn get(&self, key: impl IntoDataKey) -> Option<ScimValue> {
        let key = key.into_data_key().ok()?;
        self.get_resolved(&key, &ScimValue::Null)
    }

    /// Like [`get`](Self::get), substituting `default` for absent values,
    /// including absent elements of a broadcast lookup.
    pub fn get_or(&self, key: impl IntoDataKey, default: impl Into<ScimValue>) -> ScimValue {
        let default = default.into();
        match key.into_data_key() {
            Ok(key) => self.get_resolved(&key, &default).unwrap_or(default),
            Err(_) => default,
        }
    }

    fn get_resolved(&self, key: &DataKey, default: &ScimValue) -> Option<ScimValue> {
        match key {
            DataKey::Namespace(uri) => self.get_raw(uri.as_str()).cloned(),
            DataKey::Attr {
                namespace,
                attr,
                sub_attr,
            } => {
                let container = match namespace {
                    Some(uri) => self.get_raw(uri.as_str())?.as_complex()?,
                    None => self,
                };
                let value = container.get_raw(attr.as_str())?;
                let Some(sub_attr) = sub_attr else {
                    return Some(value.clone());
                };
                match value {
                    ScimValue::Complex(data) => data.get_raw(sub_attr.as_str()).cloned(),
                    ScimValue::List(items) => Some(ScimValue::List(
                        items
                            .iter()
                            .map(|item| {
                                item.as_complex()
                                    .and_then(|data| data.get_raw(sub_attr.as_str()))
                                    .cloned()
                                    .unwrap_or_else(|| default.clone())
                            })
                            .collect(),
                    )),
                    _ => None,
                }
            }
        }
    }

    /// Set the value at `key`.
    ///
    /// Setting `attr.sub` creates the `attr` container when needed. When `attr`
    /// holds a list, `value` must be a list too and is zipped element-wise,
    /// appending new containers for surplus values. When `attr` is absent and
    /// `value` is a list, a list of containers is created.
    pub fn set(
        &mut self,
        key: impl IntoDataKey,
        value: impl Into<ScimValue>,
    ) -> ValidationResult<()> {
        let value = value.into();
        match key.into_data_key()? {
            DataKey::Namespace(uri) => match value {
                ScimValue::Complex(_) | ScimValue::Null => {
                    self.insert_raw(uri.as_str(), value);
                    Ok(())
                }
                other => Err(ValidationError::TypeConflict {
                    key: uri.to_string(),
                    details: format!("extension data must be complex, got '{}'", other.type_name()),
                }),
            },
            DataKey::Attr {
                namespace,
                attr,
                sub_attr,
            } => {
                let container = match namespace {
                    Some(uri) => self.namespace_mut(&uri)?,
                    None => self,
                };
                match sub_attr {
                    None => {
                        container.insert_raw(attr.as_str(), value);
                        Ok(())
                    }
                    Some(sub_attr) => container.set_sub_attr(&attr, &sub_attr, value),
                }
            }
        }
    }

    fn namespace_mut(&mut self, uri: &SchemaUri) -> ValidationResult<&mut ScimData> {
        let missing = !matches!(
            self.get_raw(uri.as_str()),
            Some(ScimValue::Complex(_))
        );
        if missing {
            match self.get_raw(uri.as_str()) {
                None | Some(ScimValue::Null) => self.insert_raw(uri.as_str(), ScimData::new()),
                Some(other) => {
                    return Err(ValidationError::TypeConflict {
                        key: uri.to_string(),
                        details: format!("extension data is '{}'", other.type_name()),
                    });
                }
            }
        }
        self.get_raw_mut(uri.as_str())
            .and_then(ScimValue::as_complex_mut)
            .ok_or_else(|| ValidationError::TypeConflict {
                key: uri.to_string(),
                details: "extension data is not complex".to_string(),
            })
    }

    fn set_sub_attr(
        &mut self,
        attr: &AttrName,
        sub_attr: &AttrName,
        value: ScimValue,
    ) -> ValidationResult<()> {
        let conflict = |details: String| ValidationError::TypeConflict {
            key: format!("{}.{}", attr, sub_attr),
            details,
        };

        match self.get_raw_mut(attr.as_str()) {
            None | Some(ScimValue::Null) => {
                let parent = match value {
                    ScimValue::List(values) => ScimValue::List(
                        values
                            .into_iter()
                            .map(|value| {
                                let mut element = ScimData::new();
                                element.insert_raw(sub_attr.as_str(), value);
                                ScimValue::Complex(element)
                            })
                            .collect(),
                    ),
                    value => {
                        let mut element = ScimData::new();
                        element.insert_raw(sub_attr.as_str(), value);
                        ScimValue::Complex(element)
                    }
                };
                self.insert_raw(attr.as_str(), parent);
                Ok(())
            }
            Some(ScimValue::Complex(data)) => {
                data.insert_raw(sub_attr.as_str(), value);
                Ok(())
            }
            Some(ScimValue::List(items)) => {
                let values = match value {
                    ScimValue::List(values) => values,
                    other => {
                        return Err(conflict(format!(
                            "'{}' is multi-valued, expected a list but got '{}'",
                            attr,
                            other.type_name()
                        )));
                    }
                };
                for (index, value) in values.into_iter().enumerate() {
                    match items.get_mut(index) {
                        Some(ScimValue::Complex(data)) => data.insert_raw(sub_attr.as_str(), value),
                        Some(item @ ScimValue::Null) => {
                            let mut element = ScimData::new();
                            element.insert_raw(sub_attr.as_str(), value);
                            *item = ScimValue::Complex(element);
                        }
                        Some(other) => {
                            return Err(conflict(format!(
                                "element {} is '{}', not complex",
                                index,
                                other.type_name()
                            )));
                        }
                        None => {
                            let mut element = ScimData::new();
                            element.insert_raw(sub_attr.as_str(), value);
                            items.push(ScimValue::Complex(element));
                        }
                    }
                }
                Ok(())
            }
            Some(other) => Err(conflict(format!(
                "'{}' is '{}', not complex",
                attr,
                other.type_name()
            ))),
        }
    }

    /// Remove and return the value at `key`.
    ///
    /// For `attr.sub` where `attr` holds a list, the sub-attribute is removed
    /// from every element and the removed values are returned as a list.
    pub fn pop(&mut self, key: impl IntoDataKey) -> Option<ScimValue> {
        match key.into_data_key().ok()? {
            DataKey::Namespace(uri) => self.remove_raw(uri.as_str()),
            DataKey::Attr {
                namespace,
                attr,
                sub_attr,
            } => {
                let container = match namespace {
                    Some(uri) => self.get_raw_mut(uri.as_str())?.as_complex_mut()?,
                    None => self,
                };
                let Some(sub_attr) = sub_attr else {
                    return container.remove_raw(attr.as_str());
                };
                match container.get_raw_mut(attr.as_str())? {
                    ScimValue::Complex(data) => data.remove_raw(sub_attr.as_str()),
                    ScimValue::List(items) => Some(ScimValue::List(
                        items
                            .iter_mut()
                            .map(|item| {
                                item.as_complex_mut()
                                    .and_then(|data| data.remove_raw(sub_attr.as_str()))
                                    .unwrap_or_default()
                            })
                            .collect(),
                    )),
                    _ => None,
                }
            }
        }
    }

    /// Plain JSON object with the stored key casing.
    pub fn to_plain(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl PartialEq for ScimData {
    /// Order-insensitive, case-insensitive on keys.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get_raw(key) == Some(value))
    }
}

impl From<Map<String, Value>> for ScimData {
    fn from(map: Map<String, Value>) -> Self {
        let mut data = ScimData::new();
        for (key, value) in map {
            data.insert_raw(key, ScimValue::from_json(value));
        }
        data
    }
}

impl TryFrom<Value> for ScimData {
    type Error = ValidationError;

    fn try_from(value: Value) -> ValidationResult<Self> {
        match value {
            Value::Object(map) => Ok(Self::from(map)),
            other => Err(ValidationError::bad_type(
                "complex",
                ScimValue::from_json(other).type_name(),
            )),
        }
    }
}

impl<'a> IntoIterator for &'a ScimData {
    type Item = (&'a String, &'a ScimValue);
    type IntoIter = indexmap::map::Iter<'a, String, ScimValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
