//! Operator registry and built-in filter operators.
//!
//! Operators are looked up by their lower-cased token. The registry is assembled
//! with [`OperatorRegistryBuilder`] at start-up and is immutable afterwards;
//! parsed filters hold shared references to the operators they use, so
//! evaluation never consults the registry again.

use super::ast::Literal;
use crate::data::ScimValue;
use crate::error::{BuildError, BuildResult};
use crate::schema::AttributeType;
use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Logical keywords that can never be used as operator tokens.
pub const RESERVED_KEYWORDS: [&str; 3] = ["and", "or", "not"];

/// Operator applied to an attribute value alone, such as `pr`.
pub trait UnaryOperator: Send + Sync {
    /// Token as written in filters, e.g. `pr`.
    fn token(&self) -> &str;

    /// Evaluate the operator on one value. Absent values are passed as `Null`.
    fn evaluate(&self, value: &ScimValue) -> bool;
}

/// Operator comparing an attribute value with a literal, such as `eq`.
///
/// Values are already coerced to the attribute type and case-folded when the
/// attribute is not case-exact.
pub trait BinaryOperator: Send + Sync {
    /// Token as written in filters, e.g. `eq`.
    fn token(&self) -> &str;

    /// Evaluate the operator on one attribute value and the literal operand.
    fn evaluate(&self, value: &ScimValue, operand: &ScimValue) -> bool;

    /// Whether the literal can be used with this operator at all.
    fn supports_operand(&self, _operand: &Literal) -> bool {
        true
    }

    /// Whether attributes of `attribute_type` can be compared with this operator.
    fn supports_attribute(&self, _attribute_type: AttributeType) -> bool {
        true
    }
}

/// Typed ordering of two scalar values.
///
/// Integers and decimals compare numerically, date-times chronologically.
/// Returns `None` for values of incompatible kinds.
pub fn compare(left: &ScimValue, right: &ScimValue) -> Option<Ordering> {
    match (left, right) {
        (ScimValue::Null, ScimValue::Null) => Some(Ordering::Equal),
        (ScimValue::String(a), ScimValue::String(b)) => Some(a.cmp(b)),
        (ScimValue::Boolean(a), ScimValue::Boolean(b)) => Some(a.cmp(b)),
        (ScimValue::Integer(a), ScimValue::Integer(b)) => Some(a.cmp(b)),
        (ScimValue::DateTime(a), ScimValue::DateTime(b)) => Some(a.cmp(b)),
        (
            ScimValue::Integer(_) | ScimValue::Decimal(_),
            ScimValue::Integer(_) | ScimValue::Decimal(_),
        ) => {
            left.as_f64()?.partial_cmp(&right.as_f64()?)
        }
        _ => None,
    }
}

struct PresentOperator;

impl UnaryOperator for PresentOperator {
    fn token(&self) -> &str {
        "pr"
    }

    fn evaluate(&self, value: &ScimValue) -> bool {
        value.is_present()
    }
}

struct EqualOperator;

impl BinaryOperator for EqualOperator {
    fn token(&self) -> &str {
        "eq"
    }

    fn evaluate(&self, value: &ScimValue, operand: &ScimValue) -> bool {
        compare(value, operand) == Some(Ordering::Equal)
    }
}

struct NotEqualOperator;

impl BinaryOperator for NotEqualOperator {
    fn token(&self) -> &str {
        "ne"
    }

    fn evaluate(&self, value: &ScimValue, operand: &ScimValue) -> bool {
        compare(value, operand) != Some(Ordering::Equal)
    }
}

/// `co`, `sw` and `ew`: substring matches on string values.
struct SubstringOperator {
    token: &'static str,
    test: fn(&str, &str) -> bool,
}

impl BinaryOperator for SubstringOperator {
    fn token(&self) -> &str {
        self.token
    }

    fn evaluate(&self, value: &ScimValue, operand: &ScimValue) -> bool {
        match (value, operand) {
            (ScimValue::String(value), ScimValue::String(operand)) => (self.test)(value, operand),
            _ => false,
        }
    }

    fn supports_operand(&self, operand: &Literal) -> bool {
        matches!(operand, Literal::String(_))
    }

    fn supports_attribute(&self, attribute_type: AttributeType) -> bool {
        matches!(
            attribute_type,
            AttributeType::String | AttributeType::Reference | AttributeType::Binary
        )
    }
}

/// `gt`, `ge`, `lt` and `le`: ordering comparisons.
struct OrderingOperator {
    token: &'static str,
    accepts: fn(Ordering) -> bool,
}

impl BinaryOperator for OrderingOperator {
    fn token(&self) -> &str {
        self.token
    }

    fn evaluate(&self, value: &ScimValue, operand: &ScimValue) -> bool {
        if matches!(value, ScimValue::Null | ScimValue::Boolean(_)) {
            return false;
        }
        compare(value, operand).is_some_and(self.accepts)
    }

    fn supports_operand(&self, operand: &Literal) -> bool {
        !matches!(operand, Literal::Boolean(_) | Literal::Null)
    }

    fn supports_attribute(&self, attribute_type: AttributeType) -> bool {
        !matches!(
            attribute_type,
            AttributeType::Boolean | AttributeType::Binary | AttributeType::Complex
        )
    }
}

fn builtin_unary() -> Vec<Arc<dyn UnaryOperator>> {
    vec![Arc::new(PresentOperator)]
}

fn builtin_binary() -> Vec<Arc<dyn BinaryOperator>> {
    vec![
        Arc::new(EqualOperator),
        Arc::new(NotEqualOperator),
        Arc::new(SubstringOperator {
            token: "co",
            test: |value, operand| value.contains(operand),
        }),
        Arc::new(SubstringOperator {
            token: "sw",
            test: |value, operand| value.starts_with(operand),
        }),
        Arc::new(SubstringOperator {
            token: "ew",
            test: |value, operand| value.ends_with(operand),
        }),
        Arc::new(OrderingOperator {
            token: "gt",
            accepts: Ordering::is_gt,
        }),
        Arc::new(OrderingOperator {
            token: "ge",
            accepts: Ordering::is_ge,
        }),
        Arc::new(OrderingOperator {
            token: "lt",
            accepts: Ordering::is_lt,
        }),
        Arc::new(OrderingOperator {
            token: "le",
            accepts: Ordering::is_le,
        }),
    ]
}

static DEFAULT_REGISTRY: LazyLock<OperatorRegistry> = LazyLock::new(OperatorRegistry::default);

/// Sealed set of unary and binary operators, keyed by lower-cased token.
#[derive(Clone)]
pub struct OperatorRegistry {
    unary: HashMap<String, Arc<dyn UnaryOperator>>,
    binary: HashMap<String, Arc<dyn BinaryOperator>>,
}

impl std::fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut unary: Vec<_> = self.unary.keys().collect();
        let mut binary: Vec<_> = self.binary.keys().collect();
        unary.sort();
        binary.sort();
        f.debug_struct("OperatorRegistry")
            .field("unary", &unary)
            .field("binary", &binary)
            .finish()
    }
}

impl Default for OperatorRegistry {
    /// Registry with the built-in `pr`, `eq`, `ne`, `co`, `sw`, `ew`, `gt`, `ge`,
    /// `lt` and `le` operators.
    fn default() -> Self {
        OperatorRegistry {
            unary: builtin_unary()
                .into_iter()
                .map(|operator| (operator.token().to_lowercase(), operator))
                .collect(),
            binary: builtin_binary()
                .into_iter()
                .map(|operator| (operator.token().to_lowercase(), operator))
                .collect(),
        }
    }
}

impl OperatorRegistry {
    /// Start an empty registry.
    pub fn builder() -> OperatorRegistryBuilder {
        OperatorRegistryBuilder::new()
    }

    /// Shared registry with the built-in operators only.
    pub fn defaults() -> &'static OperatorRegistry {
        &DEFAULT_REGISTRY
    }

    pub fn get_unary(&self, token: &str) -> Option<&Arc<dyn UnaryOperator>> {
        self.unary.get(&token.to_lowercase())
    }

    pub fn get_binary(&self, token: &str) -> Option<&Arc<dyn BinaryOperator>> {
        self.binary.get(&token.to_lowercase())
    }

    pub fn contains(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        self.unary.contains_key(&token) || self.binary.contains_key(&token)
    }

    pub fn unary_tokens(&self) -> Vec<&str> {
        self.unary.keys().map(String::as_str).collect()
    }

    pub fn binary_tokens(&self) -> Vec<&str> {
        self.binary.keys().map(String::as_str).collect()
    }
}

/// Builder for [`OperatorRegistry`].
///
/// ```rust
/// use scim_core::data::ScimValue;
/// use scim_core::filter::{BinaryOperator, OperatorRegistry};
///
/// struct Regex;
///
/// impl BinaryOperator for Regex {
///     fn token(&self) -> &str {
///         "rx"
///     }
///
///     fn evaluate(&self, value: &ScimValue, operand: &ScimValue) -> bool {
///         value.as_str().zip(operand.as_str()).is_some_and(|(v, o)| v.contains(o))
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = OperatorRegistry::builder()
///     .with_defaults()?
///     .register_binary(Regex)?
///     .build();
/// assert!(registry.get_binary("RX").is_some());
/// let twice = OperatorRegistry::builder()
///     .with_defaults()?
///     .register_binary(Regex)?
///     .register_binary(Regex);
/// assert!(twice.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct OperatorRegistryBuilder {
    unary: HashMap<String, Arc<dyn UnaryOperator>>,
    binary: HashMap<String, Arc<dyn BinaryOperator>>,
}

impl OperatorRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the built-in operators.
    ///
    /// Fails with [`BuildError::DuplicateOperator`] if a built-in token was
    /// already registered.
    pub fn with_defaults(mut self) -> BuildResult<Self> {
        for operator in builtin_unary() {
            let token = self.check_token(operator.token())?;
            self.unary.insert(token, operator);
        }
        for operator in builtin_binary() {
            let token = self.check_token(operator.token())?;
            self.binary.insert(token, operator);
        }
        Ok(self)
    }

    pub fn register_unary(mut self, operator: impl UnaryOperator + 'static) -> BuildResult<Self> {
        let token = self.check_token(operator.token())?;
        debug!("Registering unary filter operator '{}'", token);
        self.unary.insert(token, Arc::new(operator));
        Ok(self)
    }

    pub fn register_binary(mut self, operator: impl BinaryOperator + 'static) -> BuildResult<Self> {
        let token = self.check_token(operator.token())?;
        debug!("Registering binary filter operator '{}'", token);
        self.binary.insert(token, Arc::new(operator));
        Ok(self)
    }

    pub fn build(self) -> OperatorRegistry {
        OperatorRegistry {
            unary: self.unary,
            binary: self.binary,
        }
    }

    fn is_taken(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        self.unary.contains_key(&token) || self.binary.contains_key(&token)
    }

    fn check_token(&self, token: &str) -> BuildResult<String> {
        let lower = token.to_lowercase();
        if lower.is_empty() || lower.contains(|c: char| c.is_whitespace() || "()[]\"".contains(c)) {
            return Err(BuildError::InvalidName {
                name: token.to_string(),
            });
        }
        if RESERVED_KEYWORDS.contains(&lower.as_str()) || self.is_taken(&lower) {
            return Err(BuildError::DuplicateOperator {
                operator: token.to_string(),
            });
        }
        Ok(lower)
    }
}
