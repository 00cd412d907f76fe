//! Filter expression tree.

use super::operator::{BinaryOperator, UnaryOperator};
use crate::data::ScimValue;
use crate::value_objects::AttrRef;
use std::fmt;
use std::sync::Arc;

/// A literal operand as written in a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Boolean(bool),
    Null,
    Integer(i64),
    /// Decimal value with its original text, so it is written back unchanged.
    Decimal { value: f64, raw: String },
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Decimal { .. } => "decimal",
        }
    }

    pub fn to_value(&self) -> ScimValue {
        match self {
            Self::String(s) => ScimValue::String(s.clone()),
            Self::Boolean(b) => ScimValue::Boolean(*b),
            Self::Null => ScimValue::Null,
            Self::Integer(i) => ScimValue::Integer(*i),
            Self::Decimal { value, .. } => ScimValue::Decimal(*value),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => {
                let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
                f.write_str(&quoted)
            }
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Null => f.write_str("null"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Decimal { raw, .. } => f.write_str(raw),
        }
    }
}

/// The comparison part of an attribute expression.
#[derive(Clone)]
pub enum Comparison {
    Unary(Arc<dyn UnaryOperator>),
    Binary(Arc<dyn BinaryOperator>, Literal),
}

impl Comparison {
    /// Lower-cased operator token.
    pub fn token(&self) -> String {
        match self {
            Self::Unary(op) => op.token().to_lowercase(),
            Self::Binary(op, _) => op.token().to_lowercase(),
        }
    }

    pub fn operand(&self) -> Option<&Literal> {
        match self {
            Self::Unary(_) => None,
            Self::Binary(_, literal) => Some(literal),
        }
    }

    pub fn is_unary(&self) -> bool {
        matches!(self, Self::Unary(_))
    }
}

impl fmt::Debug for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unary(_) => f.debug_tuple("Unary").field(&self.token()).finish(),
            Self::Binary(_, literal) => f
                .debug_tuple("Binary")
                .field(&self.token())
                .field(literal)
                .finish(),
        }
    }
}

impl PartialEq for Comparison {
    fn eq(&self, other: &Self) -> bool {
        self.token() == other.token() && self.operand() == other.operand()
    }
}

/// `attrPath op [literal]`
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeFilter {
    attr: AttrRef,
    comparison: Comparison,
}

impl AttributeFilter {
    pub fn new(attr: AttrRef, comparison: Comparison) -> Self {
        Self { attr, comparison }
    }

    pub fn attr(&self) -> &AttrRef {
        &self.attr
    }

    pub fn comparison(&self) -> &Comparison {
        &self.comparison
    }
}

impl fmt::Display for AttributeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.attr, self.comparison.token())?;
        if let Some(operand) = self.comparison.operand() {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}

/// A parsed filter expression.
///
/// `Display` writes the canonical form: single spaces, lower-case keywords and
/// operators, and JSON-escaped string literals.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
    /// Parenthesized expression
    Group(Box<Filter>),
    Attribute(AttributeFilter),
    /// `attr[filter]`: matches when any element of `attr` satisfies `filter`,
    /// whose attribute paths name sub-attributes of `attr`.
    Complex { attr: AttrRef, filter: Box<Filter> },
}

impl Filter {
    pub fn and(left: Filter, right: Filter) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Filter, right: Filter) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn negate(filter: Filter) -> Self {
        Self::Not(Box::new(filter))
    }

    pub fn group(filter: Filter) -> Self {
        Self::Group(Box::new(filter))
    }

    pub fn complex(attr: AttrRef, filter: Filter) -> Self {
        Self::Complex {
            attr,
            filter: Box::new(filter),
        }
    }

    /// Every attribute expression of the tree, depth first. Expressions inside
    /// complex groups refer to sub-attributes of the group's attribute.
    pub fn attribute_filters(&self) -> Vec<&AttributeFilter> {
        let mut found = Vec::new();
        self.collect_attribute_filters(&mut found);
        found
    }

    fn collect_attribute_filters<'a>(&'a self, found: &mut Vec<&'a AttributeFilter>) {
        match self {
            Self::And(left, right) | Self::Or(left, right) => {
                left.collect_attribute_filters(found);
                right.collect_attribute_filters(found);
            }
            Self::Not(inner) | Self::Group(inner) => inner.collect_attribute_filters(found),
            Self::Complex { filter, .. } => filter.collect_attribute_filters(found),
            Self::Attribute(filter) => found.push(filter),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(left, right) => write!(f, "{} and {}", left, right),
            Self::Or(left, right) => write!(f, "{} or {}", left, right),
            Self::Not(inner) => write!(f, "not {}", inner),
            Self::Group(inner) => write!(f, "({})", inner),
            Self::Attribute(filter) => write!(f, "{}", filter),
            Self::Complex { attr, filter } => write!(f, "{}[{}]", attr, filter),
        }
    }
}
