//! Operators registered by the host application.

use regex::Regex;

use crate::common::{bjensen, data, user_schema};

use scim_core::data::ScimValue;
use scim_core::error::BuildError;
use scim_core::filter::{BinaryOperator, Filter, Literal, OperatorRegistry, UnaryOperator};
use scim_core::issues::Location;
use scim_core::schema::AttributeType;

/// `attr re "pattern"`: regular expression match on string attributes.
struct RegexMatch;

impl BinaryOperator for RegexMatch {
    fn token(&self) -> &str {
        "re"
    }

    fn evaluate(&self, value: &ScimValue, operand: &ScimValue) -> bool {
        match (value.as_str(), operand.as_str()) {
            (Some(value), Some(pattern)) => {
                Regex::new(pattern).is_ok_and(|regex| regex.is_match(value))
            }
            _ => false,
        }
    }

    fn supports_operand(&self, operand: &Literal) -> bool {
        matches!(operand, Literal::String(_))
    }

    fn supports_attribute(&self, attribute_type: AttributeType) -> bool {
        attribute_type == AttributeType::String
    }
}

/// `attr ab`: the attribute has no value.
struct Absent;

impl UnaryOperator for Absent {
    fn token(&self) -> &str {
        "ab"
    }

    fn evaluate(&self, value: &ScimValue) -> bool {
        !value.is_present()
    }
}

fn registry() -> OperatorRegistry {
    OperatorRegistry::builder()
        .with_defaults()
        .unwrap()
        .register_binary(RegexMatch)
        .unwrap()
        .register_unary(Absent)
        .unwrap()
        .build()
}

#[test]
fn test_custom_operators_evaluate() {
    let schema = user_schema();
    let user = data(bjensen());
    let registry = registry();

    let filter = Filter::parse(r#"userName RE "^bj.*@example\\.com$" and password ab"#, &registry).unwrap();
    assert_eq!(filter.to_string(), r#"userName re "^bj.*@example\\.com$" and password ab"#);
    assert!(filter.evaluate(&user, &schema));

    let filter = Filter::parse(r#"emails[value re "jensen\\.org$"]"#, &registry).unwrap();
    assert!(filter.evaluate(&user, &schema));

    let filter = Filter::parse("nickName ab", &registry).unwrap();
    assert!(!filter.evaluate(&user, &schema));
}

#[test]
fn test_custom_operator_constraints() {
    let schema = user_schema();
    let registry = registry();

    let issues = Filter::parse("userName re 42", &registry).unwrap_err();
    assert_eq!(issues.error_codes_at(Location::root()), vec![106]);

    let filter = Filter::parse(r#"active re "t.*""#, &registry).unwrap();
    assert_eq!(filter.check(&schema).error_codes_at(Location::root()), vec![106]);
}

#[test]
fn test_default_registry_does_not_know_custom_tokens() {
    let issues = Filter::parse(r#"userName re "^b""#, OperatorRegistry::defaults()).unwrap_err();
    assert_eq!(issues.error_codes_at(Location::root()), vec![102]);

    let issues = Filter::parse("title ab", OperatorRegistry::defaults()).unwrap_err();
    assert_eq!(issues.error_codes_at(Location::root()), vec![102]);
}

#[test]
fn test_registering_an_existing_token() {
    match OperatorRegistry::builder()
        .with_defaults()
        .and_then(|builder| builder.register_unary(Absent))
        .and_then(|builder| builder.register_unary(Absent))
    {
        Err(BuildError::DuplicateOperator { operator }) => assert_eq!(operator, "ab"),
        other => panic!("Expected DuplicateOperator, got {:?}", other.map(|builder| builder.build())),
    }
}
