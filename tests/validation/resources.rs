//! Whole-resource validation tests.
//!
//! Covers the RFC 7643 §8 payloads, located type errors, halting of deeper
//! checks, schema declarations, projection and the protocol error body.

use serde_json::json;

use crate::common::{
    ENTERPRISE_URI, GROUP_URI, USER_URI, bjensen, data, group_schema, init_logging, tour_guides,
    user_schema,
};

use scim_core::data::ScimValue;
use scim_core::error::{BuildError, ScimType, ValidationError};
use scim_core::issues::Location;
use scim_core::schema::{AttrValuePresenceConfig, Attribute, ResourceSchema, SchemaRegistry};
use scim_core::value_objects::AttrRef;

fn create_config() -> AttrValuePresenceConfig {
    AttrValuePresenceConfig::request().including(user_schema().required_attr_reps())
}

#[test]
fn test_rfc_user_is_a_valid_response() {
    init_logging();
    let schema = user_schema();
    let issues = schema.validate(&data(bjensen()), &AttrValuePresenceConfig::response());
    assert!(!issues.has_errors(), "unexpected errors: {}", issues.to_json());
}

#[test]
fn test_rfc_group_is_a_valid_request() {
    let schema = group_schema();
    let config = AttrValuePresenceConfig::request().including(schema.required_attr_reps());
    let issues = schema.validate(&data(tour_guides()), &config);
    assert!(issues.is_empty(), "unexpected issues: {}", issues.to_json());
}

#[test]
fn test_create_request_rejects_server_issued_values() {
    let schema = user_schema();
    let issues = schema.validate(&data(bjensen()), &create_config());

    assert_eq!(issues.error_codes_at("id"), vec![7]);
    assert_eq!(issues.error_codes_at("meta"), vec![7]);
    assert_eq!(issues.error_codes_at("groups"), vec![7]);
    // "must not be provided" does not halt the remaining checks
    assert!(issues.can_proceed());
}

#[test]
fn test_missing_required_attribute() {
    let schema = user_schema();
    let issues = schema.validate(&data(json!({"schemas": [USER_URI]})), &create_config());

    assert_eq!(issues.error_codes_at("userName"), vec![6]);
    assert!(!issues.can_proceed_at(&[Location::from("userName")]));
    assert!(issues.error_codes_at("id").is_empty());
}

#[test]
fn test_type_errors_are_located() {
    let schema = user_schema();
    let issues = schema.validate(
        &data(json!({
            "schemas": [USER_URI, ENTERPRISE_URI],
            "userName": "bjensen",
            "active": "yes",
            "emails": [{"value": "bjensen@example.com"}, {"value": 1}],
            ENTERPRISE_URI: {"employeeNumber": 42}
        })),
        &AttrValuePresenceConfig::request(),
    );

    assert_eq!(issues.error_codes_at("active"), vec![1]);
    assert_eq!(
        issues.error_codes_at(Location::from("emails").child(1).child("value")),
        vec![1]
    );
    assert_eq!(issues.error_codes_at([ENTERPRISE_URI, "employeeNumber"]), vec![1]);
    assert_eq!(issues.errors().count(), 3);

    let rendered = issues.to_json();
    assert_eq!(rendered["active"]["_errors"][0]["code"], 1);
    assert_eq!(rendered["emails"]["1"]["value"]["_errors"][0]["code"], 1);
}

#[test]
fn test_bad_type_halts_element_checks() {
    let schema = user_schema();
    let issues = schema.validate(
        &data(json!({
            "schemas": [USER_URI],
            "userName": "bjensen",
            "emails": "bjensen@example.com"
        })),
        &AttrValuePresenceConfig::request(),
    );

    assert_eq!(issues.error_codes_at("emails"), vec![1]);
    assert_eq!(issues.errors().count(), 1);
}

#[test]
fn test_value_level_errors() {
    let schema = user_schema();
    let issues = schema.validate(
        &data(json!({
            "schemas": [USER_URI],
            "userName": "bjensen",
            "profileUrl": "login/bjensen",
            "emails": [
                {"value": "a@example.com", "primary": true},
                {"value": "b@example.com", "primary": true}
            ],
            "x509Certificates": ["not base64!"]
        })),
        &AttrValuePresenceConfig::request(),
    );

    assert_eq!(issues.error_codes_at("profileUrl"), vec![3]);
    assert_eq!(issues.error_codes_at("emails"), vec![5]);
    assert_eq!(
        issues.error_codes_at(Location::from("x509Certificates").child(0)),
        vec![2]
    );
}

#[test]
fn test_scim_reference_types() {
    let schema = group_schema();
    let mut group = tour_guides();
    group["members"][1]["$ref"] = json!("https://example.com/v2/Devices/902c246b");

    let issues = schema.validate(&data(group), &AttrValuePresenceConfig::request());
    assert_eq!(
        issues.error_codes_at(Location::from("members").child(1).child("$ref")),
        vec![14]
    );
    assert!(
        issues
            .error_codes_at(Location::from("members").child(0).child("$ref"))
            .is_empty()
    );
}

#[test]
fn test_schema_declarations() {
    let schema = user_schema();
    let issues = schema.validate(
        &data(json!({
            "schemas": [USER_URI, "urn:example:unknown:2.0:Thing"],
            "userName": "bjensen",
            ENTERPRISE_URI: {"department": "Tour Operations"}
        })),
        &AttrValuePresenceConfig::request(),
    );

    assert_eq!(issues.error_codes_at(Location::from("schemas").child(1)), vec![10]);
    assert_eq!(issues.error_codes_at("schemas"), vec![12]);

    let issues = schema.validate(
        &data(json!({"schemas": [ENTERPRISE_URI], "userName": "bjensen"})),
        &AttrValuePresenceConfig::request(),
    );
    assert_eq!(issues.error_codes_at("schemas"), vec![13]);
}

#[test]
fn test_non_canonical_values_warn() {
    let schema = user_schema();
    let issues = schema.validate(
        &data(json!({"schemas": [USER_URI], "userName": "bjensen", "userType": "Intern"})),
        &AttrValuePresenceConfig::request(),
    );

    assert!(!issues.has_errors());
    assert!(issues.has_warnings());
    assert_eq!(issues.warnings_at("userType").len(), 1);
}

#[test]
fn test_validation_is_idempotent() {
    let schema = user_schema();
    let user = data(bjensen());
    let before = user.to_plain();

    let first = schema.validate(&user, &create_config());
    let second = schema.validate(&user, &create_config());

    assert_eq!(first, second);
    assert_eq!(user.to_plain(), before);
}

#[test]
fn test_error_response() {
    let schema = user_schema();
    let issues = schema.validate(
        &data(json!({"schemas": [USER_URI], "userName": "bjensen", "active": "yes"})),
        &AttrValuePresenceConfig::request(),
    );

    let response = issues.to_error_response().unwrap();
    assert_eq!(response.status, "400");
    assert_eq!(response.scim_type, Some(ScimType::InvalidValue));
    assert!(response.detail.contains("active"));

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["scimType"], "invalidValue");
    assert_eq!(body["schemas"][0], "urn:ietf:params:scim:api:messages:2.0:Error");
}

#[test]
fn test_uniqueness_conflict_response() {
    let schema = user_schema();
    let user = data(json!({"schemas": [USER_URI], "userName": "bjensen"}));
    let mut issues = schema.validate(&user, &AttrValuePresenceConfig::request());
    assert!(!issues.has_errors());

    // the host found another user with the same userName
    issues.add_error(
        ValidationError::NotUnique {
            attribute: "userName".to_string(),
        },
        false,
        "userName",
    );

    let response = issues.to_error_response().unwrap();
    assert_eq!(response.status, "409");
    assert_eq!(response.scim_type, Some(ScimType::Uniqueness));
    assert_eq!(response.detail, "userName: value of 'userName' is not unique");
}

#[test]
fn test_projection() {
    let schema = user_schema();
    let mut user = bjensen();
    user["password"] = json!("t1meMa$heen");
    let user = data(user);

    let projected = schema.project(&user, &AttrValuePresenceConfig::response());
    assert!(projected.get_raw("password").is_none());
    assert!(projected.get_raw("userName").is_some());
    assert!(projected.get_raw(ENTERPRISE_URI).is_some());

    let config = AttrValuePresenceConfig::response()
        .including(vec![AttrRef::parse("userName").unwrap(), AttrRef::parse("name.givenName").unwrap()]);
    let projected = schema.project(&user, &config);
    assert!(projected.get_raw("userName").is_some());
    assert!(projected.get_raw("id").is_some());
    assert!(projected.get_raw("displayName").is_none());
    assert_eq!(
        projected.get("name.givenName").and_then(|value| value.as_str().map(str::to_string)),
        Some("Barbara".to_string())
    );
    assert!(projected.get("name.familyName").is_none());
}

#[test]
fn test_deserialize_and_serialize() {
    let schema = user_schema();
    let deserialized = schema.deserialize(&data(bjensen()));
    assert!(matches!(
        deserialized.get("meta.created"),
        Some(ScimValue::DateTime(_))
    ));

    let serialized = schema.serialize(&deserialized);
    assert!(serialized["meta"]["created"].is_string());
    assert_eq!(serialized["userName"], "bjensen@example.com");
}

#[test]
fn test_registry_lookup() {
    let registry = SchemaRegistry::builder()
        .register(user_schema())
        .unwrap()
        .register(group_schema())
        .unwrap()
        .build();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.by_endpoint("/groups").unwrap().name(), "Group");
    assert_eq!(registry.get(&USER_URI.to_uppercase()).unwrap().name(), "User");
    assert_eq!(registry.for_data(&data(tour_guides())).unwrap().schema().as_str(), GROUP_URI);
    assert_eq!(registry.extensions().len(), 1);
    assert_eq!(registry.to_schemas_json().len(), 3);

    match SchemaRegistry::builder()
        .register(user_schema())
        .and_then(|builder| builder.register(user_schema()))
    {
        Err(BuildError::DuplicateSchema { uri }) => assert_eq!(uri, USER_URI),
        other => panic!("Expected DuplicateSchema, got {:?}", other.map(|_| ())),
    }

    let people = ResourceSchema::builder("urn:example:params:scim:schemas:Person", "Person", "/USERS")
        .with_attribute(Attribute::string("userName").required().build().unwrap())
        .build()
        .unwrap();
    match SchemaRegistry::builder()
        .register(user_schema())
        .and_then(|builder| builder.register(people))
    {
        Err(BuildError::DuplicateEndpoint { endpoint }) => assert_eq!(endpoint, "/USERS"),
        other => panic!("Expected DuplicateEndpoint, got {:?}", other.map(|_| ())),
    }
}
