//! PATCH tests against the fixture schemas, following RFC 7644 §3.5.2.

use serde_json::json;

use crate::common::{ENTERPRISE_URI, data, group_schema, init_logging, tour_guides, user_schema};

use scim_core::config::ServiceConfig;
use scim_core::data::ScimValue;
use scim_core::error::ScimType;
use scim_core::filter::OperatorRegistry;
use scim_core::issues::{Location, ValidationIssues};
use scim_core::patch::{PATCH_OP_URI, PatchOpKind, PatchPath, PatchRequest};
use scim_core::schema::ResourceSchema;

fn parse_request(body: serde_json::Value, schema: &ResourceSchema) -> Result<PatchRequest, ValidationIssues> {
    PatchRequest::parse(
        &data(body),
        schema,
        &ServiceConfig::default(),
        OperatorRegistry::defaults(),
    )
}

fn operation_location(index: usize, part: &str) -> Location {
    Location::from("Operations").child(index).child(part)
}

#[test]
fn test_member_display_name_path() {
    init_logging();
    let schema = group_schema();
    let path: PatchPath = r#"members[value eq "2819c223-7f76-453a-919d-413861904646"].displayName"#
        .parse()
        .unwrap();

    assert_eq!(path.attr().to_string(), "members");
    assert_eq!(path.sub_attr().map(|sub| sub.as_str()), Some("displayName"));
    assert_eq!(
        path.to_string(),
        r#"members[value eq "2819c223-7f76-453a-919d-413861904646"].displayName"#
    );

    let group = data(tour_guides());
    let members = group.get_raw("members").and_then(ScimValue::as_list).unwrap();
    let selected: Vec<bool> = members
        .iter()
        .map(|member| path.filter_matches(member, &schema).unwrap())
        .collect();
    assert_eq!(selected, vec![true, false]);
}

#[test]
fn test_member_value_is_case_exact() {
    let schema = group_schema();
    let path: PatchPath = r#"members[value eq "2819C223-7F76-453A-919D-413861904646"]"#
        .parse()
        .unwrap();
    let member = ScimValue::from_json(json!({"value": "2819c223-7f76-453a-919d-413861904646"}));
    assert!(!path.filter_matches(&member, &schema).unwrap());
}

#[test]
fn test_rfc_group_membership_request() {
    let schema = group_schema();
    let request = parse_request(
        json!({
            "schemas": [PATCH_OP_URI],
            "Operations": [
                {
                    "op": "add",
                    "path": "members",
                    "value": [{
                        "display": "Babs Jensen",
                        "$ref": "https://example.com/v2/Users/2819c223-7f76-453a-919d-413861904646",
                        "value": "2819c223-7f76-453a-919d-413861904646"
                    }]
                },
                {
                    "op": "remove",
                    "path": r#"members[value eq "902c246b-6245-4190-8e05-00816be7344a"]"#
                },
                {
                    "op": "replace",
                    "path": r#"members[value eq "2819c223-7f76-453a-919d-413861904646"].displayName"#,
                    "value": "Barbara Jensen"
                },
                {
                    "op": "replace",
                    "value": {"displayName": "Tour Guides (EU)"}
                }
            ]
        }),
        &schema,
    )
    .unwrap();

    let kinds: Vec<PatchOpKind> = request.operations().iter().map(|operation| operation.op()).collect();
    assert_eq!(
        kinds,
        vec![PatchOpKind::Add, PatchOpKind::Remove, PatchOpKind::Replace, PatchOpKind::Replace]
    );
    assert!(request.operations()[3].path().is_none());
}

#[test]
fn test_user_request_errors() {
    let schema = user_schema();
    let issues = parse_request(
        json!({
            "schemas": [PATCH_OP_URI],
            "Operations": [
                {"op": "replace", "path": "userName"},
                {"op": "remove", "path": "userName"},
                {"op": "replace", "path": "groups", "value": []},
                {"op": "add", "path": "emails[type eq \"work\"", "value": {"value": "x"}},
                {"op": "replace", "value": {"active": "yes", "meta": {"version": "W/\"2\""}}},
                {"op": "add", "path": "nickname", "value": "Babs"},
                {"op": "replace", "path": format!("{}:manager.displayName", ENTERPRISE_URI), "value": "Jim"}
            ]
        }),
        &schema,
    )
    .unwrap_err();

    assert_eq!(issues.error_codes_at(operation_location(0, "value")), vec![6]);
    assert_eq!(issues.error_codes_at(operation_location(1, "path")), vec![301]);
    assert_eq!(issues.error_codes_at(operation_location(2, "path")), vec![300]);
    assert_eq!(issues.error_codes_at(operation_location(3, "path")), vec![200]);
    assert_eq!(
        issues.error_codes_at(Location::from("Operations").child(4).child("value").child("active")),
        vec![1]
    );
    assert!(
        issues
            .error_codes_at(Location::from("Operations").child(4).child("value").child("meta"))
            .contains(&300)
    );
    assert!(issues.error_codes_at(Location::from("Operations").child(5)).is_empty());
    assert!(issues.error_codes_at(operation_location(5, "path")).is_empty());
    assert_eq!(issues.error_codes_at(operation_location(6, "path")), vec![300]);

    let response = issues.to_error_response().unwrap();
    assert_eq!(response.status, "400");
    assert_eq!(response.scim_type, Some(ScimType::InvalidValue));
}

#[test]
fn test_bad_path_classification() {
    let schema = user_schema();
    let issues = parse_request(
        json!({
            "schemas": [PATCH_OP_URI],
            "Operations": [{"op": "remove", "path": "emails[type eq \"work\"]]"}]
        }),
        &schema,
    )
    .unwrap_err();

    let response = issues.to_error_response().unwrap();
    assert_eq!(response.scim_type, Some(ScimType::InvalidPath));
    assert!(response.detail.starts_with("Operations.0.path"));
}

#[test]
fn test_missing_path_classification() {
    let schema = user_schema();
    let issues = parse_request(
        json!({"schemas": [PATCH_OP_URI], "Operations": [{"op": "remove"}]}),
        &schema,
    )
    .unwrap_err();

    let response = issues.to_error_response().unwrap();
    assert_eq!(response.scim_type, Some(ScimType::NoTarget));
}
