//! List query tests: parameters, filtering, sorting, paging and projection
//! applied together, as a list endpoint would.

use serde_json::json;

use crate::common::{USER_URI, data, user_schema};

use scim_core::config::ServiceConfig;
use scim_core::data::{ScimData, ScimValue};
use scim_core::filter::OperatorRegistry;
use scim_core::query::{QueryParameters, SortOrder};

fn users() -> Vec<ScimData> {
    [
        ("1", "mpepperidge", "Mandy", "2011-08-01T18:29:49Z", "Contractor"),
        ("2", "bjensen", "Barbara", "2010-01-23T04:56:22Z", "Employee"),
        ("3", "jsmith", "John", "2012-03-02T11:00:00+01:00", "Employee"),
        ("4", "Alice", "Alice", "2013-07-15T09:30:00Z", "Employee"),
    ]
    .into_iter()
    .map(|(id, user_name, given_name, created, user_type)| {
        data(json!({
            "schemas": [USER_URI],
            "id": id,
            "userName": user_name,
            "name": {"givenName": given_name},
            "userType": user_type,
            "password": "secret",
            "meta": {"resourceType": "User", "created": created}
        }))
    })
    .collect()
}

fn list(params: &[(&str, &str)], config: &ServiceConfig) -> Vec<serde_json::Value> {
    let schema = user_schema();
    let query = QueryParameters::parse(params.iter().copied(), config, OperatorRegistry::defaults())
        .unwrap_or_else(|issues| panic!("rejected: {}", issues.to_json()));

    let mut resources: Vec<ScimData> = users()
        .into_iter()
        .filter(|user| {
            query
                .filter
                .as_ref()
                .is_none_or(|filter| filter.evaluate(user, &schema))
        })
        .collect();
    if let Some(sorter) = query.sorter() {
        resources = sorter.sort(resources, &schema);
    }
    let presence = query.presence_config();
    query
        .paginate(resources)
        .iter()
        .map(|user| schema.project(user, &presence).to_plain())
        .collect()
}

fn ids(resources: &[serde_json::Value]) -> Vec<&str> {
    resources
        .iter()
        .map(|resource| resource["id"].as_str().unwrap_or_default())
        .collect()
}

#[test]
fn test_filter_sort_and_page() {
    let config = ServiceConfig::default();
    let page = list(
        &[
            ("filter", r#"userType eq "employee""#),
            ("sortBy", "userName"),
            ("startIndex", "2"),
            ("count", "5"),
        ],
        &config,
    );
    // Alice, bjensen, jsmith without the first
    assert_eq!(ids(&page), vec!["2", "3"]);
}

#[test]
fn test_sort_by_date_descending() {
    let config = ServiceConfig::default();
    let page = list(&[("sortBy", "meta.created"), ("sortOrder", "DESCENDING")], &config);
    assert_eq!(ids(&page), vec!["4", "3", "1", "2"]);
}

#[test]
fn test_count_is_capped() {
    let config = ServiceConfig::default().with_filter(true, 3);
    let page = list(&[("count", "100")], &config);
    assert_eq!(page.len(), 3);

    let page = list(&[("count", "0")], &config);
    assert!(page.is_empty());
}

#[test]
fn test_projection_by_attribute_lists() {
    let config = ServiceConfig::default();

    let page = list(&[("attributes", "userName")], &config);
    for resource in &page {
        assert!(resource.get("userName").is_some());
        assert!(resource.get("id").is_some());
        assert!(resource.get("name").is_none());
        assert!(resource.get("password").is_none());
    }

    let page = list(&[("excludedAttributes", "name,meta")], &config);
    for resource in &page {
        assert!(resource.get("userName").is_some());
        assert!(resource.get("name").is_none());
        assert!(resource.get("meta").is_none());
    }
}

#[test]
fn test_query_parameter_errors() {
    let config = ServiceConfig::default().with_sort(false);
    let issues = QueryParameters::parse(
        [
            ("attributes", "userName"),
            ("excludedAttributes", "name"),
            ("sortBy", "userName"),
            ("filter", "userName eq"),
            ("startIndex", "first"),
        ],
        &config,
        OperatorRegistry::defaults(),
    )
    .unwrap_err();

    assert_eq!(issues.error_codes_at("attributes"), vec![15]);
    assert_eq!(issues.error_codes_at("sortBy"), vec![16]);
    assert_eq!(issues.error_codes_at("filter"), vec![103]);
    assert_eq!(issues.error_codes_at("startIndex"), vec![1]);

    let response = issues.to_error_response().unwrap();
    assert_eq!(response.status, "501");
}

#[test]
fn test_sort_order_serialization() {
    assert_eq!(serde_json::to_value(SortOrder::Descending).unwrap(), "descending");
    assert_eq!("Ascending".parse::<SortOrder>().unwrap(), SortOrder::Ascending);
    assert!(matches!(
        ScimValue::from("descending").as_str().map(str::parse::<SortOrder>),
        Some(Ok(SortOrder::Descending))
    ));
}
