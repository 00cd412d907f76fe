//! The filter examples of RFC 7644 §3.4.2.2, parsed, serialized and evaluated
//! against the RFC 7643 §8.2 user.

use crate::common::{bjensen, data, init_logging, user_schema};

use scim_core::error::ScimType;
use scim_core::filter::{Filter, OperatorRegistry};
use scim_core::issues::Location;

fn parse(input: &str) -> Filter {
    Filter::parse(input, OperatorRegistry::defaults())
        .unwrap_or_else(|issues| panic!("'{}' rejected: {}", input, issues.to_json()))
}

#[test]
fn test_rfc_examples_round_trip() {
    init_logging();
    user_schema();
    for input in [
        r#"userName eq "bjensen""#,
        r#"name.familyName co "O'Malley""#,
        r#"userName sw "J""#,
        r#"urn:ietf:params:scim:schemas:core:2.0:User:userName sw "J""#,
        "title pr",
        r#"meta.lastModified gt "2011-05-13T04:42:34Z""#,
        r#"meta.lastModified ge "2011-05-13T04:42:34Z""#,
        r#"meta.lastModified lt "2011-05-13T04:42:34Z""#,
        r#"meta.lastModified le "2011-05-13T04:42:34Z""#,
        r#"title pr and userType eq "Employee""#,
        r#"title pr or userType eq "Intern""#,
        r#"schemas eq "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User""#,
        r#"userType eq "Employee" and (emails co "example.com" or emails.value co "example.org")"#,
        r#"userType ne "Employee" and not (emails co "example.com" or emails.value co "example.org")"#,
        r#"userType eq "Employee" and (emails.type eq "work")"#,
        r#"userType eq "Employee" and emails[type eq "work" and value co "@example.com"]"#,
        r#"emails[type eq "work" and value co "@example.com"] or ims[type eq "xmpp" and value co "@foo.com"]"#,
    ] {
        assert_eq!(parse(input).to_string(), input);
    }
}

#[test]
fn test_canonical_form() {
    assert_eq!(
        parse(r#"userName Eq "john"  AND   ( title PR )"#).to_string(),
        r#"userName eq "john" and (title pr)"#
    );
    assert_eq!(
        parse(r#"emails[ type eq "work" ]"#).to_string(),
        r#"emails[type eq "work"]"#
    );
}

#[test]
fn test_rfc_examples_against_rfc_user() {
    let schema = user_schema();
    let user = data(bjensen());
    let cases = [
        (r#"userName Eq "BJENSEN@example.com""#, true),
        (r#"name.familyName co "ens""#, true),
        (r#"urn:ietf:params:scim:schemas:core:2.0:User:userName sw "bj""#, true),
        ("title pr", false),
        ("displayName pr", true),
        (r#"meta.lastModified gt "2011-05-13T04:42:33Z""#, true),
        (r#"meta.lastModified gt "2011-05-13T04:42:34Z""#, false),
        (r#"meta.lastModified ge "2011-05-13T04:42:34Z""#, true),
        (r#"meta.lastModified le "2011-05-13T06:42:34+02:00""#, true),
        (r#"meta.lastModified lt "2011-05-13T06:42:34+02:00""#, false),
        (r#"title pr or userType eq "Employee""#, true),
        (r#"schemas eq "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User""#, true),
        (r#"userType eq "Employee" and (emails co "example.com" or emails.value co "example.org")"#, true),
        (r#"userType ne "Employee" and not (emails co "example.com" or emails.value co "example.org")"#, false),
        (r#"userType eq "Employee" and emails[type eq "work" and value co "@example.com"]"#, true),
        (r#"emails[type eq "home" and value co "@example.com"]"#, false),
        (r#"emails[type eq "home" and value ew ".org"]"#, true),
        (r#"groups[display eq "tour guides"]"#, true),
        (r#"employeeNumber eq "701984""#, true),
        (r#"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:manager.value eq "26118915-6090-4610-87e4-49d8ca9f808d""#, true),
        ("x509Certificates pr", false),
        ("not (active eq false)", true),
        ("externalId eq null", false),
        ("password eq null", true),
    ];
    for (input, expected) in cases {
        assert_eq!(parse(input).evaluate(&user, &schema), expected, "filter: {}", input);
    }
}

#[test]
fn test_check_against_schema() {
    let schema = user_schema();

    assert!(parse(r#"userName eq "bjensen" and meta.created gt "2011-05-13T04:42:34Z""#)
        .check(&schema)
        .is_empty());

    let issues = parse(r#"active co "x""#).check(&schema);
    assert_eq!(issues.error_codes_at(Location::root()), vec![106]);

    let issues = parse(r#"meta.lastModified gt "yesterday" or emails[value gt 3]"#).check(&schema);
    assert_eq!(issues.error_codes_at(Location::root()), vec![106, 106]);

    // unknown attributes are left to evaluation
    assert!(parse(r#"title co "x""#).check(&schema).is_empty());
}

#[test]
fn test_filter_error_response() {
    let issues = Filter::parse(r#"userName eq "bjensen" and (title pr"#, OperatorRegistry::defaults())
        .unwrap_err();
    let response = issues.to_error_response().unwrap();
    assert_eq!(response.status, "400");
    assert_eq!(response.scim_type, Some(ScimType::InvalidFilter));
}
