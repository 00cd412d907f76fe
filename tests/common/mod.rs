//! Shared fixtures: User, Group and Enterprise User schemas modelled on
//! RFC 7643 §4 and §8, plus sample payloads.

use scim_core::data::ScimData;
use scim_core::schema::{
    AttributeIssuer, Attribute, Mutability, ResourceSchema, Returned, SchemaExtension, Uniqueness,
};
use serde_json::{Value, json};

pub const USER_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const GROUP_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";
pub const ENTERPRISE_URI: &str = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";

/// Route library logging to the test output. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn enterprise_extension() -> SchemaExtension {
    SchemaExtension::builder(ENTERPRISE_URI, "EnterpriseUser")
        .with_description("Enterprise User")
        .with_attribute(Attribute::string("employeeNumber").build().unwrap())
        .with_attribute(Attribute::string("costCenter").build().unwrap())
        .with_attribute(Attribute::string("organization").build().unwrap())
        .with_attribute(Attribute::string("department").build().unwrap())
        .with_attribute(
            Attribute::complex("manager")
                .with_sub_attribute(Attribute::string("value").build().unwrap())
                .with_sub_attribute(
                    Attribute::scim_reference("$ref", ["User"]).build().unwrap(),
                )
                .with_sub_attribute(
                    Attribute::string("displayName")
                        .with_mutability(Mutability::ReadOnly)
                        .build()
                        .unwrap(),
                )
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

pub fn user_schema() -> ResourceSchema {
    ResourceSchema::builder(USER_URI, "User", "/Users")
        .with_description("User Account")
        .with_attribute(
            Attribute::string("userName")
                .required()
                .with_uniqueness(Uniqueness::Server)
                .build()
                .unwrap(),
        )
        .with_attribute(
            Attribute::complex("name")
                .with_sub_attribute(Attribute::string("formatted").build().unwrap())
                .with_sub_attribute(Attribute::string("familyName").build().unwrap())
                .with_sub_attribute(Attribute::string("givenName").build().unwrap())
                .build()
                .unwrap(),
        )
        .with_attribute(Attribute::string("displayName").build().unwrap())
        .with_attribute(Attribute::string("nickName").build().unwrap())
        .with_attribute(Attribute::external_reference("profileUrl").build().unwrap())
        .with_attribute(
            Attribute::string("userType")
                .with_canonical_values(["Employee", "Contractor"], false)
                .build()
                .unwrap(),
        )
        .with_attribute(Attribute::boolean("active").build().unwrap())
        .with_attribute(
            Attribute::string("password")
                .with_mutability(Mutability::WriteOnly)
                .with_returned(Returned::Never)
                .build()
                .unwrap(),
        )
        .with_attribute(
            Attribute::complex("emails")
                .multi_valued()
                .with_sub_attribute(Attribute::string("value").build().unwrap())
                .with_sub_attribute(Attribute::string("display").build().unwrap())
                .with_sub_attribute(
                    Attribute::string("type")
                        .with_canonical_values(["work", "home", "other"], false)
                        .build()
                        .unwrap(),
                )
                .with_sub_attribute(Attribute::boolean("primary").build().unwrap())
                .build()
                .unwrap(),
        )
        .with_attribute(
            Attribute::complex("groups")
                .multi_valued()
                .with_mutability(Mutability::ReadOnly)
                .with_issuer(AttributeIssuer::ServiceProvider)
                .with_sub_attribute(Attribute::string("value").build().unwrap())
                .with_sub_attribute(
                    Attribute::scim_reference("$ref", ["User", "Group"]).build().unwrap(),
                )
                .with_sub_attribute(Attribute::string("display").build().unwrap())
                .build()
                .unwrap(),
        )
        .with_attribute(Attribute::binary("x509Certificates").multi_valued().build().unwrap())
        .with_extension(enterprise_extension(), false)
        .build()
        .unwrap()
}

pub fn group_schema() -> ResourceSchema {
    ResourceSchema::builder(GROUP_URI, "Group", "/Groups")
        .with_description("Group")
        .with_attribute(Attribute::string("displayName").required().build().unwrap())
        .with_attribute(
            Attribute::complex("members")
                .multi_valued()
                .with_sub_attribute(
                    Attribute::string("value")
                        .case_exact()
                        .with_mutability(Mutability::Immutable)
                        .build()
                        .unwrap(),
                )
                .with_sub_attribute(
                    Attribute::scim_reference("$ref", ["User", "Group"])
                        .with_mutability(Mutability::Immutable)
                        .build()
                        .unwrap(),
                )
                .with_sub_attribute(Attribute::string("displayName").build().unwrap())
                .with_sub_attribute(
                    Attribute::string("type")
                        .with_canonical_values(["User", "Group"], false)
                        .build()
                        .unwrap(),
                )
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

pub fn data(value: Value) -> ScimData {
    ScimData::try_from(value).unwrap()
}

/// The full user representation of RFC 7643 §8.2, trimmed to the fixture schema.
pub fn bjensen() -> Value {
    json!({
        "schemas": [USER_URI, ENTERPRISE_URI],
        "id": "2819c223-7f76-453a-919d-413861904646",
        "externalId": "701984",
        "userName": "bjensen@example.com",
        "name": {
            "formatted": "Ms. Barbara J Jensen, III",
            "familyName": "Jensen",
            "givenName": "Barbara"
        },
        "displayName": "Babs Jensen",
        "nickName": "Babs",
        "profileUrl": "https://login.example.com/bjensen",
        "userType": "Employee",
        "active": true,
        "emails": [
            {"value": "bjensen@example.com", "type": "work", "primary": true},
            {"value": "babs@jensen.org", "type": "home"}
        ],
        "groups": [
            {
                "value": "e9e30dba-f08f-4109-8486-d5c6a331660a",
                "$ref": "https://example.com/v2/Groups/e9e30dba-f08f-4109-8486-d5c6a331660a",
                "display": "Tour Guides"
            }
        ],
        ENTERPRISE_URI: {
            "employeeNumber": "701984",
            "costCenter": "4130",
            "organization": "Universal Studios",
            "department": "Tour Operations",
            "manager": {
                "value": "26118915-6090-4610-87e4-49d8ca9f808d",
                "$ref": "../Users/26118915-6090-4610-87e4-49d8ca9f808d",
                "displayName": "John Smith"
            }
        },
        "meta": {
            "resourceType": "User",
            "created": "2010-01-23T04:56:22Z",
            "lastModified": "2011-05-13T04:42:34Z",
            "version": "W/\"3694e05e9dff591\"",
            "location": "https://example.com/v2/Users/2819c223-7f76-453a-919d-413861904646"
        }
    })
}

/// A group as sent by a client when creating it.
pub fn tour_guides() -> Value {
    json!({
        "schemas": [GROUP_URI],
        "displayName": "Tour Guides",
        "members": [
            {
                "value": "2819c223-7f76-453a-919d-413861904646",
                "$ref": "https://example.com/v2/Users/2819c223-7f76-453a-919d-413861904646",
                "displayName": "Babs Jensen",
                "type": "User"
            },
            {
                "value": "902c246b-6245-4190-8e05-00816be7344a",
                "$ref": "https://example.com/v2/Users/902c246b-6245-4190-8e05-00816be7344a",
                "displayName": "Mandy Pepperidge",
                "type": "User"
            }
        ]
    })
}
