//! Property tests for the text forms and key handling that every other
//! component relies on.

use proptest::prelude::*;

use crate::common::init_logging;

use scim_core::data::{ScimData, ScimValue};
use scim_core::filter::{Filter, OperatorRegistry};
use scim_core::query::AttributeList;

fn attr_name_strategy() -> impl Strategy<Value = String> {
    // the leading `x` keeps generated names clear of operator and logical keywords
    "x[a-zA-Z0-9_]{0,8}"
}

fn attr_path_strategy() -> impl Strategy<Value = String> {
    (attr_name_strategy(), proptest::option::of(attr_name_strategy())).prop_map(|(attr, sub)| {
        match sub {
            Some(sub) => format!("{}.{}", attr, sub),
            None => attr,
        }
    })
}

fn string_literal_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 @.:-]{0,12}".prop_map(|text| format!("\"{}\"", text))
}

fn literal_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        string_literal_strategy(),
        (0i64..100_000).prop_map(|number| number.to_string()),
        Just("true".to_string()),
        Just("false".to_string()),
        Just("null".to_string()),
    ]
}

fn comparison_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (
            attr_path_strategy(),
            prop::sample::select(vec!["eq", "ne"]),
            literal_strategy(),
        )
            .prop_map(|(attr, op, literal)| format!("{} {} {}", attr, op, literal)),
        (
            attr_path_strategy(),
            prop::sample::select(vec!["co", "sw", "ew"]),
            string_literal_strategy(),
        )
            .prop_map(|(attr, op, literal)| format!("{} {} {}", attr, op, literal)),
        (
            attr_path_strategy(),
            prop::sample::select(vec!["gt", "ge", "lt", "le"]),
            prop_oneof![
                string_literal_strategy(),
                (0i64..100_000).prop_map(|number| number.to_string()),
            ],
        )
            .prop_map(|(attr, op, literal)| format!("{} {} {}", attr, op, literal)),
        attr_path_strategy().prop_map(|attr| format!("{} pr", attr)),
    ]
}

fn filter_strategy() -> impl Strategy<Value = String> {
    (
        comparison_strategy(),
        prop::collection::vec(
            (prop::sample::select(vec!["and", "or"]), comparison_strategy()),
            0..4,
        ),
    )
        .prop_map(|(first, rest)| {
            rest.into_iter().fold(first, |filter, (keyword, comparison)| {
                format!("{} {} {}", filter, keyword, comparison)
            })
        })
}

proptest! {
    #[test]
    fn test_canonical_filters_round_trip(input in filter_strategy()) {
        init_logging();
        let filter = Filter::parse(&input, OperatorRegistry::defaults());
        prop_assert!(filter.is_ok(), "'{}' rejected", input);
        prop_assert_eq!(filter.map(|filter| filter.to_string()).unwrap_or_default(), input);
    }

    #[test]
    fn test_negated_group_round_trips(input in filter_strategy()) {
        let negated = format!("not ({})", input);
        let filter = Filter::parse(&negated, OperatorRegistry::defaults());
        prop_assert!(filter.is_ok(), "'{}' rejected", negated);
        prop_assert_eq!(filter.map(|filter| filter.to_string()).unwrap_or_default(), negated);
    }
}

proptest! {
    #[test]
    fn test_data_keys_are_case_insensitive(key in "[a-zA-Z][a-zA-Z0-9]{0,15}", value in "[a-z]{0,10}") {
        let mut data = ScimData::new();
        data.insert_raw(key.to_uppercase(), ScimValue::from(value.as_str()));
        prop_assert_eq!(data.get_raw(&key.to_lowercase()), Some(&ScimValue::from(value.as_str())));

        data.insert_raw(key.clone(), ScimValue::from(true));
        prop_assert_eq!(data.len(), 1);
        prop_assert_eq!(data.keys().next(), Some(&key));
        prop_assert_eq!(data.get_raw(&key.to_uppercase()), Some(&ScimValue::from(true)));
    }

    #[test]
    fn test_attribute_lists_round_trip(attrs in prop::collection::vec(attr_path_strategy(), 1..6)) {
        let input = attrs.join(",");
        let parsed = AttributeList::parse(&input);
        prop_assert!(parsed.is_ok(), "'{}' rejected", input);
        let parsed = parsed.unwrap_or_else(|_| AttributeList::new(Vec::new()));
        prop_assert_eq!(parsed.len(), attrs.len());
        prop_assert_eq!(parsed.to_string(), input);
    }
}
