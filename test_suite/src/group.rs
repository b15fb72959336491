#![cfg(test)]

use std::sync::Arc;

use serde_json::json;
use sieve_query::filters::FilterDescriptor;
use sieve_query::filterset::{ConfigError, FilterSetBuilder, FilterSetDef};
use sieve_query::forms::QueryMap;
use sieve_query::group::{FilterSetGroup, GROUP_COUNT_KEY};
use sieve_query::lookups::{Lookup, LookupOp};
use sieve_query::memory::MemoryQuery;
use sieve_query::schema::{FieldDef, FieldKind, ModelSchema, Schema};

fn person_schema() -> Schema {
    let mut schema = Schema::new();
    schema.add_model(ModelSchema::new(
        "person",
        vec![
            FieldDef::new("name", FieldKind::Text),
            FieldDef::new("age", FieldKind::Integer),
        ],
    ));
    schema
}

fn person_def() -> Arc<FilterSetDef> {
    Arc::new(
        FilterSetBuilder::for_model("person")
            .declare(FilterDescriptor::number("age").lookups(vec![
                Lookup::new(LookupOp::Exact),
                Lookup::new(LookupOp::Gt),
                Lookup::new(LookupOp::Lt),
            ]))
            .build(&person_schema())
            .unwrap(),
    )
}

fn people() -> MemoryQuery {
    MemoryQuery::new(vec![
        json!({"name": "alice", "age": 34}),
        json!({"name": "bob", "age": 12}),
        json!({"name": "carol", "age": 5}),
    ])
}

#[test]
fn empty_input_builds_one_unbound_row() {
    let def = person_def();
    let group = FilterSetGroup::new(&def, QueryMap::new(), people()).unwrap();
    assert_eq!(group.row_count(), 1);
    assert!(!group.rows()[0].is_bound());
    assert_eq!(group.qs().count(), 3);
}

#[test_log::test]
fn disjoint_rows_union_to_the_logical_or() {
    let def = person_def();
    let data = QueryMap::from_pairs([
        (GROUP_COUNT_KEY, "2"),
        ("1-age_0", "gt"),
        ("1-age_1", "30"),
        ("2-age_0", "lt"),
        ("2-age_1", "10"),
    ]);
    let group = FilterSetGroup::new(&def, data, people()).unwrap();
    assert_eq!(group.row_count(), 2);
    let rows = group.qs().to_vec();
    assert_eq!(rows.len(), 2);
    assert!(rows.contains(&json!({"name": "alice", "age": 34})));
    assert!(rows.contains(&json!({"name": "carol", "age": 5})));
}

#[test]
fn overlapping_rows_collapse_to_one_appearance() {
    let def = person_def();
    let data = QueryMap::from_pairs([
        (GROUP_COUNT_KEY, "2"),
        ("1-age_0", "gt"),
        ("1-age_1", "10"),
        ("2-age_0", "gt"),
        ("2-age_1", "20"),
    ]);
    let group = FilterSetGroup::new(&def, data, people()).unwrap();
    // alice matches both rows; the distinct pass keeps her once.
    assert_eq!(group.base_qs().count(), 3);
    assert_eq!(group.qs().count(), 2);
}

#[test]
fn shared_ordering_applies_across_the_union() {
    let def = person_def();
    let data = QueryMap::from_pairs([
        (GROUP_COUNT_KEY, "2"),
        ("1-age_0", "gt"),
        ("1-age_1", "30"),
        ("2-age_0", "lt"),
        ("2-age_1", "10"),
        ("o", "age"),
    ]);
    let group = FilterSetGroup::new(&def, data, people()).unwrap();
    let ages: Vec<_> = group
        .qs()
        .to_vec()
        .iter()
        .map(|r| r["age"].clone())
        .collect();
    assert_eq!(ages, vec![json!(5), json!(34)]);
}

#[test]
fn descending_marker_reverses_the_shared_ordering() {
    let def = person_def();
    let data = QueryMap::from_pairs([
        (GROUP_COUNT_KEY, "2"),
        ("1-age_0", "gt"),
        ("1-age_1", "30"),
        ("2-age_0", "lt"),
        ("2-age_1", "10"),
        ("o", "age"),
        ("sort_direction", "-"),
    ]);
    let group = FilterSetGroup::new(&def, data, people()).unwrap();
    let ages: Vec<_> = group
        .qs()
        .to_vec()
        .iter()
        .map(|r| r["age"].clone())
        .collect();
    assert_eq!(ages, vec![json!(34), json!(5)]);
}

#[test]
fn any_other_direction_value_means_ascending() {
    let def = person_def();
    let data = QueryMap::from_pairs([
        (GROUP_COUNT_KEY, "1"),
        ("1-age_0", "gt"),
        ("1-age_1", "0"),
        ("o", "age"),
        ("sort_direction", "x"),
    ]);
    let group = FilterSetGroup::new(&def, data, people()).unwrap();
    let ages: Vec<_> = group
        .qs()
        .to_vec()
        .iter()
        .map(|r| r["age"].clone())
        .collect();
    assert_eq!(ages, vec![json!(5), json!(12), json!(34)]);
}

#[test]
fn unknown_ordering_fields_never_raise() {
    let def = person_def();
    let data = QueryMap::from_pairs([
        (GROUP_COUNT_KEY, "1"),
        ("1-name", "alice"),
        ("o", "shoe_size"),
    ]);
    let group = FilterSetGroup::new(&def, data, people()).unwrap();
    // Contents are unchanged, only the order is unspecified.
    assert_eq!(group.qs().count(), 1);
}

#[test]
fn missing_row_count_is_fatal_when_input_is_present() {
    let def = person_def();
    let data = QueryMap::from_pairs([("1-name", "alice")]);
    let err = FilterSetGroup::new(&def, data, people()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingRowCount));

    let data = QueryMap::from_pairs([(GROUP_COUNT_KEY, "soon"), ("1-name", "alice")]);
    let err = FilterSetGroup::new(&def, data, people()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingRowCount));
}

#[test]
fn rows_share_input_but_read_their_own_prefix() {
    let def = person_def();
    let data = QueryMap::from_pairs([
        (GROUP_COUNT_KEY, "2"),
        ("1-name", "alice"),
        ("2-name", "bob"),
    ]);
    let group = FilterSetGroup::new(&def, data, people()).unwrap();
    assert_eq!(group.rows()[0].qs().count(), 1);
    assert_eq!(group.rows()[1].qs().count(), 1);
    assert_eq!(group.qs().count(), 2);
}

#[test]
fn group_exposes_field_names_and_forms() {
    let def = person_def();
    let group = FilterSetGroup::new(&def, QueryMap::new(), people()).unwrap();
    assert_eq!(
        group.field_names(),
        vec!["name".to_string(), "age".to_string()]
    );
    assert_eq!(group.forms().count(), 1);
}
