#![cfg(test)]

use std::sync::Arc;

use serde_json::{json, Value};
use sieve_query::dynamic::{DynamicFilterSet, SELECT_FIELD_KEY};
use sieve_query::filters::FilterDescriptor;
use sieve_query::filterset::{FilterSetBuilder, FilterSetDef};
use sieve_query::forms::{QueryMap, SlotKind};
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
            FieldDef::new("email", FieldKind::Email),
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
        json!({"name": "alice", "age": 34, "email": "alice@example.com"}),
        json!({"name": "bob", "age": 12, "email": "bob@example.com"}),
    ])
}

#[test]
fn active_fields_follow_the_submitted_keys() {
    let def = person_def();
    let data = QueryMap::from_pairs([
        ("1-age_0", "gt"),
        ("1-age_1", "30"),
        ("1-name", "alice"),
        ("2-email", "ignored@example.com"),
        ("o", "age"),
    ]);
    let fs = DynamicFilterSet::bind_prefixed(&def, data, people(), "1");
    // Descriptor order, prefix and part suffixes stripped, other
    // prefixes ignored.
    assert_eq!(fs.active_fields(), &["name".to_string(), "age".to_string()]);
}

#[test]
fn unbound_sets_have_no_active_fields() {
    let def = person_def();
    let fs = DynamicFilterSet::unbound_prefixed(&def, people(), "1");
    assert!(fs.active_fields().is_empty());
}

#[test]
fn field_options_cover_every_descriptor() {
    let def = person_def();
    let fs = DynamicFilterSet::unbound_prefixed(&def, people(), "1");
    let options = fs.field_options();
    let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["name", "age", "email"]);
    assert_eq!(options[0].label, "Name");
    assert_eq!(options[0].widget, "TextInput");
    assert_eq!(options[0].filter, "TextFilter");
    assert_eq!(options[1].filter, "NumberFilter");
}

#[test]
fn options_json_is_keyed_by_field_name() {
    let def = person_def();
    let fs = DynamicFilterSet::unbound_prefixed(&def, people(), "1");
    let parsed: Value = serde_json::from_str(&fs.options_json()).unwrap();
    assert_eq!(parsed["name"]["label"], json!("Name"));
    assert_eq!(parsed["name"]["widget"], json!("TextInput"));
    assert_eq!(parsed["age"]["filter"], json!("NumberFilter"));
}

#[test]
fn dynamic_form_holds_the_picker_plus_active_slots() {
    let def = person_def();
    let data = QueryMap::from_pairs([("1-age_0", "gt"), ("1-age_1", "30")]);
    let fs = DynamicFilterSet::bind_prefixed(&def, data, people(), "1");
    let form = fs.dynamic_form();
    let names: Vec<&str> = form.slots().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec![SELECT_FIELD_KEY, "age"]);
    // The picker offers every field, empty option first.
    match &form.slot(SELECT_FIELD_KEY).unwrap().kind {
        SlotKind::Choice(choices) => {
            assert_eq!(choices[0], (String::new(), "--------".to_string()));
            assert_eq!(choices.len(), 4);
        }
        other => panic!("unexpected picker kind: {:?}", other),
    }
}

#[test]
fn unbound_dynamic_form_is_just_the_picker() {
    let def = person_def();
    let fs = DynamicFilterSet::unbound_prefixed(&def, people(), "1");
    let names: Vec<&str> = fs
        .dynamic_form()
        .slots()
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec![SELECT_FIELD_KEY]);
}

#[test]
fn query_composition_still_runs_over_the_full_set() {
    let def = person_def();
    let data = QueryMap::from_pairs([("1-name", "alice")]);
    let fs = DynamicFilterSet::bind_prefixed(&def, data, people(), "1");
    assert_eq!(fs.active_fields(), &["name".to_string()]);
    // Fields outside the active subset are no-ops by absence, so the
    // result is the same as the full set's.
    assert_eq!(fs.qs().count(), 1);
}
