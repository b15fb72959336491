#![cfg(test)]

use std::sync::Arc;

use serde_json::json;
use sieve_query::filters::{FilterDescriptor, LookupSpec};
use sieve_query::filterset::{ConfigError, FilterSet, FilterSetBuilder, FilterSetDef, OrderBy};
use sieve_query::forms::QueryMap;
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

fn people() -> MemoryQuery {
    MemoryQuery::new(vec![
        json!({"name": "alice", "age": 34}),
        json!({"name": "bob", "age": 12}),
        json!({"name": "carol", "age": 30}),
    ])
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

#[test_log::test]
fn composes_validated_predicates() {
    let def = person_def();
    let data = QueryMap::from_pairs([("name", "alice"), ("age_0", "gt"), ("age_1", "30")]);
    let fs = FilterSet::bound(&def,data, people());
    assert!(fs.is_bound());
    assert_eq!(fs.qs().to_vec(), vec![json!({"name": "alice", "age": 34})]);
}

#[test]
fn empty_fields_are_no_ops_and_empty_lookup_means_exact() {
    let def = person_def();
    let data = QueryMap::from_pairs([("name", ""), ("age_0", ""), ("age_1", "30")]);
    let fs = FilterSet::bound(&def,data, people());
    assert_eq!(fs.qs().to_vec(), vec![json!({"name": "carol", "age": 30})]);
}

#[test_log::test]
fn invalid_input_skips_only_that_filter() {
    let def = person_def();
    let data = QueryMap::from_pairs([("name", "alice"), ("age_0", "gt"), ("age_1", "abc")]);
    let fs = FilterSet::bound(&def,data, people());
    // The age filter is dropped, the name filter still applies.
    assert_eq!(fs.qs().to_vec(), vec![json!({"name": "alice", "age": 34})]);
}

#[test]
fn unknown_operator_ids_fall_back_to_exact() {
    let def = person_def();
    let data = QueryMap::from_pairs([("age_0", "bogus"), ("age_1", "12")]);
    let fs = FilterSet::bound(&def,data, people());
    assert_eq!(fs.qs().to_vec(), vec![json!({"name": "bob", "age": 12})]);
}

#[test]
fn unbound_sets_return_the_base_query() {
    let def = person_def();
    let fs = FilterSet::unbound(&def,people());
    assert!(!fs.is_bound());
    assert_eq!(fs.qs().count(), 3);
}

#[test]
fn results_are_memoized() {
    let def = person_def();
    let fs = FilterSet::bound(&def,QueryMap::from_pairs([("name", "alice")]), people());
    let first: *const MemoryQuery = fs.qs();
    let second: *const MemoryQuery = fs.qs();
    assert!(std::ptr::eq(first, second));
    let first_form = fs.form() as *const _;
    let second_form = fs.form() as *const _;
    assert!(std::ptr::eq(first_form, second_form));
}

#[test]
fn prefixed_instances_read_prefixed_keys() {
    let def = person_def();
    let data = QueryMap::from_pairs([("1-name", "alice"), ("name", "bob")]);
    let fs = FilterSet::bound_prefixed(&def,data, people(), "1");
    assert_eq!(fs.qs().to_vec(), vec![json!({"name": "alice", "age": 34})]);
}

#[test]
fn schema_fields_come_first_and_declarations_override_in_place() {
    let def = person_def();
    let names: Vec<&str> = def.descriptors().iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["name", "age"]);
    let age = &def.descriptors()[1];
    assert!(matches!(age.lookup_spec(), LookupSpec::Choice(ls) if ls.len() == 3));
}

#[test]
fn declaration_order_is_call_order() {
    let def = FilterSetBuilder::new()
        .declare(FilterDescriptor::text("b"))
        .declare(FilterDescriptor::text("a"))
        .build(&Schema::new())
        .unwrap();
    let names: Vec<&str> = def.descriptors().iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["b", "a"]);
}

#[test]
fn allow_list_restricts_and_verifies() {
    let schema = person_schema();
    let def = FilterSetBuilder::for_model("person")
        .fields(["name"])
        .build(&schema)
        .unwrap();
    assert_eq!(def.field_names(), vec!["name".to_string()]);

    let err = FilterSetBuilder::for_model("person")
        .fields(["name", "missing_field"])
        .build(&schema)
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownField { field, .. } if field == "missing_field"));
}

#[test]
fn deny_list_drops_fields() {
    let def = FilterSetBuilder::for_model("person")
        .exclude(["age"])
        .build(&person_schema())
        .unwrap();
    assert_eq!(def.field_names(), vec!["name".to_string()]);
}

#[test]
fn unknown_model_fails_the_build() {
    let err = FilterSetBuilder::for_model("nope")
        .build(&person_schema())
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownModel(m) if m == "nope"));
}

#[test]
fn child_definitions_inherit_parent_declarations() {
    let schema = person_schema();
    let parent = FilterSetBuilder::new()
        .declare(FilterDescriptor::text("name").label("Parent name"))
        .declare(FilterDescriptor::text("nickname"))
        .build(&Schema::new())
        .unwrap();

    let child = FilterSetBuilder::for_model("person")
        .inherit(&parent)
        .declare(FilterDescriptor::text("name").label("Child name"))
        .build(&schema)
        .unwrap();

    let name = child
        .descriptors()
        .iter()
        .find(|d| d.name() == "name")
        .unwrap();
    assert_eq!(name.label_text(), "Child name");
    // The parent-only declaration came along too.
    assert!(child.descriptors().iter().any(|d| d.name() == "nickname"));
}

#[test]
fn ordering_slot_orders_the_result() {
    let def = Arc::new(
        FilterSetBuilder::for_model("person")
            .order_by(OrderBy::AllFields)
            .build(&person_schema())
            .unwrap(),
    );
    let fs = FilterSet::bound(&def,QueryMap::from_pairs([("o", "age")]), people());
    let ages: Vec<_> = fs.qs().to_vec().iter().map(|r| r["age"].clone()).collect();
    assert_eq!(ages, vec![json!(12), json!(30), json!(34)]);
}

#[test]
fn unknown_ordering_field_leaves_the_result_unordered() {
    let def = Arc::new(
        FilterSetBuilder::for_model("person")
            .order_by(OrderBy::Fields(vec!["age".to_string()]))
            .build(&person_schema())
            .unwrap(),
    );
    let fs = FilterSet::bound(&def,QueryMap::from_pairs([("o", "bogus")]), people());
    assert_eq!(fs.qs().count(), 3);
}

#[test]
fn relation_declarations_resolve_a_delegate() {
    let mut schema = Schema::new();
    schema.add_model(ModelSchema::new(
        "author",
        vec![FieldDef::new("name", FieldKind::Text)],
    ));
    schema.add_model(ModelSchema::new(
        "article",
        vec![
            FieldDef::new("title", FieldKind::Text),
            FieldDef::new("author", FieldKind::ForeignKey("author".into())),
        ],
    ));
    let def = Arc::new(
        FilterSetBuilder::for_model("article")
            .fields(["title"])
            .declare(
                FilterDescriptor::related("author_name", "author__name").lookups(vec![
                    Lookup::new(LookupOp::Exact),
                    Lookup::new(LookupOp::IContains),
                ]),
            )
            .build(&schema)
            .unwrap(),
    );
    let desc = def
        .descriptors()
        .iter()
        .find(|d| d.name() == "author_name")
        .unwrap();
    let delegate = desc.delegate().unwrap();
    assert_eq!(delegate.lookup_spec(), desc.lookup_spec());

    let articles = MemoryQuery::new(vec![
        json!({"title": "intro", "author": {"name": "Alice"}}),
        json!({"title": "advanced", "author": {"name": "Bob"}}),
    ]);
    let data = QueryMap::from_pairs([("author_name_0", "icontains"), ("author_name_1", "ALICE")]);
    let fs = FilterSet::bound(&def,data, articles);
    assert_eq!(fs.qs().count(), 1);
}

#[test]
fn unresolvable_relation_targets_fail_the_build() {
    let err = FilterSetBuilder::for_model("person")
        .declare(FilterDescriptor::related("broken", "friend__name"))
        .build(&person_schema())
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnresolvedTarget { .. }));
}

#[test]
fn enumerated_choices_become_choice_filters() {
    let mut schema = Schema::new();
    schema.add_model(ModelSchema::new(
        "ticket",
        vec![FieldDef::new("status", FieldKind::Text)
            .with_choices([("new", "New"), ("done", "Done")])],
    ));
    let def = Arc::new(FilterSetBuilder::for_model("ticket").build(&schema).unwrap());
    let rows = MemoryQuery::new(vec![json!({"status": "new"}), json!({"status": "done"})]);
    let fs = FilterSet::bound(&def, QueryMap::from_pairs([("status", "done")]), rows.clone());
    assert_eq!(fs.qs().count(), 1);
    // A value outside the declared choices is rejected upstream, so
    // the filter is skipped.
    let fs = FilterSet::bound(&def, QueryMap::from_pairs([("status", "old")]), rows);
    assert_eq!(fs.qs().count(), 2);
}

#[test]
fn to_many_relations_filter_as_sets() {
    let mut schema = Schema::new();
    schema.add_model(ModelSchema::new(
        "article",
        vec![
            FieldDef::new("title", FieldKind::Text),
            FieldDef::new("tags", FieldKind::ManyToMany("tag".into())),
        ],
    ));
    schema.add_model(ModelSchema::new(
        "tag",
        vec![FieldDef::new("word", FieldKind::Text)],
    ));
    let def = Arc::new(FilterSetBuilder::for_model("article").build(&schema).unwrap());
    let rows = MemoryQuery::new(vec![
        json!({"title": "a", "tags": ["rust", "query"]}),
        json!({"title": "b", "tags": ["python"]}),
        json!({"title": "c", "tags": []}),
    ]);
    let mut data = QueryMap::new();
    data.insert("tags", "rust");
    data.insert("tags", "python");
    let fs = FilterSet::bound(&def, data, rows);
    assert_eq!(fs.qs().count(), 2);
}

#[test]
fn required_filters_without_input_are_skipped() {
    let def = Arc::new(
        FilterSetBuilder::for_model("person")
            .declare(FilterDescriptor::text("name").required(true))
            .build(&person_schema())
            .unwrap(),
    );
    let fs = FilterSet::bound(&def,QueryMap::from_pairs([("age_1", "")]), people());
    // The required violation is recovered, not surfaced.
    assert_eq!(fs.qs().count(), 3);
}
