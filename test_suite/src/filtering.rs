#![cfg(test)]

use serde_json::json;
use sieve_query::filters::FilterDescriptor;
use sieve_query::forms::SlotKind;
use sieve_query::lookups::{Lookup, LookupOp};
use sieve_query::memory::MemoryQuery;
use sieve_query::values::FilterValue;

fn people() -> MemoryQuery {
    MemoryQuery::new(vec![
        json!({"name": "alice", "age": 34}),
        json!({"name": "bob", "age": 12}),
        json!({"name": "carol", "age": null}),
    ])
}

#[test]
fn empty_values_are_no_ops() {
    let q = people();
    let desc = FilterDescriptor::text("name");
    assert_eq!(desc.apply(q.clone(), &FilterValue::text("")).count(), 3);
    assert_eq!(
        desc.apply(q.clone(), &FilterValue::Many(Vec::new())).count(),
        3
    );
    assert_eq!(
        desc.apply(
            q,
            &FilterValue::WithLookup(
                Lookup::new(LookupOp::Contains),
                Box::new(FilterValue::text("")),
            ),
        )
        .count(),
        3
    );
}

#[test]
fn default_lookup_is_exact() {
    let q = people();
    let desc = FilterDescriptor::text("name");
    let q = desc.apply(q, &FilterValue::text("alice"));
    assert_eq!(q.to_vec(), vec![json!({"name": "alice", "age": 34})]);
}

#[test]
fn fixed_lookup_applies_unconditionally() {
    let q = people();
    let desc = FilterDescriptor::number("age").lookup(LookupOp::Gt);
    let q = desc.apply(q, &FilterValue::Number(18.0));
    // The null-aged row is not greater than anything.
    assert_eq!(q.to_vec(), vec![json!({"name": "alice", "age": 34})]);
}

#[test]
fn negated_lookups_accept_the_complement() {
    let desc = FilterDescriptor::text("name").all_lookups();
    for op in [
        LookupOp::Exact,
        LookupOp::Contains,
        LookupOp::StartsWith,
        LookupOp::IContains,
    ] {
        let positive = desc.apply(
            people(),
            &FilterValue::WithLookup(Lookup::new(op), Box::new(FilterValue::text("a"))),
        );
        let negative = desc.apply(
            people(),
            &FilterValue::WithLookup(Lookup::negated(op), Box::new(FilterValue::text("a"))),
        );
        let included = positive.to_vec();
        let excluded = negative.to_vec();
        assert_eq!(included.len() + excluded.len(), 3, "op {:?}", op);
        for row in included {
            assert!(!excluded.contains(&row), "op {:?}", op);
        }
    }
}

#[test]
fn empty_operator_choice_means_exact() {
    let desc = FilterDescriptor::text("name").all_lookups();
    let explicit = desc.apply(
        people(),
        &FilterValue::WithLookup(
            Lookup::new(LookupOp::Exact),
            Box::new(FilterValue::text("bob")),
        ),
    );
    let fallback = desc.apply(
        people(),
        &FilterValue::WithLookup(
            Lookup::parse_or_exact(""),
            Box::new(FilterValue::text("bob")),
        ),
    );
    assert_eq!(explicit.to_vec(), fallback.to_vec());
}

#[test]
fn many_values_match_as_a_set() {
    let desc = FilterDescriptor::many("name", SlotKind::Text);
    let q = desc.apply(
        people(),
        &FilterValue::Many(vec![FilterValue::text("alice"), FilterValue::text("bob")]),
    );
    assert_eq!(q.count(), 2);
}

#[test]
fn range_values_match_between_bounds() {
    let desc = FilterDescriptor::range("age", SlotKind::Number);
    let q = desc.apply(
        people(),
        &FilterValue::Range(
            Box::new(FilterValue::Number(10.0)),
            Box::new(FilterValue::Number(20.0)),
        ),
    );
    assert_eq!(q.to_vec(), vec![json!({"name": "bob", "age": 12})]);
}

#[test]
fn isnull_lookup() {
    let desc = FilterDescriptor::number("age").lookup(LookupOp::IsNull);
    let q = desc.apply(people(), &FilterValue::Bool(true));
    assert_eq!(q.to_vec(), vec![json!({"name": "carol", "age": null})]);
    let q = desc.apply(people(), &FilterValue::Bool(false));
    assert_eq!(q.count(), 2);
}

#[test]
fn relation_filters_target_the_resolved_path() {
    let articles = MemoryQuery::new(vec![
        json!({"title": "intro", "author": {"name": "alice"}}),
        json!({"title": "advanced", "author": {"name": "bob"}}),
    ]);
    let desc = FilterDescriptor::related("author_name", "author__name");
    let q = desc.apply(articles, &FilterValue::text("alice"));
    assert_eq!(
        q.to_vec(),
        vec![json!({"title": "intro", "author": {"name": "alice"}})]
    );
}

#[test]
fn collection_fields_match_any_element() {
    let articles = MemoryQuery::new(vec![
        json!({"title": "intro", "tags": ["rust", "query"]}),
        json!({"title": "advanced", "tags": ["python"]}),
        json!({"title": "empty", "tags": []}),
    ]);
    let desc = FilterDescriptor::text("tags");
    let q = desc.apply(articles, &FilterValue::text("rust"));
    assert_eq!(q.count(), 1);
}
