#![cfg(test)]

use serde_json::json;
use sieve_query::lookups::LookupOp;
use sieve_query::memory::MemoryQuery;
use sieve_query::query::{Predicate, Queryset, UNORDERED};
use sieve_query::values::FilterValue;

fn people() -> MemoryQuery {
    MemoryQuery::new(vec![
        json!({"name": "alice", "age": 34}),
        json!({"name": "bob", "age": 12}),
        json!({"name": "carol", "age": null}),
    ])
}

fn age_gt(n: f64) -> Predicate {
    Predicate::new("age", LookupOp::Gt, FilterValue::Number(n))
}

#[test]
fn queries_are_lazy_and_persistent() {
    let q = people();
    let filtered = q.filter(&age_gt(18.0));
    assert_eq!(filtered.count(), 1);
    // The receiver is never mutated.
    assert_eq!(q.count(), 3);
}

#[test]
fn exclude_is_the_complement_including_nulls() {
    let q = people();
    let excluded = q.exclude(&age_gt(18.0));
    // bob and the null-aged carol both fail `age > 18`.
    assert_eq!(excluded.count(), 2);
}

#[test]
fn union_concatenates_and_distinct_collapses() {
    let q = people();
    let a = q.filter(&age_gt(10.0));
    let b = q.filter(&age_gt(20.0));
    let union = q.none().union(&a).union(&b);
    assert_eq!(union.count(), 3); // alice, bob, alice
    assert_eq!(union.distinct().count(), 2);
}

#[test]
fn order_by_sorts_and_reverses() {
    let q = people().filter(&Predicate::new(
        "age",
        LookupOp::IsNull,
        FilterValue::Bool(false),
    ));
    let names: Vec<_> = q
        .order_by("age")
        .to_vec()
        .iter()
        .map(|r| r["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("bob"), json!("alice")]);
    let names: Vec<_> = q
        .order_by("-age")
        .to_vec()
        .iter()
        .map(|r| r["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("alice"), json!("bob")]);
}

#[test]
fn null_cells_order_first() {
    let names: Vec<_> = people()
        .order_by("age")
        .to_vec()
        .iter()
        .map(|r| r["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("carol"), json!("bob"), json!("alice")]);
}

#[test]
fn unspecified_order_keeps_contents() {
    let q = people().order_by(UNORDERED);
    assert_eq!(q.count(), 3);
}

#[test]
fn regex_lookups() {
    let q = people();
    let pred = Predicate::new("name", LookupOp::Regex, FilterValue::text("^[ab]"));
    assert_eq!(q.filter(&pred).count(), 2);
    let pred = Predicate::new("name", LookupOp::IRegex, FilterValue::text("^ALICE$"));
    assert_eq!(q.filter(&pred).count(), 1);
    // An invalid pattern matches nothing rather than erroring.
    let pred = Predicate::new("name", LookupOp::Regex, FilterValue::text("("));
    assert_eq!(q.filter(&pred).count(), 0);
}

#[test]
fn string_lookups_use_the_display_form_of_cells() {
    let q = people();
    let pred = Predicate::new("age", LookupOp::StartsWith, FilterValue::text("3"));
    assert_eq!(q.filter(&pred).count(), 1);
}

#[test]
fn nested_paths_and_missing_keys() {
    let q = MemoryQuery::new(vec![
        json!({"author": {"name": "alice"}}),
        json!({"author": null}),
        json!({}),
    ]);
    let pred = Predicate::new("author__name", LookupOp::Exact, FilterValue::text("alice"));
    assert_eq!(q.filter(&pred).count(), 1);
    let pred = Predicate::new("author__name", LookupOp::IsNull, FilterValue::Bool(true));
    assert_eq!(q.filter(&pred).count(), 2);
}
