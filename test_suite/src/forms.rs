#![cfg(test)]

use sieve_query::forms::{Form, QueryMap, Slot, SlotKind, ValidationError};
use sieve_query::lookups::{Lookup, LookupOp};
use sieve_query::values::FilterValue;

fn choices(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(v, l)| (v.to_string(), l.to_string()))
        .collect()
}

#[test]
fn text_slot() {
    let mut form = Form::new(None);
    form.register_slot(Slot::new("name", SlotKind::Text));
    let data = QueryMap::from_pairs([("name", "alice")]);
    assert_eq!(
        form.clean("name", &data).unwrap(),
        Some(FilterValue::text("alice"))
    );
    // Empty and absent input both clean to nothing.
    let data = QueryMap::from_pairs([("name", "")]);
    assert_eq!(form.clean("name", &data).unwrap(), None);
    assert_eq!(form.clean("name", &QueryMap::new()).unwrap(), None);
}

#[test]
fn prefixed_keys() {
    let mut form = Form::new(Some("2".to_string()));
    form.register_slot(Slot::new("name", SlotKind::Text));
    assert_eq!(form.key_for("name"), "2-name");
    let data = QueryMap::from_pairs([("2-name", "bob"), ("name", "alice")]);
    assert_eq!(
        form.clean("name", &data).unwrap(),
        Some(FilterValue::text("bob"))
    );
}

#[test]
fn number_slot() {
    let mut form = Form::new(None);
    form.register_slot(Slot::new("age", SlotKind::Number));
    let data = QueryMap::from_pairs([("age", "30")]);
    assert_eq!(
        form.clean("age", &data).unwrap(),
        Some(FilterValue::Number(30.0))
    );
    let data = QueryMap::from_pairs([("age", "abc")]);
    assert!(matches!(
        form.clean("age", &data),
        Err(ValidationError::Invalid { .. })
    ));
}

#[test]
fn boolean_slot() {
    let mut form = Form::new(None);
    form.register_slot(Slot::new("active", SlotKind::Boolean));
    for (raw, expected) in [("true", true), ("1", true), ("FALSE", false), ("0", false)] {
        let data = QueryMap::from_pairs([("active", raw)]);
        assert_eq!(
            form.clean("active", &data).unwrap(),
            Some(FilterValue::Bool(expected))
        );
    }
    let data = QueryMap::from_pairs([("active", "maybe")]);
    assert!(form.clean("active", &data).is_err());
}

#[test]
fn date_slot() {
    let mut form = Form::new(None);
    form.register_slot(Slot::new("born", SlotKind::Date));
    let data = QueryMap::from_pairs([("born", "1990-05-17")]);
    assert!(matches!(
        form.clean("born", &data).unwrap(),
        Some(FilterValue::Date(_))
    ));
    let data = QueryMap::from_pairs([("born", "17/05/1990")]);
    assert!(form.clean("born", &data).is_err());
}

#[test]
fn choice_slot_rejects_unknown_values() {
    let mut form = Form::new(None);
    form.register_slot(Slot::new(
        "status",
        SlotKind::Choice(choices(&[("new", "New"), ("done", "Done")])),
    ));
    let data = QueryMap::from_pairs([("status", "new")]);
    assert_eq!(
        form.clean("status", &data).unwrap(),
        Some(FilterValue::text("new"))
    );
    let data = QueryMap::from_pairs([("status", "old")]);
    assert!(matches!(
        form.clean("status", &data),
        Err(ValidationError::UnknownChoice(_, _))
    ));
}

#[test]
fn multi_choice_slot() {
    let mut form = Form::new(None);
    form.register_slot(Slot::new(
        "status",
        SlotKind::MultiChoice(choices(&[("new", "New"), ("done", "Done")])),
    ));
    let mut data = QueryMap::new();
    data.insert("status", "new");
    data.insert("status", "done");
    assert_eq!(
        form.clean("status", &data).unwrap(),
        Some(FilterValue::Many(vec![
            FilterValue::text("new"),
            FilterValue::text("done"),
        ]))
    );
    let mut data = QueryMap::new();
    data.insert("status", "new");
    data.insert("status", "old");
    assert!(form.clean("status", &data).is_err());
}

#[test]
fn many_slot_cleans_each_value() {
    let mut form = Form::new(None);
    form.register_slot(Slot::new("id", SlotKind::Many(Box::new(SlotKind::Number))));
    let mut data = QueryMap::new();
    data.insert("id", "3");
    data.insert("id", "4");
    assert_eq!(
        form.clean("id", &data).unwrap(),
        Some(FilterValue::Many(vec![
            FilterValue::Number(3.0),
            FilterValue::Number(4.0),
        ]))
    );
}

#[test]
fn range_slot_requires_both_bounds() {
    let mut form = Form::new(None);
    form.register_slot(Slot::new("age", SlotKind::Range(Box::new(SlotKind::Number))));
    let data = QueryMap::from_pairs([("age_0", "10"), ("age_1", "20")]);
    assert_eq!(
        form.clean("age", &data).unwrap(),
        Some(FilterValue::Range(
            Box::new(FilterValue::Number(10.0)),
            Box::new(FilterValue::Number(20.0)),
        ))
    );
    // A partially-empty range is a no-op, not an error.
    let data = QueryMap::from_pairs([("age_0", "10")]);
    assert_eq!(form.clean("age", &data).unwrap(), None);
    let data = QueryMap::from_pairs([("age_0", "10"), ("age_1", "")]);
    assert_eq!(form.clean("age", &data).unwrap(), None);
}

#[test]
fn lookup_choice_slot() {
    let mut form = Form::new(None);
    form.register_slot(Slot::new(
        "age",
        SlotKind::LookupChoice {
            value: Box::new(SlotKind::Number),
            lookups: vec![
                Lookup::new(LookupOp::Exact),
                Lookup::new(LookupOp::Gt),
                Lookup::negated(LookupOp::Exact),
            ],
        },
    ));
    let data = QueryMap::from_pairs([("age_0", "gt"), ("age_1", "30")]);
    assert_eq!(
        form.clean("age", &data).unwrap(),
        Some(FilterValue::WithLookup(
            Lookup::new(LookupOp::Gt),
            Box::new(FilterValue::Number(30.0)),
        ))
    );
}

#[test]
fn lookup_choice_falls_back_to_exact() {
    let exact = |form: &Form, data: &QueryMap| match form.clean("age", data).unwrap() {
        Some(FilterValue::WithLookup(lookup, _)) => lookup,
        other => panic!("unexpected clean result: {:?}", other),
    };
    let mut form = Form::new(None);
    form.register_slot(Slot::new(
        "age",
        SlotKind::LookupChoice {
            value: Box::new(SlotKind::Number),
            lookups: vec![Lookup::new(LookupOp::Exact), Lookup::new(LookupOp::Gt)],
        },
    ));
    // Empty operator id.
    let data = QueryMap::from_pairs([("age_0", ""), ("age_1", "30")]);
    assert_eq!(exact(&form, &data), Lookup::new(LookupOp::Exact));
    // Operator id outside the vocabulary.
    let data = QueryMap::from_pairs([("age_0", "bogus"), ("age_1", "30")]);
    assert_eq!(exact(&form, &data), Lookup::new(LookupOp::Exact));
    // Known operator that this slot does not offer.
    let data = QueryMap::from_pairs([("age_0", "lt"), ("age_1", "30")]);
    assert_eq!(exact(&form, &data), Lookup::new(LookupOp::Exact));
    // No value at all: no lookup either.
    let data = QueryMap::from_pairs([("age_0", "gt")]);
    assert_eq!(form.clean("age", &data).unwrap(), None);
}

#[test]
fn required_slot() {
    let mut form = Form::new(None);
    form.register_slot(Slot::new("name", SlotKind::Text).required(true));
    assert!(matches!(
        form.clean("name", &QueryMap::new()),
        Err(ValidationError::Required(_))
    ));
}

#[test]
fn unknown_slot_cleans_to_nothing() {
    let form = Form::new(None);
    let data = QueryMap::from_pairs([("name", "alice")]);
    assert_eq!(form.clean("name", &data).unwrap(), None);
}

#[test]
fn query_map_accumulates_repeated_keys() {
    let mut data = QueryMap::new();
    data.insert("tag", "a");
    data.insert("tag", "b");
    assert_eq!(data.get("tag"), Some("a"));
    assert_eq!(data.get_all("tag"), &["a".to_string(), "b".to_string()]);
    assert!(!data.is_empty());
}
