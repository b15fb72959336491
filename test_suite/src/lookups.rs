#![cfg(test)]

use sieve_query::lookups::{Lookup, LookupOp, NEGATION_MARKER};

#[test]
fn wire_ids() {
    assert_eq!(Lookup::new(LookupOp::Exact).id(), "exact");
    assert_eq!(Lookup::new(LookupOp::IContains).id(), "icontains");
    assert_eq!(Lookup::new(LookupOp::StartsWith).id(), "startswith");
    assert_eq!(Lookup::new(LookupOp::IsNull).id(), "isnull");
    assert_eq!(Lookup::negated(LookupOp::In).id(), "ex_in");
    assert_eq!(Lookup::negated(LookupOp::Exact).id(), "ex_exact");
}

#[test]
fn parse_positive_and_negated() {
    assert_eq!(Lookup::parse("gt"), Some(Lookup::new(LookupOp::Gt)));
    assert_eq!(
        Lookup::parse("ex_contains"),
        Some(Lookup::negated(LookupOp::Contains))
    );
    // "exact" begins with "ex" but carries no marker
    assert_eq!(Lookup::parse("exact"), Some(Lookup::new(LookupOp::Exact)));
    assert_eq!(Lookup::parse("bogus"), None);
    assert_eq!(Lookup::parse("ex_bogus"), None);
}

#[test]
fn parse_round_trips_the_whole_vocabulary() {
    for lookup in Lookup::all() {
        assert_eq!(Lookup::parse(&lookup.id()), Some(lookup));
    }
}

#[test]
fn unknown_ids_fall_back_to_exact() {
    assert_eq!(Lookup::parse_or_exact(""), Lookup::new(LookupOp::Exact));
    assert_eq!(
        Lookup::parse_or_exact("frobnicate"),
        Lookup::new(LookupOp::Exact)
    );
    // Valid ids are untouched.
    assert_eq!(
        Lookup::parse_or_exact("ex_in"),
        Lookup::negated(LookupOp::In)
    );
}

#[test]
fn every_positive_lookup_has_a_negated_twin() {
    let all = Lookup::all();
    for lookup in all.iter().filter(|l| !l.negated) {
        let twin = Lookup::negated(lookup.op);
        assert!(all.contains(&twin));
        assert_eq!(twin.id(), format!("{}{}", NEGATION_MARKER, lookup.id()));
    }
    assert_eq!(all.len() % 2, 0);
}

#[test]
fn labels() {
    assert_eq!(Lookup::new(LookupOp::Gt).label(), "Greater than");
    assert_eq!(Lookup::new(LookupOp::Range).label(), "Range");
    assert_eq!(Lookup::negated(LookupOp::Exact).label(), "Different");
    assert_eq!(Lookup::negated(LookupOp::Contains).label(), "Not contains");
    assert_eq!(Lookup::negated(LookupOp::IsNull).label(), "Is not null");
}
